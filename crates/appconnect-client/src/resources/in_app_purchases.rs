//! In-app purchases (v2 API)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::jsonapi::{create_body, to_one, update_body, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InAppPurchaseType {
    Consumable,
    NonConsumable,
    NonRenewingSubscription,
}

impl fmt::Display for InAppPurchaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Consumable => "CONSUMABLE",
            Self::NonConsumable => "NON_CONSUMABLE",
            Self::NonRenewingSubscription => "NON_RENEWING_SUBSCRIPTION",
        })
    }
}

impl FromStr for InAppPurchaseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "CONSUMABLE" => Ok(Self::Consumable),
            "NON_CONSUMABLE" => Ok(Self::NonConsumable),
            "NON_RENEWING_SUBSCRIPTION" => Ok(Self::NonRenewingSubscription),
            _ => Err(Error::InvalidInput(format!("unknown in-app purchase type '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InAppPurchaseAttributes {
    pub name: Option<String>,
    pub product_id: Option<String>,
    pub in_app_purchase_type: Option<String>,
    pub state: Option<String>,
    pub review_note: Option<String>,
    pub family_sharable: Option<bool>,
}

pub type InAppPurchase = Resource<InAppPurchaseAttributes>;

impl Client {
    /// In-app purchases of the configured app
    pub async fn list_in_app_purchases(&self) -> Result<Vec<InAppPurchase>> {
        let app_id = self.app_id()?;
        self.get_all(&format!("/apps/{}/inAppPurchasesV2", app_id), &[])
            .await
    }

    pub async fn get_in_app_purchase(&self, iap_id: &str) -> Result<InAppPurchase> {
        self.get_one(&format!("/v2/inAppPurchases/{}", iap_id), &[])
            .await
    }

    #[instrument(skip(self))]
    pub async fn create_in_app_purchase(
        &self,
        name: &str,
        product_id: &str,
        kind: InAppPurchaseType,
    ) -> Result<InAppPurchase> {
        let app_id = self.app_id()?;
        let body = create_body(
            "inAppPurchases",
            json!({ "name": name, "productId": product_id, "inAppPurchaseType": kind }),
            json!({ "app": to_one("apps", app_id) }),
        );
        let iap = self.post("/v2/inAppPurchases", &body).await?;
        info!(product_id, "created in-app purchase");
        Ok(iap)
    }

    pub async fn update_in_app_purchase(&self, iap_id: &str, attributes: Value) -> Result<InAppPurchase> {
        let body = update_body("inAppPurchases", iap_id, attributes);
        self.patch(&format!("/v2/inAppPurchases/{}", iap_id), &body)
            .await
    }

    pub async fn delete_in_app_purchase(&self, iap_id: &str) -> Result<()> {
        self.delete(&format!("/v2/inAppPurchases/{}", iap_id)).await?;
        info!(iap_id, "deleted in-app purchase");
        Ok(())
    }
}
