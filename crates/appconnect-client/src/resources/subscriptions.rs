//! Auto-renewable subscriptions

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::client::Client;
use crate::error::Result;
use crate::jsonapi::{create_body, to_one, update_body, Resource};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriptionGroupAttributes {
    pub reference_name: Option<String>,
}

pub type SubscriptionGroup = Resource<SubscriptionGroupAttributes>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriptionAttributes {
    pub name: Option<String>,
    pub product_id: Option<String>,
    pub family_sharable: Option<bool>,
    pub state: Option<String>,
    pub subscription_period: Option<String>,
    pub review_note: Option<String>,
    pub group_level: Option<u32>,
}

pub type Subscription = Resource<SubscriptionAttributes>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriptionLocalizationAttributes {
    pub locale: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub state: Option<String>,
}

pub type SubscriptionLocalization = Resource<SubscriptionLocalizationAttributes>;

impl Client {
    /// Subscription groups of the configured app
    pub async fn list_subscription_groups(&self) -> Result<Vec<SubscriptionGroup>> {
        let app_id = self.app_id()?;
        self.get_all(&format!("/apps/{}/subscriptionGroups", app_id), &[])
            .await
    }

    /// Subscriptions in a group
    pub async fn list_subscriptions(&self, group_id: &str) -> Result<Vec<Subscription>> {
        self.get_all(
            &format!("/subscriptionGroups/{}/subscriptions", group_id),
            &[],
        )
        .await
    }

    pub async fn get_subscription(&self, subscription_id: &str) -> Result<Subscription> {
        self.get_one(&format!("/subscriptions/{}", subscription_id), &[])
            .await
    }

    /// Update subscription attributes (`name`, `reviewNote`, `familySharable`, ...)
    pub async fn update_subscription(&self, subscription_id: &str, attributes: Value) -> Result<Subscription> {
        let body = update_body("subscriptions", subscription_id, attributes);
        let subscription = self
            .patch(&format!("/subscriptions/{}", subscription_id), &body)
            .await?;
        info!(subscription_id, "updated subscription");
        Ok(subscription)
    }

    pub async fn list_subscription_localizations(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<SubscriptionLocalization>> {
        self.get_all(
            &format!("/subscriptions/{}/subscriptionLocalizations", subscription_id),
            &[],
        )
        .await
    }

    pub async fn create_subscription_localization(
        &self,
        subscription_id: &str,
        locale: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<SubscriptionLocalization> {
        let body = create_body(
            "subscriptionLocalizations",
            json!({ "locale": locale, "name": name, "description": description }),
            json!({ "subscription": to_one("subscriptions", subscription_id) }),
        );
        self.post("/subscriptionLocalizations", &body).await
    }
}
