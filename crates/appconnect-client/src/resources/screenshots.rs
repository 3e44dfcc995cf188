//! App screenshot sets and screenshots

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::jsonapi::{create_body, to_one, Resource};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScreenshotSetAttributes {
    /// e.g. `APP_IPHONE_67`, `APP_IPAD_PRO_129`
    pub screenshot_display_type: Option<String>,
}

pub type ScreenshotSet = Resource<ScreenshotSetAttributes>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScreenshotAttributes {
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub source_file_checksum: Option<String>,
    pub asset_delivery_state: Option<serde_json::Value>,
}

impl ScreenshotAttributes {
    /// `assetDeliveryState.state`, e.g. `COMPLETE`
    pub fn delivery_state(&self) -> Option<&str> {
        self.asset_delivery_state.as_ref()?.get("state")?.as_str()
    }
}

pub type Screenshot = Resource<ScreenshotAttributes>;

impl Client {
    /// Screenshot sets of a version localization
    pub async fn list_screenshot_sets(&self, localization_id: &str) -> Result<Vec<ScreenshotSet>> {
        self.get_all(
            &format!("/appStoreVersionLocalizations/{}/appScreenshotSets", localization_id),
            &[],
        )
        .await
    }

    pub async fn create_screenshot_set(
        &self,
        localization_id: &str,
        display_type: &str,
    ) -> Result<ScreenshotSet> {
        let body = create_body(
            "appScreenshotSets",
            json!({ "screenshotDisplayType": display_type }),
            json!({
                "appStoreVersionLocalization": to_one("appStoreVersionLocalizations", localization_id)
            }),
        );
        self.post("/appScreenshotSets", &body).await
    }

    pub async fn list_screenshots(&self, set_id: &str) -> Result<Vec<Screenshot>> {
        self.get_all(&format!("/appScreenshotSets/{}/appScreenshots", set_id), &[])
            .await
    }

    /// Upload an image file into a screenshot set
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn upload_screenshot(&self, set_id: &str, path: &Path) -> Result<Screenshot> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidInput(format!("not a file path: {}", path.display())))?;
        let data = tokio::fs::read(path).await?;
        if data.is_empty() {
            return Err(Error::InvalidInput(format!("{} is empty", path.display())));
        }

        self.upload_asset(
            "appScreenshots",
            file_name,
            &data,
            json!({ "appScreenshotSet": to_one("appScreenshotSets", set_id) }),
        )
        .await
    }

    pub async fn delete_screenshot(&self, screenshot_id: &str) -> Result<()> {
        self.delete(&format!("/appScreenshots/{}", screenshot_id)).await?;
        info!(screenshot_id, "deleted screenshot");
        Ok(())
    }
}
