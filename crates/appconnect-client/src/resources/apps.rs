//! Apps and app infos

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::jsonapi::Resource;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppAttributes {
    pub name: Option<String>,
    pub bundle_id: Option<String>,
    pub sku: Option<String>,
    pub primary_locale: Option<String>,
    pub content_rights_declaration: Option<String>,
}

pub type App = Resource<AppAttributes>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppInfoAttributes {
    pub app_store_state: Option<String>,
    pub app_store_age_rating: Option<String>,
    pub brazil_age_rating: Option<String>,
    pub kids_age_band: Option<String>,
}

pub type AppInfo = Resource<AppInfoAttributes>;

impl Client {
    /// List every app visible to the key
    #[instrument(skip(self))]
    pub async fn list_apps(&self) -> Result<Vec<App>> {
        self.get_all("/apps", &[]).await
    }

    /// Get an app by ID, or the configured app when `app_id` is `None`
    pub async fn get_app(&self, app_id: Option<&str>) -> Result<App> {
        let app_id = match app_id {
            Some(id) => id,
            None => self.app_id()?,
        };
        self.get_one(&format!("/apps/{}", app_id), &[]).await
    }

    /// Find an app by bundle identifier
    #[instrument(skip(self))]
    pub async fn find_app_by_bundle_id(&self, bundle_id: &str) -> Result<App> {
        let page = self
            .get::<AppAttributes>("/apps", &[("filter[bundleId]", bundle_id)])
            .await?;

        let app = page
            .data
            .into_iter()
            .find(|app| app.attributes.bundle_id.as_deref() == Some(bundle_id))
            .ok_or_else(|| Error::AppNotFound(bundle_id.to_string()))?;

        debug!(app_id = %app.id, "resolved bundle id");
        Ok(app)
    }

    /// App ID from the configuration, else looked up from the bundle ID
    pub async fn resolve_app_id(&self) -> Result<String> {
        if let Ok(app_id) = self.app_id() {
            return Ok(app_id.to_string());
        }
        let bundle_id = self.bundle_id()?.to_string();
        Ok(self.find_app_by_bundle_id(&bundle_id).await?.id)
    }

    /// App info records of the configured app
    pub async fn app_infos(&self) -> Result<Vec<AppInfo>> {
        let app_id = self.app_id()?;
        self.get_all(&format!("/apps/{}/appInfos", app_id), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{fixture, fixture_with, MockTransport};
    use serde_json::json;

    #[tokio::test]
    async fn test_find_app_by_bundle_id() {
        let fx = fixture(vec![(200, json!({ "data": [
            { "type": "apps", "id": "1", "attributes": { "bundleId": "com.example.other" } },
            { "type": "apps", "id": "2", "attributes": { "bundleId": "com.example.app", "name": "Example" } }
        ]}))]);

        let app = fx.client.find_app_by_bundle_id("com.example.app").await.unwrap();
        assert_eq!(app.id, "2");
        assert_eq!(app.attributes.name.as_deref(), Some("Example"));

        let url = &fx.transport.recorded()[0].url;
        assert_eq!(url.path(), "/v1/apps");
        assert!(url.query().unwrap().contains("filter%5BbundleId%5D=com.example.app"));
    }

    #[tokio::test]
    async fn test_find_app_by_bundle_id_not_found() {
        let fx = fixture(vec![(200, json!({ "data": [] }))]);
        let err = fx.client.find_app_by_bundle_id("com.example.none").await.unwrap_err();
        assert!(matches!(err, Error::AppNotFound(ref id) if id == "com.example.none"));
    }

    #[tokio::test]
    async fn test_get_app_defaults_to_configured_app() {
        let fx = fixture(vec![(200, json!({ "data": { "type": "apps", "id": "6450000000" } }))]);
        let app = fx.client.get_app(None).await.unwrap();
        assert_eq!(app.id, "6450000000");
        assert_eq!(fx.transport.recorded()[0].url.path(), "/v1/apps/6450000000");
    }

    #[tokio::test]
    async fn test_app_infos_without_app_id_is_config_error() {
        let fx = fixture_with(MockTransport::json(vec![]), |c| c.credentials.app_id = None);
        let err = fx.client.app_infos().await.unwrap_err();
        assert!(err.is_config());
        assert!(fx.transport.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_app_id_falls_back_to_bundle_id() {
        let transport = MockTransport::json(vec![(200, json!({ "data": [
            { "type": "apps", "id": "77", "attributes": { "bundleId": "com.example.app" } }
        ]}))]);
        let fx = fixture_with(transport, |c| c.credentials.app_id = None);
        assert_eq!(fx.client.resolve_app_id().await.unwrap(), "77");
    }
}
