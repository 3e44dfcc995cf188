//! App Store versions and their localizations

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::jsonapi::{create_body, to_one, update_body, Resource};

use super::join_filter;

/// Version states in which metadata can still be edited
pub const EDITABLE_STATES: &[&str] = &[
    "PREPARE_FOR_SUBMISSION",
    "DEVELOPER_REJECTED",
    "REJECTED",
    "METADATA_REJECTED",
    "INVALID_BINARY",
];

/// App Store platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[default]
    #[serde(rename = "IOS")]
    Ios,
    #[serde(rename = "MAC_OS")]
    MacOs,
    #[serde(rename = "TV_OS")]
    TvOs,
    #[serde(rename = "VISION_OS")]
    VisionOs,
}

impl Platform {
    /// API value, e.g. `IOS`
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::Ios => "IOS",
            Self::MacOs => "MAC_OS",
            Self::TvOs => "TV_OS",
            Self::VisionOs => "VISION_OS",
        }
    }

    /// Path segment used by the App Store Connect website
    pub fn web_slug(&self) -> &'static str {
        match self {
            Self::Ios | Self::VisionOs => "ios",
            Self::MacOs => "osx",
            Self::TvOs => "appletvos",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "ios" => Ok(Self::Ios),
            "macos" | "osx" | "mac" => Ok(Self::MacOs),
            "tvos" | "appletvos" => Ok(Self::TvOs),
            "visionos" => Ok(Self::VisionOs),
            _ => Err(Error::InvalidInput(format!("unknown platform '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VersionAttributes {
    pub platform: Option<Platform>,
    pub version_string: Option<String>,
    pub app_store_state: Option<String>,
    pub release_type: Option<String>,
    pub earliest_release_date: Option<String>,
    pub copyright: Option<String>,
    pub created_date: Option<String>,
}

impl VersionAttributes {
    pub fn is_editable(&self) -> bool {
        self.app_store_state
            .as_deref()
            .is_some_and(|s| EDITABLE_STATES.contains(&s))
    }
}

pub type AppStoreVersion = Resource<VersionAttributes>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VersionLocalizationAttributes {
    pub locale: String,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub whats_new: Option<String>,
    pub promotional_text: Option<String>,
    pub marketing_url: Option<String>,
    pub support_url: Option<String>,
}

pub type VersionLocalization = Resource<VersionLocalizationAttributes>;

/// Localized fields to set; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whats_new: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotional_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketing_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_url: Option<String>,
}

/// Result of creating one locale in a batch
#[derive(Debug)]
pub enum LocalizationOutcome {
    Created(VersionLocalization),
    Failed { locale: String, error: Error },
}

impl LocalizationOutcome {
    pub fn locale(&self) -> &str {
        match self {
            Self::Created(loc) => &loc.attributes.locale,
            Self::Failed { locale, .. } => locale,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

impl Client {
    /// List versions of the configured app, optionally filtered
    #[instrument(skip(self, states))]
    pub async fn list_versions(
        &self,
        platform: Option<Platform>,
        states: &[&str],
    ) -> Result<Vec<AppStoreVersion>> {
        let app_id = self.app_id()?;

        let states = join_filter(states);
        let mut params = Vec::new();
        if let Some(platform) = platform {
            params.push(("filter[platform]", platform.as_api_str()));
        }
        if !states.is_empty() {
            params.push(("filter[appStoreState]", states.as_str()));
        }

        self.get_all(&format!("/apps/{}/appStoreVersions", app_id), &params)
            .await
    }

    pub async fn get_version(&self, version_id: &str) -> Result<AppStoreVersion> {
        self.get_one(&format!("/appStoreVersions/{}", version_id), &[])
            .await
    }

    /// Create a new version of the configured app
    #[instrument(skip(self))]
    pub async fn create_version(
        &self,
        platform: Platform,
        version_string: &str,
    ) -> Result<AppStoreVersion> {
        let app_id = self.app_id()?;
        let body = create_body(
            "appStoreVersions",
            json!({ "platform": platform, "versionString": version_string }),
            json!({ "app": to_one("apps", app_id) }),
        );

        let version = self.post("/appStoreVersions", &body).await?;
        info!(version = version_string, %platform, "created app store version");
        Ok(version)
    }

    /// Update version attributes (`versionString`, `releaseType`, ...)
    pub async fn update_version(&self, version_id: &str, attributes: Value) -> Result<AppStoreVersion> {
        let body = update_body("appStoreVersions", version_id, attributes);
        self.patch(&format!("/appStoreVersions/{}", version_id), &body)
            .await
    }

    /// The version of `platform` whose metadata can still be edited
    pub async fn editable_version(&self, platform: Platform) -> Result<AppStoreVersion> {
        self.list_versions(Some(platform), EDITABLE_STATES)
            .await?
            .into_iter()
            .find(|v| v.attributes.is_editable())
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "no editable {} version found; create a new version first",
                    platform
                ))
            })
    }

    pub async fn list_version_localizations(&self, version_id: &str) -> Result<Vec<VersionLocalization>> {
        self.get_all(
            &format!("/appStoreVersions/{}/appStoreVersionLocalizations", version_id),
            &[],
        )
        .await
    }

    pub async fn update_version_localization(
        &self,
        localization_id: &str,
        update: &LocalizationUpdate,
    ) -> Result<VersionLocalization> {
        let body = update_body(
            "appStoreVersionLocalizations",
            localization_id,
            serde_json::to_value(update)?,
        );
        self.patch(
            &format!("/appStoreVersionLocalizations/{}", localization_id),
            &body,
        )
        .await
    }

    pub async fn create_version_localization(
        &self,
        version_id: &str,
        locale: &str,
        update: &LocalizationUpdate,
    ) -> Result<VersionLocalization> {
        let mut attributes = serde_json::to_value(update)?;
        if let Value::Object(ref mut map) = attributes {
            map.insert("locale".to_string(), Value::String(locale.to_string()));
        }

        let body = create_body(
            "appStoreVersionLocalizations",
            attributes,
            json!({ "appStoreVersion": to_one("appStoreVersions", version_id) }),
        );
        self.post("/appStoreVersionLocalizations", &body).await
    }

    /// Create several localizations, continuing past failures
    #[instrument(skip(self, localizations), fields(count = localizations.len()))]
    pub async fn create_version_localizations(
        &self,
        version_id: &str,
        localizations: &[(String, LocalizationUpdate)],
    ) -> Vec<LocalizationOutcome> {
        let mut outcomes = Vec::with_capacity(localizations.len());

        for (locale, update) in localizations {
            match self.create_version_localization(version_id, locale, update).await {
                Ok(created) => {
                    info!(%locale, "created localization");
                    outcomes.push(LocalizationOutcome::Created(created));
                }
                Err(error) => {
                    warn!(%locale, %error, "failed to create localization");
                    outcomes.push(LocalizationOutcome::Failed {
                        locale: locale.clone(),
                        error,
                    });
                }
            }
        }

        outcomes
    }

    /// Attach a build to a version
    pub async fn select_build_for_version(&self, version_id: &str, build_id: &str) -> Result<()> {
        self.send(
            reqwest::Method::PATCH,
            &format!("/appStoreVersions/{}/relationships/build", version_id),
            Some(&to_one("builds", build_id)),
        )
        .await?;
        info!(version_id, build_id, "selected build for version");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::fixture;
    use crate::error::ApiErrorKind;
    use reqwest::Method;

    #[test]
    fn test_platform_parse() {
        assert_eq!("ios".parse::<Platform>().unwrap(), Platform::Ios);
        assert_eq!("MAC_OS".parse::<Platform>().unwrap(), Platform::MacOs);
        assert_eq!("tvos".parse::<Platform>().unwrap(), Platform::TvOs);
        assert_eq!("visionOS".parse::<Platform>().unwrap(), Platform::VisionOs);
        assert!("android".parse::<Platform>().is_err());
        assert_eq!(Platform::MacOs.web_slug(), "osx");
        assert_eq!(Platform::TvOs.web_slug(), "appletvos");
    }

    #[test]
    fn test_localization_update_serialization() {
        let update = LocalizationUpdate {
            description: Some("Test description".to_string()),
            whats_new: Some("Bug fixes".to_string()),
            support_url: Some("https://example.com".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("whatsNew"));
        assert!(json.contains("supportUrl"));
        assert!(!json.contains("keywords"));
        assert!(!json.contains("promotionalText"));
    }

    #[tokio::test]
    async fn test_list_versions_filters() {
        let fx = fixture(vec![(200, json!({ "data": [
            { "type": "appStoreVersions", "id": "v1", "attributes": { "platform": "IOS", "versionString": "1.2", "appStoreState": "PREPARE_FOR_SUBMISSION" } }
        ]}))]);

        let versions = fx
            .client
            .list_versions(Some(Platform::Ios), &["PREPARE_FOR_SUBMISSION", "READY_FOR_SALE"])
            .await
            .unwrap();
        assert_eq!(versions[0].attributes.platform, Some(Platform::Ios));
        assert!(versions[0].attributes.is_editable());

        let url = &fx.transport.recorded()[0].url;
        assert_eq!(url.path(), "/v1/apps/6450000000/appStoreVersions");
        let pairs: Vec<_> = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert!(pairs.contains(&("filter[platform]".to_string(), "IOS".to_string())));
        assert!(pairs.contains(&(
            "filter[appStoreState]".to_string(),
            "PREPARE_FOR_SUBMISSION,READY_FOR_SALE".to_string()
        )));
    }

    #[tokio::test]
    async fn test_create_version_body() {
        let fx = fixture(vec![(201, json!({ "data": { "type": "appStoreVersions", "id": "v9" } }))]);
        fx.client.create_version(Platform::MacOs, "2.0").await.unwrap();

        let request = &fx.transport.recorded()[0];
        assert_eq!(request.method, Method::POST);
        let body: Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["data"]["attributes"]["platform"], "MAC_OS");
        assert_eq!(body["data"]["attributes"]["versionString"], "2.0");
        assert_eq!(body["data"]["relationships"]["app"]["data"]["id"], "6450000000");
    }

    #[tokio::test]
    async fn test_editable_version_missing() {
        let fx = fixture(vec![(200, json!({ "data": [
            { "type": "appStoreVersions", "id": "v1", "attributes": { "appStoreState": "READY_FOR_SALE" } }
        ]}))]);
        let err = fx.client.editable_version(Platform::Ios).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_batch_localizations_continue_past_failures() {
        let fx = fixture(vec![
            (201, json!({ "data": { "type": "appStoreVersionLocalizations", "id": "l1", "attributes": { "locale": "en-US" } } })),
            (409, json!({ "errors": [{ "status": "409", "detail": "locale already exists" }] })),
            (201, json!({ "data": { "type": "appStoreVersionLocalizations", "id": "l3", "attributes": { "locale": "fr-FR" } } })),
        ]);

        let update = LocalizationUpdate {
            whats_new: Some("Fixes".to_string()),
            ..Default::default()
        };
        let outcomes = fx
            .client
            .create_version_localizations(
                "v1",
                &[
                    ("en-US".to_string(), update.clone()),
                    ("de-DE".to_string(), update.clone()),
                    ("fr-FR".to_string(), update),
                ],
            )
            .await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_created());
        assert_eq!(outcomes[1].locale(), "de-DE");
        match &outcomes[1] {
            LocalizationOutcome::Failed { error, .. } => {
                assert_eq!(error.api_kind(), Some(ApiErrorKind::Generic));
                assert!(error.to_string().contains("locale already exists"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(outcomes[2].locale(), "fr-FR");

        let body: Value = serde_json::from_slice(fx.transport.recorded()[1].body.as_ref().unwrap()).unwrap();
        assert_eq!(body["data"]["attributes"]["locale"], "de-DE");
        assert_eq!(body["data"]["attributes"]["whatsNew"], "Fixes");
    }

    #[tokio::test]
    async fn test_select_build_for_version() {
        let fx = fixture(vec![(204, Value::Null)]);
        fx.client.select_build_for_version("v1", "b1").await.unwrap();

        let request = &fx.transport.recorded()[0];
        assert_eq!(request.method, Method::PATCH);
        assert_eq!(request.url.path(), "/v1/appStoreVersions/v1/relationships/build");
    }
}
