//! Builds

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::client::Client;
use crate::error::Result;
use crate::jsonapi::{create_body, to_one, update_body, Resource};

/// Default page size for build listings
pub const DEFAULT_BUILD_LIMIT: usize = 25;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildAttributes {
    pub version: Option<String>,
    pub uploaded_date: Option<String>,
    pub expiration_date: Option<String>,
    pub expired: Option<bool>,
    pub processing_state: Option<String>,
    pub build_audience_type: Option<String>,
    pub min_os_version: Option<String>,
    pub uses_non_exempt_encryption: Option<bool>,
}

impl BuildAttributes {
    pub fn state(&self) -> BuildProcessingState {
        self.processing_state
            .as_deref()
            .map(BuildProcessingState::from_str)
            .unwrap_or(BuildProcessingState::Processing)
    }
}

pub type Build = Resource<BuildAttributes>;

/// Build processing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildProcessingState {
    Processing,
    Failed,
    Invalid,
    Valid,
}

impl BuildProcessingState {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PROCESSING" => Self::Processing,
            "FAILED" => Self::Failed,
            "INVALID" => Self::Invalid,
            "VALID" => Self::Valid,
            _ => Self::Processing,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BetaLocalizationAttributes {
    locale: String,
}

impl Client {
    /// Most recently uploaded builds of the configured app
    #[instrument(skip(self))]
    pub async fn list_builds(&self, limit: Option<usize>) -> Result<Vec<Build>> {
        let app_id = self.app_id()?;
        let limit = limit.unwrap_or(DEFAULT_BUILD_LIMIT).to_string();

        let page = self
            .get::<BuildAttributes>(
                "/builds",
                &[
                    ("filter[app]", app_id),
                    ("limit", limit.as_str()),
                    ("sort", "-uploadedDate"),
                ],
            )
            .await?;
        Ok(page.data)
    }

    pub async fn get_build(&self, build_id: &str) -> Result<Build> {
        self.get_one(&format!("/builds/{}", build_id), &[]).await
    }

    /// Most recently uploaded build, if any
    pub async fn latest_build(&self) -> Result<Option<Build>> {
        Ok(self.list_builds(Some(1)).await?.into_iter().next())
    }

    /// Set export compliance for a build
    pub async fn set_export_compliance(&self, build_id: &str, uses_encryption: bool) -> Result<Build> {
        let body = update_body(
            "builds",
            build_id,
            json!({ "usesNonExemptEncryption": uses_encryption }),
        );
        self.patch(&format!("/builds/{}", build_id), &body).await
    }

    /// Expire a build (remove from TestFlight)
    pub async fn expire_build(&self, build_id: &str) -> Result<Build> {
        let body = update_body("builds", build_id, json!({ "expired": true }));
        let build = self.patch(&format!("/builds/{}", build_id), &body).await?;
        info!(build_id, "expired build");
        Ok(build)
    }

    /// Set "What's New" text for a build, creating the localization if needed
    #[instrument(skip(self, whats_new))]
    pub async fn set_whats_new(&self, build_id: &str, locale: &str, whats_new: &str) -> Result<()> {
        let existing = self
            .get_all::<BetaLocalizationAttributes>(
                &format!("/builds/{}/betaBuildLocalizations", build_id),
                &[],
            )
            .await?
            .into_iter()
            .find(|l| l.attributes.locale == locale);

        match existing {
            Some(loc) => {
                let body = update_body(
                    "betaBuildLocalizations",
                    &loc.id,
                    json!({ "whatsNew": whats_new }),
                );
                self.send(
                    reqwest::Method::PATCH,
                    &format!("/betaBuildLocalizations/{}", loc.id),
                    Some(&body),
                )
                .await?;
            }
            None => {
                let body = create_body(
                    "betaBuildLocalizations",
                    json!({ "locale": locale, "whatsNew": whats_new }),
                    json!({ "build": to_one("builds", build_id) }),
                );
                self.send(reqwest::Method::POST, "/betaBuildLocalizations", Some(&body))
                    .await?;
            }
        }

        info!("Set 'What's New' for build {} in {}", build_id, locale);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::fixture;
    use reqwest::Method;
    use serde_json::Value;

    #[test]
    fn test_build_processing_state() {
        assert_eq!(
            BuildProcessingState::from_str("PROCESSING"),
            BuildProcessingState::Processing
        );
        assert_eq!(
            BuildProcessingState::from_str("VALID"),
            BuildProcessingState::Valid
        );
        assert_eq!(
            BuildProcessingState::from_str("invalid"),
            BuildProcessingState::Invalid
        );
        assert_eq!(BuildAttributes::default().state(), BuildProcessingState::Processing);
    }

    #[tokio::test]
    async fn test_list_builds_query() {
        let fx = fixture(vec![(200, json!({ "data": [
            { "type": "builds", "id": "b1", "attributes": { "version": "42", "processingState": "VALID" } }
        ]}))]);

        let builds = fx.client.list_builds(Some(5)).await.unwrap();
        assert_eq!(builds[0].attributes.state(), BuildProcessingState::Valid);

        let url = &fx.transport.recorded()[0].url;
        let pairs: Vec<_> = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert_eq!(
            pairs,
            vec![
                ("filter[app]".to_string(), "6450000000".to_string()),
                ("limit".to_string(), "5".to_string()),
                ("sort".to_string(), "-uploadedDate".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_expire_build_body() {
        let fx = fixture(vec![(200, json!({ "data": { "type": "builds", "id": "b1", "attributes": { "expired": true } } }))]);
        let build = fx.client.expire_build("b1").await.unwrap();
        assert_eq!(build.attributes.expired, Some(true));

        let request = &fx.transport.recorded()[0];
        assert_eq!(request.method, Method::PATCH);
        let body: Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["data"]["attributes"]["expired"], true);
    }

    #[tokio::test]
    async fn test_set_whats_new_updates_existing_locale() {
        let fx = fixture(vec![
            (200, json!({ "data": [
                { "type": "betaBuildLocalizations", "id": "bl-en", "attributes": { "locale": "en-US" } }
            ]})),
            (200, json!({ "data": { "type": "betaBuildLocalizations", "id": "bl-en" } })),
        ]);

        fx.client.set_whats_new("b1", "en-US", "New things").await.unwrap();

        let requests = fx.transport.recorded();
        assert_eq!(requests[1].method, Method::PATCH);
        assert_eq!(requests[1].url.path(), "/v1/betaBuildLocalizations/bl-en");
    }

    #[tokio::test]
    async fn test_set_whats_new_creates_missing_locale() {
        let fx = fixture(vec![
            (200, json!({ "data": [] })),
            (201, json!({ "data": { "type": "betaBuildLocalizations", "id": "bl-de" } })),
        ]);

        fx.client.set_whats_new("b1", "de-DE", "Neues").await.unwrap();

        let request = &fx.transport.recorded()[1];
        assert_eq!(request.method, Method::POST);
        let body: Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["data"]["attributes"]["locale"], "de-DE");
        assert_eq!(body["data"]["relationships"]["build"]["data"]["id"], "b1");
    }
}
