//! Phased release, pre-orders, manual release and App Review submission

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::jsonapi::{create_body, to_one, update_body, Resource};

use super::versions::Platform;

/// Phased release state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhasedReleaseState {
    Inactive,
    Active,
    Paused,
    Complete,
}

impl fmt::Display for PhasedReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inactive => "INACTIVE",
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Complete => "COMPLETE",
        })
    }
}

impl FromStr for PhasedReleaseState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INACTIVE" => Ok(Self::Inactive),
            "ACTIVE" | "RESUME" => Ok(Self::Active),
            "PAUSED" | "PAUSE" => Ok(Self::Paused),
            "COMPLETE" => Ok(Self::Complete),
            _ => Err(Error::InvalidInput(format!("unknown phased release state '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhasedReleaseAttributes {
    pub phased_release_state: Option<PhasedReleaseState>,
    pub start_date: Option<String>,
    pub total_pause_duration: Option<u32>,
    pub current_day_number: Option<u32>,
}

pub type PhasedRelease = Resource<PhasedReleaseAttributes>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreOrderAttributes {
    pub pre_order_available_date: Option<String>,
    pub app_release_date: Option<String>,
}

pub type PreOrder = Resource<PreOrderAttributes>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewSubmissionAttributes {
    pub platform: Option<Platform>,
    pub state: Option<String>,
    pub submitted_date: Option<String>,
}

pub type ReviewSubmission = Resource<ReviewSubmissionAttributes>;

impl Client {
    // -------------------------------------------------------------------------
    // Phased Release
    // -------------------------------------------------------------------------

    /// Phased release of a version, if one was set up
    pub async fn get_phased_release(&self, version_id: &str) -> Result<Option<PhasedRelease>> {
        self.get_optional(
            &format!("/appStoreVersions/{}/appStoreVersionPhasedRelease", version_id),
            &[],
        )
        .await
    }

    /// Enable a phased release for a version
    pub async fn create_phased_release(&self, version_id: &str) -> Result<PhasedRelease> {
        let body = create_body(
            "appStoreVersionPhasedReleases",
            json!({ "phasedReleaseState": PhasedReleaseState::Inactive }),
            json!({ "appStoreVersion": to_one("appStoreVersions", version_id) }),
        );
        let phased = self.post("/appStoreVersionPhasedReleases", &body).await?;
        info!(version_id, "created phased release");
        Ok(phased)
    }

    /// Pause, resume or complete a phased release
    #[instrument(skip(self))]
    pub async fn set_phased_release_state(
        &self,
        phased_release_id: &str,
        state: PhasedReleaseState,
    ) -> Result<PhasedRelease> {
        let body = update_body(
            "appStoreVersionPhasedReleases",
            phased_release_id,
            json!({ "phasedReleaseState": state }),
        );
        let phased = self
            .patch(
                &format!("/appStoreVersionPhasedReleases/{}", phased_release_id),
                &body,
            )
            .await?;
        info!(phased_release_id, %state, "updated phased release");
        Ok(phased)
    }

    // -------------------------------------------------------------------------
    // Pre-orders
    // -------------------------------------------------------------------------

    /// Pre-order of the configured app, if enabled
    pub async fn get_pre_order(&self) -> Result<Option<PreOrder>> {
        let app_id = self.app_id()?;
        self.get_optional(&format!("/apps/{}/preOrder", app_id), &[])
            .await
    }

    /// Make the configured app available for pre-order until `release_date` (YYYY-MM-DD)
    pub async fn enable_pre_order(&self, release_date: &str) -> Result<PreOrder> {
        let app_id = self.app_id()?;
        let body = create_body(
            "appPreOrders",
            json!({ "appReleaseDate": release_date }),
            json!({ "app": to_one("apps", app_id) }),
        );
        let pre_order = self.post("/appPreOrders", &body).await?;
        info!(release_date, "enabled pre-order");
        Ok(pre_order)
    }

    pub async fn update_pre_order(&self, pre_order_id: &str, release_date: &str) -> Result<PreOrder> {
        let body = update_body(
            "appPreOrders",
            pre_order_id,
            json!({ "appReleaseDate": release_date }),
        );
        self.patch(&format!("/appPreOrders/{}", pre_order_id), &body)
            .await
    }

    pub async fn cancel_pre_order(&self, pre_order_id: &str) -> Result<()> {
        self.delete(&format!("/appPreOrders/{}", pre_order_id)).await?;
        info!(pre_order_id, "cancelled pre-order");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Release & Review
    // -------------------------------------------------------------------------

    /// Release a version that is pending developer release
    #[instrument(skip(self))]
    pub async fn release_version(&self, version_id: &str) -> Result<()> {
        let body = create_body(
            "appStoreVersionReleaseRequests",
            Value::Null,
            json!({ "appStoreVersion": to_one("appStoreVersions", version_id) }),
        );
        self.send(
            reqwest::Method::POST,
            "/appStoreVersionReleaseRequests",
            Some(&body),
        )
        .await?;
        info!(version_id, "requested release");
        Ok(())
    }

    /// Submit a version for App Review.
    ///
    /// Creates a review submission, adds the version as its item, then marks
    /// the submission as submitted.
    #[instrument(skip(self))]
    pub async fn submit_for_review(&self, version_id: &str, platform: Platform) -> Result<ReviewSubmission> {
        let app_id = self.app_id()?;

        let body = create_body(
            "reviewSubmissions",
            json!({ "platform": platform }),
            json!({ "app": to_one("apps", app_id) }),
        );
        let submission: ReviewSubmission = self.post("/reviewSubmissions", &body).await?;

        let item = create_body(
            "reviewSubmissionItems",
            Value::Null,
            json!({
                "reviewSubmission": to_one("reviewSubmissions", &submission.id),
                "appStoreVersion": to_one("appStoreVersions", version_id)
            }),
        );
        self.send(reqwest::Method::POST, "/reviewSubmissionItems", Some(&item))
            .await?;

        let submit = update_body("reviewSubmissions", &submission.id, json!({ "submitted": true }));
        let submitted = self
            .patch(&format!("/reviewSubmissions/{}", submission.id), &submit)
            .await?;

        info!(version_id, submission_id = %submission.id, "submitted for review");
        Ok(submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::fixture;
    use reqwest::Method;

    #[test]
    fn test_phased_state_parse() {
        assert_eq!("pause".parse::<PhasedReleaseState>().unwrap(), PhasedReleaseState::Paused);
        assert_eq!("resume".parse::<PhasedReleaseState>().unwrap(), PhasedReleaseState::Active);
        assert_eq!("COMPLETE".parse::<PhasedReleaseState>().unwrap(), PhasedReleaseState::Complete);
        assert!("stop".parse::<PhasedReleaseState>().is_err());
    }

    #[tokio::test]
    async fn test_missing_phased_release_is_none() {
        let fx = fixture(vec![(200, json!({ "data": null }))]);
        assert!(fx.client.get_phased_release("v1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pause_phased_release() {
        let fx = fixture(vec![(200, json!({ "data": {
            "type": "appStoreVersionPhasedReleases",
            "id": "p1",
            "attributes": { "phasedReleaseState": "PAUSED", "currentDayNumber": 3 }
        }}))]);

        let phased = fx
            .client
            .set_phased_release_state("p1", PhasedReleaseState::Paused)
            .await
            .unwrap();
        assert_eq!(phased.attributes.phased_release_state, Some(PhasedReleaseState::Paused));

        let body: Value = serde_json::from_slice(fx.transport.recorded()[0].body.as_ref().unwrap()).unwrap();
        assert_eq!(body["data"]["attributes"]["phasedReleaseState"], "PAUSED");
    }

    #[tokio::test]
    async fn test_pre_order_lifecycle() {
        let fx = fixture(vec![
            (201, json!({ "data": { "type": "appPreOrders", "id": "po1", "attributes": { "appReleaseDate": "2026-12-01" } } })),
            (200, json!({ "data": { "type": "appPreOrders", "id": "po1", "attributes": { "appReleaseDate": "2026-12-15" } } })),
            (204, Value::Null),
        ]);

        let pre_order = fx.client.enable_pre_order("2026-12-01").await.unwrap();
        let updated = fx.client.update_pre_order(&pre_order.id, "2026-12-15").await.unwrap();
        assert_eq!(updated.attributes.app_release_date.as_deref(), Some("2026-12-15"));
        fx.client.cancel_pre_order(&pre_order.id).await.unwrap();

        let methods: Vec<_> = fx.transport.recorded().into_iter().map(|r| r.method).collect();
        assert_eq!(methods, vec![Method::POST, Method::PATCH, Method::DELETE]);
    }

    #[tokio::test]
    async fn test_release_version_body() {
        let fx = fixture(vec![(201, json!({ "data": { "type": "appStoreVersionReleaseRequests", "id": "rr1" } }))]);
        fx.client.release_version("v1").await.unwrap();

        let body: Value = serde_json::from_slice(fx.transport.recorded()[0].body.as_ref().unwrap()).unwrap();
        assert!(body["data"].get("attributes").is_none());
        assert_eq!(body["data"]["relationships"]["appStoreVersion"]["data"]["id"], "v1");
    }

    #[tokio::test]
    async fn test_submit_for_review_sequence() {
        let fx = fixture(vec![
            (201, json!({ "data": { "type": "reviewSubmissions", "id": "rs1", "attributes": { "platform": "IOS", "state": "READY_FOR_REVIEW" } } })),
            (201, json!({ "data": { "type": "reviewSubmissionItems", "id": "item1" } })),
            (200, json!({ "data": { "type": "reviewSubmissions", "id": "rs1", "attributes": { "state": "WAITING_FOR_REVIEW" } } })),
        ]);

        let submission = fx.client.submit_for_review("v1", Platform::Ios).await.unwrap();
        assert_eq!(submission.attributes.state.as_deref(), Some("WAITING_FOR_REVIEW"));

        let requests = fx.transport.recorded();
        assert_eq!(requests[0].url.path(), "/v1/reviewSubmissions");
        assert_eq!(requests[1].url.path(), "/v1/reviewSubmissionItems");
        let item: Value = serde_json::from_slice(requests[1].body.as_ref().unwrap()).unwrap();
        assert_eq!(item["data"]["relationships"]["reviewSubmission"]["data"]["id"], "rs1");
        assert_eq!(requests[2].method, Method::PATCH);
        assert_eq!(requests[2].url.path(), "/v1/reviewSubmissions/rs1");
    }
}
