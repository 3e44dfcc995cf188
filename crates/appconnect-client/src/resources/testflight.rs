//! TestFlight beta groups, testers and beta review

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::client::Client;
use crate::error::Result;
use crate::jsonapi::{create_body, to_many, to_one, Resource};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BetaGroupAttributes {
    pub name: Option<String>,
    pub is_internal_group: Option<bool>,
    pub public_link_enabled: Option<bool>,
    pub public_link: Option<String>,
    pub public_link_limit_enabled: Option<bool>,
    pub public_link_limit: Option<u32>,
    pub created_date: Option<String>,
}

pub type BetaGroup = Resource<BetaGroupAttributes>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BetaTesterAttributes {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub invite_type: Option<String>,
    pub state: Option<String>,
}

impl BetaTesterAttributes {
    pub fn invite(&self) -> TesterInviteType {
        self.invite_type
            .as_deref()
            .map(TesterInviteType::from_str)
            .unwrap_or(TesterInviteType::Email)
    }
}

pub type BetaTester = Resource<BetaTesterAttributes>;

/// Tester invite type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TesterInviteType {
    Email,
    PublicLink,
}

impl TesterInviteType {
    fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PUBLIC_LINK" => Self::PublicLink,
            _ => Self::Email,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BetaReviewSubmissionAttributes {
    pub beta_review_state: Option<String>,
    pub submitted_date: Option<String>,
}

impl BetaReviewSubmissionAttributes {
    pub fn state(&self) -> BetaReviewState {
        self.beta_review_state
            .as_deref()
            .map(BetaReviewState::from_str)
            .unwrap_or(BetaReviewState::WaitingForReview)
    }
}

pub type BetaReviewSubmission = Resource<BetaReviewSubmissionAttributes>;

/// Beta review state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetaReviewState {
    WaitingForReview,
    InReview,
    Rejected,
    Approved,
}

impl BetaReviewState {
    fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "WAITING_FOR_REVIEW" => Self::WaitingForReview,
            "IN_REVIEW" => Self::InReview,
            "REJECTED" => Self::Rejected,
            "APPROVED" => Self::Approved,
            _ => Self::WaitingForReview,
        }
    }
}

impl Client {
    // -------------------------------------------------------------------------
    // Beta Group Management
    // -------------------------------------------------------------------------

    /// List beta groups of the configured app
    pub async fn list_beta_groups(&self) -> Result<Vec<BetaGroup>> {
        let app_id = self.app_id()?;
        self.get_all("/betaGroups", &[("filter[app]", app_id)]).await
    }

    /// Create a new beta group
    #[instrument(skip(self))]
    pub async fn create_beta_group(&self, name: &str, public_link_enabled: bool) -> Result<BetaGroup> {
        let app_id = self.app_id()?;
        let body = create_body(
            "betaGroups",
            json!({ "name": name, "publicLinkEnabled": public_link_enabled }),
            json!({ "app": to_one("apps", app_id) }),
        );

        let group = self.post("/betaGroups", &body).await?;
        info!(name, "created beta group");
        Ok(group)
    }

    /// Delete a beta group
    pub async fn delete_beta_group(&self, group_id: &str) -> Result<()> {
        self.delete(&format!("/betaGroups/{}", group_id)).await
    }

    /// Add builds to a beta group
    pub async fn add_builds_to_group(&self, group_id: &str, build_ids: &[&str]) -> Result<()> {
        self.send(
            reqwest::Method::POST,
            &format!("/betaGroups/{}/relationships/builds", group_id),
            Some(&to_many("builds", build_ids)),
        )
        .await?;
        info!(group_id, count = build_ids.len(), "added builds to group");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Tester Management
    // -------------------------------------------------------------------------

    /// List testers of the configured app, or of one group
    pub async fn list_testers(&self, group_id: Option<&str>) -> Result<Vec<BetaTester>> {
        match group_id {
            Some(group_id) => {
                self.get_all(&format!("/betaGroups/{}/betaTesters", group_id), &[])
                    .await
            }
            None => {
                let app_id = self.app_id()?;
                self.get_all("/betaTesters", &[("filter[apps]", app_id)])
                    .await
            }
        }
    }

    /// Find a tester by email address
    pub async fn find_tester(&self, email: &str) -> Result<Option<BetaTester>> {
        let page = self
            .get::<BetaTesterAttributes>("/betaTesters", &[("filter[email]", email)])
            .await?;
        Ok(page.data.into_iter().next())
    }

    /// Invite a tester into one or more groups
    #[instrument(skip(self))]
    pub async fn invite_tester(
        &self,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        group_ids: &[&str],
    ) -> Result<BetaTester> {
        let body = create_body(
            "betaTesters",
            json!({ "email": email, "firstName": first_name, "lastName": last_name }),
            json!({ "betaGroups": to_many("betaGroups", group_ids) }),
        );

        let tester = self.post("/betaTesters", &body).await?;
        info!(email, "invited tester");
        Ok(tester)
    }

    /// Remove a tester from all apps and groups
    pub async fn remove_tester(&self, tester_id: &str) -> Result<()> {
        self.delete(&format!("/betaTesters/{}", tester_id)).await
    }

    /// Add a tester to groups
    pub async fn add_tester_to_groups(&self, tester_id: &str, group_ids: &[&str]) -> Result<()> {
        self.send(
            reqwest::Method::POST,
            &format!("/betaTesters/{}/relationships/betaGroups", tester_id),
            Some(&to_many("betaGroups", group_ids)),
        )
        .await
    }

    // -------------------------------------------------------------------------
    // Beta App Review
    // -------------------------------------------------------------------------

    /// Submit a build for beta app review
    #[instrument(skip(self))]
    pub async fn submit_for_beta_review(&self, build_id: &str) -> Result<BetaReviewSubmission> {
        let body = create_body(
            "betaAppReviewSubmissions",
            json!({}),
            json!({ "build": to_one("builds", build_id) }),
        );
        let submission = self.post("/betaAppReviewSubmissions", &body).await?;
        info!(build_id, "submitted build for beta review");
        Ok(submission)
    }
}
