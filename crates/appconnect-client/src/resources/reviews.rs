//! Customer reviews and developer responses

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::jsonapi::{create_body, to_one, Resource};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerReviewAttributes {
    pub rating: Option<u8>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub reviewer_nickname: Option<String>,
    pub created_date: Option<String>,
    pub territory: Option<String>,
}

pub type CustomerReview = Resource<CustomerReviewAttributes>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewResponseAttributes {
    pub response_body: Option<String>,
    pub last_modified_date: Option<String>,
    pub state: Option<String>,
}

pub type ReviewResponse = Resource<ReviewResponseAttributes>;

/// Sort order for review listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReviewSort {
    #[default]
    Newest,
    Oldest,
    HighestRating,
    LowestRating,
}

impl ReviewSort {
    /// Value of the `sort` query parameter
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Newest => "-createdDate",
            Self::Oldest => "createdDate",
            Self::HighestRating => "-rating",
            Self::LowestRating => "rating",
        }
    }
}

impl fmt::Display for ReviewSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

impl FromStr for ReviewSort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "newest" | "-createdDate" => Ok(Self::Newest),
            "oldest" | "createdDate" => Ok(Self::Oldest),
            "highest" | "-rating" => Ok(Self::HighestRating),
            "lowest" | "rating" => Ok(Self::LowestRating),
            _ => Err(Error::InvalidInput(format!("unknown review sort '{}'", s))),
        }
    }
}

impl Client {
    /// Customer reviews of the configured app
    #[instrument(skip(self))]
    pub async fn list_customer_reviews(
        &self,
        rating: Option<u8>,
        sort: ReviewSort,
        limit: Option<usize>,
    ) -> Result<Vec<CustomerReview>> {
        let app_id = self.app_id()?;
        if let Some(rating) = rating {
            if !(1..=5).contains(&rating) {
                return Err(Error::InvalidInput(format!(
                    "rating must be between 1 and 5, got {}",
                    rating
                )));
            }
        }

        let rating = rating.map(|r| r.to_string());
        let limit = limit.map(|l| l.to_string());
        let mut params = vec![("sort", sort.as_param())];
        if let Some(rating) = rating.as_deref() {
            params.push(("filter[rating]", rating));
        }

        let path = format!("/apps/{}/customerReviews", app_id);
        match limit.as_deref() {
            Some(limit) => {
                params.push(("limit", limit));
                Ok(self.get::<CustomerReviewAttributes>(&path, &params).await?.data)
            }
            None => self.get_all(&path, &params).await,
        }
    }

    /// The developer response to a review, if one exists
    pub async fn get_review_response(&self, review_id: &str) -> Result<Option<ReviewResponse>> {
        self.get_optional(&format!("/customerReviews/{}/response", review_id), &[])
            .await
    }

    /// Publish a response to a review, replacing any earlier one
    #[instrument(skip(self, response_body))]
    pub async fn respond_to_review(&self, review_id: &str, response_body: &str) -> Result<ReviewResponse> {
        let body = create_body(
            "customerReviewResponses",
            json!({ "responseBody": response_body }),
            json!({ "review": to_one("customerReviews", review_id) }),
        );
        let response = self.post("/customerReviewResponses", &body).await?;
        info!(review_id, "responded to review");
        Ok(response)
    }

    pub async fn delete_review_response(&self, response_id: &str) -> Result<()> {
        self.delete(&format!("/customerReviewResponses/{}", response_id))
            .await
    }
}
