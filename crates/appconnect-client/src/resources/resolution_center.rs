//! App Review messages from the Resolution Center
//!
//! Only the website API serves these, so requests go through
//! [`Client::web_request`] and need a web session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::client::Client;
use crate::error::Result;

use super::versions::Platform;

/// One message in the Resolution Center thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewMessage {
    pub from: Option<String>,
    pub date: Option<DateTime<Utc>>,
    /// Message body as served (HTML)
    pub body: String,
}

impl ReviewMessage {
    fn from_value(value: &Value) -> Option<Self> {
        let body = value.get("body")?.as_str()?.to_string();
        let from = value
            .get("from")
            .and_then(Value::as_str)
            .map(str::to_string);
        let date = value.get("date").and_then(parse_date);
        Some(Self { from, date, body })
    }

    /// Body with HTML tags removed and common entities decoded
    pub fn plain_text(&self) -> String {
        let with_breaks = self
            .body
            .replace("<br>", "\n")
            .replace("<br/>", "\n")
            .replace("<br />", "\n")
            .replace("</p>", "\n");

        let mut text = String::with_capacity(with_breaks.len());
        let mut in_tag = false;
        for c in with_breaks.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if !in_tag => text.push(c),
                _ => {}
            }
        }

        text.replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&")
            .trim()
            .to_string()
    }
}

/// Dates arrive as epoch milliseconds or RFC 3339 strings
fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|d| d.with_timezone(&Utc)),
        _ => None,
    }
}

impl Client {
    /// Latest App Review messages for the configured app
    #[instrument(skip(self))]
    pub async fn review_messages(&self, platform: Platform) -> Result<Vec<ReviewMessage>> {
        let app_id = self.app_id()?;
        let path = format!(
            "/apps/{}/platforms/{}/resolutionCenter",
            app_id,
            platform.web_slug()
        );

        let response = self.web_request(&path, &[("v", "latest")]).await?;
        let messages: Vec<ReviewMessage> = response
            .pointer("/data/messages")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(ReviewMessage::from_value).collect())
            .unwrap_or_default();

        debug!(count = messages.len(), "fetched resolution center messages");
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{fixture_with, MockTransport};
    use serde_json::json;

    #[test]
    fn test_plain_text() {
        let message = ReviewMessage {
            from: None,
            date: None,
            body: "<p>Guideline 2.1 &amp; 4.0</p><p>We found a crash.<br/>Please fix.</p>".to_string(),
        };
        assert_eq!(
            message.plain_text(),
            "Guideline 2.1 & 4.0\nWe found a crash.\nPlease fix."
        );
    }

    #[test]
    fn test_parse_date_formats() {
        let millis = parse_date(&json!(1_700_000_000_000i64)).unwrap();
        assert_eq!(millis.timestamp(), 1_700_000_000);
        let rfc = parse_date(&json!("2026-01-02T03:04:05Z")).unwrap();
        assert_eq!(rfc.to_rfc3339(), "2026-01-02T03:04:05+00:00");
        assert!(parse_date(&json!(true)).is_none());
    }

    #[tokio::test]
    async fn test_review_messages() {
        let transport = MockTransport::json(vec![(200, json!({ "data": { "messages": [
            { "from": "Apple", "date": 1_700_000_000_000i64, "body": "<p>Rejected</p>" },
            { "from": "Apple" }
        ]}}))]);
        let fx = fixture_with(transport, |c| c.session = Some("myacinfo=abc".to_string()));

        let messages = fx.client.review_messages(Platform::MacOs).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].from.as_deref(), Some("Apple"));
        assert_eq!(messages[0].plain_text(), "Rejected");

        let url = &fx.transport.recorded()[0].url;
        assert!(url.path().ends_with("/ra/apps/6450000000/platforms/osx/resolutionCenter"));
        assert_eq!(url.query(), Some("v=latest"));
    }
}
