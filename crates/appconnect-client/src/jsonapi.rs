//! Generic JSON:API documents
//!
//! Every response from App Store Connect has the shape
//! `{ "data": ..., "included": [...], "links": {...} }`. Resource wrappers
//! pick an attribute struct and decode through [`Document`] and
//! [`Resource`]; nothing else knows about the envelope.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Result;

/// Top-level response document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document<D> {
    pub data: D,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Resource<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl<D: DeserializeOwned> Document<D> {
    /// Decode a parsed response body
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

impl<D> Document<D> {
    /// URL of the next page, if any
    pub fn next_page(&self) -> Option<&str> {
        self.links.as_ref().and_then(|l| l.next.as_deref())
    }

    /// Decode a sideloaded resource from `included`
    pub fn find_included<A: DeserializeOwned + Default>(&self, kind: &str, id: &str) -> Option<Resource<A>> {
        self.included
            .iter()
            .find(|r| r.kind == kind && r.id == id)
            .and_then(|r| serde_json::to_value(r).ok())
            .and_then(|v| serde_json::from_value(v).ok())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
}

/// A typed resource object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<A> {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub attributes: A,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, Relationship>,
}

impl<A> Resource<A> {
    /// Id of a to-one relationship, when its linkage was returned
    pub fn relationship_id(&self, name: &str) -> Option<&str> {
        match self.relationships.get(name)?.data.as_ref()? {
            Linkage::One(id) => Some(id.id.as_str()),
            Linkage::Many(_) => None,
        }
    }

    /// Ids of a to-many relationship
    pub fn relationship_ids(&self, name: &str) -> Vec<&str> {
        match self.relationships.get(name).and_then(|r| r.data.as_ref()) {
            Some(Linkage::Many(ids)) => ids.iter().map(|i| i.id.as_str()).collect(),
            Some(Linkage::One(id)) => vec![id.id.as_str()],
            None => Vec::new(),
        }
    }
}

impl<A: Serialize> Resource<A> {
    /// Flatten into one map: `id`, `type`, then the attributes
    pub fn flatten(&self) -> Map<String, Value> {
        let mut flat = Map::new();
        flat.insert("id".to_string(), Value::String(self.id.clone()));
        flat.insert("type".to_string(), Value::String(self.kind.clone()));

        if let Ok(Value::Object(attributes)) = serde_json::to_value(&self.attributes) {
            for (key, value) in attributes {
                if !value.is_null() {
                    flat.insert(key, value);
                }
            }
        }

        flat
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Linkage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
}

/// Resource linkage of a relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    One(ResourceId),
    Many(Vec<ResourceId>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceId {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

// ----------------------------------------------------------------------------
// Request bodies
// ----------------------------------------------------------------------------

/// `{"data": {"type": kind, "id": id}}`
pub fn to_one(kind: &str, id: &str) -> Value {
    json!({ "data": { "type": kind, "id": id } })
}

/// `{"data": [{"type": kind, "id": id}, ...]}`
pub fn to_many(kind: &str, ids: &[&str]) -> Value {
    let data: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "type": kind, "id": id }))
        .collect();
    json!({ "data": data })
}

/// Body for a POST creating a resource
pub fn create_body(kind: &str, attributes: Value, relationships: Value) -> Value {
    let mut data = Map::new();
    data.insert("type".to_string(), Value::String(kind.to_string()));
    if !is_empty(&attributes) {
        data.insert("attributes".to_string(), attributes);
    }
    if !is_empty(&relationships) {
        data.insert("relationships".to_string(), relationships);
    }
    json!({ "data": data })
}

/// Body for a PATCH updating a resource
pub fn update_body(kind: &str, id: &str, attributes: Value) -> Value {
    json!({
        "data": {
            "type": kind,
            "id": id,
            "attributes": attributes
        }
    })
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct AppAttributes {
        name: Option<String>,
        bundle_id: Option<String>,
    }

    fn apps_document() -> Value {
        json!({
            "data": [{
                "type": "apps",
                "id": "1234567890",
                "attributes": { "name": "Example", "bundleId": "com.example.app", "sku": "EX1" },
                "relationships": {
                    "appInfos": { "links": { "related": "https://example.test" } },
                    "preOrder": { "data": { "type": "appPreOrders", "id": "po-1" } },
                    "betaGroups": { "data": [
                        { "type": "betaGroups", "id": "g1" },
                        { "type": "betaGroups", "id": "g2" }
                    ]}
                }
            }],
            "included": [{
                "type": "appPreOrders",
                "id": "po-1",
                "attributes": { "appReleaseDate": "2026-12-01" }
            }],
            "links": {
                "self": "https://api.appstoreconnect.apple.com/v1/apps",
                "next": "https://api.appstoreconnect.apple.com/v1/apps?cursor=Mg"
            }
        })
    }

    #[test]
    fn test_decode_collection() {
        let doc: Document<Vec<Resource<AppAttributes>>> = Document::from_value(apps_document()).unwrap();
        assert_eq!(doc.data.len(), 1);

        let app = &doc.data[0];
        assert_eq!(app.kind, "apps");
        assert_eq!(app.attributes.bundle_id.as_deref(), Some("com.example.app"));
        assert_eq!(app.relationship_id("preOrder"), Some("po-1"));
        assert_eq!(app.relationship_ids("betaGroups"), vec!["g1", "g2"]);
        assert_eq!(app.relationship_id("appInfos"), None);
        assert_eq!(doc.next_page(), Some("https://api.appstoreconnect.apple.com/v1/apps?cursor=Mg"));
    }

    #[test]
    fn test_find_included() {
        #[derive(Debug, Default, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct PreOrder {
            app_release_date: Option<String>,
        }

        let doc: Document<Vec<Resource<Value>>> = Document::from_value(apps_document()).unwrap();
        let pre_order: Resource<PreOrder> = doc.find_included("appPreOrders", "po-1").unwrap();
        assert_eq!(pre_order.attributes.app_release_date.as_deref(), Some("2026-12-01"));
        assert!(doc.find_included::<PreOrder>("appPreOrders", "missing").is_none());
    }

    #[test]
    fn test_missing_attributes_default() {
        let doc: Document<Resource<AppAttributes>> =
            Document::from_value(json!({ "data": { "type": "apps", "id": "1" } })).unwrap();
        assert_eq!(doc.data.attributes, AppAttributes::default());
        assert!(doc.next_page().is_none());
    }

    #[test]
    fn test_null_data_decodes_as_none() {
        let doc: Document<Option<Resource<AppAttributes>>> =
            Document::from_value(json!({ "data": null })).unwrap();
        assert!(doc.data.is_none());
    }

    #[test]
    fn test_flatten() {
        let resource = Resource {
            id: "1".to_string(),
            kind: "apps".to_string(),
            attributes: AppAttributes {
                name: Some("Example".to_string()),
                bundle_id: None,
            },
            relationships: BTreeMap::new(),
        };
        let flat = resource.flatten();
        assert_eq!(flat.get("id"), Some(&json!("1")));
        assert_eq!(flat.get("type"), Some(&json!("apps")));
        assert_eq!(flat.get("name"), Some(&json!("Example")));
        assert!(!flat.contains_key("bundleId"));
    }

    #[test]
    fn test_bodies() {
        let body = create_body(
            "betaGroups",
            json!({ "name": "QA" }),
            json!({ "app": to_one("apps", "42") }),
        );
        assert_eq!(body["data"]["type"], "betaGroups");
        assert_eq!(body["data"]["attributes"]["name"], "QA");
        assert_eq!(body["data"]["relationships"]["app"]["data"]["id"], "42");

        let body = create_body("appStoreVersionReleaseRequests", Value::Null, json!({}));
        assert!(body["data"].get("attributes").is_none());
        assert!(body["data"].get("relationships").is_none());

        let many = to_many("builds", &["b1", "b2"]);
        assert_eq!(many["data"][1]["id"], "b2");

        let patch = update_body("builds", "b1", json!({ "expired": true }));
        assert_eq!(patch["data"]["id"], "b1");
        assert_eq!(patch["data"]["attributes"]["expired"], true);
    }
}
