//! The remote collaborator contract and its wire types.
//!
//! The remote is a plain REST collection: `GET <endpoint>` lists,
//! `DELETE <endpoint>/{id}` removes one, `POST <endpoint>` creates one.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use pocket_core::types::{format_timestamp, Record};

use crate::error::SyncError;

/// A record as the remote returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
}

/// Body of a create request: a remote record without its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePayload {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
}

impl From<&Record> for RemotePayload {
    fn from(record: &Record) -> Self {
        Self {
            title: record.title.clone(),
            amount: record.amount,
            created_at: format_timestamp(&record.created_at),
            type_tag: record.type_tag.map(|t| t.as_str().to_string()),
        }
    }
}

impl RemotePayload {
    /// The record the remote would hold after accepting this payload.
    pub fn into_record(self, id: String) -> RemoteRecord {
        RemoteRecord {
            id,
            title: self.title,
            amount: self.amount,
            created_at: self.created_at,
            type_tag: self.type_tag,
        }
    }
}

// Mock APIs disagree on whether ids are strings or numbers.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// A remote store that local records are backed up to.
#[async_trait]
pub trait RemoteCollaborator: Send + Sync {
    /// All records currently held remotely, in the remote's order.
    async fn fetch_all(&self) -> Result<Vec<RemoteRecord>, SyncError>;

    /// Remove one remote record.
    async fn delete(&self, id: &str) -> Result<(), SyncError>;

    /// Create a remote record and return it with the id the remote assigned.
    async fn create(&self, payload: &RemotePayload) -> Result<RemoteRecord, SyncError>;
}
