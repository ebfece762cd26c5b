//! Zone and record documents
//!
//! These mirror the provider's document shapes. Every type carries a
//! flattened `extra` map so provider fields this crate does not model reach
//! the provider unchanged. The cache does not go through these types; it
//! keeps the provider's document as raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A DNS zone as tracked by the upstream provider
///
/// `id`, default TTLs and `dns_servers` are assigned upstream. A client-built
/// `Zone` only ever travels *to* the provider; what lands in the cache is the
/// provider's answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Upstream-assigned identifier (empty until the zone exists upstream)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// The zone's domain name
    #[serde(rename = "zone", alias = "Zone", default)]
    pub name: String,

    /// Default TTL for records in the zone
    #[serde(alias = "TTL", default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    /// Negative-caching TTL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nx_ttl: Option<u32>,

    /// SOA retry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<u32>,

    /// SOA refresh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<u32>,

    /// SOA expiry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u32>,

    /// Nameservers the provider assigned, in the provider's order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_servers: Vec<String>,

    /// Provider networks serving the zone
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<u32>,

    /// Record summaries embedded in a fetched zone
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<ZoneRecord>,

    /// Provider fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Zone {
    /// Create a zone document carrying only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the default TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Look up an embedded record summary by its key
    pub fn record(&self, key: &RecordKey) -> Option<&ZoneRecord> {
        self.records
            .iter()
            .find(|r| r.domain == key.domain && r.record_type == key.record_type)
    }
}

/// Record summary as embedded in a zone document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneRecord {
    /// Upstream-assigned identifier
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Fully qualified record name
    pub domain: String,

    /// Record type (A, AAAA, CNAME, ...)
    #[serde(rename = "type")]
    pub record_type: String,

    /// Answers in their short textual form
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub short_answers: Vec<String>,

    /// Record TTL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    /// Provider fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A DNS record creation payload, scoped to one zone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Upstream-assigned identifier
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Owning zone name
    #[serde(default)]
    pub zone: String,

    /// Fully qualified record name
    #[serde(default)]
    pub domain: String,

    /// Record type (A, AAAA, CNAME, ...)
    #[serde(rename = "type", default)]
    pub record_type: String,

    /// Answers; each carries its rdata under `answer`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub answers: Vec<Answer>,

    /// Record TTL
    #[serde(alias = "TTL", default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    /// Provider fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Create a record for `domain` in `zone`
    pub fn new(
        zone: impl Into<String>,
        domain: impl Into<String>,
        record_type: impl Into<String>,
    ) -> Self {
        Self {
            zone: zone.into(),
            domain: domain.into(),
            record_type: record_type.into(),
            ..Self::default()
        }
    }

    /// Append an answer built from its rdata fields
    pub fn with_answer<I, V>(mut self, rdata: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.answers.push(Answer {
            answer: rdata.into_iter().map(Into::into).collect(),
            extra: Map::new(),
        });
        self
    }

    /// The record's identifying key within its zone
    pub fn key(&self) -> RecordKey {
        RecordKey {
            domain: self.domain.clone(),
            record_type: self.record_type.clone(),
        }
    }
}

/// A single answer of a record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Rdata fields, e.g. `["1.2.3.4"]` or `[10, "mx.example.com"]`
    #[serde(default)]
    pub answer: Vec<Value>,

    /// Provider fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Answer {
    /// Render the rdata the way zone summaries list it
    pub fn short_form(&self) -> String {
        self.answer
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Identifies a record within its zone: type plus name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    /// Fully qualified record name
    pub domain: String,
    /// Record type
    pub record_type: String,
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.domain, self.record_type)
    }
}
