//! Paper and Author records, in their persisted and pre-persistence forms.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Backend-assigned paper identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaperId(pub String);

/// Backend-assigned author identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(pub String);

macro_rules! id_impls {
    ($ty:ident) => {
        impl $ty {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $ty {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

id_impls!(PaperId);
id_impls!(AuthorId);

/// Kind of paper. Serialized with the backend's literal names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaperType {
    #[default]
    Article,
    Block,
    #[serde(rename = "White-Paper")]
    WhitePaper,
}

impl PaperType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Article => "Article",
            Self::Block => "Block",
            Self::WhitePaper => "White-Paper",
        }
    }
}

impl fmt::Display for PaperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaperType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "article" => Ok(Self::Article),
            "block" => Ok(Self::Block),
            "white-paper" | "whitepaper" | "white_paper" => Ok(Self::WhitePaper),
            other => Err(format!(
                "unknown paper type `{other}` (expected Article, Block or White-Paper)"
            )),
        }
    }
}

/// A persisted author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(rename = "_id")]
    pub id: AuthorId,
    pub name: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of an author create or rename request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorDraft {
    pub name: String,
}

/// A persisted paper. `author` always holds an author id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    #[serde(rename = "_id")]
    pub id: PaperId,
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub kind: PaperType,
    pub author: AuthorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Paper {
    /// The writable fields of this paper, as sent in a PATCH body.
    pub fn draft(&self) -> PaperDraft {
        PaperDraft {
            title: self.title.clone(),
            body: self.body.clone(),
            kind: self.kind,
            author: self.author.clone(),
            category: self.category.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Paper body for create (POST) and update (PATCH) requests.
///
/// Unlike the editor form, the author here is already resolved to an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperDraft {
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub kind: PaperType,
    pub author: AuthorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
}

/// `null` decodes like a missing list.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode each record on its own and drop the ones that do not fit, so one
/// malformed record does not cost the whole collection.
fn lenient_records<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(raw) = Option::<Vec<serde_json::Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let records = raw
        .into_iter()
        .filter_map(|value| {
            let id = value.get("_id").and_then(|v| v.as_str()).map(str::to_owned);
            match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::warn!(id = ?id, error = %err, "skipping malformed record");
                    None
                }
            }
        })
        .collect();
    Ok(Some(records))
}

/// Collection listing returned by `GET /api/v0/<entity>`.
///
/// `data` is `None` when the backend answered without a collection.
/// Records that fail to decode are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Listing<T> {
    #[serde(default, deserialize_with = "lenient_records")]
    pub data: Option<Vec<T>>,
    #[serde(default)]
    pub length: Option<usize>,
}

impl<T> Listing<T> {
    pub fn new(items: Vec<T>) -> Self {
        let length = items.len();
        Self {
            data: Some(items),
            length: Some(length),
        }
    }

    /// Number of records actually received.
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
