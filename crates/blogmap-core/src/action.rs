//! Actions accepted by the reducer.
//!
//! The serialized form matches the `{ "type": "ADD_PAPER", "data": ... }`
//! shape used by the web client, so recorded action logs can be replayed.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::Value;

use crate::model::{Author, AuthorId, Paper, PaperId};
use crate::store::{Store, SyncStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    remote = "Self",
    tag = "type",
    content = "data",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum Action {
    /// Replace the whole store (bootstrap only).
    SetInitStore(Store),
    SetBackendUri(String),
    SetSyncStatus(SyncStatus),
    /// `None` means the payload was not a collection; the reducer ignores it.
    SetPapers(Option<Vec<Paper>>),
    SetAuthors(Option<Vec<Author>>),
    AddPaper(Paper),
    ModPaper(Paper),
    RemPaper {
        #[serde(rename = "_id")]
        id: PaperId,
    },
    AddAuthor(Author),
    ModAuthor(Author),
    RemAuthor {
        #[serde(rename = "_id")]
        id: AuthorId,
    },
    /// Any action type this client does not know about. Its payload is
    /// dropped.
    #[serde(skip_deserializing)]
    Unknown,
}

/// Wire names of every action kind the reducer handles.
const KNOWN_KINDS: &[&str] = &[
    "SET_INIT_STORE",
    "SET_BACKEND_URI",
    "SET_SYNC_STATUS",
    "SET_PAPERS",
    "SET_AUTHORS",
    "ADD_PAPER",
    "MOD_PAPER",
    "REM_PAPER",
    "ADD_AUTHOR",
    "MOD_AUTHOR",
    "REM_AUTHOR",
];

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Action::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let kind = raw
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| de::Error::missing_field("type"))?;
        if !KNOWN_KINDS.contains(&kind) {
            tracing::debug!(kind, "ignoring unknown action");
            return Ok(Action::Unknown);
        }
        Action::deserialize(raw).map_err(de::Error::custom)
    }
}

impl Action {
    /// Wire name of the action kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetInitStore(_) => "SET_INIT_STORE",
            Self::SetBackendUri(_) => "SET_BACKEND_URI",
            Self::SetSyncStatus(_) => "SET_SYNC_STATUS",
            Self::SetPapers(_) => "SET_PAPERS",
            Self::SetAuthors(_) => "SET_AUTHORS",
            Self::AddPaper(_) => "ADD_PAPER",
            Self::ModPaper(_) => "MOD_PAPER",
            Self::RemPaper { .. } => "REM_PAPER",
            Self::AddAuthor(_) => "ADD_AUTHOR",
            Self::ModAuthor(_) => "MOD_AUTHOR",
            Self::RemAuthor { .. } => "REM_AUTHOR",
            Self::Unknown => "UNKNOWN",
        }
    }
}
