//! Backend entity models
//!
//! Serde views of the JSON returned by the Azure DevOps Git REST API. Each
//! entity is an [`Entity`]: typed fields for the handful of values the
//! projections read, plus the object exactly as received. Serializing an
//! entity re-emits that object, null fields and absent keys included.

use std::ops::Deref;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Prefix of branch refs
pub const HEADS_PREFIX: &str = "refs/heads/";

/// Collection envelope used by list endpoints: `{ "count": n, "value": [...] }`
#[derive(Debug, Clone, Deserialize)]
pub struct ValueList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// Typed fields `T` over a backend object that is kept verbatim
///
/// Derefs to `T` for reads. There is no mutable access, so the raw object
/// always matches what was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity<T> {
    fields: T,
    raw: Value,
}

impl<T> Entity<T> {
    /// The backend object as received
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }
}

impl<T: DeserializeOwned> Entity<T> {
    pub fn from_raw(raw: Value) -> serde_json::Result<Self> {
        let fields = T::deserialize(&raw)?;
        Ok(Self { fields, raw })
    }
}

impl<T> Deref for Entity<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.fields
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Entity<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Self::from_raw(Value::deserialize(deserializer)?).map_err(D::Error::custom)
    }
}

impl<T> Serialize for Entity<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

pub type GitRepository = Entity<RepositoryFields>;
pub type GitRef = Entity<RefFields>;
pub type GitPullRequest = Entity<PullRequestFields>;
pub type CommentThread = Entity<ThreadFields>;
pub type Comment = Entity<CommentFields>;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryFields {
    pub id: Option<String>,
    pub name: Option<String>,
    pub is_disabled: Option<bool>,
    pub is_fork: Option<bool>,
    pub is_in_maintenance: Option<bool>,
    pub web_url: Option<String>,
    pub size: Option<u64>,
}

/// Git ref (branch, tag, note)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefFields {
    pub name: String,
    pub object_id: Option<String>,
}

impl RefFields {
    /// Short branch name, or `None` when the ref is not under `refs/heads/`
    pub fn branch_name(&self) -> Option<&str> {
        self.name.strip_prefix(HEADS_PREFIX)
    }
}

/// Identity reference embedded in pull requests and comments
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub unique_name: Option<String>,
}

/// Repository reference embedded in a pull request
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestFields {
    pub pull_request_id: Option<i64>,
    pub code_review_id: Option<i64>,
    pub status: Option<String>,
    pub created_by: Option<IdentityRef>,
    pub creation_date: Option<String>,
    pub title: Option<String>,
    pub is_draft: Option<bool>,
    pub source_ref_name: Option<String>,
    pub target_ref_name: Option<String>,
    pub repository: Option<RepositoryRef>,
}

/// Line/offset position inside a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPosition {
    pub line: u32,
    pub offset: u32,
}

impl CommentPosition {
    /// Start of `line`
    pub fn line_start(line: u32) -> Self {
        Self { line, offset: 1 }
    }
}

/// File and line range a thread is anchored to
///
/// Also sent as part of new-thread requests, hence `Serialize`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_file_start: Option<CommentPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_file_end: Option<CommentPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_file_start: Option<CommentPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_file_end: Option<CommentPosition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentFields {
    pub id: Option<i64>,
    pub author: Option<IdentityRef>,
    pub content: Option<String>,
    pub published_date: Option<String>,
    pub last_updated_date: Option<String>,
    pub last_content_updated_date: Option<String>,
    pub is_deleted: Option<bool>,
}

impl CommentFields {
    pub fn is_deleted(&self) -> bool {
        self.is_deleted.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadFields {
    pub id: Option<i64>,
    pub published_date: Option<String>,
    pub last_updated_date: Option<String>,
    pub status: Option<String>,
    pub thread_context: Option<ThreadContext>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Entity<ThreadFields> {
    /// The backend object with deleted entries removed from `comments`
    pub fn raw_without_deleted(&self) -> Value {
        let mut raw = self.raw.clone();
        if let Some(Value::Array(comments)) = raw.get_mut("comments") {
            comments.retain(|c| c.get("isDeleted") != Some(&Value::Bool(true)));
        }
        raw
    }
}
