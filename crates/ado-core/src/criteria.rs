//! Backend search criteria
//!
//! One criteria struct per operation kind, each built by a pure function from
//! already-validated input. Optional members stay `None` instead of being
//! added conditionally. Enum tokens are parsed here, so a bad token fails
//! before a connection is opened.

use crate::enums::{PullRequestQueryType, PullRequestStatus, ThreadStatus, VersionType};
use crate::identity::IdentitySelector;
use crate::models::{CommentPosition, ThreadContext};
use crate::{Error, Result};

/// Ref filter that limits a ref listing to branches
pub const HEADS_FILTER: &str = "heads/";

/// Where a pull request listing is scoped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestScope {
    Repository(String),
    Project(String),
}

/// Identity filters as requested, before resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityFilters {
    pub created_by_user: Option<String>,
    pub created_by_me: bool,
    pub i_am_reviewer: bool,
}

impl IdentityFilters {
    /// Creator selector; an explicit user wins over `created_by_me`
    pub fn creator(&self) -> Result<Option<IdentitySelector>> {
        match (&self.created_by_user, self.created_by_me) {
            (Some(user), _) => IdentitySelector::explicit(user.clone()).map(Some),
            (None, true) => Ok(Some(IdentitySelector::Caller)),
            (None, false) => Ok(None),
        }
    }

    /// Reviewer selector
    pub fn reviewer(&self) -> Option<IdentitySelector> {
        self.i_am_reviewer.then_some(IdentitySelector::Caller)
    }
}

/// Pull request search criteria
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSearchCriteria {
    pub status: PullRequestStatus,
    pub creator_id: Option<String>,
    pub reviewer_id: Option<String>,
}

pub fn pull_request_criteria(
    status: PullRequestStatus,
    creator_id: Option<String>,
    reviewer_id: Option<String>,
) -> PullRequestSearchCriteria {
    PullRequestSearchCriteria {
        status,
        creator_id,
        reviewer_id,
    }
}

/// Ref listing query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefQuery {
    pub filter: &'static str,
    pub filter_contains: Option<String>,
    pub include_my_branches: bool,
}

pub fn branch_query(filter_contains: Option<String>, mine: bool) -> RefQuery {
    RefQuery {
        filter: HEADS_FILTER,
        filter_contains: non_empty(filter_contains),
        include_my_branches: mine,
    }
}

/// In-memory repository filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryFilter {
    pub name_contains: Option<String>,
}

impl RepositoryFilter {
    pub fn new(name_contains: Option<String>) -> Self {
        Self {
            name_contains: non_empty(name_contains).map(|s| s.to_lowercase()),
        }
    }

    /// Case-insensitive substring match on the repository name
    pub fn matches(&self, name: Option<&str>) -> bool {
        match &self.name_contains {
            None => true,
            Some(needle) => name.is_some_and(|n| n.to_lowercase().contains(needle.as_str())),
        }
    }
}

/// Iteration range for a thread listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreadQuery {
    pub iteration: Option<u32>,
    pub base_iteration: Option<u32>,
}

/// Version a commit search is anchored to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDescriptor {
    pub version: String,
    pub version_type: VersionType,
}

/// Commit search criteria
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitQuery {
    pub from_commit_id: Option<String>,
    pub to_commit_id: Option<String>,
    pub item_version: Option<VersionDescriptor>,
    pub include_links: bool,
    pub include_work_items: bool,
    pub skip: usize,
    pub top: usize,
}

/// Raw commit search input
#[derive(Debug, Clone, Default)]
pub struct CommitSearch<'a> {
    pub from_commit: Option<&'a str>,
    pub to_commit: Option<&'a str>,
    pub version: Option<&'a str>,
    pub version_type: &'a str,
    pub include_links: bool,
    pub include_work_items: bool,
    pub skip: usize,
    pub top: usize,
}

pub fn commit_query(search: &CommitSearch<'_>) -> Result<CommitQuery> {
    let version_type = VersionType::parse("versionType", search.version_type)?;
    let item_version = search
        .version
        .filter(|v| !v.is_empty())
        .map(|version| VersionDescriptor {
            version: version.to_string(),
            version_type,
        });

    Ok(CommitQuery {
        from_commit_id: search.from_commit.filter(|c| !c.is_empty()).map(str::to_string),
        to_commit_id: search.to_commit.filter(|c| !c.is_empty()).map(str::to_string),
        item_version,
        include_links: search.include_links,
        include_work_items: search.include_work_items,
        skip: search.skip,
        top: search.top,
    })
}

/// Commit to pull request query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestQuery {
    pub items: Vec<String>,
    pub query_type: PullRequestQueryType,
}

pub fn pull_request_query(commits: Vec<String>, query_type: &str) -> Result<PullRequestQuery> {
    let query_type = PullRequestQueryType::parse("queryType", query_type)?;
    let items: Vec<String> = commits.into_iter().filter(|c| !c.is_empty()).collect();
    if items.is_empty() {
        return Err(Error::invalid_parameters("commits must contain at least one commit id"));
    }
    Ok(PullRequestQuery { items, query_type })
}

/// New thread to open on a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewThread {
    pub content: String,
    pub status: ThreadStatus,
    pub thread_context: Option<ThreadContext>,
}

/// Where a new comment goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentTarget {
    Reply { thread_id: i64, content: String },
    Thread(NewThread),
}

/// Raw comment input
#[derive(Debug, Clone, Default)]
pub struct CommentRequest<'a> {
    pub content: &'a str,
    pub thread_id: Option<i64>,
    pub status: &'a str,
    pub file_path: Option<&'a str>,
    pub line_start: Option<u32>,
    pub line_end: Option<u32>,
}

pub fn comment_target(request: &CommentRequest<'_>) -> Result<CommentTarget> {
    if request.content.trim().is_empty() {
        return Err(Error::invalid_parameters("content must not be empty"));
    }
    let status = ThreadStatus::parse("status", request.status)?;

    if let Some(thread_id) = request.thread_id {
        return Ok(CommentTarget::Reply {
            thread_id,
            content: request.content.to_string(),
        });
    }

    let thread_context = match (request.file_path.filter(|p| !p.is_empty()), request.line_start) {
        (Some(path), Some(start)) => Some(file_context(path, start, request.line_end)?),
        _ => None,
    };

    Ok(CommentTarget::Thread(NewThread {
        content: request.content.to_string(),
        status,
        thread_context,
    }))
}

/// Context spanning `start..=end` on both diff sides; `end` defaults to `start`
fn file_context(path: &str, start: u32, end: Option<u32>) -> Result<ThreadContext> {
    let end = end.unwrap_or(start);
    if end < start {
        return Err(Error::invalid_parameters(format!(
            "lineEnd ({end}) must not be before lineStart ({start})"
        )));
    }
    Ok(ThreadContext {
        file_path: Some(path.to_string()),
        left_file_start: Some(CommentPosition::line_start(start)),
        left_file_end: Some(CommentPosition::line_start(end)),
        right_file_start: Some(CommentPosition::line_start(start)),
        right_file_end: Some(CommentPosition::line_start(end)),
        ..Default::default()
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
