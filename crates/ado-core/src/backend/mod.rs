//! Backend seams
//!
//! The core never talks to the network directly. It consumes:
//!
//! - [`GitBackend`] for repository, ref, pull request, thread, and commit data
//! - [`IdentityService`] for user id lookups
//! - [`ConnectionProvider`], asked for a fresh [`Connection`] on every tool call
//!
//! [`HttpBackend`] implements the first two against the Azure DevOps REST API.

mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::auth::TokenProvider;
use crate::config::AdoConfig;
use crate::criteria::{
    CommitQuery, NewThread, PullRequestQuery, PullRequestScope, PullRequestSearchCriteria,
    RefQuery, ThreadQuery,
};
use crate::models::{Comment, CommentThread, GitPullRequest, GitRef, GitRepository};
use crate::pager::Page;

pub use http::HttpBackend;

/// Read access to Git data, plus comment creation
#[async_trait]
pub trait GitBackend: Send + Sync {
    async fn list_repositories(&self, project: &str) -> Result<Vec<GitRepository>>;

    async fn list_refs(&self, repository_id: &str, query: &RefQuery) -> Result<Vec<GitRef>>;

    /// Best-effort server-side `page`; callers still slice the result
    async fn list_pull_requests(
        &self,
        scope: &PullRequestScope,
        criteria: &PullRequestSearchCriteria,
        page: Page,
    ) -> Result<Vec<GitPullRequest>>;

    /// `None` when the pull request does not exist
    async fn get_pull_request(
        &self,
        repository_id: &str,
        pull_request_id: i64,
        include_work_item_refs: bool,
    ) -> Result<Option<GitPullRequest>>;

    async fn list_threads(
        &self,
        project: Option<&str>,
        repository_id: &str,
        pull_request_id: i64,
        query: ThreadQuery,
    ) -> Result<Vec<CommentThread>>;

    async fn list_comments(
        &self,
        project: Option<&str>,
        repository_id: &str,
        pull_request_id: i64,
        thread_id: i64,
    ) -> Result<Vec<Comment>>;

    async fn search_commits(
        &self,
        project: &str,
        repository: &str,
        query: &CommitQuery,
    ) -> Result<Vec<Value>>;

    async fn query_pull_requests_by_commits(
        &self,
        project: &str,
        repository: &str,
        query: &PullRequestQuery,
    ) -> Result<Value>;

    async fn create_thread(
        &self,
        project: Option<&str>,
        repository_id: &str,
        pull_request_id: i64,
        thread: &NewThread,
    ) -> Result<CommentThread>;

    async fn create_comment(
        &self,
        project: Option<&str>,
        repository_id: &str,
        pull_request_id: i64,
        thread_id: i64,
        content: &str,
    ) -> Result<Comment>;
}

/// User id lookups
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Id of the authenticated caller
    async fn current_user_id(&self) -> Result<String>;

    /// Id for an email or account handle; `None` when nothing matches
    async fn find_user_id(&self, identifier: &str) -> Result<Option<String>>;
}

/// Backend handles for a single tool invocation
#[derive(Clone)]
pub struct Connection {
    pub git: Arc<dyn GitBackend>,
    pub identity: Arc<dyn IdentityService>,
}

/// Supplies a [`Connection`] on demand
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn connect(&self) -> Result<Connection>;
}

/// Opens an [`HttpBackend`] with a freshly acquired credential per call
pub struct HttpConnectionProvider {
    config: AdoConfig,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpConnectionProvider {
    pub fn new(config: AdoConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        Self { config, tokens }
    }
}

#[async_trait]
impl ConnectionProvider for HttpConnectionProvider {
    async fn connect(&self) -> Result<Connection> {
        let credential = self.tokens.credential().await?;
        let backend = Arc::new(HttpBackend::new(self.config.clone(), credential)?);
        Ok(Connection {
            git: backend.clone(),
            identity: backend,
        })
    }
}
