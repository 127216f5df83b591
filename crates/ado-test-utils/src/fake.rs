//! In-memory backend for handler and dispatcher tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ado_core::backend::{Connection, ConnectionProvider, GitBackend, IdentityService};
use ado_core::criteria::{
    CommitQuery, NewThread, PullRequestQuery, PullRequestScope, PullRequestSearchCriteria,
    RefQuery, ThreadQuery,
};
use ado_core::models::{Comment, CommentThread, GitPullRequest, GitRef, GitRepository};
use ado_core::{Error, Page, Result};
use async_trait::async_trait;
use serde_json::{Value, json};

/// A recorded backend, identity, or connection call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect,
    CurrentUser,
    FindUser(String),
    ListRepositories(String),
    ListRefs(String, RefQuery),
    ListPullRequests(PullRequestScope, PullRequestSearchCriteria, Page),
    GetPullRequest(String, i64, bool),
    ListThreads(Option<String>, String, i64, ThreadQuery),
    ListComments(String, i64, i64),
    SearchCommits(String, String, CommitQuery),
    QueryPullRequests(String, String, PullRequestQuery),
    CreateThread(String, i64, NewThread),
    CreateComment(String, i64, i64, String),
}

/// Canned backend data plus a call log
///
/// ```rust,no_run
/// use ado_test_utils::FakeBackend;
///
/// let backend = FakeBackend::new()
///     .with_branches("R", &["main", "dev"])
///     .with_user("a@x.com", "a-id")
///     .shared();
/// ```
#[derive(Default)]
pub struct FakeBackend {
    current_user: String,
    users: HashMap<String, String>,
    repositories: HashMap<String, Vec<GitRepository>>,
    refs: HashMap<String, Vec<GitRef>>,
    my_refs: HashMap<String, Vec<GitRef>>,
    pull_requests: Vec<GitPullRequest>,
    threads: HashMap<i64, Vec<CommentThread>>,
    comments: HashMap<i64, Vec<Comment>>,
    commits: Vec<Value>,
    unavailable: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            current_user: "me-id".to_string(),
            ..Default::default()
        }
    }

    pub fn with_current_user(mut self, id: &str) -> Self {
        self.current_user = id.to_string();
        self
    }

    /// Register an identifier the identity service can resolve
    pub fn with_user(mut self, identifier: &str, id: &str) -> Self {
        self.users.insert(identifier.to_string(), id.to_string());
        self
    }

    pub fn with_repositories(mut self, project: &str, repositories: Vec<GitRepository>) -> Self {
        self.repositories.insert(project.to_string(), repositories);
        self
    }

    pub fn with_refs(mut self, repository_id: &str, refs: Vec<GitRef>) -> Self {
        self.refs.insert(repository_id.to_string(), refs);
        self
    }

    /// Branches under `refs/heads/`, in the given order
    pub fn with_branches(self, repository_id: &str, names: &[&str]) -> Self {
        let refs = names.iter().map(|n| crate::fixtures::branch(n)).collect();
        self.with_refs(repository_id, refs)
    }

    /// Refs returned when `includeMyBranches` is set
    pub fn with_my_refs(mut self, repository_id: &str, refs: Vec<GitRef>) -> Self {
        self.my_refs.insert(repository_id.to_string(), refs);
        self
    }

    pub fn with_pull_requests(mut self, pull_requests: Vec<GitPullRequest>) -> Self {
        self.pull_requests = pull_requests;
        self
    }

    pub fn with_threads(mut self, pull_request_id: i64, threads: Vec<CommentThread>) -> Self {
        self.threads.insert(pull_request_id, threads);
        self
    }

    pub fn with_comments(mut self, thread_id: i64, comments: Vec<Comment>) -> Self {
        self.comments.insert(thread_id, comments);
        self
    }

    pub fn with_commits(mut self, commits: Vec<Value>) -> Self {
        self.commits = commits;
        self
    }

    /// Fail every git call with `BackendUnavailable`
    pub fn unavailable(mut self, message: &str) -> Self {
        self.unavailable = Some(message.to_string());
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Connection provider handing out this backend
    pub fn provider(self: &Arc<Self>) -> Arc<dyn ConnectionProvider> {
        Arc::new(FakeConnector {
            backend: Arc::clone(self),
        })
    }

    /// Every call recorded so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than [`Call::Connect`]
    pub fn backend_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| *c != Call::Connect)
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_available(&self) -> Result<()> {
        match &self.unavailable {
            Some(message) => Err(Error::backend(message.clone())),
            None => Ok(()),
        }
    }
}

fn last_merge_commit(pr: &GitPullRequest) -> Option<&str> {
    pr.raw().get("lastMergeCommit")?.get("commitId")?.as_str()
}

struct FakeConnector {
    backend: Arc<FakeBackend>,
}

#[async_trait]
impl ConnectionProvider for FakeConnector {
    async fn connect(&self) -> Result<Connection> {
        self.backend.record(Call::Connect);
        Ok(Connection {
            git: self.backend.clone(),
            identity: self.backend.clone(),
        })
    }
}

#[async_trait]
impl GitBackend for FakeBackend {
    async fn list_repositories(&self, project: &str) -> Result<Vec<GitRepository>> {
        self.record(Call::ListRepositories(project.to_string()));
        self.check_available()?;
        self.repositories
            .get(project)
            .cloned()
            .ok_or_else(|| Error::not_found("project", project))
    }

    async fn list_refs(&self, repository_id: &str, query: &RefQuery) -> Result<Vec<GitRef>> {
        self.record(Call::ListRefs(repository_id.to_string(), query.clone()));
        self.check_available()?;
        let source = if query.include_my_branches {
            &self.my_refs
        } else {
            &self.refs
        };
        let refs = source
            .get(repository_id)
            .cloned()
            .ok_or_else(|| Error::not_found("repository", repository_id))?;
        Ok(refs
            .into_iter()
            .filter(|r| match &query.filter_contains {
                Some(needle) => r.name.contains(needle.as_str()),
                None => true,
            })
            .collect())
    }

    async fn list_pull_requests(
        &self,
        scope: &PullRequestScope,
        criteria: &PullRequestSearchCriteria,
        page: Page,
    ) -> Result<Vec<GitPullRequest>> {
        self.record(Call::ListPullRequests(scope.clone(), criteria.clone(), page));
        self.check_available()?;
        Ok(page.slice(self.pull_requests.clone()))
    }

    async fn get_pull_request(
        &self,
        repository_id: &str,
        pull_request_id: i64,
        include_work_item_refs: bool,
    ) -> Result<Option<GitPullRequest>> {
        self.record(Call::GetPullRequest(
            repository_id.to_string(),
            pull_request_id,
            include_work_item_refs,
        ));
        self.check_available()?;
        Ok(self
            .pull_requests
            .iter()
            .find(|pr| pr.pull_request_id == Some(pull_request_id))
            .cloned())
    }

    async fn list_threads(
        &self,
        project: Option<&str>,
        repository_id: &str,
        pull_request_id: i64,
        query: ThreadQuery,
    ) -> Result<Vec<CommentThread>> {
        self.record(Call::ListThreads(
            project.map(str::to_string),
            repository_id.to_string(),
            pull_request_id,
            query,
        ));
        self.check_available()?;
        Ok(self.threads.get(&pull_request_id).cloned().unwrap_or_default())
    }

    async fn list_comments(
        &self,
        _project: Option<&str>,
        repository_id: &str,
        pull_request_id: i64,
        thread_id: i64,
    ) -> Result<Vec<Comment>> {
        self.record(Call::ListComments(
            repository_id.to_string(),
            pull_request_id,
            thread_id,
        ));
        self.check_available()?;
        self.comments
            .get(&thread_id)
            .cloned()
            .ok_or_else(|| Error::not_found("thread", thread_id.to_string()))
    }

    async fn search_commits(
        &self,
        project: &str,
        repository: &str,
        query: &CommitQuery,
    ) -> Result<Vec<Value>> {
        self.record(Call::SearchCommits(
            project.to_string(),
            repository.to_string(),
            query.clone(),
        ));
        self.check_available()?;
        Ok(Page::new(query.skip, query.top).slice(self.commits.clone()))
    }

    async fn query_pull_requests_by_commits(
        &self,
        project: &str,
        repository: &str,
        query: &PullRequestQuery,
    ) -> Result<Value> {
        self.record(Call::QueryPullRequests(
            project.to_string(),
            repository.to_string(),
            query.clone(),
        ));
        self.check_available()?;
        let results: Vec<Value> = query
            .items
            .iter()
            .map(|commit| {
                let matches: Vec<&GitPullRequest> = self
                    .pull_requests
                    .iter()
                    .filter(|pr| last_merge_commit(pr) == Some(commit.as_str()))
                    .collect();
                json!({ commit.as_str(): matches })
            })
            .collect();
        Ok(json!({ "results": results }))
    }

    async fn create_thread(
        &self,
        _project: Option<&str>,
        repository_id: &str,
        pull_request_id: i64,
        thread: &NewThread,
    ) -> Result<CommentThread> {
        self.record(Call::CreateThread(
            repository_id.to_string(),
            pull_request_id,
            thread.clone(),
        ));
        self.check_available()?;
        let mut created = json!({
            "id": 1000,
            "status": thread.status.as_input(),
            "comments": [{"id": 1, "content": thread.content}]
        });
        if let Some(context) = &thread.thread_context {
            created["threadContext"] = serde_json::to_value(context)?;
        }
        Ok(CommentThread::from_raw(created)?)
    }

    async fn create_comment(
        &self,
        _project: Option<&str>,
        repository_id: &str,
        pull_request_id: i64,
        thread_id: i64,
        content: &str,
    ) -> Result<Comment> {
        self.record(Call::CreateComment(
            repository_id.to_string(),
            pull_request_id,
            thread_id,
            content.to_string(),
        ));
        self.check_available()?;
        Ok(Comment::from_raw(json!({"id": 2, "content": content}))?)
    }
}

#[async_trait]
impl IdentityService for FakeBackend {
    async fn current_user_id(&self) -> Result<String> {
        self.record(Call::CurrentUser);
        self.check_available()?;
        Ok(self.current_user.clone())
    }

    async fn find_user_id(&self, identifier: &str) -> Result<Option<String>> {
        self.record(Call::FindUser(identifier.to_string()));
        self.check_available()?;
        Ok(self.users.get(identifier).cloned())
    }
}
