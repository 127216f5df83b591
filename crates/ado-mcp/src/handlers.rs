//! MCP Tool Handlers
//!
//! Every handler follows the same pipeline:
//!
//! 1. deserialize arguments into a typed struct (defaults applied here)
//! 2. build criteria, parsing enum tokens; nothing touches the network yet
//! 3. open a connection and resolve identities when a filter needs them
//! 4. fetch, page, project
//!
//! A failure in steps 1-2 never opens a connection.

use std::sync::Arc;

use ado_core::criteria::{
    self, CommentRequest, CommentTarget, CommitSearch, IdentityFilters, PullRequestScope,
    RepositoryFilter, ThreadQuery,
};
use ado_core::enums::{PullRequestQueryType, PullRequestStatus, ThreadStatus, VersionType};
use ado_core::models::HEADS_PREFIX;
use ado_core::pager::{self, Page};
use ado_core::projector::{self, Projection};
use ado_core::{AdoConfig, ConnectionProvider, DEFAULT_TOP, IdentityResolver};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Error, Result};

/// Default `top` for `search_commits`
pub const DEFAULT_COMMIT_TOP: usize = 10;

/// Future returned by a tool handler
pub type HandlerFuture = BoxFuture<'static, Result<Value>>;

/// A tool handler
pub type Handler = fn(ToolContext, Value) -> HandlerFuture;

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct ToolContext {
    pub config: Arc<AdoConfig>,
    pub connections: Arc<dyn ConnectionProvider>,
}

impl ToolContext {
    pub fn new(config: Arc<AdoConfig>, connections: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            config,
            connections,
        }
    }

    /// Requested project, else the configured default
    fn project(&self, requested: Option<&str>) -> Result<String> {
        Ok(self.config.project(requested)?.to_string())
    }

    /// Requested project, else the configured default, else none
    fn optional_project(&self, requested: Option<String>) -> Option<String> {
        requested
            .filter(|p| !p.is_empty())
            .or_else(|| self.config.default_project.clone())
    }
}

/// Look up the handler registered under a tool name
pub fn handler_for(tool_name: &str) -> Option<Handler> {
    let handler: Handler = match tool_name {
        // Repositories
        "list_repos_by_project" => |ctx, args| handle_list_repos(ctx, args).boxed(),
        "get_repo_by_name_or_id" => |ctx, args| handle_get_repo(ctx, args).boxed(),

        // Pull Requests
        "list_pull_requests_by_repo" => {
            |ctx, args| handle_list_pull_requests_by_repo(ctx, args).boxed()
        }
        "list_pull_requests_by_project" => {
            |ctx, args| handle_list_pull_requests_by_project(ctx, args).boxed()
        }
        "get_pull_request_by_id" => |ctx, args| handle_get_pull_request(ctx, args).boxed(),
        "list_pull_requests_by_commits" => {
            |ctx, args| handle_list_pull_requests_by_commits(ctx, args).boxed()
        }

        // Branches
        "list_branches_by_repo" => |ctx, args| handle_list_branches(ctx, args, false).boxed(),
        "list_my_branches_by_repo" => |ctx, args| handle_list_branches(ctx, args, true).boxed(),
        "get_branch_by_name" => |ctx, args| handle_get_branch(ctx, args).boxed(),

        // Review Threads
        "list_pull_request_threads" => |ctx, args| handle_list_threads(ctx, args).boxed(),
        "list_pull_request_thread_comments" => {
            |ctx, args| handle_list_comments(ctx, args).boxed()
        }
        "create_pull_request_comment" => |ctx, args| handle_create_comment(ctx, args).boxed(),

        // Commits
        "search_commits" => |ctx, args| handle_search_commits(ctx, args).boxed(),

        _ => return None,
    };
    Some(handler)
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| Error::invalid_parameters(e.to_string()))
}

fn default_top() -> usize {
    DEFAULT_TOP
}

fn default_commit_top() -> usize {
    DEFAULT_COMMIT_TOP
}

fn default_status() -> String {
    PullRequestStatus::default().as_input().to_string()
}

fn default_version_type() -> String {
    VersionType::default().as_input().to_string()
}

fn default_query_type() -> String {
    PullRequestQueryType::default().as_input().to_string()
}

fn default_thread_status() -> String {
    ThreadStatus::default().as_input().to_string()
}

// ============================================================================
// Repositories
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListReposArgs {
    project: Option<String>,
    #[serde(default = "default_top")]
    top: usize,
    #[serde(default)]
    skip: usize,
    repo_name: Option<String>,
}

async fn handle_list_repos(ctx: ToolContext, arguments: Value) -> Result<Value> {
    let args: ListReposArgs = parse_args(arguments)?;
    let project = ctx.project(args.project.as_deref())?;
    let filter = RepositoryFilter::new(args.repo_name);

    let conn = ctx.connections.connect().await?;
    let repos: Vec<_> = conn
        .git
        .list_repositories(&project)
        .await?
        .into_iter()
        .filter(|r| filter.matches(r.name.as_deref()))
        .collect();

    let page = pager::paginate(repos, Page::new(args.skip, args.top));
    let summaries: Vec<_> = page.iter().map(projector::repository).collect();
    Ok(serde_json::to_value(summaries)?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetRepoArgs {
    project: Option<String>,
    repository_name_or_id: String,
}

async fn handle_get_repo(ctx: ToolContext, arguments: Value) -> Result<Value> {
    let args: GetRepoArgs = parse_args(arguments)?;
    let project = ctx.project(args.project.as_deref())?;
    let wanted = args.repository_name_or_id.as_str();

    let conn = ctx.connections.connect().await?;
    let repo = conn
        .git
        .list_repositories(&project)
        .await?
        .into_iter()
        .find(|r| r.name.as_deref() == Some(wanted) || r.id.as_deref() == Some(wanted))
        .ok_or_else(|| ado_core::Error::not_found("repository", wanted))?;

    Ok(serde_json::to_value(repo)?)
}

// ============================================================================
// Pull Requests
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestFilterArgs {
    #[serde(default = "default_top")]
    top: usize,
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_status")]
    status: String,
    #[serde(default, rename = "created_by_me")]
    created_by_me: bool,
    #[serde(rename = "created_by_user")]
    created_by_user: Option<String>,
    #[serde(default, rename = "i_am_reviewer")]
    i_am_reviewer: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepoPullRequestArgs {
    repository_id: String,
    #[serde(flatten)]
    filters: PullRequestFilterArgs,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectPullRequestArgs {
    project: Option<String>,
    #[serde(flatten)]
    filters: PullRequestFilterArgs,
}

async fn handle_list_pull_requests_by_repo(ctx: ToolContext, arguments: Value) -> Result<Value> {
    let args: RepoPullRequestArgs = parse_args(arguments)?;
    let scope = PullRequestScope::Repository(args.repository_id);
    list_pull_requests(ctx, scope, args.filters).await
}

async fn handle_list_pull_requests_by_project(
    ctx: ToolContext,
    arguments: Value,
) -> Result<Value> {
    let args: ProjectPullRequestArgs = parse_args(arguments)?;
    let scope = PullRequestScope::Project(ctx.project(args.project.as_deref())?);
    list_pull_requests(ctx, scope, args.filters).await
}

async fn list_pull_requests(
    ctx: ToolContext,
    scope: PullRequestScope,
    args: PullRequestFilterArgs,
) -> Result<Value> {
    let status = PullRequestStatus::parse("status", &args.status)?;
    let identities = IdentityFilters {
        created_by_user: args.created_by_user,
        created_by_me: args.created_by_me,
        i_am_reviewer: args.i_am_reviewer,
    };
    let creator = identities.creator()?;
    let reviewer = identities.reviewer();

    let conn = ctx.connections.connect().await?;
    let resolver = IdentityResolver::new(conn.identity.as_ref());
    let creator_id = resolver.resolve_opt(creator.as_ref()).await?;
    let reviewer_id = resolver.resolve_opt(reviewer.as_ref()).await?;
    let search = criteria::pull_request_criteria(status, creator_id, reviewer_id);

    // The backend applies skip; only cap the length here
    let prs = conn
        .git
        .list_pull_requests(&scope, &search, Page::new(args.skip, args.top))
        .await?;
    let prs = Page::first(args.top).slice(prs);

    let with_repository = matches!(scope, PullRequestScope::Project(_));
    let summaries: Vec<_> = prs
        .iter()
        .map(|pr| projector::pull_request(pr, with_repository))
        .collect();
    Ok(serde_json::to_value(summaries)?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetPullRequestArgs {
    repository_id: String,
    pull_request_id: i64,
    #[serde(default)]
    include_work_item_refs: bool,
}

async fn handle_get_pull_request(ctx: ToolContext, arguments: Value) -> Result<Value> {
    let args: GetPullRequestArgs = parse_args(arguments)?;

    let conn = ctx.connections.connect().await?;
    let pr = conn
        .git
        .get_pull_request(
            &args.repository_id,
            args.pull_request_id,
            args.include_work_item_refs,
        )
        .await?
        .ok_or_else(|| {
            ado_core::Error::not_found("pull request", args.pull_request_id.to_string())
        })?;

    Ok(serde_json::to_value(pr)?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestsByCommitsArgs {
    project: Option<String>,
    repository: String,
    commits: Vec<String>,
    #[serde(default = "default_query_type")]
    query_type: String,
}

async fn handle_list_pull_requests_by_commits(
    ctx: ToolContext,
    arguments: Value,
) -> Result<Value> {
    let args: PullRequestsByCommitsArgs = parse_args(arguments)?;
    let query = criteria::pull_request_query(args.commits, &args.query_type)?;
    let project = ctx.project(args.project.as_deref())?;

    let conn = ctx.connections.connect().await?;
    let result = conn
        .git
        .query_pull_requests_by_commits(&project, &args.repository, &query)
        .await?;
    Ok(result)
}

// ============================================================================
// Branches
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListBranchesArgs {
    repository_id: String,
    #[serde(default = "default_top")]
    top: usize,
    filter_contains: Option<String>,
}

async fn handle_list_branches(ctx: ToolContext, arguments: Value, mine: bool) -> Result<Value> {
    let args: ListBranchesArgs = parse_args(arguments)?;
    let query = criteria::branch_query(args.filter_contains, mine);

    let conn = ctx.connections.connect().await?;
    let refs = conn.git.list_refs(&args.repository_id, &query).await?;

    let branches = pager::paginate(projector::branch_refs(refs), Page::first(args.top));
    Ok(serde_json::to_value(projector::branch_names(&branches))?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetBranchArgs {
    repository_id: String,
    branch_name: String,
}

async fn handle_get_branch(ctx: ToolContext, arguments: Value) -> Result<Value> {
    let args: GetBranchArgs = parse_args(arguments)?;
    let wanted = args
        .branch_name
        .strip_prefix(HEADS_PREFIX)
        .unwrap_or(&args.branch_name)
        .to_string();
    let query = criteria::branch_query(Some(wanted.clone()), false);

    let conn = ctx.connections.connect().await?;
    let branch = conn
        .git
        .list_refs(&args.repository_id, &query)
        .await?
        .into_iter()
        .find(|r| r.branch_name() == Some(wanted.as_str()))
        .ok_or_else(|| ado_core::Error::not_found("branch", wanted.as_str()))?;

    Ok(serde_json::to_value(branch)?)
}

// ============================================================================
// Review Threads
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListThreadsArgs {
    repository_id: String,
    pull_request_id: i64,
    project: Option<String>,
    iteration: Option<u32>,
    base_iteration: Option<u32>,
    #[serde(default = "default_top")]
    top: usize,
    #[serde(default)]
    skip: usize,
    #[serde(default)]
    full_response: bool,
}

async fn handle_list_threads(ctx: ToolContext, arguments: Value) -> Result<Value> {
    let args: ListThreadsArgs = parse_args(arguments)?;
    let project = ctx.optional_project(args.project);
    let query = ThreadQuery {
        iteration: args.iteration,
        base_iteration: args.base_iteration,
    };

    let conn = ctx.connections.connect().await?;
    let threads = conn
        .git
        .list_threads(
            project.as_deref(),
            &args.repository_id,
            args.pull_request_id,
            query,
        )
        .await?;

    let page = pager::paginate(threads, Page::new(args.skip, args.top));
    Ok(projector::threads(
        &page,
        Projection::from_full_response(args.full_response),
    )?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListCommentsArgs {
    repository_id: String,
    pull_request_id: i64,
    thread_id: i64,
    project: Option<String>,
    #[serde(default = "default_top")]
    top: usize,
    #[serde(default)]
    skip: usize,
    #[serde(default)]
    full_response: bool,
}

async fn handle_list_comments(ctx: ToolContext, arguments: Value) -> Result<Value> {
    let args: ListCommentsArgs = parse_args(arguments)?;
    let project = ctx.optional_project(args.project);

    let conn = ctx.connections.connect().await?;
    let comments = conn
        .git
        .list_comments(
            project.as_deref(),
            &args.repository_id,
            args.pull_request_id,
            args.thread_id,
        )
        .await?;

    // Deleted comments never count toward a page
    let visible = projector::without_deleted(comments);
    let page = pager::paginate(visible, Page::new(args.skip, args.top));
    Ok(projector::comments(
        &page,
        Projection::from_full_response(args.full_response),
    )?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCommentArgs {
    repository_id: String,
    pull_request_id: i64,
    content: String,
    thread_id: Option<i64>,
    #[serde(default = "default_thread_status")]
    status: String,
    file_path: Option<String>,
    line_start: Option<u32>,
    line_end: Option<u32>,
    project: Option<String>,
}

async fn handle_create_comment(ctx: ToolContext, arguments: Value) -> Result<Value> {
    let args: CreateCommentArgs = parse_args(arguments)?;
    let target = criteria::comment_target(&CommentRequest {
        content: &args.content,
        thread_id: args.thread_id,
        status: &args.status,
        file_path: args.file_path.as_deref(),
        line_start: args.line_start,
        line_end: args.line_end,
    })?;
    let project = ctx.optional_project(args.project);

    let conn = ctx.connections.connect().await?;
    match target {
        CommentTarget::Reply { thread_id, content } => {
            let comment = conn
                .git
                .create_comment(
                    project.as_deref(),
                    &args.repository_id,
                    args.pull_request_id,
                    thread_id,
                    &content,
                )
                .await?;
            Ok(serde_json::to_value(projector::comment(&comment))?)
        }
        CommentTarget::Thread(thread) => {
            let created = conn
                .git
                .create_thread(
                    project.as_deref(),
                    &args.repository_id,
                    args.pull_request_id,
                    &thread,
                )
                .await?;
            tracing::info!(
                pull_request_id = args.pull_request_id,
                thread_id = ?created.id,
                "Opened review thread"
            );
            Ok(serde_json::to_value(projector::thread(&created))?)
        }
    }
}

// ============================================================================
// Commits
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchCommitsArgs {
    project: Option<String>,
    repository: String,
    from_commit: Option<String>,
    to_commit: Option<String>,
    version: Option<String>,
    #[serde(default = "default_version_type")]
    version_type: String,
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_commit_top")]
    top: usize,
    #[serde(default)]
    include_links: bool,
    #[serde(default)]
    include_work_items: bool,
}

async fn handle_search_commits(ctx: ToolContext, arguments: Value) -> Result<Value> {
    let args: SearchCommitsArgs = parse_args(arguments)?;
    let query = criteria::commit_query(&CommitSearch {
        from_commit: args.from_commit.as_deref(),
        to_commit: args.to_commit.as_deref(),
        version: args.version.as_deref(),
        version_type: &args.version_type,
        include_links: args.include_links,
        include_work_items: args.include_work_items,
        skip: args.skip,
        top: args.top,
    })?;
    let project = ctx.project(args.project.as_deref())?;

    let conn = ctx.connections.connect().await?;
    let commits = conn
        .git
        .search_commits(&project, &args.repository, &query)
        .await?;
    Ok(Value::Array(Page::first(args.top).slice(commits)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_defined_tool_has_a_handler() {
        for tool in crate::tools::get_tool_definitions() {
            assert!(handler_for(&tool.name).is_some(), "{}", tool.name);
        }
        assert!(handler_for("repo_init").is_none());
    }

    #[test]
    fn test_pull_request_filters_use_snake_case_identity_flags() {
        let args: ProjectPullRequestArgs = parse_args(json!({
            "project": "P",
            "created_by_me": true,
            "created_by_user": "a@x.com",
            "i_am_reviewer": true
        }))
        .unwrap();
        assert!(args.filters.created_by_me);
        assert!(args.filters.i_am_reviewer);
        assert_eq!(args.filters.created_by_user.as_deref(), Some("a@x.com"));
        assert_eq!(args.filters.status, "Active");
        assert_eq!(args.filters.top, 100);
        assert_eq!(args.filters.skip, 0);
    }

    #[test]
    fn test_search_commit_defaults() {
        let args: SearchCommitsArgs = parse_args(json!({"repository": "web"})).unwrap();
        assert_eq!(args.top, DEFAULT_COMMIT_TOP);
        assert_eq!(args.version_type, "Branch");
    }

    #[test]
    fn test_wrong_argument_type_is_invalid_parameters() {
        let err = parse_args::<GetPullRequestArgs>(json!({
            "repositoryId": "r",
            "pullRequestId": "seven"
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Core(ado_core::Error::InvalidParameters { .. })
        ));
    }
}
