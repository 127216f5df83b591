//! End-to-end tool tests against the in-memory backend
//!
//! Each test drives a tool through the registry (schema validation, criteria,
//! identity resolution, fetch, paging, projection) and inspects both the
//! payload and the recorded backend calls.

use std::sync::Arc;

use ado_core::criteria::{CommentTarget, PullRequestScope};
use ado_core::enums::{PullRequestQueryType, PullRequestStatus, ThreadStatus};
use ado_core::models::{CommentPosition, ThreadContext};
use ado_core::{AdoConfig, Page};
use ado_mcp::{Error, ToolContext, ToolRegistry, ToolResult};
use ado_test_utils::{Call, FakeBackend, fixtures};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

struct Harness {
    backend: Arc<FakeBackend>,
    registry: ToolRegistry,
    ctx: ToolContext,
}

impl Harness {
    fn new(backend: FakeBackend) -> Self {
        let mut config = AdoConfig::for_organization("contoso");
        config.default_project = Some("Platform".to_string());
        Self::with_config(backend, config)
    }

    fn with_config(backend: FakeBackend, config: AdoConfig) -> Self {
        let backend = backend.shared();
        let ctx = ToolContext::new(Arc::new(config), backend.provider());
        Self {
            backend,
            registry: ToolRegistry::new().unwrap(),
            ctx,
        }
    }

    async fn call(&self, tool: &str, arguments: Value) -> ado_mcp::Result<Value> {
        self.registry.call(&self.ctx, tool, arguments).await
    }

    async fn dispatch(&self, tool: &str, arguments: Value) -> ToolResult {
        self.registry.dispatch(&self.ctx, tool, arguments).await
    }
}

fn core_error(result: ado_mcp::Result<Value>) -> ado_core::Error {
    match result {
        Err(Error::Core(err)) => err,
        other => panic!("expected a core error, got {other:?}"),
    }
}

// ==========================================================================
// Branches
// ==========================================================================

#[tokio::test]
async fn test_branches_sorted_descending_and_sliced() {
    let harness = Harness::new(FakeBackend::new().with_branches("R", &["main", "dev", "beta"]));

    let branches = harness
        .call("list_branches_by_repo", json!({"repositoryId": "R", "top": 2}))
        .await
        .unwrap();

    assert_eq!(branches, json!(["main", "dev"]));
}

#[tokio::test]
async fn test_branch_listing_drops_non_branch_refs() {
    let harness = Harness::new(FakeBackend::new().with_refs(
        "R",
        vec![
            fixtures::git_ref("refs/tags/v1.0"),
            fixtures::branch("feature/login"),
            fixtures::git_ref("refs/pull/12/merge"),
            fixtures::branch("alpha"),
        ],
    ));

    let branches = harness
        .call("list_branches_by_repo", json!({"repositoryId": "R"}))
        .await
        .unwrap();

    assert_eq!(branches, json!(["feature/login", "alpha"]));
}

#[tokio::test]
async fn test_my_branches_ask_backend_for_caller_branches() {
    let harness = Harness::new(
        FakeBackend::new().with_my_refs("R", vec![fixtures::branch("users/me/fix")]),
    );

    let branches = harness
        .call(
            "list_my_branches_by_repo",
            json!({"repositoryId": "R", "filterContains": "fix"}),
        )
        .await
        .unwrap();

    assert_eq!(branches, json!(["users/me/fix"]));
    let Call::ListRefs(repo, query) = &harness.backend.backend_calls()[0] else {
        panic!("expected a ref listing");
    };
    assert_eq!(repo, "R");
    assert!(query.include_my_branches);
    assert_eq!(query.filter, "heads/");
    assert_eq!(query.filter_contains.as_deref(), Some("fix"));
}

#[rstest]
#[case("dev")]
#[case("refs/heads/dev")]
#[tokio::test]
async fn test_get_branch_accepts_short_or_full_name(#[case] name: &str) {
    let harness = Harness::new(FakeBackend::new().with_branches("R", &["main", "dev"]));

    let branch = harness
        .call(
            "get_branch_by_name",
            json!({"repositoryId": "R", "branchName": name}),
        )
        .await
        .unwrap();

    assert_eq!(branch["name"], "refs/heads/dev");
    assert!(branch["objectId"].is_string());
}

#[tokio::test]
async fn test_missing_branch_is_entity_not_found() {
    let harness = Harness::new(FakeBackend::new().with_branches("R", &["main"]));

    let err = core_error(
        harness
            .call(
                "get_branch_by_name",
                json!({"repositoryId": "R", "branchName": "gone"}),
            )
            .await,
    );

    assert!(matches!(err, ado_core::Error::EntityNotFound { kind: "branch", .. }));
}

// ==========================================================================
// Repositories
// ==========================================================================

#[tokio::test]
async fn test_repos_filtered_case_insensitively_sorted_and_paged() {
    let harness = Harness::new(FakeBackend::new().with_repositories(
        "Platform",
        vec![
            fixtures::repository("3", "web-admin"),
            fixtures::repository("1", "api"),
            fixtures::repository("2", "Web"),
            fixtures::repository("4", "web"),
        ],
    ));

    let repos = harness
        .call(
            "list_repos_by_project",
            json!({"repoName": "WEB", "skip": 1, "top": 2}),
        )
        .await
        .unwrap();

    let names: Vec<&str> = repos
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["web", "web-admin"]);

    // Minimal schema only
    let first = repos[0].as_object().unwrap();
    assert!(first.contains_key("webUrl"));
    assert!(!first.contains_key("remoteUrl"));
    assert_eq!(
        harness.backend.backend_calls(),
        vec![Call::ListRepositories("Platform".to_string())]
    );
}

#[tokio::test]
async fn test_repos_skip_past_end_is_empty() {
    let harness = Harness::new(
        FakeBackend::new().with_repositories("Platform", vec![fixtures::repository("1", "api")]),
    );

    let repos = harness
        .call("list_repos_by_project", json!({"skip": 5}))
        .await
        .unwrap();

    assert_eq!(repos, json!([]));
}

#[rstest]
#[case("api")]
#[case("1")]
#[tokio::test]
async fn test_get_repo_by_name_or_id(#[case] wanted: &str) {
    let harness = Harness::new(FakeBackend::new().with_repositories(
        "Platform",
        vec![fixtures::repository("1", "api"), fixtures::repository("2", "web")],
    ));

    let repo = harness
        .call(
            "get_repo_by_name_or_id",
            json!({"project": "Platform", "repositoryNameOrId": wanted}),
        )
        .await
        .unwrap();

    assert_eq!(repo["id"], "1");
    // Full backend object
    assert!(repo["remoteUrl"].is_string());
}

#[tokio::test]
async fn test_project_required_without_default() {
    let harness = Harness::with_config(
        FakeBackend::new(),
        AdoConfig::for_organization("contoso"),
    );

    let err = core_error(harness.call("list_repos_by_project", json!({})).await);

    assert!(matches!(err, ado_core::Error::InvalidParameters { .. }));
    assert!(harness.backend.calls().is_empty());
}

// ==========================================================================
// Pull Requests
// ==========================================================================

#[tokio::test]
async fn test_unknown_status_fails_before_any_backend_call() {
    let harness = Harness::new(FakeBackend::new());

    let result = harness
        .dispatch(
            "list_pull_requests_by_repo",
            json!({"repositoryId": "R", "status": "Merged"}),
        )
        .await;

    assert!(result.is_error());
    assert_eq!(
        result.text_content(),
        "invalid value 'Merged' for status; expected one of: Abandoned, Active, All, Completed, NotSet"
    );
    assert!(harness.backend.calls().is_empty(), "no connection may be opened");
}

#[tokio::test]
async fn test_explicit_creator_wins_over_created_by_me() {
    let harness = Harness::new(FakeBackend::new().with_user("a@x.com", "a-id"));

    harness
        .call(
            "list_pull_requests_by_repo",
            json!({
                "repositoryId": "R",
                "created_by_user": "a@x.com",
                "created_by_me": true
            }),
        )
        .await
        .unwrap();

    let calls = harness.backend.backend_calls();
    assert!(!calls.contains(&Call::CurrentUser));
    assert_eq!(calls[0], Call::FindUser("a@x.com".to_string()));
    let Call::ListPullRequests(scope, criteria, page) = &calls[1] else {
        panic!("expected a pull request listing, got {calls:?}");
    };
    assert_eq!(scope, &PullRequestScope::Repository("R".to_string()));
    assert_eq!(criteria.creator_id.as_deref(), Some("a-id"));
    assert_eq!(criteria.reviewer_id, None);
    assert_eq!(criteria.status, PullRequestStatus::Active);
    assert_eq!(*page, Page::new(0, 100));
}

#[tokio::test]
async fn test_creator_and_reviewer_both_resolve_to_caller() {
    let harness = Harness::new(FakeBackend::new().with_current_user("me-7"));

    harness
        .call(
            "list_pull_requests_by_project",
            json!({"created_by_me": true, "i_am_reviewer": true, "status": "All"}),
        )
        .await
        .unwrap();

    let calls = harness.backend.backend_calls();
    assert_eq!(calls[..2], [Call::CurrentUser, Call::CurrentUser]);
    let Call::ListPullRequests(scope, criteria, _) = &calls[2] else {
        panic!("expected a pull request listing, got {calls:?}");
    };
    assert_eq!(scope, &PullRequestScope::Project("Platform".to_string()));
    assert_eq!(criteria.creator_id.as_deref(), Some("me-7"));
    assert_eq!(criteria.reviewer_id.as_deref(), Some("me-7"));
    assert_eq!(criteria.status, PullRequestStatus::All);
}

#[tokio::test]
async fn test_unknown_user_is_identity_not_found() {
    let harness = Harness::new(FakeBackend::new());

    let result = harness
        .dispatch(
            "list_pull_requests_by_repo",
            json!({"repositoryId": "R", "created_by_user": "ghost@x.com"}),
        )
        .await;

    assert!(result.is_error());
    assert_eq!(result.text_content(), "identity not found: ghost@x.com");
    assert!(
        !harness
            .backend
            .calls()
            .iter()
            .any(|c| matches!(c, Call::ListPullRequests(..)))
    );
}

#[tokio::test]
async fn test_project_listing_includes_repository_name() {
    let harness = Harness::new(FakeBackend::new().with_pull_requests(vec![
        fixtures::pull_request(1, "First"),
        fixtures::pull_request(2, "Second"),
    ]));

    let by_project = harness
        .call("list_pull_requests_by_project", json!({"top": 1}))
        .await
        .unwrap();
    let by_repo = harness
        .call("list_pull_requests_by_repo", json!({"repositoryId": "r-1"}))
        .await
        .unwrap();

    assert_eq!(
        by_project,
        json!([{
            "pullRequestId": 1,
            "codeReviewId": 1,
            "status": "active",
            "createdBy": {"displayName": "Ada Lovelace", "uniqueName": "ada@contoso.com"},
            "creationDate": "2024-05-01T10:00:00Z",
            "title": "First",
            "isDraft": false,
            "sourceRefName": "refs/heads/feature/1",
            "targetRefName": "refs/heads/main",
            "repository": "web"
        }])
    );
    assert_eq!(by_repo.as_array().unwrap().len(), 2);
    assert!(by_repo[0].get("repository").is_none());
    assert!(by_repo[0].get("description").is_none());
}

#[tokio::test]
async fn test_missing_pull_request_is_entity_not_found() {
    let harness = Harness::new(FakeBackend::new());

    let result = harness
        .dispatch(
            "get_pull_request_by_id",
            json!({"repositoryId": "R", "pullRequestId": 99}),
        )
        .await;

    assert!(result.is_error());
    assert_eq!(result.text_content(), "pull request not found: 99");
}

#[tokio::test]
async fn test_get_pull_request_returns_full_object() {
    let harness =
        Harness::new(FakeBackend::new().with_pull_requests(vec![fixtures::pull_request(5, "Fix")]));

    let pr = harness
        .call(
            "get_pull_request_by_id",
            json!({"repositoryId": "r-1", "pullRequestId": 5, "includeWorkItemRefs": true}),
        )
        .await
        .unwrap();

    assert_eq!(pr["title"], "Fix");
    assert_eq!(pr["mergeStatus"], "succeeded");
    assert_eq!(
        harness.backend.backend_calls(),
        vec![Call::GetPullRequest("r-1".to_string(), 5, true)]
    );
}

#[tokio::test]
async fn test_get_tools_return_backend_object_verbatim() {
    let pr_raw = json!({
        "pullRequestId": 6,
        "title": "Nullable",
        "description": null,
        "createdBy": null,
        "closedDate": null,
        "repository": {"id": "r-1", "name": null}
    });
    let repo_raw = json!({"id": "r1", "name": "web", "size": null, "webUrl": null});
    let harness = Harness::new(
        FakeBackend::new()
            .with_pull_requests(vec![serde_json::from_value(pr_raw.clone()).unwrap()])
            .with_repositories("Platform", vec![serde_json::from_value(repo_raw.clone()).unwrap()]),
    );

    let pr = harness
        .call("get_pull_request_by_id", json!({"repositoryId": "r-1", "pullRequestId": 6}))
        .await
        .unwrap();
    assert_eq!(pr, pr_raw);

    let repo = harness
        .call("get_repo_by_name_or_id", json!({"repositoryNameOrId": "web"}))
        .await
        .unwrap();
    assert_eq!(repo, repo_raw);
}

#[tokio::test]
async fn test_pull_requests_by_commits() {
    let harness =
        Harness::new(FakeBackend::new().with_pull_requests(vec![fixtures::pull_request(5, "Fix")]));

    let result = harness
        .call(
            "list_pull_requests_by_commits",
            json!({"repository": "web", "commits": ["c5"]}),
        )
        .await
        .unwrap();

    assert_eq!(result["results"][0]["c5"][0]["pullRequestId"], 5);
    let Call::QueryPullRequests(project, repo, query) = &harness.backend.backend_calls()[0] else {
        panic!("expected a pull request query");
    };
    assert_eq!((project.as_str(), repo.as_str()), ("Platform", "web"));
    assert_eq!(query.query_type, PullRequestQueryType::LastMergeCommit);
}

// ==========================================================================
// Input validation
// ==========================================================================

#[rstest]
#[case::missing_required("get_pull_request_by_id", json!({"repositoryId": "R"}))]
#[case::wrong_type("get_pull_request_by_id", json!({"repositoryId": "R", "pullRequestId": "seven"}))]
#[case::negative_top("list_branches_by_repo", json!({"repositoryId": "R", "top": -1}))]
#[case::empty_commits("list_pull_requests_by_commits", json!({"repository": "web", "commits": []}))]
#[case::bad_version_type("search_commits", json!({"repository": "web", "versionType": "Label"}))]
#[case::bad_query_type(
    "list_pull_requests_by_commits",
    json!({"repository": "web", "commits": ["c1"], "queryType": "Squash"})
)]
#[case::bad_thread_status(
    "create_pull_request_comment",
    json!({"repositoryId": "R", "pullRequestId": 1, "content": "x", "status": "resolved"})
)]
#[case::inverted_lines(
    "create_pull_request_comment",
    json!({"repositoryId": "R", "pullRequestId": 1, "content": "x", "filePath": "a.ts", "lineStart": 9, "lineEnd": 3})
)]
#[tokio::test]
async fn test_invalid_input_never_reaches_backend(#[case] tool: &str, #[case] arguments: Value) {
    let harness = Harness::new(FakeBackend::new());

    let err = core_error(harness.call(tool, arguments).await);

    assert!(err.is_pre_flight(), "{err:?}");
    assert!(harness.backend.calls().is_empty(), "{:?}", harness.backend.calls());
}

// ==========================================================================
// Review Threads
// ==========================================================================

fn review_backend() -> FakeBackend {
    FakeBackend::new()
        .with_threads(
            12,
            vec![
                fixtures::file_thread(
                    3,
                    "/src/a.ts",
                    4,
                    6,
                    vec![fixtures::comment(1, "nit"), fixtures::deleted_comment(2)],
                ),
                fixtures::thread(1, vec![fixtures::comment(5, "LGTM")]),
            ],
        )
        .with_comments(
            3,
            vec![
                fixtures::comment(3, "third"),
                fixtures::deleted_comment(1),
                fixtures::comment(2, "second"),
            ],
        )
}

#[tokio::test]
async fn test_threads_minimal_projection_hides_deleted_comments() {
    let harness = Harness::new(review_backend());

    let threads = harness
        .call(
            "list_pull_request_threads",
            json!({"repositoryId": "R", "pullRequestId": 12}),
        )
        .await
        .unwrap();

    assert_eq!(threads[0]["id"], 1);
    assert_eq!(threads[1]["id"], 3);
    assert_eq!(
        threads[1]["threadContext"],
        json!({
            "filePath": "/src/a.ts",
            "rightFileStart": {"line": 4, "offset": 1},
            "rightFileEnd": {"line": 6, "offset": 1}
        })
    );
    let comments = threads[1]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["content"], "nit");
    assert!(comments[0].get("commentType").is_none());
}

#[tokio::test]
async fn test_threads_full_projection_keeps_fields_but_not_deleted_comments() {
    let harness = Harness::new(review_backend());

    let threads = harness
        .call(
            "list_pull_request_threads",
            json!({"repositoryId": "R", "pullRequestId": 12, "fullResponse": true, "iteration": 2}),
        )
        .await
        .unwrap();

    let file_thread = &threads[1];
    assert!(file_thread.get("properties").is_some());
    let comments = file_thread["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["commentType"], "text");
    assert!(comments.iter().all(|c| c.get("isDeleted").is_none()));

    let Call::ListThreads(project, _, _, query) = &harness.backend.backend_calls()[0] else {
        panic!("expected a thread listing");
    };
    assert_eq!(project.as_deref(), Some("Platform"));
    assert_eq!(query.iteration, Some(2));
    assert_eq!(query.base_iteration, None);
}

#[rstest]
#[case(false)]
#[case(true)]
#[tokio::test]
async fn test_thread_comments_skip_deleted_before_paging(#[case] full_response: bool) {
    let harness = Harness::new(review_backend());

    let comments = harness
        .call(
            "list_pull_request_thread_comments",
            json!({
                "repositoryId": "R",
                "pullRequestId": 12,
                "threadId": 3,
                "skip": 1,
                "fullResponse": full_response
            }),
        )
        .await
        .unwrap();

    let ids: Vec<i64> = comments
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![3]);
}

#[tokio::test]
async fn test_file_comment_opens_thread_on_single_line() {
    let harness = Harness::new(FakeBackend::new());

    let thread = harness
        .call(
            "create_pull_request_comment",
            json!({
                "repositoryId": "R",
                "pullRequestId": 12,
                "content": "Consider a guard here",
                "filePath": "a.ts",
                "lineStart": 10
            }),
        )
        .await
        .unwrap();

    let line_10 = Some(CommentPosition { line: 10, offset: 1 });
    let expected = ThreadContext {
        file_path: Some("a.ts".to_string()),
        left_file_start: line_10,
        left_file_end: line_10,
        right_file_start: line_10,
        right_file_end: line_10,
        ..Default::default()
    };
    let Call::CreateThread(repo, pr, created) = &harness.backend.backend_calls()[0] else {
        panic!("expected a new thread");
    };
    assert_eq!((repo.as_str(), *pr), ("R", 12));
    assert_eq!(created.status, ThreadStatus::Active);
    assert_eq!(created.thread_context.as_ref(), Some(&expected));
    assert_eq!(thread["threadContext"]["rightFileEnd"]["line"], 10);
    assert_eq!(thread["comments"][0]["content"], "Consider a guard here");
}

#[tokio::test]
async fn test_file_path_without_line_opens_general_thread() {
    let harness = Harness::new(FakeBackend::new());

    harness
        .call(
            "create_pull_request_comment",
            json!({
                "repositoryId": "R",
                "pullRequestId": 12,
                "content": "General remark",
                "filePath": "a.ts",
                "status": "wontFix"
            }),
        )
        .await
        .unwrap();

    let Call::CreateThread(_, _, created) = &harness.backend.backend_calls()[0] else {
        panic!("expected a new thread");
    };
    assert_eq!(created.thread_context, None);
    assert_eq!(created.status.backend_token(), "WontFix");
}

#[tokio::test]
async fn test_thread_id_appends_reply() {
    let harness = Harness::new(FakeBackend::new());

    let comment = harness
        .call(
            "create_pull_request_comment",
            json!({"repositoryId": "R", "pullRequestId": 12, "threadId": 4, "content": "Done"}),
        )
        .await
        .unwrap();

    assert_eq!(comment["content"], "Done");
    assert_eq!(
        harness.backend.backend_calls(),
        vec![Call::CreateComment("R".to_string(), 12, 4, "Done".to_string())]
    );
}

#[test]
fn test_reply_target_shape() {
    let target = ado_core::criteria::comment_target(&ado_core::criteria::CommentRequest {
        content: "ok",
        thread_id: Some(9),
        status: "active",
        ..Default::default()
    })
    .unwrap();
    assert_eq!(
        target,
        CommentTarget::Reply {
            thread_id: 9,
            content: "ok".to_string()
        }
    );
}

// ==========================================================================
// Commits
// ==========================================================================

#[tokio::test]
async fn test_search_commits_defaults_to_ten() {
    let commits: Vec<Value> = (0..15).map(|i| json!({"commitId": format!("c{i}")})).collect();
    let harness = Harness::new(FakeBackend::new().with_commits(commits));

    let result = harness
        .call(
            "search_commits",
            json!({"repository": "web", "version": "main"}),
        )
        .await
        .unwrap();

    assert_eq!(result.as_array().unwrap().len(), 10);
    let Call::SearchCommits(project, repo, query) = &harness.backend.backend_calls()[0] else {
        panic!("expected a commit search");
    };
    assert_eq!((project.as_str(), repo.as_str()), ("Platform", "web"));
    assert_eq!(query.top, 10);
    assert_eq!(query.skip, 0);
    assert_eq!(
        query.item_version.as_ref().map(|v| v.version.as_str()),
        Some("main")
    );
}

#[tokio::test]
async fn test_backend_failure_is_error_envelope() {
    let harness = Harness::new(FakeBackend::new().unavailable("HTTP 503 Service Unavailable: try later"));

    let result = harness
        .dispatch("search_commits", json!({"repository": "web"}))
        .await;

    assert!(result.is_error());
    assert!(result.text_content().contains("HTTP 503"));
}
