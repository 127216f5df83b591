//! Response projection
//!
//! Maps backend entities to the small, stable schemas returned to callers.
//! With [`Projection::Full`] the backend object is emitted as fetched, nulls
//! and unknown keys included. Deleted comments are dropped on both paths.
//! Sources are never mutated.

use serde::Serialize;
use serde_json::Value;

use crate::Result;
use crate::models::{
    Comment, CommentPosition, CommentThread, GitPullRequest, GitRef, GitRepository, IdentityRef,
    ThreadContext,
};

/// Output shape selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    Minimal,
    Full,
}

impl Projection {
    pub fn from_full_response(full_response: bool) -> Self {
        if full_response {
            Projection::Full
        } else {
            Projection::Minimal
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySummary<'a> {
    pub id: Option<&'a str>,
    pub name: Option<&'a str>,
    pub is_disabled: Option<bool>,
    pub is_fork: Option<bool>,
    pub is_in_maintenance: Option<bool>,
    pub web_url: Option<&'a str>,
    pub size: Option<u64>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary<'a> {
    pub display_name: Option<&'a str>,
    pub unique_name: Option<&'a str>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestSummary<'a> {
    pub pull_request_id: Option<i64>,
    pub code_review_id: Option<i64>,
    pub status: Option<&'a str>,
    pub created_by: AuthorSummary<'a>,
    pub creation_date: Option<&'a str>,
    pub title: Option<&'a str>,
    pub is_draft: Option<bool>,
    pub source_ref_name: Option<&'a str>,
    pub target_ref_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<&'a str>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentSummary<'a> {
    pub id: Option<i64>,
    pub author: AuthorSummary<'a>,
    pub content: Option<&'a str>,
    pub published_date: Option<&'a str>,
    pub last_updated_date: Option<&'a str>,
    pub last_content_updated_date: Option<&'a str>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary<'a> {
    pub id: Option<i64>,
    pub published_date: Option<&'a str>,
    pub last_updated_date: Option<&'a str>,
    pub status: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_context: Option<ContextSummary<'a>>,
    pub comments: Vec<CommentSummary<'a>>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextSummary<'a> {
    pub file_path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_file_start: Option<CommentPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_file_end: Option<CommentPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_file_start: Option<CommentPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_file_end: Option<CommentPosition>,
}

pub fn repository(repo: &GitRepository) -> RepositorySummary<'_> {
    RepositorySummary {
        id: repo.id.as_deref(),
        name: repo.name.as_deref(),
        is_disabled: repo.is_disabled,
        is_fork: repo.is_fork,
        is_in_maintenance: repo.is_in_maintenance,
        web_url: repo.web_url.as_deref(),
        size: repo.size,
    }
}

fn author(identity: Option<&IdentityRef>) -> AuthorSummary<'_> {
    AuthorSummary {
        display_name: identity.and_then(|i| i.display_name.as_deref()),
        unique_name: identity.and_then(|i| i.unique_name.as_deref()),
    }
}

/// Project a pull request; `with_repository` adds the repository name
pub fn pull_request(pr: &GitPullRequest, with_repository: bool) -> PullRequestSummary<'_> {
    PullRequestSummary {
        pull_request_id: pr.pull_request_id,
        code_review_id: pr.code_review_id,
        status: pr.status.as_deref(),
        created_by: author(pr.created_by.as_ref()),
        creation_date: pr.creation_date.as_deref(),
        title: pr.title.as_deref(),
        is_draft: pr.is_draft,
        source_ref_name: pr.source_ref_name.as_deref(),
        target_ref_name: pr.target_ref_name.as_deref(),
        repository: if with_repository {
            pr.repository.as_ref().and_then(|r| r.name.as_deref())
        } else {
            None
        },
    }
}

/// Keep only refs under `refs/heads/`
pub fn branch_refs(refs: Vec<GitRef>) -> Vec<GitRef> {
    refs.into_iter().filter(|r| r.branch_name().is_some()).collect()
}

/// Short names of branch refs; other refs are skipped
pub fn branch_names(refs: &[GitRef]) -> Vec<&str> {
    refs.iter().filter_map(|r| r.branch_name()).collect()
}

/// Drop deleted comments
pub fn without_deleted(comments: Vec<Comment>) -> Vec<Comment> {
    comments.into_iter().filter(|c| !c.is_deleted()).collect()
}

pub fn comment(comment: &Comment) -> CommentSummary<'_> {
    CommentSummary {
        id: comment.id,
        author: author(comment.author.as_ref()),
        content: comment.content.as_deref(),
        published_date: comment.published_date.as_deref(),
        last_updated_date: comment.last_updated_date.as_deref(),
        last_content_updated_date: comment.last_content_updated_date.as_deref(),
    }
}

fn context(context: &ThreadContext) -> ContextSummary<'_> {
    ContextSummary {
        file_path: context.file_path.as_deref(),
        left_file_start: context.left_file_start,
        left_file_end: context.left_file_end,
        right_file_start: context.right_file_start,
        right_file_end: context.right_file_end,
    }
}

pub fn thread(thread: &CommentThread) -> ThreadSummary<'_> {
    ThreadSummary {
        id: thread.id,
        published_date: thread.published_date.as_deref(),
        last_updated_date: thread.last_updated_date.as_deref(),
        status: thread.status.as_deref(),
        thread_context: thread.thread_context.as_ref().map(context),
        comments: thread
            .comments
            .iter()
            .filter(|c| !c.is_deleted())
            .map(comment)
            .collect(),
    }
}

/// Project comments to JSON
pub fn comments(comments: &[Comment], projection: Projection) -> Result<Value> {
    let visible = comments.iter().filter(|c| !c.is_deleted());
    let value = match projection {
        Projection::Minimal => serde_json::to_value(visible.map(comment).collect::<Vec<_>>())?,
        Projection::Full => serde_json::to_value(visible.collect::<Vec<_>>())?,
    };
    Ok(value)
}

/// Project threads to JSON
pub fn threads(threads: &[CommentThread], projection: Projection) -> Result<Value> {
    let value = match projection {
        Projection::Minimal => serde_json::to_value(threads.iter().map(thread).collect::<Vec<_>>())?,
        Projection::Full => Value::Array(threads.iter().map(CommentThread::raw_without_deleted).collect()),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_thread() -> CommentThread {
        serde_json::from_value(json!({
            "id": 11,
            "publishedDate": "2024-05-01T10:00:00Z",
            "lastUpdatedDate": "2024-05-02T10:00:00Z",
            "status": "active",
            "threadContext": {
                "filePath": "/src/app.ts",
                "rightFileStart": {"line": 4, "offset": 1},
                "rightFileEnd": {"line": 6, "offset": 1}
            },
            "properties": {"CodeReviewThreadType": {"$value": "VoteUpdate"}},
            "comments": [
                {"id": 1, "content": "looks good", "author": {"displayName": "Ada", "uniqueName": "ada@x.com", "imageUrl": "http://img"}, "commentType": "text"},
                {"id": 2, "content": "removed", "isDeleted": true}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_minimal_thread_drops_deleted_comments_and_extra_fields() {
        let value = threads(&[sample_thread()], Projection::Minimal).unwrap();
        assert_eq!(
            value,
            json!([{
                "id": 11,
                "publishedDate": "2024-05-01T10:00:00Z",
                "lastUpdatedDate": "2024-05-02T10:00:00Z",
                "status": "active",
                "threadContext": {
                    "filePath": "/src/app.ts",
                    "rightFileStart": {"line": 4, "offset": 1},
                    "rightFileEnd": {"line": 6, "offset": 1}
                },
                "comments": [{
                    "id": 1,
                    "author": {"displayName": "Ada", "uniqueName": "ada@x.com"},
                    "content": "looks good",
                    "publishedDate": null,
                    "lastUpdatedDate": null,
                    "lastContentUpdatedDate": null
                }]
            }])
        );
    }

    #[test]
    fn test_full_thread_keeps_backend_fields_but_not_deleted_comments() {
        let source = sample_thread();
        let value = threads(std::slice::from_ref(&source), Projection::Full).unwrap();

        assert_eq!(value[0]["properties"]["CodeReviewThreadType"]["$value"], "VoteUpdate");
        assert_eq!(value[0]["comments"].as_array().unwrap().len(), 1);
        assert_eq!(value[0]["comments"][0]["author"]["imageUrl"], "http://img");
        assert_eq!(value[0]["comments"][0]["commentType"], "text");
        // source untouched
        assert_eq!(source.comments.len(), 2);
    }

    #[test]
    fn test_full_thread_is_the_backend_object_verbatim() {
        let raw = json!([{
            "comments": [{
                "author": null,
                "content": "x",
                "id": 1,
                "isDeleted": null,
                "lastContentUpdatedDate": null
            }],
            "id": 7,
            "publishedDate": null,
            "status": "active",
            "threadContext": null
        }]);
        let source: Vec<CommentThread> = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(threads(&source, Projection::Full).unwrap(), raw);
    }

    #[test]
    fn test_full_comments_keep_null_fields() {
        let raw = json!([{"id": 4, "content": "ok", "author": null, "publishedDate": null}]);
        let list: Vec<Comment> = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(comments(&list, Projection::Full).unwrap(), raw);
    }

    #[test]
    fn test_deleted_comments_never_surface() {
        let list: Vec<Comment> = serde_json::from_value(json!([
            {"id": 1, "isDeleted": true},
            {"id": 2}
        ]))
        .unwrap();
        for projection in [Projection::Minimal, Projection::Full] {
            let value = comments(&list, projection).unwrap();
            let ids: Vec<i64> = value
                .as_array()
                .unwrap()
                .iter()
                .map(|c| c["id"].as_i64().unwrap())
                .collect();
            assert_eq!(ids, vec![2]);
        }
    }

    #[test]
    fn test_pull_request_repository_name_only_when_requested() {
        let pr: GitPullRequest = serde_json::from_value(json!({
            "pullRequestId": 42,
            "codeReviewId": 42,
            "status": "active",
            "createdBy": {"displayName": "Ada", "uniqueName": "ada@x.com", "id": "u1"},
            "creationDate": "2024-05-01T10:00:00Z",
            "title": "Add login",
            "isDraft": false,
            "sourceRefName": "refs/heads/login",
            "targetRefName": "refs/heads/main",
            "repository": {"id": "r1", "name": "web"},
            "reviewers": []
        }))
        .unwrap();

        let repo_scoped = serde_json::to_value(pull_request(&pr, false)).unwrap();
        assert!(repo_scoped.get("repository").is_none());
        assert!(repo_scoped.get("reviewers").is_none());
        assert_eq!(repo_scoped["createdBy"], json!({"displayName": "Ada", "uniqueName": "ada@x.com"}));

        let project_scoped = serde_json::to_value(pull_request(&pr, true)).unwrap();
        assert_eq!(project_scoped["repository"], "web");
    }

    #[test]
    fn test_branch_names_skip_non_heads_refs() {
        let refs = branch_refs(
            serde_json::from_value(json!([{"name": "refs/heads/main"}, {"name": "refs/tags/v1"}]))
                .unwrap(),
        );
        assert_eq!(branch_names(&refs), vec!["main"]);
    }

    #[test]
    fn test_repository_summary_shape() {
        let repo: GitRepository = serde_json::from_value(json!({
            "id": "r1",
            "name": "api",
            "isDisabled": false,
            "webUrl": "https://dev.azure.com/org/p/_git/api",
            "size": 1024,
            "remoteUrl": "https://org@dev.azure.com/org/p/_git/api"
        }))
        .unwrap();
        assert_eq!(
            serde_json::to_value(repository(&repo)).unwrap(),
            json!({
                "id": "r1",
                "name": "api",
                "isDisabled": false,
                "isFork": null,
                "isInMaintenance": null,
                "webUrl": "https://dev.azure.com/org/p/_git/api",
                "size": 1024
            })
        );
    }
}
