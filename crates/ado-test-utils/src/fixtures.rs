//! Entity builders.
//!
//! Entities are built from JSON so they look like what the backend returns,
//! including fields the projections drop.

use ado_core::models::{Comment, CommentThread, GitPullRequest, GitRef, GitRepository};
use serde_json::{Value, json};

fn from_json<T: serde::de::DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).expect("fixture JSON must match the model")
}

pub fn repository(id: &str, name: &str) -> GitRepository {
    from_json(json!({
        "id": id,
        "name": name,
        "url": format!("https://dev.azure.com/contoso/_apis/git/repositories/{id}"),
        "project": {"id": "p-1", "name": "Platform"},
        "defaultBranch": "refs/heads/main",
        "size": 2048,
        "remoteUrl": format!("https://contoso@dev.azure.com/contoso/Platform/_git/{name}"),
        "webUrl": format!("https://dev.azure.com/contoso/Platform/_git/{name}"),
        "isDisabled": false,
        "isInMaintenance": false
    }))
}

/// Ref named `refs/heads/{name}`
pub fn branch(name: &str) -> GitRef {
    git_ref(&format!("refs/heads/{name}"))
}

pub fn git_ref(full_name: &str) -> GitRef {
    from_json(json!({
        "name": full_name,
        "objectId": "0f1e2d3c4b5a69788796a5b4c3d2e1f00f1e2d3c",
        "creator": {"displayName": "Ada Lovelace", "uniqueName": "ada@contoso.com"},
        "url": "https://dev.azure.com/contoso/_apis/git/repositories/r/refs"
    }))
}

pub fn pull_request(id: i64, title: &str) -> GitPullRequest {
    from_json(json!({
        "pullRequestId": id,
        "codeReviewId": id,
        "status": "active",
        "createdBy": {
            "id": "u-ada",
            "displayName": "Ada Lovelace",
            "uniqueName": "ada@contoso.com",
            "imageUrl": "https://dev.azure.com/contoso/_api/_common/identityImage?id=u-ada"
        },
        "creationDate": "2024-05-01T10:00:00Z",
        "title": title,
        "description": "Long description the minimal projection drops",
        "isDraft": false,
        "sourceRefName": format!("refs/heads/feature/{id}"),
        "targetRefName": "refs/heads/main",
        "mergeStatus": "succeeded",
        "reviewers": [{"id": "u-bob", "vote": 10}],
        "repository": {"id": "r-1", "name": "web", "project": {"name": "Platform"}},
        "lastMergeCommit": {"commitId": format!("c{id}")}
    }))
}

pub fn comment(id: i64, content: &str) -> Comment {
    from_json(comment_json(id, content))
}

fn comment_json(id: i64, content: &str) -> Value {
    json!({
        "id": id,
        "parentCommentId": 0,
        "author": {
            "displayName": "Ada Lovelace",
            "uniqueName": "ada@contoso.com",
            "imageUrl": "https://img"
        },
        "content": content,
        "publishedDate": "2024-05-01T10:00:00Z",
        "lastUpdatedDate": "2024-05-01T10:00:00Z",
        "lastContentUpdatedDate": "2024-05-01T10:00:00Z",
        "commentType": "text",
        "usersLiked": []
    })
}

pub fn deleted_comment(id: i64) -> Comment {
    let mut raw = comment_json(id, "this comment was removed");
    raw["isDeleted"] = json!(true);
    from_json(raw)
}

fn thread_json(id: i64, comments: &[Comment]) -> Value {
    json!({
        "id": id,
        "publishedDate": "2024-05-01T10:00:00Z",
        "lastUpdatedDate": "2024-05-02T10:00:00Z",
        "status": "active",
        "threadContext": null,
        "properties": {},
        "identities": null,
        "isDeleted": false,
        "comments": comments.iter().map(Comment::raw).collect::<Vec<_>>()
    })
}

pub fn thread(id: i64, comments: Vec<Comment>) -> CommentThread {
    from_json(thread_json(id, &comments))
}

/// Thread anchored to `path` lines `start..=end` on the right side
pub fn file_thread(id: i64, path: &str, start: u32, end: u32, comments: Vec<Comment>) -> CommentThread {
    let mut raw = thread_json(id, &comments);
    raw["threadContext"] = json!({
        "filePath": path,
        "rightFileStart": {"line": start, "offset": 1},
        "rightFileEnd": {"line": end, "offset": 1}
    });
    from_json(raw)
}
