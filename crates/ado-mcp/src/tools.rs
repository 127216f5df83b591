//! MCP tool definitions
//!
//! Tools are the only way agents reach Azure DevOps through this server.
//!
//! # Tool Categories
//!
//! ## Repositories
//! - `list_repos_by_project` - List repositories in a project
//! - `get_repo_by_name_or_id` - Fetch one repository
//!
//! ## Branches
//! - `list_branches_by_repo` - List branches, newest-looking names first
//! - `list_my_branches_by_repo` - List the caller's branches
//! - `get_branch_by_name` - Fetch one branch
//!
//! ## Pull Requests
//! - `list_pull_requests_by_repo` - List pull requests in a repository
//! - `list_pull_requests_by_project` - List pull requests across a project
//! - `get_pull_request_by_id` - Fetch one pull request
//! - `list_pull_requests_by_commits` - Map commits to the pull requests that carried them
//!
//! ## Review Threads
//! - `list_pull_request_threads` - List comment threads with file context
//! - `list_pull_request_thread_comments` - List comments in one thread
//! - `create_pull_request_comment` - Reply to a thread or open a new one
//!
//! ## Commits
//! - `search_commits` - Search commit history
//!
//! Enum-valued parameters (`status`, `versionType`, `queryType`) are typed as
//! plain strings here. Their closed sets are enforced when criteria are built,
//! which reports the allowed values.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Tool definition for MCP protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Result from a tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// Content types for tool results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolResult {
    /// Create a successful text result
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: content.into(),
            }],
            is_error: None,
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: Some(true),
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error == Some(true)
    }

    /// Text of the first content block
    pub fn text_content(&self) -> &str {
        match self.content.first() {
            Some(ToolContent::Text { text }) => text,
            None => "",
        }
    }
}

fn paging(default_top: u64) -> Value {
    json!({
        "top": {
            "type": "integer",
            "minimum": 0,
            "default": default_top,
            "description": "Maximum number of items to return"
        },
        "skip": {
            "type": "integer",
            "minimum": 0,
            "default": 0,
            "description": "Number of items to skip"
        }
    })
}

/// `properties` plus `top` and `skip`
fn with_paging(properties: Value, default_top: u64) -> Value {
    merge(properties, paging(default_top))
}

fn pull_request_filters() -> Value {
    json!({
        "status": {
            "type": "string",
            "default": "Active",
            "description": "Pull request status: Abandoned, Active, All, Completed, or NotSet"
        },
        "created_by_me": {
            "type": "boolean",
            "default": false,
            "description": "Only pull requests created by the caller"
        },
        "created_by_user": {
            "type": "string",
            "description": "Only pull requests created by this email or account handle; wins over created_by_me"
        },
        "i_am_reviewer": {
            "type": "boolean",
            "default": false,
            "description": "Only pull requests where the caller is a reviewer"
        }
    })
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

fn merge(mut a: Value, b: Value) -> Value {
    if let (Some(target), Value::Object(extra)) = (a.as_object_mut(), b) {
        target.extend(extra);
    }
    a
}

fn tool(name: &str, description: &str, input_schema: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

/// Get all available tool definitions
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        // Repositories
        tool(
            "list_repos_by_project",
            "List repositories in a project, sorted by name",
            object(
                with_paging(
                    json!({
                        "project": {"type": "string", "description": "Project name or id"},
                        "repoName": {
                            "type": "string",
                            "description": "Case-insensitive substring the repository name must contain"
                        }
                    }),
                    100,
                ),
                &[],
            ),
        ),
        tool(
            "get_repo_by_name_or_id",
            "Get a repository by its name or id",
            object(
                json!({
                    "project": {"type": "string", "description": "Project name or id"},
                    "repositoryNameOrId": {"type": "string", "minLength": 1}
                }),
                &["repositoryNameOrId"],
            ),
        ),
        // Pull Requests
        tool(
            "list_pull_requests_by_repo",
            "List pull requests in a repository",
            object(
                merge(
                    with_paging(json!({"repositoryId": {"type": "string", "minLength": 1}}), 100),
                    pull_request_filters(),
                ),
                &["repositoryId"],
            ),
        ),
        tool(
            "list_pull_requests_by_project",
            "List pull requests across all repositories of a project",
            object(
                merge(
                    with_paging(json!({"project": {"type": "string"}}), 100),
                    pull_request_filters(),
                ),
                &[],
            ),
        ),
        // Branches
        tool(
            "list_branches_by_repo",
            "List branches of a repository, sorted by name descending",
            object(
                json!({
                    "repositoryId": {"type": "string", "minLength": 1},
                    "top": {"type": "integer", "minimum": 0, "default": 100},
                    "filterContains": {
                        "type": "string",
                        "description": "Substring the branch name must contain"
                    }
                }),
                &["repositoryId"],
            ),
        ),
        tool(
            "list_my_branches_by_repo",
            "List branches the caller created, pushed, or favorited",
            object(
                json!({
                    "repositoryId": {"type": "string", "minLength": 1},
                    "top": {"type": "integer", "minimum": 0, "default": 100},
                    "filterContains": {"type": "string"}
                }),
                &["repositoryId"],
            ),
        ),
        tool(
            "get_branch_by_name",
            "Get a branch by its short or refs/heads/ name",
            object(
                json!({
                    "repositoryId": {"type": "string", "minLength": 1},
                    "branchName": {"type": "string", "minLength": 1}
                }),
                &["repositoryId", "branchName"],
            ),
        ),
        // Review Threads
        tool(
            "list_pull_request_threads",
            "List comment threads of a pull request with their file and line context",
            object(
                with_paging(
                    json!({
                        "repositoryId": {"type": "string", "minLength": 1},
                        "pullRequestId": {"type": "integer"},
                        "project": {"type": "string"},
                        "iteration": {"type": "integer", "minimum": 0},
                        "baseIteration": {"type": "integer", "minimum": 0},
                        "fullResponse": {
                            "type": "boolean",
                            "default": false,
                            "description": "Return the backend objects untrimmed"
                        }
                    }),
                    100,
                ),
                &["repositoryId", "pullRequestId"],
            ),
        ),
        tool(
            "list_pull_request_thread_comments",
            "List comments in a pull request thread",
            object(
                with_paging(
                    json!({
                        "repositoryId": {"type": "string", "minLength": 1},
                        "pullRequestId": {"type": "integer"},
                        "threadId": {"type": "integer"},
                        "project": {"type": "string"},
                        "fullResponse": {"type": "boolean", "default": false}
                    }),
                    100,
                ),
                &["repositoryId", "pullRequestId", "threadId"],
            ),
        ),
        tool(
            "get_pull_request_by_id",
            "Get a pull request by its id",
            object(
                json!({
                    "repositoryId": {"type": "string", "minLength": 1},
                    "pullRequestId": {"type": "integer"},
                    "includeWorkItemRefs": {"type": "boolean", "default": false}
                }),
                &["repositoryId", "pullRequestId"],
            ),
        ),
        // Commits
        tool(
            "search_commits",
            "Search the commit history of a repository",
            object(
                with_paging(
                    json!({
                        "project": {"type": "string"},
                        "repository": {"type": "string", "minLength": 1},
                        "fromCommit": {"type": "string"},
                        "toCommit": {"type": "string"},
                        "version": {
                            "type": "string",
                            "description": "Branch name, tag, or commit id to search from"
                        },
                        "versionType": {
                            "type": "string",
                            "default": "Branch",
                            "description": "Kind of version: Branch, Tag, or Commit"
                        },
                        "includeLinks": {"type": "boolean", "default": false},
                        "includeWorkItems": {"type": "boolean", "default": false}
                    }),
                    10,
                ),
                &["repository"],
            ),
        ),
        tool(
            "list_pull_requests_by_commits",
            "List the pull requests associated with the given commits",
            object(
                json!({
                    "project": {"type": "string"},
                    "repository": {"type": "string", "minLength": 1},
                    "commits": {
                        "type": "array",
                        "items": {"type": "string"},
                        "minItems": 1
                    },
                    "queryType": {
                        "type": "string",
                        "default": "LastMergeCommit",
                        "description": "How commits are matched: NotSet, LastMergeCommit, or Commit"
                    }
                }),
                &["repository", "commits"],
            ),
        ),
        tool(
            "create_pull_request_comment",
            "Reply to a pull request thread, or open a new thread optionally anchored to file lines",
            object(
                json!({
                    "repositoryId": {"type": "string", "minLength": 1},
                    "pullRequestId": {"type": "integer"},
                    "content": {"type": "string", "minLength": 1},
                    "threadId": {
                        "type": "integer",
                        "description": "Existing thread to reply to; omit to open a new thread"
                    },
                    "status": {
                        "type": "string",
                        "default": "active",
                        "description": "Status of a new thread: active, byDesign, closed, fixed, pending, unknown, or wontFix"
                    },
                    "filePath": {"type": "string"},
                    "lineStart": {"type": "integer", "minimum": 1},
                    "lineEnd": {"type": "integer", "minimum": 1},
                    "project": {"type": "string"}
                }),
                &["repositoryId", "pullRequestId", "content"],
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_are_unique() {
        let tools = get_tool_definitions();
        let mut names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), tools.len());
        assert_eq!(tools.len(), 13);
    }

    #[test]
    fn test_every_schema_is_an_object() {
        for tool in get_tool_definitions() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(tool.input_schema["properties"].is_object(), "{}", tool.name);
        }
    }

    #[test]
    fn test_enum_parameters_are_not_schema_enums() {
        for tool in get_tool_definitions() {
            let properties = tool.input_schema["properties"].as_object().unwrap();
            for (name, schema) in properties {
                assert!(schema.get("enum").is_none(), "{}.{name}", tool.name);
            }
        }
    }

    #[test]
    fn test_search_commits_defaults_to_ten() {
        let tools = get_tool_definitions();
        let search = tools.iter().find(|t| t.name == "search_commits").unwrap();
        assert_eq!(search.input_schema["properties"]["top"]["default"], 10);
    }

    #[test]
    fn test_with_paging_keeps_own_properties() {
        let schema = with_paging(json!({"repositoryId": {"type": "string"}}), 25);
        assert_eq!(schema["repositoryId"]["type"], "string");
        assert_eq!(schema["top"]["default"], 25);
        assert_eq!(schema["skip"]["default"], 0);
        assert_eq!(schema.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_tool_result_error_serializes_is_error_camel_case() {
        let json = serde_json::to_value(ToolResult::error("boom")).unwrap();
        assert_eq!(json["isError"], true);
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][0]["text"], "boom");
    }

    #[test]
    fn test_tool_result_text_omits_is_error() {
        let json = serde_json::to_value(ToolResult::text("{}")).unwrap();
        assert!(json.get("isError").is_none());
    }
}
