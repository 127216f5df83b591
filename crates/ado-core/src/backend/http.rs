//! Azure DevOps REST client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{GitBackend, IdentityService};
use crate::auth::Credential;
use crate::config::AdoConfig;
use crate::criteria::{
    CommitQuery, NewThread, PullRequestQuery, PullRequestScope, PullRequestSearchCriteria,
    RefQuery, ThreadQuery,
};
use crate::models::{Comment, CommentThread, GitPullRequest, GitRef, GitRepository, ValueList};
use crate::pager::Page;
use crate::{Error, Result};

/// `commentType` for plain text comments
const COMMENT_TYPE_TEXT: u8 = 1;

type Query = Vec<(&'static str, String)>;

/// HTTP implementation of [`GitBackend`] and [`IdentityService`]
pub struct HttpBackend {
    client: Client,
    config: AdoConfig,
    credential: Credential,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionData {
    authenticated_user: IdentityRecord,
}

#[derive(Deserialize)]
struct IdentityRecord {
    id: String,
}

impl HttpBackend {
    pub fn new(config: AdoConfig, credential: Credential) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ado-mcp/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            credential,
        })
    }

    fn url(&self, base: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(base).map_err(|e| Error::Config {
            message: format!("invalid base URL '{base}': {e}"),
        })?;
        url.path_segments_mut()
            .map_err(|_| Error::Config {
                message: format!("'{base}' cannot be a base URL"),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn org_url(&self, segments: &[&str]) -> Result<Url> {
        self.url(&self.config.base_url(), segments)
    }

    /// `[{project}/]_apis/git/repositories/{repo}/pullRequests/{id}/threads`
    fn threads_url(
        &self,
        project: Option<&str>,
        repository_id: &str,
        pull_request_id: i64,
        rest: &[&str],
    ) -> Result<Url> {
        let pr = pull_request_id.to_string();
        let mut segments: Vec<&str> = project.into_iter().collect();
        segments.extend([
            "_apis",
            "git",
            "repositories",
            repository_id,
            "pullRequests",
            pr.as_str(),
            "threads",
        ]);
        segments.extend_from_slice(rest);
        self.org_url(&segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.unversioned(method, url)
            .query(&[("api-version", self.config.api_version.as_str())])
    }

    fn unversioned(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "Backend request");
        let builder = self.client.request(method, url);
        match &self.credential {
            Credential::Pat(pat) => builder.basic_auth("", Some(pat)),
            Credential::Bearer(token) => builder.bearer_auth(token),
        }
    }

    /// Send and decode; HTTP 404 yields `None`
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Option<T>> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let url = response.url().clone();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            warn!(%url, %status, "Backend request failed");
            return Err(Error::backend(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    format!("authentication failed (HTTP {status}): {body}")
                }
                _ => format!("HTTP {status}: {body}"),
            }));
        }

        Ok(Some(response.json::<T>().await?))
    }

    /// Send and decode a `{ value: [...] }` list; HTTP 404 is `EntityNotFound`
    async fn send_list<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        kind: &'static str,
        id: &str,
    ) -> Result<Vec<T>> {
        self.send::<ValueList<T>>(builder)
            .await?
            .map(|list| list.value)
            .ok_or_else(|| Error::not_found(kind, id))
    }
}

fn push_opt(query: &mut Query, key: &'static str, value: Option<impl ToString>) {
    if let Some(value) = value {
        query.push((key, value.to_string()));
    }
}

#[async_trait]
impl GitBackend for HttpBackend {
    async fn list_repositories(&self, project: &str) -> Result<Vec<GitRepository>> {
        let url = self.org_url(&[project, "_apis", "git", "repositories"])?;
        self.send_list(self.request(Method::GET, url), "project", project)
            .await
    }

    async fn list_refs(&self, repository_id: &str, query: &RefQuery) -> Result<Vec<GitRef>> {
        let url = self.org_url(&["_apis", "git", "repositories", repository_id, "refs"])?;
        let mut params: Query = vec![("filter", query.filter.to_string())];
        push_opt(&mut params, "filterContains", query.filter_contains.as_deref());
        if query.include_my_branches {
            params.push(("includeMyBranches", "true".to_string()));
        }
        let builder = self.request(Method::GET, url).query(&params);
        self.send_list(builder, "repository", repository_id).await
    }

    async fn list_pull_requests(
        &self,
        scope: &PullRequestScope,
        criteria: &PullRequestSearchCriteria,
        page: Page,
    ) -> Result<Vec<GitPullRequest>> {
        let (url, kind, id) = match scope {
            PullRequestScope::Repository(repo) => (
                self.org_url(&["_apis", "git", "repositories", repo, "pullrequests"])?,
                "repository",
                repo,
            ),
            PullRequestScope::Project(project) => (
                self.org_url(&[project, "_apis", "git", "pullrequests"])?,
                "project",
                project,
            ),
        };

        let mut params: Query = vec![
            ("searchCriteria.status", criteria.status.backend_token().to_string()),
            ("$skip", page.skip.to_string()),
            ("$top", page.top.to_string()),
        ];
        push_opt(&mut params, "searchCriteria.creatorId", criteria.creator_id.as_deref());
        push_opt(&mut params, "searchCriteria.reviewerId", criteria.reviewer_id.as_deref());

        let builder = self.request(Method::GET, url).query(&params);
        self.send_list(builder, kind, id).await
    }

    async fn get_pull_request(
        &self,
        repository_id: &str,
        pull_request_id: i64,
        include_work_item_refs: bool,
    ) -> Result<Option<GitPullRequest>> {
        let pr = pull_request_id.to_string();
        let url = self.org_url(&[
            "_apis",
            "git",
            "repositories",
            repository_id,
            "pullrequests",
            pr.as_str(),
        ])?;
        let builder = self
            .request(Method::GET, url)
            .query(&[("includeWorkItemRefs", include_work_item_refs.to_string())]);
        self.send(builder).await
    }

    async fn list_threads(
        &self,
        project: Option<&str>,
        repository_id: &str,
        pull_request_id: i64,
        query: ThreadQuery,
    ) -> Result<Vec<CommentThread>> {
        let url = self.threads_url(project, repository_id, pull_request_id, &[])?;
        let mut params = Query::new();
        push_opt(&mut params, "$iteration", query.iteration);
        push_opt(&mut params, "$baseIteration", query.base_iteration);
        let builder = self.request(Method::GET, url).query(&params);
        self.send_list(builder, "pull request", &pull_request_id.to_string())
            .await
    }

    async fn list_comments(
        &self,
        project: Option<&str>,
        repository_id: &str,
        pull_request_id: i64,
        thread_id: i64,
    ) -> Result<Vec<Comment>> {
        let thread = thread_id.to_string();
        let url = self.threads_url(
            project,
            repository_id,
            pull_request_id,
            &[thread.as_str(), "comments"],
        )?;
        self.send_list(self.request(Method::GET, url), "thread", &thread)
            .await
    }

    async fn search_commits(
        &self,
        project: &str,
        repository: &str,
        query: &CommitQuery,
    ) -> Result<Vec<Value>> {
        let url = self.org_url(&[project, "_apis", "git", "repositories", repository, "commits"])?;
        let mut params: Query = vec![
            ("searchCriteria.$skip", query.skip.to_string()),
            ("searchCriteria.$top", query.top.to_string()),
            ("searchCriteria.includeLinks", query.include_links.to_string()),
            ("searchCriteria.includeWorkItems", query.include_work_items.to_string()),
        ];
        push_opt(&mut params, "searchCriteria.fromCommitId", query.from_commit_id.as_deref());
        push_opt(&mut params, "searchCriteria.toCommitId", query.to_commit_id.as_deref());
        if let Some(version) = &query.item_version {
            params.push(("searchCriteria.itemVersion.version", version.version.clone()));
            params.push((
                "searchCriteria.itemVersion.versionType",
                version.version_type.backend_token().to_string(),
            ));
        }
        let builder = self.request(Method::GET, url).query(&params);
        self.send_list(builder, "repository", repository).await
    }

    async fn query_pull_requests_by_commits(
        &self,
        project: &str,
        repository: &str,
        query: &PullRequestQuery,
    ) -> Result<Value> {
        let url = self.org_url(&[
            project,
            "_apis",
            "git",
            "repositories",
            repository,
            "pullrequestquery",
        ])?;
        let body = json!({
            "queries": [{
                "items": query.items,
                "type": query.query_type.backend_token(),
            }]
        });
        let builder = self.request(Method::POST, url).json(&body);
        self.send(builder)
            .await?
            .ok_or_else(|| Error::not_found("repository", repository))
    }

    async fn create_thread(
        &self,
        project: Option<&str>,
        repository_id: &str,
        pull_request_id: i64,
        thread: &NewThread,
    ) -> Result<CommentThread> {
        let url = self.threads_url(project, repository_id, pull_request_id, &[])?;
        let mut body = json!({
            "comments": [{
                "parentCommentId": 0,
                "content": thread.content,
                "commentType": COMMENT_TYPE_TEXT,
            }],
            "status": thread.status.backend_token(),
        });
        if let Some(context) = &thread.thread_context {
            body["threadContext"] = serde_json::to_value(context)?;
        }
        let builder = self.request(Method::POST, url).json(&body);
        self.send(builder)
            .await?
            .ok_or_else(|| Error::not_found("pull request", pull_request_id.to_string()))
    }

    async fn create_comment(
        &self,
        project: Option<&str>,
        repository_id: &str,
        pull_request_id: i64,
        thread_id: i64,
        content: &str,
    ) -> Result<Comment> {
        let thread = thread_id.to_string();
        let url = self.threads_url(
            project,
            repository_id,
            pull_request_id,
            &[thread.as_str(), "comments"],
        )?;
        let body = json!({
            "content": content,
            "commentType": COMMENT_TYPE_TEXT,
        });
        let builder = self.request(Method::POST, url).json(&body);
        self.send(builder)
            .await?
            .ok_or_else(|| Error::not_found("thread", thread))
    }
}

#[async_trait]
impl IdentityService for HttpBackend {
    async fn current_user_id(&self) -> Result<String> {
        let url = self.org_url(&["_apis", "connectionData"])?;
        let data: ConnectionData = self
            .send(self.unversioned(Method::GET, url))
            .await?
            .ok_or_else(|| Error::backend("connection data unavailable"))?;
        Ok(data.authenticated_user.id)
    }

    async fn find_user_id(&self, identifier: &str) -> Result<Option<String>> {
        let url = self.url(&self.config.identity_url(), &["_apis", "identities"])?;
        let builder = self.request(Method::GET, url).query(&[
            ("searchFilter", "General"),
            ("filterValue", identifier),
            ("queryMembership", "None"),
        ]);
        let identities: Option<ValueList<IdentityRecord>> = self.send(builder).await?;
        Ok(identities.and_then(|list| list.value.into_iter().next().map(|i| i.id)))
    }
}
