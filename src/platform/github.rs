//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::RemoteRepository;
use crate::types::{
    Actor, Branch, CommitPointer, FileContent, Fork, Issue, NewPullRequest, PullRequest, RepoId,
    RepositoryInfo,
};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use octocrab::Octocrab;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Page size for list routes (GitHub's maximum)
const PER_PAGE: usize = 100;

// Response shapes for routes called through the raw HTTP client

#[derive(Deserialize)]
struct RepositoryResponse {
    description: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
    license: Option<LicenseResponse>,
    default_branch: Option<String>,
}

#[derive(Deserialize)]
struct LicenseResponse {
    spdx_id: Option<String>,
}

#[derive(Deserialize)]
struct BranchResponse {
    name: String,
    commit: CommitRef,
}

#[derive(Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Deserialize)]
struct ForkResponse {
    name: String,
    owner: OwnerResponse,
}

#[derive(Deserialize)]
struct OwnerResponse {
    login: String,
}

#[derive(Deserialize)]
struct DescriptionResponse {
    description: Option<String>,
}

#[derive(Deserialize)]
struct TopicsResponse {
    names: Vec<String>,
}

#[derive(Deserialize)]
struct ContentResponse {
    content: String,
    sha: String,
}

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    /// Token for raw HTTP requests
    token: String,
    /// HTTP client for routes octocrab has no typed builder for
    http_client: Client,
    /// API base URL, without trailing slash
    api_base: String,
}

impl GitHubService {
    /// Create a new GitHub service
    ///
    /// `host` selects a GitHub Enterprise instance; `None` means github.com.
    pub fn new(token: &str, host: Option<&str>) -> Result<Self> {
        let api_base = host.map_or_else(
            || "https://api.github.com".to_string(),
            |h| format!("https://{h}/api/v3"),
        );
        Self::with_api_base(token, &api_base)
    }

    /// Create a service talking to an explicit API base URL
    pub fn with_api_base(token: &str, api_base: &str) -> Result<Self> {
        let api_base = api_base.trim_end_matches('/').to_string();

        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_base.as_str())
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("manifest-sync")
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token: token.to_string(),
            http_client,
            api_base,
        })
    }

    fn repo_url(&self, repo: &RepoId, rest: &str) -> String {
        format!(
            "{}/repos/{}/{}{rest}",
            self.api_base, repo.owner, repo.name
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Send a raw request, mapping 404 and 401/403 to their own variants
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("{what}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response.text().await.unwrap_or_default();
        debug!(%status, what, "GitHub request failed");
        Err(match status {
            StatusCode::NOT_FOUND => Error::NotFound(what.to_string()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Error::PermissionDenied(format!("{what}: {detail}"))
            }
            _ => Error::GitHubApi(format!("{what} returned {status}: {detail}")),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        self.send(request, what)
            .await?
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse {what}: {e}")))
    }
}

/// Helper to convert octocrab PR to our `PullRequest` type
fn pr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        head_ref: pr.head.ref_field.clone(),
        base_ref: pr.base.ref_field.clone(),
        title: pr.title.as_deref().unwrap_or_default().to_string(),
    }
}

/// Search query for open PRs by `author` in `repo`
fn open_pr_query(repo: &RepoId, author: &str) -> String {
    format!("type:pr is:open author:{author} repo:{repo}")
}

#[async_trait]
impl RemoteRepository for GitHubService {
    async fn get_repository(&self, repo: &RepoId) -> Result<RepositoryInfo> {
        debug!(%repo, "fetching repository");
        let response: RepositoryResponse = self
            .send_json(self.http_client.get(self.repo_url(repo, "")), "repository")
            .await?;

        Ok(RepositoryInfo {
            description: response.description.filter(|d| !d.is_empty()),
            topics: response.topics,
            license_spdx: response.license.and_then(|l| l.spdx_id),
            default_branch: response.default_branch,
        })
    }

    async fn current_user(&self) -> Result<Actor> {
        let user = self.client.current().user().await?;
        debug!(login = %user.login, "authenticated");
        Ok(Actor { login: user.login })
    }

    async fn search_open_pull_requests(
        &self,
        repo: &RepoId,
        author: &str,
    ) -> Result<Vec<PullRequest>> {
        let query = open_pr_query(repo, author);
        debug!(%query, "searching open PRs");

        let page = self
            .client
            .search()
            .issues_and_pull_requests(&query)
            .send()
            .await?;

        let result: Vec<PullRequest> = page
            .items
            .into_iter()
            .filter(|issue| issue.pull_request.is_some())
            .map(|issue| PullRequest {
                number: issue.number,
                html_url: issue.html_url.to_string(),
                head_ref: String::new(),
                base_ref: String::new(),
                title: issue.title,
            })
            .collect();
        debug!(count = result.len(), "found open PRs");
        Ok(result)
    }

    async fn get_pull_request(&self, repo: &RepoId, number: u64) -> Result<PullRequest> {
        debug!(%repo, number, "getting PR");
        let pr = self.client.pulls(&repo.owner, &repo.name).get(number).await?;
        Ok(pr_from_octocrab(&pr))
    }

    async fn get_branch(&self, repo: &RepoId, branch: &str) -> Result<Branch> {
        debug!(%repo, branch, "getting branch");
        let response: BranchResponse = self
            .send_json(
                self.http_client
                    .get(self.repo_url(repo, &format!("/branches/{}", urlencoding::encode(branch)))),
                &format!("branch {branch}"),
            )
            .await?;

        Ok(Branch {
            name: response.name,
            tip: CommitPointer(response.commit.sha),
        })
    }

    async fn create_branch(
        &self,
        repo: &RepoId,
        branch: &str,
        tip: &CommitPointer,
    ) -> Result<()> {
        debug!(%repo, branch, sha = %tip, "creating branch");
        let body = serde_json::json!({
            "ref": format!("refs/heads/{branch}"),
            "sha": tip.0,
        });
        self.send(
            self.http_client
                .post(self.repo_url(repo, "/git/refs"))
                .json(&body),
            &format!("create branch {branch}"),
        )
        .await?;
        debug!(branch, "created branch");
        Ok(())
    }

    async fn list_forks(&self, repo: &RepoId) -> Result<Vec<Fork>> {
        debug!(%repo, "listing forks");
        let mut forks = Vec::new();

        // A short page is the last one
        for page in 1.. {
            let batch: Vec<ForkResponse> = self
                .send_json(
                    self.http_client
                        .get(self.repo_url(repo, "/forks"))
                        .query(&[("per_page", PER_PAGE), ("page", page)]),
                    "forks",
                )
                .await?;
            let last = batch.len() < PER_PAGE;
            forks.extend(batch.into_iter().map(|f| Fork {
                repo: RepoId::new(f.owner.login, f.name),
            }));
            if last {
                break;
            }
        }

        debug!(count = forks.len(), "listed forks");
        Ok(forks)
    }

    async fn create_fork(&self, repo: &RepoId) -> Result<Fork> {
        debug!(%repo, "creating fork");
        let fork: ForkResponse = self
            .send_json(
                self.http_client
                    .post(self.repo_url(repo, "/forks"))
                    .json(&serde_json::json!({})),
                "create fork",
            )
            .await?;

        Ok(Fork {
            repo: RepoId::new(fork.owner.login, fork.name),
        })
    }

    async fn create_issue(&self, repo: &RepoId, title: &str, body: &str) -> Result<Issue> {
        debug!(%repo, "creating issue");
        let issue = self
            .client
            .issues(&repo.owner, &repo.name)
            .create(title)
            .body(body)
            .send()
            .await?;

        debug!(number = issue.number, "created issue");
        Ok(Issue {
            number: issue.number,
            html_url: issue.html_url.to_string(),
        })
    }

    async fn create_pull_request(
        &self,
        repo: &RepoId,
        pr: &NewPullRequest,
    ) -> Result<PullRequest> {
        debug!(%repo, head = %pr.head, base = %pr.base, "creating PR");
        let created = self
            .client
            .pulls(&repo.owner, &repo.name)
            .create(&pr.title, &pr.head, &pr.base)
            .body(&pr.body)
            .send()
            .await?;

        let result = pr_from_octocrab(&created);
        debug!(pr_number = result.number, "created PR");
        Ok(result)
    }

    async fn update_description(&self, repo: &RepoId, description: &str) -> Result<String> {
        debug!(%repo, "updating description");
        let response: DescriptionResponse = self
            .send_json(
                self.http_client
                    .patch(self.repo_url(repo, ""))
                    .json(&serde_json::json!({ "description": description })),
                "update description",
            )
            .await?;
        Ok(response.description.unwrap_or_default())
    }

    async fn replace_topics(&self, repo: &RepoId, topics: &[String]) -> Result<Vec<String>> {
        debug!(%repo, count = topics.len(), "replacing topics");
        let response: TopicsResponse = self
            .send_json(
                self.http_client
                    .put(self.repo_url(repo, "/topics"))
                    .json(&serde_json::json!({ "names": topics })),
                "replace topics",
            )
            .await?;
        Ok(response.names)
    }

    async fn get_file(&self, repo: &RepoId, path: &str, branch: &str) -> Result<FileContent> {
        debug!(%repo, path, branch, "reading file");
        let response: ContentResponse = self
            .send_json(
                self.http_client
                    .get(self.repo_url(repo, &format!("/contents/{path}")))
                    .query(&[("ref", branch)]),
                path,
            )
            .await?;

        // GitHub wraps base64 content at 60 columns
        let packed: String = response
            .content
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = STANDARD
            .decode(packed)
            .map_err(|e| Error::GitHubApi(format!("Failed to decode {path}: {e}")))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| Error::Manifest(format!("{path} is not valid UTF-8: {e}")))?;

        Ok(FileContent {
            text,
            sha: response.sha,
        })
    }

    async fn update_file(
        &self,
        repo: &RepoId,
        path: &str,
        branch: &str,
        message: &str,
        contents: &str,
        sha: &str,
    ) -> Result<()> {
        debug!(%repo, path, branch, "committing file");
        let body = serde_json::json!({
            "message": message,
            "content": STANDARD.encode(contents),
            "sha": sha,
            "branch": branch,
        });
        self.send(
            self.http_client
                .put(self.repo_url(repo, &format!("/contents/{path}")))
                .json(&body),
            &format!("update {path}"),
        )
        .await?;
        Ok(())
    }
}
