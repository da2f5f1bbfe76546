//! GitHub REST client for issue details.
//!
//! Fetches a single issue and its comments. A `GITHUB_TOKEN` environment
//! variable is optional; without it the API's unauthenticated rate limits
//! apply. Pagination is not handled — one issue per analysis run.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Issue fields the analysis pipeline consumes.
#[derive(Debug, Clone)]
pub struct IssueDetails {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub url: String,
    pub comments: Vec<IssueComment>,
}

#[derive(Debug, Clone)]
pub struct IssueComment {
    pub user: String,
    pub body: String,
}

/// Extract `(owner, repo)` from a GitHub repository URL.
pub fn parse_github_url(repo_url: &str) -> Result<(String, String)> {
    let rest = repo_url
        .split("github.com/")
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Invalid GitHub URL: {}", repo_url))?;

    let mut parts = rest.split('/').filter(|s| !s.is_empty());
    let owner = parts.next().unwrap_or_default();
    let repo = parts.next().unwrap_or_default().trim_end_matches(".git");

    if owner.is_empty() || repo.is_empty() {
        bail!("Invalid GitHub URL: {}", repo_url);
    }

    Ok((owner.to_string(), repo.to_string()))
}

#[derive(Deserialize)]
struct ApiIssue {
    number: u64,
    title: String,
    body: Option<String>,
    html_url: String,
}

#[derive(Deserialize)]
struct ApiComment {
    user: ApiUser,
    body: Option<String>,
}

#[derive(Deserialize)]
struct ApiUser {
    login: String,
}

/// Fetch one issue plus its comments.
pub async fn fetch_issue(owner: &str, repo: &str, number: u64) -> Result<IssueDetails> {
    println!("Fetching issue #{} from {}/{}...", number, owner, repo);
    let client = build_client()?;

    let issue_url = format!(
        "https://api.github.com/repos/{}/{}/issues/{}",
        owner, repo, number
    );
    let issue: ApiIssue = get_json(&client, &issue_url)
        .await
        .with_context(|| format!("Failed to fetch issue #{}", number))?;

    let comments_url = format!("{}/comments", issue_url);
    let comments: Vec<ApiComment> = get_json(&client, &comments_url)
        .await
        .with_context(|| format!("Failed to fetch comments for issue #{}", number))?;

    Ok(IssueDetails {
        number: issue.number,
        title: issue.title,
        body: issue.body.unwrap_or_default(),
        url: issue.html_url,
        comments: comments
            .into_iter()
            .map(|c| IssueComment {
                user: c.user.login,
                body: c.body.unwrap_or_default(),
            })
            .collect(),
    })
}

async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("GitHub API error {} for {}: {}", status, url, body);
    }
    Ok(response.json().await?)
}

fn build_client() -> Result<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
    );

    match std::env::var("GITHUB_TOKEN") {
        Ok(token) if !token.is_empty() => {
            let value = format!("Bearer {}", token);
            headers.insert(
                reqwest::header::AUTHORIZATION,
                reqwest::header::HeaderValue::from_str(&value)
                    .context("GITHUB_TOKEN contains invalid header characters")?,
            );
        }
        _ => {
            eprintln!("Warning: GITHUB_TOKEN not set. API rate limits will be very low.");
        }
    }

    Ok(reqwest::Client::builder()
        .user_agent(concat!("bugscope/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_url() {
        let (owner, repo) = parse_github_url("https://github.com/gothinkster/realworld").unwrap();
        assert_eq!(owner, "gothinkster");
        assert_eq!(repo, "realworld");
    }

    #[test]
    fn test_parse_strips_git_suffix() {
        let (owner, repo) = parse_github_url("https://github.com/rust-lang/cargo.git").unwrap();
        assert_eq!(owner, "rust-lang");
        assert_eq!(repo, "cargo");
    }

    #[test]
    fn test_parse_trailing_slash() {
        let (owner, repo) = parse_github_url("https://github.com/a/b/").unwrap();
        assert_eq!(owner, "a");
        assert_eq!(repo, "b");
    }

    #[test]
    fn test_parse_rejects_non_github() {
        assert!(parse_github_url("https://gitlab.com/a/b").is_err());
        assert!(parse_github_url("https://github.com/only-owner").is_err());
        assert!(parse_github_url("nonsense").is_err());
    }
}
