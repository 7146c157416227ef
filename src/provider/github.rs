//! GitHub candidate source.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;

use crate::http::HttpClient;
use crate::release::{Candidate, ReleaseAsset};

use super::{CandidateSource, ProviderKind, RepoId};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const PER_PAGE: &str = "100";

/// Pagination guard per phase; the selector's staleness window is the
/// primary bound on how deep a scan goes.
const MAX_PAGES: u32 = 20;

/// GitHub API response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Release {
        pub tag_name: String,
        pub published_at: Option<String>,
        #[serde(default)]
        pub prerelease: bool,
        #[serde(default)]
        pub assets: Vec<Asset>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Asset {
        pub name: String,
        pub browser_download_url: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct Tag {
        pub name: String,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Releases,
    Tags,
    Exhausted,
}

/// Streams candidates from the GitHub REST API: formal releases first,
/// falling back to bare tags when the repository has no releases at all.
pub struct GitHubSource {
    http_client: HttpClient,
    api_url: String,
    repo: RepoId,
    phase: Phase,
    page: u32,
}

impl GitHubSource {
    pub fn new(http_client: HttpClient, repo: RepoId, api_url: impl Into<String>) -> Self {
        Self {
            http_client,
            api_url: api_url.into(),
            repo,
            phase: Phase::Releases,
            page: 1,
        }
    }

    async fn fetch_releases(&self) -> Result<Vec<api::Release>> {
        let url = format!(
            "{}/repos/{}/{}/releases",
            self.api_url, self.repo.owner, self.repo.repo
        );
        debug!("Fetching releases page {} from {}...", self.page, url);
        self.http_client
            .get_json_with_query(&url, &[("per_page", PER_PAGE), ("page", &self.page.to_string())])
            .await
    }

    async fn fetch_tags(&self) -> Result<Vec<api::Tag>> {
        let url = format!(
            "{}/repos/{}/{}/tags",
            self.api_url, self.repo.owner, self.repo.repo
        );
        debug!("Fetching tags page {} from {}...", self.page, url);
        self.http_client
            .get_json_with_query(&url, &[("per_page", PER_PAGE), ("page", &self.page.to_string())])
            .await
    }
}

#[async_trait]
impl CandidateSource for GitHubSource {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    async fn next_batch(&mut self) -> Result<Vec<Candidate>> {
        loop {
            match self.phase {
                Phase::Releases => {
                    if self.page > MAX_PAGES {
                        self.phase = Phase::Exhausted;
                        continue;
                    }
                    let releases = self.fetch_releases().await?;
                    if releases.is_empty() {
                        if self.page == 1 {
                            // No formal releases at all: scan bare tags.
                            debug!("No formal releases for {}, trying tags", self.repo);
                            self.phase = Phase::Tags;
                            continue;
                        }
                        self.phase = Phase::Exhausted;
                        continue;
                    }
                    self.page += 1;
                    return Ok(releases.into_iter().map(Candidate::from).collect());
                }
                Phase::Tags => {
                    if self.page > MAX_PAGES {
                        self.phase = Phase::Exhausted;
                        continue;
                    }
                    let tags = self.fetch_tags().await?;
                    if tags.is_empty() {
                        self.phase = Phase::Exhausted;
                        continue;
                    }
                    self.page += 1;
                    return Ok(tags.into_iter().map(Candidate::from).collect());
                }
                Phase::Exhausted => return Ok(Vec::new()),
            }
        }
    }
}

impl From<api::Release> for Candidate {
    fn from(release: api::Release) -> Self {
        Candidate {
            tag: release.tag_name,
            date: release.published_at.as_deref().and_then(parse_timestamp),
            assets: release
                .assets
                .into_iter()
                .map(|a| ReleaseAsset {
                    name: a.name,
                    download_url: a.browser_download_url,
                })
                .collect(),
            formal: true,
            provider_prerelease: Some(release.prerelease),
        }
    }
}

impl From<api::Tag> for Candidate {
    fn from(tag: api::Tag) -> Self {
        Candidate {
            tag: tag.name,
            date: None,
            assets: Vec::new(),
            formal: false,
            provider_prerelease: None,
        }
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;

    fn source(api_url: &str) -> GitHubSource {
        GitHubSource::new(
            HttpClient::new(Client::new()),
            "owner/repo".parse().unwrap(),
            api_url,
        )
    }

    #[test]
    fn test_kind() {
        assert_eq!(source(DEFAULT_API_URL).kind(), ProviderKind::GitHub);
    }

    #[test]
    fn test_release_conversion() {
        let release = api::Release {
            tag_name: "v1.0.0".into(),
            published_at: Some("2024-01-01T00:00:00Z".into()),
            prerelease: false,
            assets: vec![api::Asset {
                name: "tool-linux-amd64.tar.gz".into(),
                browser_download_url: "https://example.com/asset".into(),
            }],
        };

        let candidate: Candidate = release.into();
        assert_eq!(candidate.tag, "v1.0.0");
        assert!(candidate.formal);
        assert_eq!(candidate.provider_prerelease, Some(false));
        assert!(candidate.date.is_some());
        assert_eq!(candidate.assets.len(), 1);
        assert_eq!(candidate.assets[0].name, "tool-linux-amd64.tar.gz");
    }

    #[test]
    fn test_tag_conversion() {
        let tag = api::Tag {
            name: "v0.3.0".into(),
        };
        let candidate: Candidate = tag.into();
        assert_eq!(candidate.tag, "v0.3.0");
        assert!(!candidate.formal);
        assert_eq!(candidate.provider_prerelease, None);
        assert!(candidate.date.is_none());
    }

    #[test]
    fn test_bad_timestamp_is_dropped() {
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("2024-01-01T00:00:00Z").is_some());
    }

    #[tokio::test]
    async fn test_streams_release_pages() {
        let mut server = mockito::Server::new_async().await;

        let page1 = server
            .mock("GET", "/repos/owner/repo/releases?per_page=100&page=1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"tag_name": "v1.1.0", "prerelease": false, "assets": []}]"#)
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/repos/owner/repo/releases?per_page=100&page=2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let mut source = source(&server.url());
        let batch = source.next_batch().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].tag, "v1.1.0");

        let batch = source.next_batch().await.unwrap();
        assert!(batch.is_empty());

        // Exhausted sources stay exhausted without further requests.
        let batch = source.next_batch().await.unwrap();
        assert!(batch.is_empty());

        page1.assert_async().await;
        page2.assert_async().await;
    }

    #[tokio::test]
    async fn test_falls_back_to_tags_without_releases() {
        let mut server = mockito::Server::new_async().await;

        let releases = server
            .mock("GET", "/repos/owner/repo/releases?per_page=100&page=1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;
        let tags = server
            .mock("GET", "/repos/owner/repo/tags?per_page=100&page=1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name": "v0.9.0"}]"#)
            .create_async()
            .await;

        let mut source = source(&server.url());
        let batch = source.next_batch().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].tag, "v0.9.0");
        assert!(!batch[0].formal);

        releases.assert_async().await;
        tags.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_repo_surfaces_error() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/owner/repo/releases?per_page=100&page=1")
            .with_status(404)
            .create_async()
            .await;

        let mut source = source(&server.url());
        assert!(source.next_batch().await.is_err());
        mock.assert_async().await;
    }
}
