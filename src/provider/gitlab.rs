//! GitLab candidate source.
//!
//! Same shape as the GitHub source, but GitLab addresses projects by a
//! URL-encoded path and its bare tags carry commit dates.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;

use crate::http::HttpClient;
use crate::release::{Candidate, ReleaseAsset};

use super::{CandidateSource, ProviderKind, RepoId};

pub const DEFAULT_API_URL: &str = "https://gitlab.com";

const PER_PAGE: &str = "100";
const MAX_PAGES: u32 = 20;

/// GitLab API response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Release {
        pub tag_name: String,
        pub released_at: Option<String>,
        #[serde(default)]
        pub upcoming_release: bool,
        #[serde(default)]
        pub assets: Assets,
    }

    #[derive(Deserialize, Debug, Default)]
    pub struct Assets {
        #[serde(default)]
        pub links: Vec<Link>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Link {
        pub name: String,
        pub url: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct Tag {
        pub name: String,
        pub commit: Option<Commit>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Commit {
        pub committed_date: Option<String>,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Releases,
    Tags,
    Exhausted,
}

/// Streams candidates from the GitLab REST API.
pub struct GitLabSource {
    http_client: HttpClient,
    api_url: String,
    repo: RepoId,
    phase: Phase,
    page: u32,
}

impl GitLabSource {
    pub fn new(http_client: HttpClient, repo: RepoId, api_url: impl Into<String>) -> Self {
        Self {
            http_client,
            api_url: api_url.into(),
            repo,
            phase: Phase::Releases,
            page: 1,
        }
    }

    /// Project path in the URL-encoded `owner%2Frepo` form GitLab expects.
    fn project_path(&self) -> String {
        format!("{}%2F{}", self.repo.owner, self.repo.repo)
    }

    async fn fetch_releases(&self) -> Result<Vec<api::Release>> {
        let url = format!(
            "{}/api/v4/projects/{}/releases",
            self.api_url,
            self.project_path()
        );
        debug!("Fetching releases page {} from {}...", self.page, url);
        self.http_client
            .get_json_with_query(&url, &[("per_page", PER_PAGE), ("page", &self.page.to_string())])
            .await
    }

    async fn fetch_tags(&self) -> Result<Vec<api::Tag>> {
        let url = format!(
            "{}/api/v4/projects/{}/repository/tags",
            self.api_url,
            self.project_path()
        );
        debug!("Fetching tags page {} from {}...", self.page, url);
        self.http_client
            .get_json_with_query(&url, &[("per_page", PER_PAGE), ("page", &self.page.to_string())])
            .await
    }
}

#[async_trait]
impl CandidateSource for GitLabSource {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitLab
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
            date: release.released_at.as_deref().and_then(parse_timestamp),
            assets: release
                .assets
                .links
                .into_iter()
                .map(|link| ReleaseAsset {
                    name: link.name,
                    download_url: link.url,
                })
                .collect(),
            formal: true,
            provider_prerelease: Some(release.upcoming_release),
        }
    }
}

impl From<api::Tag> for Candidate {
    fn from(tag: api::Tag) -> Self {
        let date = tag
            .commit
            .and_then(|commit| commit.committed_date)
            .as_deref()
            .and_then(parse_timestamp);
        Candidate {
            tag: tag.name,
            date,
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
