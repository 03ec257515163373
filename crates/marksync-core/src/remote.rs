//! Remote bookmark service
//!
//! The remote holds the authoritative bookmark set per user. Its API is
//! deliberately coarse: fetch the whole set, or replace it. A failed fetch
//! is reported as an empty set, which the sync engine disambiguates with
//! its bootstrap rule.
//!
//! ## HTTP protocol
//!
//! - `GET  {base}/users/{user_id}/bookmarks` -> `["id", ...]`
//! - `PUT  {base}/users/{user_id}/bookmarks` with body `["id", ...]`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, warn};

use crate::models::{BookmarkId, BookmarkSet};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of truth for a user's bookmarks
#[async_trait]
pub trait RemoteBookmarkService: Send + Sync {
    /// Fetch the user's bookmarks. Returns an empty list on any failure.
    async fn fetch(&self, user_id: &str) -> Vec<BookmarkId>;

    /// Replace the user's bookmarks. Returns `true` only on confirmed success.
    async fn push(&self, user_id: &str, ids: &BookmarkSet) -> bool;
}

/// HTTP implementation of the remote bookmark service
#[derive(Debug, Clone)]
pub struct HttpRemote {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemote {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("marksync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Bookmark collection URL for a user (user id is percent-encoded)
    pub fn endpoint(&self, user_id: &str) -> Option<Url> {
        let mut url = Url::parse(&self.base_url).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["users", user_id, "bookmarks"]);
        Some(url)
    }

    async fn try_fetch(&self, user_id: &str) -> anyhow::Result<Vec<BookmarkId>> {
        let url = self
            .endpoint(user_id)
            .ok_or_else(|| anyhow::anyhow!("Invalid remote URL: {}", self.base_url))?;

        let response = self.client.get(url).send().await?.error_for_status()?;
        let ids: Vec<BookmarkId> = response.json().await?;
        Ok(ids)
    }

    async fn try_push(&self, user_id: &str, ids: &BookmarkSet) -> anyhow::Result<()> {
        let url = self
            .endpoint(user_id)
            .ok_or_else(|| anyhow::anyhow!("Invalid remote URL: {}", self.base_url))?;

        self.client
            .put(url)
            .json(ids)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl RemoteBookmarkService for HttpRemote {
    async fn fetch(&self, user_id: &str) -> Vec<BookmarkId> {
        match self.try_fetch(user_id).await {
            Ok(ids) => {
                debug!("Fetched {} remote bookmarks", ids.len());
                ids
            }
            Err(e) => {
                warn!("Remote bookmark fetch failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn push(&self, user_id: &str, ids: &BookmarkSet) -> bool {
        match self.try_push(user_id, ids).await {
            Ok(()) => {
                debug!("Pushed {} bookmarks to remote", ids.len());
                true
            }
            Err(e) => {
                warn!("Remote bookmark push failed: {}", e);
                false
            }
        }
    }
}

/// Stand-in used when no remote service is configured
///
/// Every fetch is empty and every push fails, so mutations stay queued
/// until a real remote is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemote;

#[async_trait]
impl RemoteBookmarkService for OfflineRemote {
    async fn fetch(&self, _user_id: &str) -> Vec<BookmarkId> {
        Vec::new()
    }

    async fn push(&self, _user_id: &str, _ids: &BookmarkSet) -> bool {
        false
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let remote = HttpRemote::new("https://api.example.com/v1/", DEFAULT_TIMEOUT).unwrap();

        let url = remote.endpoint("user-1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/users/user-1/bookmarks"
        );
    }

    #[test]
    fn test_endpoint_encodes_user_id() {
        let remote = HttpRemote::new("https://api.example.com", DEFAULT_TIMEOUT).unwrap();

        let url = remote.endpoint("a/b c").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/users/a%2Fb%20c/bookmarks"
        );
    }

    #[test]
    fn test_endpoint_invalid_base() {
        let remote = HttpRemote::new("not a url", DEFAULT_TIMEOUT).unwrap();
        assert!(remote.endpoint("u").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_remote_degrades() {
        // Port 1 on loopback refuses connections
        let remote = HttpRemote::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();

        assert!(remote.fetch("u").await.is_empty());
        let ids: BookmarkSet = ["a"].into_iter().collect();
        assert!(!remote.push("u", &ids).await);
    }

    #[tokio::test]
    async fn test_offline_remote() {
        let remote = OfflineRemote;
        assert!(remote.fetch("u").await.is_empty());
        assert!(!remote.push("u", &BookmarkSet::new()).await);
    }
}
