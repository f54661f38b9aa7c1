//! Followers listing.

use crate::error::FetchError;
use crate::github::client::GitHubClient;
use crate::models::{Follower, RateLimitInfo};
use crate::pipeline::{Fetched, FollowerSource, FollowersRequest};
use async_trait::async_trait;
use tracing::{debug, info, warn};

impl GitHubClient {
    /// First page of the followers listing for `request`.
    ///
    /// Without a username the authenticated user's followers are listed.
    pub fn followers_url(&self, request: &FollowersRequest) -> Option<String> {
        let api = &self.config.api_url;
        let per_page = self.config.per_page;

        match (&request.username, &request.token) {
            (Some(username), _) => Some(format!(
                "{}/users/{}/followers?per_page={}",
                api,
                urlencoding::encode(username),
                per_page
            )),
            (None, Some(_)) => Some(format!("{}/user/followers?per_page={}", api, per_page)),
            (None, None) => None,
        }
    }
}

#[async_trait]
impl FollowerSource for GitHubClient {
    async fn fetch_followers(&self, request: &FollowersRequest) -> Fetched<Vec<Follower>> {
        let Some(first) = self.followers_url(request) else {
            return Fetched::err(
                FetchError::new(401, "A username or an access token is required"),
                None,
            );
        };

        info!(
            "Fetching followers of {}",
            request.username.as_deref().unwrap_or("the authenticated user")
        );

        let mut followers = Vec::new();
        let mut latest: Option<RateLimitInfo> = None;
        let mut next = Some(first);
        let mut pages = 0;

        while let Some(url) = next.take() {
            let page = self
                .get_json::<Vec<Follower>>(&url, &request.user_agent, request.token.as_deref())
                .await;
            if page.rate_limit.is_some() {
                latest = page.rate_limit;
            }

            match page.result {
                Ok((batch, link)) => {
                    pages += 1;
                    debug!("Followers page {}: {} entries", pages, batch.len());
                    followers.extend(batch);
                    match link {
                        Some(link) if !self.is_api_url(&link) => {
                            warn!("Refusing to follow pagination link {}", link);
                            return Fetched::err(
                                FetchError::new(
                                    502,
                                    format!("Pagination link points outside {}", self.config.api_url),
                                ),
                                latest,
                            );
                        }
                        link => next = link,
                    }
                }
                Err(error) => return Fetched::err(error, latest),
            }
        }

        Fetched::ok(followers, latest)
    }
}
