//! Account detail lookups.

use crate::github::client::GitHubClient;
use crate::models::{DetailsResponse, FetchFailure, RateLimitInfo, UserDetails};
use crate::pipeline::{DetailSource, DetailsRequest, Fetched};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use indexmap::IndexSet;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

impl GitHubClient {
    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.config.show_progress || len == 0 {
            return None;
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} users")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    }
}

#[async_trait]
impl DetailSource for GitHubClient {
    async fn fetch_details(&self, request: &DetailsRequest) -> Fetched<DetailsResponse> {
        // Each account is looked up once; `meta.total` counts distinct logins,
        // so it always equals `success + failure`.
        let logins: IndexSet<String> = request.logins.iter().cloned().collect();
        if logins.len() < request.logins.len() {
            debug!(
                "Skipping {} duplicate logins",
                request.logins.len() - logins.len()
            );
        }
        info!("Fetching details for {} users", logins.len());

        let progress = self.progress_bar(logins.len());
        let progress = &progress;

        // `buffered` yields in request order, keeping the map in follower order.
        let lookups: Vec<(String, Fetched<UserDetails>)> =
            stream::iter(logins)
                .map(|login| async move {
                    let url = self.user_url(&login);
                    let fetched = self
                        .get_json::<UserDetails>(&url, &request.user_agent, request.token.as_deref())
                        .await;
                    if let Some(pb) = progress {
                        pb.inc(1);
                    }
                    let fetched = Fetched {
                        result: fetched.result.map(|(details, _)| details),
                        rate_limit: fetched.rate_limit,
                    };
                    (login, fetched)
                })
                .buffered(self.config.concurrency)
                .collect()
                .await;

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        let mut response = DetailsResponse::default();
        response.meta.total = lookups.len();
        let mut rate_limit: Option<RateLimitInfo> = None;

        for (login, fetched) in lookups {
            rate_limit = most_consumed(rate_limit, fetched.rate_limit);
            match fetched.result {
                Ok(details) => {
                    response.data.insert(login, details);
                }
                Err(error) => {
                    warn!("Failed to fetch details for {}: {}", login, error);
                    response.failures.insert(
                        login,
                        FetchFailure {
                            status: error.status,
                            message: error.message,
                        },
                    );
                }
            }
        }

        response.meta.success = response.data.len();
        response.meta.failure = response.failures.len();

        Fetched::ok(response, rate_limit)
    }
}

/// Of two observations, keep the one with the fewest remaining requests.
fn most_consumed(
    current: Option<RateLimitInfo>,
    observed: Option<RateLimitInfo>,
) -> Option<RateLimitInfo> {
    match (current, observed) {
        (Some(current), Some(observed)) => {
            if observed.remaining <= current.remaining {
                Some(observed)
            } else {
                Some(current)
            }
        }
        (current, None) => current,
        (None, observed) => observed,
    }
}
