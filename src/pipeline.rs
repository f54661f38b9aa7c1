//! Ranking pipeline.
//!
//! Fetches a user's followers, fetches each follower's details, then runs
//! the analysis. The two fetches are sequential: the detail request needs
//! the identities returned by the follower request. Whichever rate limit
//! info was seen last is returned on every exit path.

use crate::analysis::{analyze, AnalysisConfig, AnalysisResult, ScoreMethod, SortOrder};
use crate::error::{ConfigError, FetchError};
use crate::models::{DetailsResponse, Follower, RateLimitInfo, UserDetails};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// User agent sent when the caller does not supply one.
pub const DEFAULT_USER_AGENT: &str = concat!("follower-rank/", env!("CARGO_PKG_VERSION"));

/// Request for a followers listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowersRequest {
    /// Whose followers to list. `None` lists the token owner's followers.
    pub username: Option<String>,
    pub token: Option<String>,
    pub user_agent: String,
}

/// Request for the details of a set of accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsRequest {
    pub logins: Vec<String>,
    pub user_agent: String,
    pub token: Option<String>,
}

/// Outcome of a fetch, with whatever rate limit info came along with it.
///
/// Rate limit info may accompany failures as well as successes.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub result: Result<T, FetchError>,
    pub rate_limit: Option<RateLimitInfo>,
}

impl<T> Fetched<T> {
    pub fn ok(value: T, rate_limit: Option<RateLimitInfo>) -> Self {
        Self {
            result: Ok(value),
            rate_limit,
        }
    }

    pub fn err(error: FetchError, rate_limit: Option<RateLimitInfo>) -> Self {
        Self {
            result: Err(error),
            rate_limit,
        }
    }
}

/// Lists the followers of an account.
#[async_trait]
pub trait FollowerSource: Send + Sync {
    async fn fetch_followers(&self, request: &FollowersRequest) -> Fetched<Vec<Follower>>;
}

/// Looks up the details of a set of accounts.
///
/// Implementations report per-account failures in the response's `meta`
/// and `failures` rather than dropping them.
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn fetch_details(&self, request: &DetailsRequest) -> Fetched<DetailsResponse>;
}

/// Options for a ranking run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankOptions {
    /// Access token. Without a username, the token owner's followers are ranked.
    pub token: Option<String>,
    pub username: Option<String>,
    pub user_agent: String,
    pub method: ScoreMethod,
    pub order: SortOrder,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            token: None,
            username: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            method: ScoreMethod::default(),
            order: SortOrder::default(),
        }
    }
}

impl RankOptions {
    /// Rank the followers of `username`.
    pub fn for_username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }

    /// Rank the followers of the account owning `token`.
    pub fn for_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: ScoreMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Check the options before any request is made.
    ///
    /// Blank strings count as absent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if non_blank(&self.token).is_none() && non_blank(&self.username).is_none() {
            return Err(ConfigError::MissingIdentity);
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::EmptyUserAgent);
        }
        Ok(())
    }

    pub fn analysis(&self) -> AnalysisConfig {
        AnalysisConfig::new(self.method, self.order)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Where a run currently is.
#[derive(Debug)]
pub enum Stage {
    FetchingFollowers,
    FetchingDetails(Vec<String>),
    Analyzing(IndexMap<String, UserDetails>),
    Done(AnalysisResult),
    Failed(FetchError),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::FetchingFollowers => "fetching_followers",
            Stage::FetchingDetails(_) => "fetching_details",
            Stage::Analyzing(_) => "analyzing",
            Stage::Done(_) => "done",
            Stage::Failed(_) => "failed",
        }
    }
}

/// Final outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RankOutput {
    pub result: Result<AnalysisResult, FetchError>,
    /// Latest rate limit info seen by either fetch, if any.
    pub rate_limit: Option<RateLimitInfo>,
}

impl RankOutput {
    /// Split into `(error, analysis, rate_limit)`; exactly one of the first
    /// two is present.
    pub fn into_parts(
        self,
    ) -> (
        Option<FetchError>,
        Option<AnalysisResult>,
        Option<RateLimitInfo>,
    ) {
        match self.result {
            Ok(analysis) => (None, Some(analysis), self.rate_limit),
            Err(error) => (Some(error), None, self.rate_limit),
        }
    }
}

/// Ranks the followers of one account.
///
/// Holds no state between runs; a ranker may be run any number of times,
/// including concurrently.
pub struct Ranker {
    options: RankOptions,
    followers: Arc<dyn FollowerSource>,
    details: Arc<dyn DetailSource>,
}

impl Ranker {
    /// Validate `options` and build a ranker. Makes no requests.
    pub fn new(
        options: RankOptions,
        followers: Arc<dyn FollowerSource>,
        details: Arc<dyn DetailSource>,
    ) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            options,
            followers,
            details,
        })
    }

    pub fn options(&self) -> &RankOptions {
        &self.options
    }

    /// Run the pipeline to completion or to the first failure.
    pub async fn run(&self) -> RankOutput {
        let mut latest: Option<RateLimitInfo> = None;
        let mut stage = Stage::FetchingFollowers;

        loop {
            debug!("Pipeline stage: {}", stage.name());
            stage = match stage {
                Stage::Done(analysis) => {
                    return RankOutput {
                        result: Ok(analysis),
                        rate_limit: latest,
                    };
                }
                Stage::Failed(error) => {
                    warn!("Ranking failed: {}", error);
                    return RankOutput {
                        result: Err(error),
                        rate_limit: latest,
                    };
                }
                other => self.step(other, &mut latest).await,
            };
        }
    }

    /// Run the pipeline and hand the outcome to `callback`.
    pub async fn run_with<F>(&self, callback: F)
    where
        F: FnOnce(Option<FetchError>, Option<AnalysisResult>, Option<RateLimitInfo>),
    {
        let (error, analysis, rate_limit) = self.run().await.into_parts();
        callback(error, analysis, rate_limit);
    }

    async fn step(&self, stage: Stage, latest: &mut Option<RateLimitInfo>) -> Stage {
        match stage {
            Stage::FetchingFollowers => {
                let request = FollowersRequest {
                    username: non_blank(&self.options.username).map(String::from),
                    token: non_blank(&self.options.token).map(String::from),
                    user_agent: self.options.user_agent.clone(),
                };
                let fetched = self.followers.fetch_followers(&request).await;
                observe(latest, fetched.rate_limit);

                match fetched.result {
                    Ok(followers) => {
                        info!("Fetched {} followers", followers.len());
                        Stage::FetchingDetails(followers.into_iter().map(|f| f.login).collect())
                    }
                    Err(error) => Stage::Failed(error),
                }
            }
            Stage::FetchingDetails(logins) => {
                let request = DetailsRequest {
                    logins,
                    user_agent: self.options.user_agent.clone(),
                    token: non_blank(&self.options.token).map(String::from),
                };
                let fetched = self.details.fetch_details(&request).await;
                observe(latest, fetched.rate_limit);

                match fetched.result {
                    Ok(response) if response.meta.failure > 0 => {
                        Stage::Failed(FetchError::throttled(format!(
                            "unable to fetch details for {} of {} users. Rate limit may be exceeded.",
                            response.meta.failure, response.meta.total
                        )))
                    }
                    Ok(response) => {
                        info!("Fetched details for {} users", response.meta.success);
                        Stage::Analyzing(response.data)
                    }
                    Err(error) => Stage::Failed(error),
                }
            }
            Stage::Analyzing(data) => Stage::Done(analyze(&self.options.analysis(), data)),
            terminal => terminal,
        }
    }
}

/// Replace the latest rate limit info when a new value arrived.
fn observe(latest: &mut Option<RateLimitInfo>, info: Option<RateLimitInfo>) {
    if let Some(info) = info {
        debug!("Rate limit: {}", info);
        *latest = Some(info);
    }
}

/// Rank followers and report through a callback.
///
/// Options are validated immediately, so a configuration error is returned
/// before any request is made. The returned future invokes `callback`
/// exactly once with `(error, analysis, rate_limit)`.
pub fn rank<F>(
    options: RankOptions,
    followers: Arc<dyn FollowerSource>,
    details: Arc<dyn DetailSource>,
    callback: F,
) -> Result<impl Future<Output = ()> + Send, ConfigError>
where
    F: FnOnce(Option<FetchError>, Option<AnalysisResult>, Option<RateLimitInfo>) + Send + 'static,
{
    let ranker = Ranker::new(options, followers, details)?;
    Ok(async move { ranker.run_with(callback).await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DetailsMeta, FetchFailure};
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    struct FakeFollowers {
        response: Fetched<Vec<Follower>>,
        requests: Mutex<Vec<FollowersRequest>>,
    }

    impl FakeFollowers {
        fn new(response: Fetched<Vec<Follower>>) -> Arc<Self> {
            Arc::new(Self {
                response,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<FollowersRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FollowerSource for FakeFollowers {
        async fn fetch_followers(&self, request: &FollowersRequest) -> Fetched<Vec<Follower>> {
            self.requests.lock().unwrap().push(request.clone());
            tokio::task::yield_now().await;
            self.response.clone()
        }
    }

    struct FakeDetails {
        response: Fetched<DetailsResponse>,
        requests: Mutex<Vec<DetailsRequest>>,
    }

    impl FakeDetails {
        fn new(response: Fetched<DetailsResponse>) -> Arc<Self> {
            Arc::new(Self {
                response,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<DetailsRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DetailSource for FakeDetails {
        async fn fetch_details(&self, request: &DetailsRequest) -> Fetched<DetailsResponse> {
            self.requests.lock().unwrap().push(request.clone());
            tokio::task::yield_now().await;
            self.response.clone()
        }
    }

    fn info(remaining: u64) -> RateLimitInfo {
        RateLimitInfo {
            limit: 5000,
            remaining,
            reset: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    fn account(login: &str, followers: u64, following: u64, year: i32) -> UserDetails {
        UserDetails {
            login: login.to_string(),
            followers,
            following,
            created_at: Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
            ..Default::default()
        }
    }

    fn followers() -> Vec<Follower> {
        vec![Follower::new("x"), Follower::new("y")]
    }

    fn details() -> DetailsResponse {
        DetailsResponse::from_records(vec![account("x", 10, 5, 2020), account("y", 3, 6, 2015)])
    }

    fn options() -> RankOptions {
        RankOptions::for_username("beep")
            .with_user_agent("beep-boop-bop")
            .with_method(ScoreMethod::FfRatio)
    }

    fn ranker(
        options: RankOptions,
        followers: &Arc<FakeFollowers>,
        details: &Arc<FakeDetails>,
    ) -> Ranker {
        Ranker::new(options, followers.clone(), details.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_followers_error_is_returned() {
        let f = FakeFollowers::new(Fetched::err(FetchError::new(404, "beep"), None));
        let d = FakeDetails::new(Fetched::ok(details(), None));

        let (error, data, rate_limit) = ranker(options(), &f, &d).run().await.into_parts();

        let error = error.unwrap();
        assert_eq!(error.status, 404);
        assert_eq!(error.message, "beep");
        assert!(data.is_none());
        assert!(rate_limit.is_none());
        assert!(d.calls().is_empty());
    }

    #[tokio::test]
    async fn test_followers_error_keeps_rate_limit() {
        let f = FakeFollowers::new(Fetched::err(FetchError::new(404, "beep"), Some(info(10))));
        let d = FakeDetails::new(Fetched::ok(details(), None));

        let output = ranker(options(), &f, &d).run().await;

        assert_eq!(output.result, Err(FetchError::new(404, "beep")));
        assert_eq!(output.rate_limit, Some(info(10)));
    }

    #[tokio::test]
    async fn test_details_error_keeps_previous_rate_limit() {
        let f = FakeFollowers::new(Fetched::ok(followers(), Some(info(20))));
        let d = FakeDetails::new(Fetched::err(FetchError::new(404, "beep"), None));

        let output = ranker(options(), &f, &d).run().await;

        assert_eq!(output.result, Err(FetchError::new(404, "beep")));
        assert_eq!(output.rate_limit, Some(info(20)));
    }

    #[tokio::test]
    async fn test_details_error_overwrites_rate_limit() {
        let f = FakeFollowers::new(Fetched::ok(followers(), Some(info(20))));
        let d = FakeDetails::new(Fetched::err(FetchError::new(404, "beep"), Some(info(3))));

        let (error, data, rate_limit) = ranker(options(), &f, &d).run().await.into_parts();

        assert_eq!(error.map(|e| e.status), Some(404));
        assert!(data.is_none());
        assert_eq!(rate_limit, Some(info(3)));
    }

    #[tokio::test]
    async fn test_partial_details_failure_is_throttling() {
        let mut response = details();
        response.data.shift_remove("y");
        response.meta = DetailsMeta {
            total: 2,
            success: 1,
            failure: 1,
        };
        response.failures.insert(
            "y".to_string(),
            FetchFailure {
                status: 403,
                message: "API rate limit exceeded".to_string(),
            },
        );
        let f = FakeFollowers::new(Fetched::ok(followers(), Some(info(20))));
        let d = FakeDetails::new(Fetched::ok(response, Some(info(0))));

        let output = ranker(options(), &f, &d).run().await;

        let error = output.result.unwrap_err();
        assert_eq!(error.status, 429);
        assert!(error.is_rate_limited());
        assert!(error.message.contains("1 of 2"));
        assert_eq!(output.rate_limit, Some(info(0)));
    }

    #[tokio::test]
    async fn test_success_returns_analysis() {
        let f = FakeFollowers::new(Fetched::ok(followers(), Some(info(20))));
        let d = FakeDetails::new(Fetched::ok(details(), Some(info(18))));

        let output = ranker(options(), &f, &d).run().await;

        let analysis = output.result.unwrap();
        let logins: Vec<_> = analysis.data.iter().map(|r| r.login.as_str()).collect();
        assert_eq!(logins, vec!["x", "y"]);
        assert_eq!(analysis.results, vec![2.0, 0.5]);
        assert_eq!(output.rate_limit, Some(info(18)));
    }

    #[tokio::test]
    async fn test_success_without_rate_limit() {
        let f = FakeFollowers::new(Fetched::ok(followers(), None));
        let d = FakeDetails::new(Fetched::ok(details(), None));

        let output = ranker(options(), &f, &d).run().await;

        assert!(output.result.is_ok());
        assert_eq!(output.rate_limit, None);
    }

    #[tokio::test]
    async fn test_created_oldest_first() {
        let f = FakeFollowers::new(Fetched::ok(followers(), None));
        let d = FakeDetails::new(Fetched::ok(details(), None));
        let opts = options().with_method(ScoreMethod::Created).with_order(SortOrder::Desc);

        let analysis = ranker(opts, &f, &d).run().await.result.unwrap();

        // y was created in 2015, x in 2020
        assert_eq!(analysis.data[0].login, "y");
        assert_eq!(analysis.data[1].login, "x");
    }

    #[tokio::test]
    async fn test_requests_carry_identities_and_token() {
        let f = FakeFollowers::new(Fetched::ok(followers(), None));
        let d = FakeDetails::new(Fetched::ok(details(), None));
        let mut opts = options();
        opts.token = Some("abc".to_string());

        ranker(opts, &f, &d).run().await;

        let follower_calls = f.calls();
        assert_eq!(follower_calls.len(), 1);
        assert_eq!(follower_calls[0].username.as_deref(), Some("beep"));
        assert_eq!(follower_calls[0].token.as_deref(), Some("abc"));
        assert_eq!(follower_calls[0].user_agent, "beep-boop-bop");

        let detail_calls = d.calls();
        assert_eq!(detail_calls.len(), 1);
        assert_eq!(detail_calls[0].logins, vec!["x", "y"]);
        assert_eq!(detail_calls[0].token.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_requests_without_token() {
        let f = FakeFollowers::new(Fetched::ok(followers(), None));
        let d = FakeDetails::new(Fetched::ok(details(), None));

        let output = ranker(options(), &f, &d).run().await;

        assert!(output.result.is_ok());
        assert_eq!(d.calls()[0].token, None);
    }

    #[test]
    fn test_missing_identity_is_rejected() {
        let f = FakeFollowers::new(Fetched::ok(followers(), None));
        let d = FakeDetails::new(Fetched::ok(details(), None));

        let result = Ranker::new(RankOptions::default(), f.clone(), d.clone());
        assert!(matches!(result, Err(ConfigError::MissingIdentity)));

        let mut blank = RankOptions::for_username("  ");
        blank.token = Some(String::new());
        assert_eq!(blank.validate(), Err(ConfigError::MissingIdentity));

        assert!(f.calls().is_empty());
        assert!(d.calls().is_empty());
    }

    #[test]
    fn test_empty_user_agent_is_rejected() {
        let opts = RankOptions::for_token("abc").with_user_agent("");
        assert_eq!(opts.validate(), Err(ConfigError::EmptyUserAgent));
    }

    #[test]
    fn test_rank_callback_invoked_once() {
        let f = FakeFollowers::new(Fetched::ok(followers(), Some(info(7))));
        let d = FakeDetails::new(Fetched::ok(details(), None));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();

        let future = rank(options(), f, d, move |error, analysis, rate_limit| {
            sink.lock().unwrap().push((error, analysis, rate_limit));
        })
        .unwrap();
        tokio_test::block_on(future);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (error, analysis, rate_limit) = &calls[0];
        assert!(error.is_none());
        assert_eq!(analysis.as_ref().map(|a| a.results.clone()), Some(vec![2.0, 0.5]));
        assert_eq!(rate_limit.as_ref(), Some(&info(7)));
    }

    #[test]
    fn test_rank_rejects_before_fetching() {
        let f = FakeFollowers::new(Fetched::ok(followers(), None));
        let d = FakeDetails::new(Fetched::ok(details(), None));

        let result = rank(RankOptions::default(), f.clone(), d, |_, _, _| {});
        assert!(matches!(result, Err(ConfigError::MissingIdentity)));
        assert!(f.calls().is_empty());
    }

    #[tokio::test]
    async fn test_independent_runs_do_not_interfere() {
        let f1 = FakeFollowers::new(Fetched::ok(followers(), Some(info(1))));
        let d1 = FakeDetails::new(Fetched::ok(details(), None));
        let f2 = FakeFollowers::new(Fetched::err(FetchError::new(500, "down"), Some(info(2))));
        let d2 = FakeDetails::new(Fetched::ok(details(), None));

        let a = ranker(options(), &f1, &d1);
        let b = ranker(options(), &f2, &d2);
        let (out_a, out_b) = tokio::join!(a.run(), b.run());

        assert!(out_a.result.is_ok());
        assert_eq!(out_a.rate_limit, Some(info(1)));
        assert_eq!(out_b.result, Err(FetchError::new(500, "down")));
        assert_eq!(out_b.rate_limit, Some(info(2)));
    }
}
