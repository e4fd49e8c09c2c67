//! Vulnerability feed resolution.
//!
//! A [`VulnerabilityResolver`] maps feed identifiers (CPE strings) to a risk
//! score. Resolution is best effort: identifiers the feed does not know are
//! simply missing from the result, and any failure of the feed itself is
//! turned into "no data" by [`resolve_or_empty`] so that network construction
//! falls back to random scores instead of failing.

pub mod table;

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use table::TableFeedResolver;

/// Score given to identifiers the feed has no entry for, so that a node whose
/// identifiers are all unknown is not treated as invulnerable.
pub const UNKNOWN_IDENTIFIER_SCORE: f64 = 0.01;

/// Default time allowed for a feed query.
pub const DEFAULT_FEED_TIMEOUT: Duration = Duration::from_secs(10);

/// Failures of a vulnerability feed. Always recovered locally.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Vulnerability feed unavailable: {0}")]
    Unavailable(String),

    #[error("Vulnerability feed did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Vulnerability feed returned malformed data: {0}")]
    Malformed(String),
}

/// Source of vulnerability scores keyed by feed identifier.
pub trait VulnerabilityResolver: Send + Sync {
    /// Name used in log messages.
    fn name(&self) -> &str;

    /// Scores for the identifiers the feed knows about.
    fn resolve(&self, identifiers: &BTreeSet<String>) -> Result<HashMap<String, f64>, ResolveError>;
}

/// Connection settings for a feed, injected by the caller.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSettings {
    /// Where the feed lives. For [`TableFeedResolver`] this is the path of
    /// an exported feed table.
    pub endpoint: String,
    /// Access token or password for feeds that need one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// Only keep identifiers containing this substring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

fn default_timeout() -> Duration {
    DEFAULT_FEED_TIMEOUT
}

impl FeedSettings {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            credentials: None,
            timeout: DEFAULT_FEED_TIMEOUT,
            filter: None,
        }
    }
}

// Credentials never reach the logs
impl fmt::Debug for FeedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedSettings")
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("filter", &self.filter)
            .finish()
    }
}

/// Run `resolver` on a worker thread and wait at most `timeout` for it.
///
/// A resolver that overruns is left to finish on its own; its answer is
/// discarded.
pub fn resolve_with_timeout(
    resolver: Arc<dyn VulnerabilityResolver>,
    identifiers: BTreeSet<String>,
    timeout: Duration,
) -> Result<HashMap<String, f64>, ResolveError> {
    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(&resolver);

    thread::Builder::new()
        .name("vulnerability-feed".to_string())
        .spawn(move || {
            // The receiver is gone once the caller timed out
            let _ = tx.send(worker.resolve(&identifiers));
        })
        .map_err(|e| ResolveError::Unavailable(format!("cannot start feed query: {}", e)))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result.map(sanitize_scores),
        Err(mpsc::RecvTimeoutError::Timeout) => Err(ResolveError::Timeout(timeout)),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(ResolveError::Unavailable(format!(
            "feed '{}' stopped without answering",
            resolver.name()
        ))),
    }
}

/// Drop non-finite scores a feed may hand back.
fn sanitize_scores(scores: HashMap<String, f64>) -> HashMap<String, f64> {
    scores
        .into_iter()
        .filter(|(id, score)| {
            let keep = score.is_finite();
            if !keep {
                log::warn!("Ignoring non-finite score for feed identifier '{}'", id);
            }
            keep
        })
        .collect()
}

/// Query the feed, converting any failure into `None` ("no data").
pub fn resolve_or_empty(
    resolver: Arc<dyn VulnerabilityResolver>,
    identifiers: BTreeSet<String>,
    timeout: Duration,
) -> Option<HashMap<String, f64>> {
    let name = resolver.name().to_string();
    match resolve_with_timeout(resolver, identifiers, timeout) {
        Ok(scores) => {
            log::info!("Feed '{}' returned scores for {} identifiers", name, scores.len());
            Some(scores)
        }
        Err(e) => {
            log::warn!("{}. Falling back to random vulnerability scores.", e);
            None
        }
    }
}

/// Rescale `value` from `[min_val, max_val]` to `[0, 1]`, clamped.
///
/// A degenerate range (`min_val == max_val`) leaves the value unscaled.
pub fn normalise(min_val: f64, max_val: f64, value: f64) -> f64 {
    let span = max_val - min_val;
    let scaled = if span.abs() < f64::EPSILON {
        value
    } else {
        (value - min_val) / span
    };
    scaled.clamp(0.0, 1.0)
}

/// Highest score among `identifiers`, normalised against `[min_val, max_val]`.
///
/// Identifiers missing from `scores` count as [`UNKNOWN_IDENTIFIER_SCORE`].
pub fn find_highest_vulnerability<S: AsRef<str>>(
    identifiers: &[S],
    scores: &HashMap<String, f64>,
    min_val: f64,
    max_val: f64,
) -> f64 {
    let highest = identifiers
        .iter()
        .map(|id| match scores.get(id.as_ref()) {
            Some(&score) if score > 0.0 => score,
            _ => UNKNOWN_IDENTIFIER_SCORE,
        })
        .fold(0.0, f64::max);

    normalise(min_val, max_val, highest)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedFeed(HashMap<String, f64>);

    impl VulnerabilityResolver for FixedFeed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn resolve(&self, identifiers: &BTreeSet<String>) -> Result<HashMap<String, f64>, ResolveError> {
            Ok(identifiers
                .iter()
                .filter_map(|id| self.0.get(id).map(|s| (id.clone(), *s)))
                .collect())
        }
    }

    struct BrokenFeed;

    impl VulnerabilityResolver for BrokenFeed {
        fn name(&self) -> &str {
            "broken"
        }

        fn resolve(&self, _: &BTreeSet<String>) -> Result<HashMap<String, f64>, ResolveError> {
            Err(ResolveError::Unavailable("connection refused".to_string()))
        }
    }

    struct SlowFeed;

    impl VulnerabilityResolver for SlowFeed {
        fn name(&self) -> &str {
            "slow"
        }

        fn resolve(&self, _: &BTreeSet<String>) -> Result<HashMap<String, f64>, ResolveError> {
            thread::sleep(Duration::from_millis(500));
            Ok(HashMap::new())
        }
    }

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalise() {
        assert_eq!(normalise(0.0, 1.0, 0.25), 0.25);
        assert_eq!(normalise(0.0, 10.0, 5.0), 0.5);
        assert_eq!(normalise(0.0, 1.0, 3.0), 1.0);
        assert_eq!(normalise(0.5, 0.5, 0.3), 0.3);
    }

    #[test]
    fn test_highest_vulnerability_uses_max_known_score() {
        let scores: HashMap<String, f64> =
            [("a".to_string(), 0.3), ("b".to_string(), 0.7)].into_iter().collect();
        assert_eq!(find_highest_vulnerability(&["a", "b", "zzz"], &scores, 0.0, 1.0), 0.7);
    }

    #[test]
    fn test_unknown_identifiers_get_floor_not_zero() {
        let scores = HashMap::new();
        let score = find_highest_vulnerability(&["unknown:1", "unknown:2"], &scores, 0.0, 1.0);
        assert_eq!(score, UNKNOWN_IDENTIFIER_SCORE);
        assert!(score > 0.0);

        let scaled = find_highest_vulnerability(&["unknown"], &scores, 0.0, 0.5);
        assert!((scaled - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_zero_score_treated_as_unknown() {
        let scores: HashMap<String, f64> = [("a".to_string(), 0.0)].into_iter().collect();
        assert_eq!(find_highest_vulnerability(&["a"], &scores, 0.0, 1.0), UNKNOWN_IDENTIFIER_SCORE);
    }

    #[test]
    fn test_resolve_with_timeout_success() {
        let feed = FixedFeed([("cpe:a".to_string(), 0.4), ("cpe:b".to_string(), f64::NAN)].into_iter().collect());
        let scores = resolve_with_timeout(Arc::new(feed), ids(&["cpe:a", "cpe:b", "cpe:c"]), Duration::from_secs(5)).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores.get("cpe:a"), Some(&0.4));
    }

    #[test]
    fn test_failures_become_no_data() {
        assert!(resolve_or_empty(Arc::new(BrokenFeed), ids(&["x"]), Duration::from_secs(5)).is_none());

        let err = resolve_with_timeout(Arc::new(SlowFeed), ids(&["x"]), Duration::from_millis(20)).unwrap_err();
        assert!(matches!(err, ResolveError::Timeout(_)));
        assert!(resolve_or_empty(Arc::new(SlowFeed), ids(&["x"]), Duration::from_millis(20)).is_none());
    }

    #[test]
    fn test_settings_debug_redacts_credentials() {
        let mut settings = FeedSettings::new("feeds/cpe.json");
        settings.credentials = Some("hunter2".to_string());
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_settings_from_yaml() {
        let yaml = "endpoint: feeds/cpe.yaml\ntimeout: 2s\nfilter: siemens\n";
        let settings: FeedSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(2));
        assert_eq!(settings.filter.as_deref(), Some("siemens"));

        let settings: FeedSettings = serde_yaml::from_str("endpoint: x.json\n").unwrap();
        assert_eq!(settings.timeout, DEFAULT_FEED_TIMEOUT);
    }
}
