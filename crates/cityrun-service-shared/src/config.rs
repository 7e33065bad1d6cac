//! Service configuration read from environment variables at startup.
//!
//! | variable | default |
//! |---|---|
//! | `CITYRUN_DATA_PATH` | `/data/road_network.db` |
//! | `SERVICE_PORT` | `3000` |
//! | `GRAPH_QUERY_TIMEOUT_MS` | `2000` |
//! | `REQUEST_TIMEOUT_MS` | `10000` |
//! | `MAX_SNAP_DISTANCE_M` | `1000` |
//! | `CROSSWALK_PENALTY_M`, `CROSSING_LAMBDA` | library defaults |
//! | `CANDIDATE_VIA_LIMIT` | library default |
//! | `VIA_DISTANCE_RATIO_MIN`, `VIA_DISTANCE_RATIO_MAX` | library defaults |
//! | `MAX_CROSSWALKS_PER_KM` | library default |
//!
//! Values that fail to parse or fall out of range are logged and replaced by
//! the default. Distances, penalties and weights must be finite and
//! non-negative, ratio bounds positive with min <= max, and the candidate
//! limit and timeouts above zero.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use cityrun_lib::store::{DEFAULT_MAX_SNAP_DISTANCE_M, DEFAULT_QUERY_TIMEOUT};
use cityrun_lib::RecommendConfig;

pub const DEFAULT_DATA_PATH: &str = "/data/road_network.db";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub data_path: PathBuf,
    pub port: u16,
    pub query_timeout: Duration,
    pub request_timeout: Duration,
    pub max_snap_distance_m: f64,
    pub recommend: RecommendConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            port: DEFAULT_PORT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_snap_distance_m: DEFAULT_MAX_SNAP_DISTANCE_M,
            recommend: RecommendConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let base = defaults.recommend;
        let meters = |name: &str, default: f64| parse_checked(&lookup, name, default, non_negative);

        let mut recommend = RecommendConfig {
            crosswalk_penalty_m: meters("CROSSWALK_PENALTY_M", base.crosswalk_penalty_m),
            candidate_via_limit: parse_checked(
                &lookup,
                "CANDIDATE_VIA_LIMIT",
                base.candidate_via_limit,
                |limit: &usize| *limit > 0,
            ),
            crossing_lambda: meters("CROSSING_LAMBDA", base.crossing_lambda),
            min_distance_ratio: parse_checked(
                &lookup,
                "VIA_DISTANCE_RATIO_MIN",
                base.min_distance_ratio,
                positive,
            ),
            max_distance_ratio: parse_checked(
                &lookup,
                "VIA_DISTANCE_RATIO_MAX",
                base.max_distance_ratio,
                positive,
            ),
            max_crosswalks_per_km: meters("MAX_CROSSWALKS_PER_KM", base.max_crosswalks_per_km),
        };
        if recommend.min_distance_ratio > recommend.max_distance_ratio {
            tracing::warn!(
                min = recommend.min_distance_ratio,
                max = recommend.max_distance_ratio,
                "distance ratio bounds are inverted, using defaults"
            );
            recommend.min_distance_ratio = base.min_distance_ratio;
            recommend.max_distance_ratio = base.max_distance_ratio;
        }

        Self {
            data_path: lookup("CITYRUN_DATA_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            port: parse_checked(&lookup, "SERVICE_PORT", defaults.port, |_: &u16| true),
            query_timeout: millis_or(&lookup, "GRAPH_QUERY_TIMEOUT_MS", defaults.query_timeout),
            request_timeout: millis_or(&lookup, "REQUEST_TIMEOUT_MS", defaults.request_timeout),
            max_snap_distance_m: meters("MAX_SNAP_DISTANCE_M", defaults.max_snap_distance_m),
            recommend,
        }
    }
}

fn non_negative(value: &f64) -> bool {
    value.is_finite() && *value >= 0.0
}

fn positive(value: &f64) -> bool {
    value.is_finite() && *value > 0.0
}

/// Parse `name`, falling back to `default` with a warning when the value
/// does not parse or fails `valid`.
fn parse_checked<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
    valid: impl Fn(&T) -> bool,
) -> T
where
    T: FromStr + Copy + std::fmt::Debug,
{
    let Some(raw) = lookup(name) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => value,
        Ok(_) => {
            tracing::warn!(
                variable = name,
                value = %raw,
                default = ?default,
                "configuration value out of range, using default"
            );
            default
        }
        Err(_) => {
            tracing::warn!(
                variable = name,
                value = %raw,
                default = ?default,
                "unparseable configuration value, using default"
            );
            default
        }
    }
}

/// Millisecond duration; zero is rejected since it fails every query.
fn millis_or(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: Duration,
) -> Duration {
    let millis = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(parse_checked(lookup, name, millis, |ms: &u64| *ms > 0))
}
