//! Central configuration: loads `.env` and environment variables into an
//! immutable `EngineConfig` once at process start, using the write-path
//! and trip-switch knobs this engine needs.

use std::env;
use std::time::Duration;

use access_infra::{ErrorHandlingConfig, InterceptMode};

pub struct EngineConfig {
    /// When set, a mutation whose prerequisite is missing synthesizes
    /// it instead of rejecting the request. `ACCESS_DEPENDENCY_FREE`.
    pub dependency_free: bool,
    /// Flush fires once the buffer's total length reaches this. `ACCESS_FLUSH_THRESHOLD`.
    pub flush_threshold: usize,
    /// Flush also fires on this fixed tick, independent of size. `ACCESS_FLUSH_INTERVAL_MS`.
    pub flush_interval: Duration,
    /// Bounded ring size for the temporal event cache. `ACCESS_CACHE_CAPACITY`.
    pub cache_capacity: usize,
    /// Reader refresh tick period. `ACCESS_READER_REFRESH_INTERVAL_MS`.
    pub reader_refresh_interval: Duration,
    /// Trip switch behavior once a flush cannot reach the persister.
    /// `ACCESS_TRIP_MODE` = `fail-fast` | `delayed-shutdown`;
    /// `ACCESS_TRIP_SHUTDOWN_DELAY_MS` sets the delay for the latter.
    pub trip_mode: InterceptMode,
    /// `ErrorHandling.*`: controls for the RPC boundary's error-to-status
    /// converter. `ACCESS_ERROR_INCLUDE_INNER_EXCEPTIONS`,
    /// `ACCESS_ERROR_OVERRIDE_INTERNAL`, `ACCESS_ERROR_INTERNAL_MESSAGE`.
    pub error_handling: ErrorHandlingConfig,
}

impl EngineConfig {
    /// Loads `.env` (if present) then reads environment variables,
    /// defaulting anything unset. Never panics on a missing variable —
    /// nothing here is mandatory.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let dependency_free = env_flag("ACCESS_DEPENDENCY_FREE", false);
        let flush_threshold = env_parse("ACCESS_FLUSH_THRESHOLD", 64usize);
        let flush_interval = Duration::from_millis(env_parse("ACCESS_FLUSH_INTERVAL_MS", 1_000u64));
        let cache_capacity = env_parse("ACCESS_CACHE_CAPACITY", 10_000usize);
        let reader_refresh_interval = Duration::from_millis(env_parse("ACCESS_READER_REFRESH_INTERVAL_MS", 500u64));

        let trip_mode = match env::var("ACCESS_TRIP_MODE").as_deref() {
            Ok("delayed-shutdown") => {
                let delay = Duration::from_millis(env_parse("ACCESS_TRIP_SHUTDOWN_DELAY_MS", 5_000u64));
                InterceptMode::DelayedShutdown { after: delay }
            }
            _ => InterceptMode::FailFast,
        };

        let error_handling = ErrorHandlingConfig {
            include_inner_exceptions: env_flag("ACCESS_ERROR_INCLUDE_INNER_EXCEPTIONS", false),
            override_internal_server_errors: env_flag("ACCESS_ERROR_OVERRIDE_INTERNAL", false),
            internal_server_error_message_override: env::var("ACCESS_ERROR_INTERNAL_MESSAGE")
                .unwrap_or_else(|_| "internal error".to_string()),
        };

        Self {
            dependency_free,
            flush_threshold,
            flush_interval,
            cache_capacity,
            reader_refresh_interval,
            trip_mode,
            error_handling,
        }
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key).ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
