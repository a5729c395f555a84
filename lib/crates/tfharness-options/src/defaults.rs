//! Built-in transient-failure policy.
//!
//! The patterns below cover failures that show up in CI under network
//! contention and resolve on their own after a retry or two.

use std::collections::HashMap;
use std::time::Duration;

use crate::options::Options;

/// Retry count set by [`with_default_retryable_errors`].
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay between retries set by [`with_default_retryable_errors`].
pub const DEFAULT_TIME_BETWEEN_RETRIES: Duration = Duration::from_secs(5);

const PLUGIN_NETWORK_ERROR: &str = "Failed to retrieve plugin due to transient network error.";

/// Known-transient failure patterns and the message shown when one matches.
///
/// Each pattern is a case-sensitive regex matched against the combined output
/// of a failed run.
pub const DEFAULT_RETRYABLE_ERRORS: &[(&str, &str)] = &[
    // Helm releases under heavy parallel test load
    (
        ".*read: connection reset by peer.*",
        "Failed to reach helm charts repository.",
    ),
    (".*transport is closing.*", "Failed to reach Kubernetes API."),
    // Plugin downloads during `init`
    (".*unable to verify signature.*", PLUGIN_NETWORK_ERROR),
    (".*unable to verify checksum.*", PLUGIN_NETWORK_ERROR),
    (".*no provider exists with the given name.*", PLUGIN_NETWORK_ERROR),
    (".*registry service is unreachable.*", PLUGIN_NETWORK_ERROR),
    (".*Error installing provider.*", PLUGIN_NETWORK_ERROR),
    (
        ".*Failed to query available provider packages.*",
        PLUGIN_NETWORK_ERROR,
    ),
    (
        ".*timeout while waiting for plugin to start.*",
        PLUGIN_NETWORK_ERROR,
    ),
    (
        ".*timed out waiting for server handshake.*",
        PLUGIN_NETWORK_ERROR,
    ),
    ("could not query provider registry for", PLUGIN_NETWORK_ERROR),
    // Providers whose post-apply reads lag behind the write
    (
        ".*Provider produced inconsistent result after apply.*",
        "Provider eventual consistency error.",
    ),
];

/// [`DEFAULT_RETRYABLE_ERRORS`] as an owned map.
#[must_use]
pub fn default_retryable_errors() -> HashMap<String, String> {
    DEFAULT_RETRYABLE_ERRORS
        .iter()
        .map(|&(pattern, message)| (pattern.to_string(), message.to_string()))
        .collect()
}

/// Returns a copy of `original` with the built-in retry policy applied.
///
/// The built-in patterns are merged into the copy's `retryable_errors`,
/// replacing any caller entry under the same pattern. `max_retries` and
/// `time_between_retries` are overwritten with [`DEFAULT_MAX_RETRIES`] and
/// [`DEFAULT_TIME_BETWEEN_RETRIES`]. `original` is left untouched.
#[must_use]
pub fn with_default_retryable_errors(original: &Options) -> Options {
    let mut options = original.clone();
    options.retryable_errors.extend(default_retryable_errors());
    options.max_retries = DEFAULT_MAX_RETRIES;
    options.time_between_retries = DEFAULT_TIME_BETWEEN_RETRIES;
    options
}
