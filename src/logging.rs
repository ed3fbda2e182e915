//! Logging setup for applications embedding the query builder.
//!
//! The builder itself only emits [`tracing`] events; installing a subscriber is
//! left to the caller.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global `fmt` subscriber.
///
/// `level` is an `EnvFilter` directive such as `"info"` or `"dataquery=debug"`.
/// `RUST_LOG`, when set, takes precedence. With `json` the output is one JSON
/// object per event, otherwise a compact human-readable format is used.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_logging(level: &str, json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt::Subscriber::builder().with_env_filter(filter).with_target(true);
    if json {
        builder.json().try_init().is_ok()
    } else {
        builder.compact().try_init().is_ok()
    }
}

/// Span wrapping the build of one query.
///
/// ```
/// use dataquery::logging::build_span;
///
/// let span = build_span("tt_content");
/// let _guard = span.enter();
/// tracing::debug!("building");
/// ```
pub fn build_span(main_table: &str) -> tracing::Span {
    tracing::info_span!("query_build", main_table = main_table)
}
