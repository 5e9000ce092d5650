//! Timestamped console logging.

use log::LevelFilter;


/// Configures the global logger. `None` keeps the informational default
/// the tools run with; the `-v` flags pass `"debug"` and `"trace"` here to
/// surface the per-packet detail.
pub fn configure(level: Option<&str>) {
    let filter = match level {
        Some("trace") => LevelFilter::Trace,
        Some("debug") => LevelFilter::Debug,
        _             => LevelFilter::Info,
    };

    let mut logs = env_logger::Builder::new();
    logs.filter(None, filter);
    logs.format_timestamp_millis();

    // a second configure call (from tests, say) keeps the first logger
    let _ = logs.try_init();
}
