// Logging setup for the wordforge binary

use anyhow::anyhow;
use tracing::Level;

/// Resolve the maximum log level from the `--verbose` flag and `logging.level`
///
/// `--verbose` always wins; an unrecognised configured level falls back to `INFO`.
pub fn resolve_level(verbose: bool, configured: &str) -> Level {
    if verbose {
        return Level::DEBUG;
    }
    configured.trim().parse().unwrap_or(Level::INFO)
}

/// Install the global `fmt` subscriber writing to stderr
///
/// Stdout is reserved for command output so JSON can be piped.
pub fn init_logging(verbose: bool, configured: &str) -> anyhow::Result<()> {
    let level = resolve_level(verbose, configured);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {}", e))
}
