use std::sync::Once;

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "KEEPSAKE_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

static INIT: Once = Once::new();

/// Installs the stderr subscriber. Filter comes from `KEEPSAKE_LOG`, then
/// `RUST_LOG`, then `info`. Later calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        if let Err(err) = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
        {
            eprintln!("keepsake: logging already initialized: {err}");
        }
    });
}
