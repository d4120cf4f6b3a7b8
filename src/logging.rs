use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initialize logging.  If the environment variable `RUST_LOG` is set to a
/// non-empty value, we interpret it as an env-filter and install a compact
/// fmt subscriber.  Wrapper scripts frequently export RUST_LOG
/// unconditionally but potentially with an empty value, and we don't want
/// that to be interpreted as a desire to enable logging.
pub fn init_logging() {
    INIT.call_once(|| {
        if let Ok(rustlog) = std::env::var("RUST_LOG") {
            if !rustlog.is_empty() {
                if let Ok(env_filter) = EnvFilter::try_from_default_env() {
                    tracing_subscriber::fmt()
                        .compact()
                        // Output is routinely captured into logs that get
                        // excerpted for email, so ANSI isn't helpful.
                        .with_ansi(false)
                        // Wall time takes up a lot of columns and we rarely
                        // care about it at this granularity.
                        .without_time()
                        .with_env_filter(env_filter)
                        .init();
                }
            }
        }
    });
}
