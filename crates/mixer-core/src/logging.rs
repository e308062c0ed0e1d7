use std::sync::Once;

const DEFAULT_FILTER: &str = "mixer_core=info";

/// Install the fmt subscriber. Safe to call more than once; only the first
/// call has an effect. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER));
        if tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .try_init()
            .is_err()
        {
            tracing::debug!("a global subscriber is already installed");
        }
    });
}
