use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Installs the global fmt subscriber, `RUST_LOG` overrides the default level
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt().with_env_filter(filter).with_target(true);
    if cfg!(test) {
        let _ = builder.compact().with_test_writer().try_init();
    } else {
        let _ = builder.try_init();
    }
}
