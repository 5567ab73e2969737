//! Tracing setup shared by the binaries

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static TRACING_INIT: Once = Once::new();

/// HTTP internals are too chatty at debug level
const QUIET_TARGETS: &[&str] = &["hyper_util=off", "hyper=off", "reqwest=off"];

/// Install the global subscriber (stderr, `RUST_LOG` aware). Safe to call
/// more than once.
pub fn init() {
    TRACING_INIT.call_once(|| {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,dj_core=debug,dj=debug"));
        for directive in QUIET_TARGETS {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }

        tracing_subscriber::fmt()
            .with_target(false)
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}
