pub mod mock_client;

use std::sync::Once;

static TRACING: Once = Once::new();

/// Installs the fmt subscriber once per test binary, honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    });
}
