/// Development helper: install a `tracing` subscriber when `RUST_LOG` is set.
///
/// Tests and demos call `chat_reactor::dev_tracing::init_tracing()` to see the
/// event loop's diagnostics. No-op when `RUST_LOG` is unset or a global
/// subscriber is already installed.
pub fn init_tracing() {
    use std::env;

    if env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_thread_names(true)
            .try_init();
    }
}
