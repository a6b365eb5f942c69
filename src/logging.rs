use env_logger::Env;

/// One-shot logger setup; `RUST_LOG` overrides the default level.
pub fn init() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}
