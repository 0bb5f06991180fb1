use env_logger::Env;

/// Logs to stderr at `info` unless `RUST_LOG` says otherwise.
pub fn init() {
    let env = Env::default().default_filter_or("info");
    // a second init (tests, embedding) keeps the first logger
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
