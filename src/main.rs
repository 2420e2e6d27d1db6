fn init_log() {
    let default_level = if cfg!(debug_assertions) { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() {
    init_log();

    if let Err(e) = currency_converter_lib::run().await {
        log::error!("CRITICAL: {}", e);
        std::process::exit(1);
    }
}
