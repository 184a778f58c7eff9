pub mod cleanup;
pub mod config;

/// Load `.env` if present and install the log subscriber.
pub fn init() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dailysong=debug,dailysong_server=debug,dailysong_api=debug,dailysong_db=debug,\
                 dailysong_core=debug,tower_http=debug"
                    .into()
            }),
        )
        .init();
}
