use std::sync::Arc;

use idf_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), idf_core::Error> {
    idf_core::logging::init("idf")?;

    let cfg = Arc::new(Config::load()?);
    tracing::info!(
        lookup_timeout_ms = cfg.lookup_timeout.as_millis() as u64,
        rate_limit_enabled = cfg.rate_limit_enabled,
        "configuration loaded"
    );

    idf_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| idf_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
