use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*, types::UserId};

use tokio::sync::Mutex;

use idf_core::{config::Config, ports::ChatLookup, security::RateLimiter};

use crate::handlers;
use crate::TelegramLookup;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub lookup: Arc<dyn ChatLookup>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
    pub bot_id: Option<UserId>,
    pub bot_username: Option<String>,
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let (bot_id, bot_username) = match bot.get_me().await {
        Ok(me) => {
            tracing::info!(username = %me.username(), "id finder bot started");
            (Some(me.id), Some(me.username().to_string()))
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "getMe failed; bot admin checks are skipped and @-addressed commands ignored"
            );
            (None, None)
        }
    };

    let lookup: Arc<dyn ChatLookup> =
        Arc::new(TelegramLookup::new(bot.clone(), cfg.lookup_timeout));

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        lookup,
        rate_limiter: Arc::new(Mutex::new(RateLimiter::new(
            cfg.rate_limit_enabled,
            cfg.rate_limit_requests,
            cfg.rate_limit_window,
        ))),
        bot_id,
        bot_username,
    });

    let handler = dptree::entry()
        .branch(Update::filter_inline_query().endpoint(handlers::handle_inline_query))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("dispatcher stopped");
    Ok(())
}
