use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{
        InlineQuery, InlineQueryResult, InlineQueryResultArticle, InputMessageContent,
        InputMessageContentText, ParseMode,
    },
};

use idf_core::{
    formatting::{format_response, Outcome},
    resolve::resolve_identifier,
};

use crate::router::AppState;

use super::take_lookup_token;

pub(super) async fn handle_inline_query(
    bot: Bot,
    q: InlineQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let query = q.query.trim();
    if query.is_empty() {
        return Ok(());
    }
    let result = match take_lookup_token(&state, Some(&q.from)).await {
        Ok(()) => {
            let outcome = Outcome::from(resolve_identifier(state.lookup.as_ref(), query).await);
            article(
                "fetch-id",
                "Fetch Telegram ID",
                "Get Telegram ID for @username or t.me link",
                format_response(&outcome),
            )
        }
        Err(notice) => article("rate-limited", "Too many lookups", &notice, notice.clone()),
    };

    if let Err(e) = bot
        .answer_inline_query(q.id.clone(), vec![InlineQueryResult::Article(result)])
        .cache_time(1)
        .await
    {
        tracing::warn!(error = %e, "failed to answer inline query");
    }
    Ok(())
}

fn article(id: &str, title: &str, description: &str, html: String) -> InlineQueryResultArticle {
    let content =
        InputMessageContent::Text(InputMessageContentText::new(html).parse_mode(ParseMode::Html));
    InlineQueryResultArticle::new(id, title, content).description(description)
}
