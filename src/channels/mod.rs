//! Transport layer: the Telegram channel and the bot run loop.
//!
//! The channel is pure plumbing — it moves text in and out. Everything the
//! bot says comes from the pipeline; the run loop only adds the transport
//! conveniences (slash commands, typing indicator, photo delivery).

mod health;
mod policy;
mod runtime;
pub mod telegram;
pub mod traits;

pub use telegram::TelegramChannel;
pub use traits::{Channel, ChannelMessage};

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::reply::{FormattedReply, ReplyRenderer};
use crate::resolver::{Resolver, scan_catalog_urls};

use health::{ChannelHealth, channel_health};
use runtime::{listener_backoff_settings, spawn_supervised_listener};

/// Start the bot and serve until ctrl-c.
pub async fn run_bot(config: Arc<Config>) -> Result<()> {
    let telegram = config.require_telegram()?;
    let channel: Arc<dyn Channel> = Arc::new(TelegramChannel::new(
        telegram.bot_token.clone(),
        telegram.allowed_users.clone(),
    ));

    let locale = config.catalog.language.clone();
    let pipeline = Arc::new(Pipeline::new(
        Resolver::new(&config.resolver),
        CatalogClient::new(&config.catalog),
        ReplyRenderer::new(&locale, channel.max_message_length()),
    ));

    println!("◆ {}", t!("bot.title"));
    println!("  › {} {}", t!("bot.channel"), channel.name());
    println!(
        "  › {} {} / {} / {}",
        t!("bot.market"),
        config.catalog.currency,
        config.catalog.language,
        config.catalog.ship_to_country
    );
    println!();
    println!("  {}", t!("bot.listening"));
    println!();

    let (initial_backoff_secs, max_backoff_secs) = listener_backoff_settings(&config.reliability);
    let (tx, mut rx) = tokio::sync::mpsc::channel::<ChannelMessage>(100);
    let listener = spawn_supervised_listener(
        Arc::clone(&channel),
        tx,
        initial_backoff_secs,
        max_backoff_secs,
    );

    loop {
        tokio::select! {
            maybe_msg = rx.recv() => {
                let Some(msg) = maybe_msg else { break };
                // Fetches can take seconds; never serialize users behind
                // each other.
                let channel = Arc::clone(&channel);
                let pipeline = Arc::clone(&pipeline);
                let locale = locale.clone();
                tokio::spawn(async move {
                    handle_inbound(channel.as_ref(), &pipeline, &locale, &msg).await;
                });
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n{}", t!("bot.shutdown"));
                break;
            }
        }
    }

    listener.abort();
    let _ = listener.await;

    Ok(())
}

async fn handle_inbound(
    channel: &dyn Channel,
    pipeline: &Pipeline,
    locale: &str,
    msg: &ChannelMessage,
) {
    tracing::debug!(message_id = %msg.id, channel = %msg.channel, "inbound message");

    if let Some(reply) = command_reply(&msg.content, locale) {
        if let Err(e) = channel.send(&reply, &msg.sender).await {
            tracing::error!("Failed to send command reply: {e}");
        }
        return;
    }

    // Only messages that carry a catalog link get acknowledged at all, so
    // the typing indicator is gated the same way as the reply.
    if !scan_catalog_urls(&msg.content).is_empty() {
        if let Err(e) = channel.send_typing(&msg.sender).await {
            tracing::debug!("Typing indicator failed: {e}");
        }
    }

    let Some(reply) = pipeline.handle_message(&msg.content).await else {
        return;
    };

    deliver(channel, &reply, &msg.sender).await;
}

/// Prefer a photo with the reply as caption; fall back to plain text when
/// the reply is longer than a caption may be, or the photo send fails.
async fn deliver(channel: &dyn Channel, reply: &FormattedReply, recipient: &str) {
    if let Some(image) = &reply.image_url {
        if reply.text.chars().count() <= channel.max_caption_length() {
            match channel.send_photo(image, &reply.text, recipient).await {
                Ok(()) => return,
                Err(e) => tracing::warn!("Photo send failed, falling back to text: {e}"),
            }
        }
    }

    if let Err(e) = channel.send(&reply.text, recipient).await {
        tracing::error!("Failed to send reply: {e}");
    }
}

/// `/start` and `/help`, with the `@botname` suffix Telegram appends in
/// groups stripped. Unknown commands fall through to the pipeline, which
/// ignores them like any other link-less text.
fn command_reply(content: &str, locale: &str) -> Option<String> {
    let first = content.trim().split_whitespace().next()?;
    if !first.starts_with('/') {
        return None;
    }

    let command = first.split('@').next().unwrap_or(first);
    match command {
        "/start" => Some(t!("telegram.welcome", locale = locale).into_owned()),
        "/help" => Some(t!("telegram.help", locale = locale).into_owned()),
        _ => None,
    }
}

/// Health report for the configured channel and catalog credentials.
pub async fn doctor(config: &Config) -> Result<()> {
    println!("◆ {}", t!("doctor.title"));
    println!();

    match &config.telegram {
        Some(telegram) => {
            let channel = TelegramChannel::new(
                telegram.bot_token.clone(),
                telegram.allowed_users.clone(),
            );
            match channel_health(&channel, Duration::from_secs(10)).await {
                ChannelHealth::Healthy => {
                    println!("  ✓ telegram  {}", t!("doctor.healthy"));
                }
                ChannelHealth::Unreachable => {
                    println!("  ✗ telegram  {}", t!("doctor.unhealthy"));
                }
                ChannelHealth::TimedOut { budget } => {
                    println!(
                        "  ! telegram  {}",
                        t!("doctor.timed_out", secs = budget.as_secs())
                    );
                }
            }
        }
        None => println!("  ✗ telegram  {}", t!("doctor.not_configured")),
    }

    match config.catalog.require_credentials() {
        Ok(()) => println!("  ✓ catalog   {}", t!("doctor.credentials_set")),
        Err(e) => println!("  ✗ catalog   {e}"),
    }

    println!(
        "  › {}",
        t!(
            "doctor.market",
            currency = config.catalog.currency,
            language = config.catalog.language,
            country = config.catalog.ship_to_country
        )
    );

    Ok(())
}
