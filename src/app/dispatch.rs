use std::sync::Arc;

use crate::catalog::CatalogClient;
use crate::channels;
use crate::channels::telegram::TELEGRAM_MAX_MESSAGE_CHARS;
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::Result;
use crate::reply::{OutcomeKind, ReplyRenderer};
use crate::resolver::{ProductId, Resolution, Resolver};

pub async fn dispatch(cli: Cli, config: Arc<Config>) -> Result<()> {
    match cli.command {
        Commands::Run => {
            config.catalog.require_credentials()?;
            channels::run_bot(config).await?;
            Ok(())
        }

        Commands::Doctor => {
            channels::doctor(&config).await?;
            Ok(())
        }

        Commands::Resolve { text } => resolve(&config, &text).await,

        Commands::Fetch { id, locale } => fetch(&config, id, locale).await,
    }
}

/// Print the product id a message resolves to. Unresolvable links become a
/// process error so shell scripts can branch on the exit code.
async fn resolve(config: &Config, text: &str) -> Result<()> {
    let resolver = Resolver::new(&config.resolver);
    match resolver.resolve(text).await {
        Resolution::Product(id) => {
            println!("{id}");
            Ok(())
        }
        Resolution::NoUrlFound => {
            println!("{}", t!("cli.resolve.no_url"));
            Ok(())
        }
        Resolution::Unresolvable(err) => Err(err.into()),
    }
}

/// Fetch one product and print the reply exactly as the bot would send it.
async fn fetch(config: &Config, id: u64, locale: Option<String>) -> Result<()> {
    config.catalog.require_credentials()?;

    let client = CatalogClient::new(&config.catalog);
    let record = client.fetch(ProductId::new(id)).await?;

    let locale = locale.unwrap_or_else(|| config.catalog.language.clone());
    let renderer = ReplyRenderer::new(locale, TELEGRAM_MAX_MESSAGE_CHARS);
    if let Some(reply) = renderer.render(OutcomeKind::Success, Some(&record)) {
        println!("{}", reply.text);
        if let Some(image) = reply.image_url {
            println!();
            println!("{}", t!("cli.fetch.image", url = image));
        }
    }

    Ok(())
}
