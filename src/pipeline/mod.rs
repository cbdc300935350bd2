//! Message pipeline: resolve, fetch, render.
//!
//! One inbound message flows through three stages. The resolver scans the
//! text and recovers a product id, the catalog client fetches and merges the
//! product record, and the renderer produces the localized reply. Failures
//! collapse into a small set of outcomes with fixed user-facing text.

use crate::catalog::{CatalogClient, ProductRecord};
use crate::error::CatalogError;
use crate::reply::{FormattedReply, OutcomeKind, ReplyRenderer};
use crate::resolver::{Resolution, Resolver};

pub struct Pipeline {
    resolver: Resolver,
    catalog: CatalogClient,
    renderer: ReplyRenderer,
}

impl Pipeline {
    pub fn new(resolver: Resolver, catalog: CatalogClient, renderer: ReplyRenderer) -> Self {
        Self {
            resolver,
            catalog,
            renderer,
        }
    }

    /// Process one inbound message. `None` means stay silent: the message
    /// carried no catalog link and is ordinary chatter.
    pub async fn handle_message(&self, text: &str) -> Option<FormattedReply> {
        let (outcome, record) = self.run(text).await;
        self.renderer.render(outcome, record.as_ref())
    }

    async fn run(&self, text: &str) -> (OutcomeKind, Option<ProductRecord>) {
        let id = match self.resolver.resolve(text).await {
            Resolution::Product(id) => id,
            Resolution::NoUrlFound => return (OutcomeKind::NoUrl, None),
            Resolution::Unresolvable(err) => {
                tracing::info!(error = %err, "link did not resolve to a product");
                return (OutcomeKind::Unresolvable, None);
            }
        };

        tracing::debug!(%id, "fetching product");
        match self.catalog.fetch(id).await {
            Ok(record) => (OutcomeKind::Success, Some(record)),
            Err(err) => (outcome_for_catalog_error(&err), None),
        }
    }
}

fn outcome_for_catalog_error(err: &CatalogError) -> OutcomeKind {
    match err {
        CatalogError::NotFound(id) => {
            tracing::info!(%id, "product not found in catalog");
            OutcomeKind::NotFound
        }
        other => {
            tracing::warn!(error = %other, "catalog fetch failed");
            OutcomeKind::Upstream
        }
    }
}
