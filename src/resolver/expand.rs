use super::{ProductId, shapes};
use crate::config::ResolverConfig;
use crate::error::ResolveError;
use reqwest::Client;
use std::time::Duration;
use url::{Origin, Url};

/// Expands `a.aliexpress.com` short links without downloading bodies.
///
/// Redirects are followed manually (policy `none`, walking `Location`
/// headers) so every hop counts against the configured cap and the walk can
/// stop at the first hop whose path already carries an item id.
pub struct RedirectExpander {
    client: Client,
    max_hops: u32,
}

impl RedirectExpander {
    pub fn new(config: &ResolverConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("souqbot/0.1")
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            max_hops: config.max_redirect_hops,
        }
    }

    /// Walk the redirect chain until an item-shaped URL on a trusted host
    /// appears or the hop cap is hit. HEAD requests only; the target pages
    /// are never fetched.
    pub async fn expand(&self, start: &Url) -> Result<ProductId, ResolveError> {
        let chain_origin = start.origin();
        let mut current = start.clone();

        for hop in 0..self.max_hops {
            let response = self.client.head(current.clone()).send().await?;
            let status = response.status();

            if !status.is_redirection() {
                // End of the chain; either we landed on an item page or
                // there is nothing to extract.
                return match trusted_product_id(&current, &chain_origin) {
                    Some(id) => Ok(id),
                    None => Err(ResolveError::DeadEnd(current.to_string())),
                };
            }

            let Some(location) = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
            else {
                return Err(ResolveError::DeadEnd(current.to_string()));
            };

            current = current
                .join(location)
                .map_err(|_| ResolveError::BadLocation(location.to_string()))?;

            if let Some(id) = trusted_product_id(&current, &chain_origin) {
                tracing::debug!(hops = hop + 1, resolved = %current, "short link expanded");
                return Ok(id);
            }
        }

        Err(ResolveError::HopLimit {
            limit: self.max_hops,
        })
    }
}

/// Item-shaped paths only hand over an id on a catalog host or on the origin
/// the walk started from. Hops elsewhere are followed, never trusted with
/// identity.
fn trusted_product_id(url: &Url, chain_origin: &Origin) -> Option<ProductId> {
    if shapes::is_catalog_host(url) || url.origin() == *chain_origin {
        shapes::extract_product_id(url)
    } else {
        None
    }
}
