pub mod expand;
pub mod shapes;

pub use expand::RedirectExpander;
pub use shapes::{LinkShape, classify, extract_product_id, scan_catalog_urls};

use crate::config::ResolverConfig;
use crate::error::ResolveError;
use std::fmt;

/// Minimum digits for a plausible catalog item id. Shorter numbers in paths
/// are page numbers, store ids and similar noise.
const MIN_ID_DIGITS: usize = 8;

/// Canonical catalog key for one product, stable across every URL shape
/// that names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProductId(u64);

impl ProductId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Parse a path segment as an item id. Rejects anything non-numeric or
    /// shorter than [`MIN_ID_DIGITS`].
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() < MIN_ID_DIGITS || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse().ok().map(Self)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of resolving one inbound message.
#[derive(Debug)]
pub enum Resolution {
    /// The first recognized link reduced to a product id.
    Product(ProductId),
    /// No catalog link in the message at all. The correct reaction is
    /// silence, not an error.
    NoUrlFound,
    /// A catalog link was recognized but no id could be recovered.
    Unresolvable(ResolveError),
}

/// Turns free-form message text into [`Resolution`]s.
pub struct Resolver {
    expander: RedirectExpander,
}

impl Resolver {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            expander: RedirectExpander::new(config),
        }
    }

    /// Resolve the first catalog link in `text`. Only short links cost a
    /// network round-trip; every other shape is pure parsing.
    pub async fn resolve(&self, text: &str) -> Resolution {
        let Some(url) = scan_catalog_urls(text).into_iter().next() else {
            return Resolution::NoUrlFound;
        };

        let Some(shape) = classify(&url) else {
            let host = url.host_str().unwrap_or_default().to_string();
            return Resolution::Unresolvable(ResolveError::UnknownHost(host));
        };

        tracing::debug!(url = %url, shape = %shape, "resolving catalog link");

        match shape {
            LinkShape::Canonical | LinkShape::Mobile => match extract_product_id(&url) {
                Some(id) => Resolution::Product(id),
                None => Resolution::Unresolvable(ResolveError::NoIdInPath(url.path().to_string())),
            },
            LinkShape::ShortRedirect => match self.expander.expand(&url).await {
                Ok(id) => Resolution::Product(id),
                Err(e) => Resolution::Unresolvable(e),
            },
            LinkShape::Store => {
                Resolution::Unresolvable(ResolveError::StoreLink(url.path().to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;

    fn resolver() -> Resolver {
        Resolver::new(&ResolverConfig::default())
    }

    #[tokio::test]
    async fn canonical_link_resolves_without_network() {
        let res = resolver()
            .resolve("look https://www.aliexpress.com/item/1005001234567890.html")
            .await;
        match res {
            Resolution::Product(id) => assert_eq!(id.get(), 1005001234567890),
            other => panic!("expected product, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn plain_chatter_is_silence() {
        let res = resolver().resolve("hello there").await;
        assert!(matches!(res, Resolution::NoUrlFound));
    }

    #[tokio::test]
    async fn foreign_links_are_silence() {
        let res = resolver()
            .resolve("https://example.com/item/1005001234567890.html")
            .await;
        assert!(matches!(res, Resolution::NoUrlFound));
    }

    #[tokio::test]
    async fn store_front_is_unresolvable() {
        let res = resolver()
            .resolve("https://www.aliexpress.com/store/1102")
            .await;
        assert!(matches!(
            res,
            Resolution::Unresolvable(ResolveError::StoreLink(_))
        ));
    }

    #[tokio::test]
    async fn unknown_subdomain_is_unresolvable() {
        let res = resolver().resolve("https://best.aliexpress.com/deals").await;
        assert!(matches!(
            res,
            Resolution::Unresolvable(ResolveError::UnknownHost(_))
        ));
    }

    #[tokio::test]
    async fn item_path_without_id_is_unresolvable() {
        let res = resolver()
            .resolve("https://www.aliexpress.com/item/not-a-number.html")
            .await;
        assert!(matches!(
            res,
            Resolution::Unresolvable(ResolveError::NoIdInPath(_))
        ));
    }

    #[tokio::test]
    async fn first_catalog_link_wins() {
        let res = resolver()
            .resolve(
                "https://m.aliexpress.com/item/99887766.html and \
                 https://www.aliexpress.com/item/1005001234567890.html",
            )
            .await;
        match res {
            Resolution::Product(id) => assert_eq!(id.get(), 99887766),
            other => panic!("expected product, got {other:?}"),
        }
    }

    #[test]
    fn product_id_parse_rules() {
        assert_eq!(ProductId::parse("1005001234567890").map(ProductId::get), Some(1005001234567890));
        assert_eq!(ProductId::parse("1234567"), None);
        assert_eq!(ProductId::parse("12345abc"), None);
        assert_eq!(ProductId::parse(""), None);
    }
}
