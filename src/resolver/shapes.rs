use super::ProductId;
use std::collections::HashSet;
use url::Url;

/// Recognized aliexpress.com URL families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LinkShape {
    /// Desktop item page, id embedded in the path.
    Canonical,
    /// `m.aliexpress.com` item page.
    Mobile,
    /// `a.aliexpress.com/_<code>` — id only revealed by following redirects.
    ShortRedirect,
    /// Store front, search or category page. No single product id exists.
    Store,
}

/// Hosts a scheme-less token must start with to be promoted to a URL.
const BARE_HOST_PREFIXES: [&str; 4] = [
    "aliexpress.com/",
    "www.aliexpress.com/",
    "m.aliexpress.com/",
    "a.aliexpress.com/",
];

pub fn is_catalog_host(url: &Url) -> bool {
    url.host_str().is_some_and(|h| {
        let host = h.to_ascii_lowercase();
        host == "aliexpress.com" || host.ends_with(".aliexpress.com")
    })
}

/// Find catalog-hosted URLs in free-form text, deduplicated, in order of
/// appearance. Tokens may be wrapped in markdown, angle brackets or
/// parentheses, carry trailing punctuation, or lack a scheme entirely.
pub fn scan_catalog_urls(text: &str) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for token in text.split_whitespace() {
        for candidate in extract_candidates(token) {
            if let Some(url) = try_parse_catalog_url(&candidate) {
                let key = url.to_string();
                if seen.insert(key) {
                    urls.push(url);
                }
            }
        }
    }

    urls
}

fn extract_candidates(token: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    if let Some(start) = token.find("](")
        && let Some(end) = token[start..].find(')')
    {
        let url_part = &token[start + 2..start + end];
        candidates.push(url_part.to_string());
        return candidates;
    }

    let stripped = token
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(token);

    let stripped = stripped
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(stripped);

    let stripped = strip_trailing_punctuation(stripped);

    candidates.push(stripped.to_string());
    candidates
}

fn strip_trailing_punctuation(s: &str) -> &str {
    let mut end = s.len();
    let bytes = s.as_bytes();

    while end > 0 {
        let ch = bytes[end - 1];
        if ch == b'.' || ch == b',' || ch == b';' || ch == b'!' || ch == b'?' || ch == b')' {
            end -= 1;
        } else {
            break;
        }
    }

    &s[..end]
}

fn try_parse_catalog_url(candidate: &str) -> Option<Url> {
    let url = match Url::parse(candidate) {
        Ok(url) => match url.scheme() {
            "http" | "https" => url,
            _ => return None,
        },
        // Users paste links without a scheme all the time.
        Err(_) if looks_like_bare_catalog_link(candidate) => {
            Url::parse(&format!("https://{candidate}")).ok()?
        }
        Err(_) => return None,
    };

    is_catalog_host(&url).then_some(url)
}

fn looks_like_bare_catalog_link(candidate: &str) -> bool {
    let lower = candidate.to_ascii_lowercase();
    BARE_HOST_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Classify a catalog URL by host. `None` for aliexpress subdomains this
/// bot has no handling for.
pub fn classify(url: &Url) -> Option<LinkShape> {
    let host = url.host_str()?.to_ascii_lowercase();
    match host.as_str() {
        "aliexpress.com" | "www.aliexpress.com" => {
            if is_store_path(url) {
                Some(LinkShape::Store)
            } else {
                Some(LinkShape::Canonical)
            }
        }
        "m.aliexpress.com" => Some(LinkShape::Mobile),
        "a.aliexpress.com" => Some(LinkShape::ShortRedirect),
        _ => None,
    }
}

fn is_store_path(url: &Url) -> bool {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    match segments.first() {
        // `/store/product/…` is an item page; every other `/store/…` is a front.
        Some(&"store") => !matches!(segments.get(1), Some(&"product")),
        Some(&"wholesale" | &"w" | &"category") => true,
        _ => false,
    }
}

/// Pull the numeric product id out of an item-shaped path.
///
/// Handles `/item/<id>.html`, `/item/<slug>/<id>.html` and the store item
/// form `/store/product/<slug>/<storeid>_<id>.html`. Query parameters and
/// fragments never participate in identity.
pub fn extract_product_id(url: &Url) -> Option<ProductId> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        ["item", .., last] => id_from_html_stem(last),
        ["store", "product", .., last] => store_item_id(last),
        _ => None,
    }
}

fn id_from_html_stem(segment: &str) -> Option<ProductId> {
    let stem = segment.strip_suffix(".html").unwrap_or(segment);
    ProductId::parse(stem)
}

fn store_item_id(segment: &str) -> Option<ProductId> {
    let stem = segment.strip_suffix(".html").unwrap_or(segment);
    let (_store_id, product_id) = stem.split_once('_')?;
    ProductId::parse(product_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn canonical_item_extracts() {
        let u = url("https://www.aliexpress.com/item/1005001234567890.html");
        assert_eq!(classify(&u), Some(LinkShape::Canonical));
        assert_eq!(
            extract_product_id(&u),
            Some(ProductId::new(1005001234567890))
        );
    }

    #[test]
    fn canonical_with_slug_extracts() {
        let u = url("https://aliexpress.com/item/wireless-mouse/1005001234567890.html");
        assert_eq!(
            extract_product_id(&u),
            Some(ProductId::new(1005001234567890))
        );
    }

    #[test]
    fn mobile_item_extracts() {
        let u = url("https://m.aliexpress.com/item/99887766.html");
        assert_eq!(classify(&u), Some(LinkShape::Mobile));
        assert_eq!(extract_product_id(&u), Some(ProductId::new(99887766)));
    }

    #[test]
    fn store_item_extracts() {
        let u = url("https://www.aliexpress.com/store/product/usb-hub/1102_4001234567890.html");
        assert_eq!(classify(&u), Some(LinkShape::Canonical));
        assert_eq!(extract_product_id(&u), Some(ProductId::new(4001234567890)));
    }

    #[test]
    fn store_front_is_store_shape() {
        let u = url("https://www.aliexpress.com/store/1102");
        assert_eq!(classify(&u), Some(LinkShape::Store));
        assert_eq!(extract_product_id(&u), None);
    }

    #[test]
    fn search_is_store_shape() {
        let u = url("https://www.aliexpress.com/w/wholesale-usb-hub.html");
        assert_eq!(classify(&u), Some(LinkShape::Store));
    }

    #[test]
    fn short_link_classifies_as_redirect() {
        let u = url("https://a.aliexpress.com/_mAbCd12");
        assert_eq!(classify(&u), Some(LinkShape::ShortRedirect));
        assert_eq!(extract_product_id(&u), None);
    }

    #[test]
    fn unknown_subdomain_has_no_shape() {
        let u = url("https://best.aliexpress.com/deals");
        assert!(is_catalog_host(&u));
        assert_eq!(classify(&u), None);
    }

    #[test]
    fn query_params_do_not_affect_identity() {
        let u = url("https://www.aliexpress.com/item/1005001234567890.html?spm=a2g0o&sku_id=123");
        assert_eq!(
            extract_product_id(&u),
            Some(ProductId::new(1005001234567890))
        );
    }

    #[test]
    fn short_numeric_stems_are_rejected() {
        let u = url("https://www.aliexpress.com/item/1234567.html");
        assert_eq!(extract_product_id(&u), None);
    }

    #[test]
    fn scan_ignores_foreign_hosts() {
        let urls = scan_catalog_urls("see https://example.com/item/1005001234567890.html please");
        assert!(urls.is_empty());
    }

    #[test]
    fn scan_finds_catalog_links_in_order() {
        let urls = scan_catalog_urls(
            "https://a.aliexpress.com/_abc then https://www.aliexpress.com/item/1005001234567890.html",
        );
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].host_str(), Some("a.aliexpress.com"));
    }

    #[test]
    fn scan_accepts_bare_host_tokens() {
        let urls = scan_catalog_urls("aliexpress.com/item/1005001234567890.html");
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].scheme(), "https");
    }

    #[test]
    fn scan_unwraps_markdown_and_punctuation() {
        let urls =
            scan_catalog_urls("look [here](https://m.aliexpress.com/item/99887766.html) now!");
        assert_eq!(urls.len(), 1);

        let urls = scan_catalog_urls("try https://www.aliexpress.com/item/99887766.html.");
        assert_eq!(urls.len(), 1);
        assert!(urls[0].path().ends_with("99887766.html"));
    }

    #[test]
    fn scan_deduplicates() {
        let urls = scan_catalog_urls(
            "https://m.aliexpress.com/item/99887766.html https://m.aliexpress.com/item/99887766.html",
        );
        assert_eq!(urls.len(), 1);
    }
}
