use crate::resolver::ProductId;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for souqbot.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum SouqError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Link resolution ─────────────────────────────────────────────────
    #[error("resolve: {0}")]
    Resolve(#[from] ResolveError),

    // ── Catalog gateway ─────────────────────────────────────────────────
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Link resolution errors ─────────────────────────────────────────────────

/// Why a recognized catalog link could not be reduced to a product id.
///
/// Every variant collapses to the same user-visible "unresolvable" reply;
/// the distinctions exist for logs and the `resolve` CLI command.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unknown catalog host: {0}")]
    UnknownHost(String),

    #[error("no product id in path: {0}")]
    NoIdInPath(String),

    #[error("store or search page carries no product id: {0}")]
    StoreLink(String),

    #[error("redirect chain exceeded {limit} hops")]
    HopLimit { limit: u32 },

    #[error("invalid redirect location: {0}")]
    BadLocation(String),

    #[error("redirect chain ended at {0} without an item link")]
    DeadEnd(String),

    #[error("redirect request failed: {0}")]
    Redirect(#[from] reqwest::Error),
}

// ─── Catalog gateway errors ─────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The gateway answered but knows no such product.
    #[error("product {0} not found upstream")]
    NotFound(ProductId),

    /// Network, TLS or timeout failure below the protocol layer.
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway returned its error envelope instead of a result.
    #[error("gateway error {code}: {message}")]
    Api { code: String, message: String },

    /// Upstream asked us to slow down.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// A call succeeded but carried no result payload.
    #[error("{call} returned an empty result")]
    Empty { call: &'static str },

    /// The detail payload is missing a field the record cannot exist without.
    #[error("detail response for {id} missing {field}")]
    MissingField { id: ProductId, field: &'static str },

    /// The response body did not match the expected wire shape.
    #[error("decode failed for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, SouqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_displays_correctly() {
        let err = SouqError::Config(ConfigError::Validation("missing app_key".into()));
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn not_found_displays_product_id() {
        let err = SouqError::Catalog(CatalogError::NotFound(ProductId::new(1005001234567890)));
        assert!(err.to_string().contains("1005001234567890"));
    }

    #[test]
    fn hop_limit_displays_cap() {
        let err = SouqError::Resolve(ResolveError::HopLimit { limit: 5 });
        assert!(err.to_string().contains("5 hops"));
    }

    #[test]
    fn anyhow_interop() {
        let anyhow_err = anyhow::anyhow!("something went wrong");
        let souq_err: SouqError = anyhow_err.into();
        assert!(souq_err.to_string().contains("something went wrong"));
    }
}
