//! HTTP client for the affiliate gateway.
//!
//! All methods share one signed POST transport: common params plus
//! method-specific params, MD5-signed, form-encoded against the single
//! gateway endpoint. Each response is checked for the gateway's
//! `error_response` envelope before its typed result is unwrapped.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::record::ProductRecord;
use super::types::{
    DetailEnvelope, ErrorEnvelope, ProductDetail, ShippingEnvelope, ShippingResult, SkuEnvelope,
    SkuResult,
};
use super::{retry, sign};
use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::resolver::ProductId;

const METHOD_DETAIL: &str = "aliexpress.affiliate.productdetail.get";
const METHOD_SKU: &str = "aliexpress.affiliate.product.sku.detail.get";
const METHOD_SHIPPING: &str = "aliexpress.affiliate.product.shipping.get";

/// Field list requested from the detail call; keep in sync with
/// [`ProductDetail`](super::types::ProductDetail).
const DETAIL_FIELDS: &str = "product_id,product_title,product_main_image_url,\
product_small_image_urls,product_detail_url,target_sale_price,\
target_sale_price_currency,target_original_price,evaluate_rate,\
lastest_volume,shop_name,shop_id,shop_url";

/// Products ship from China unless the gateway says otherwise.
const SEND_GOODS_COUNTRY: &str = "CN";

pub struct CatalogClient {
    client: Client,
    options: CatalogConfig,
    base_url: String,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Self {
        Self::with_base_url(config, &config.base_url)
    }

    /// Point the client at a custom gateway URL (for wiremock in tests).
    pub fn with_base_url(config: &CatalogConfig, base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("souqbot/0.1")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            options: config.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch everything the reply needs for one product.
    ///
    /// The detail call is mandatory and retried on transient failures. The
    /// sku and shipping calls run concurrently afterwards and get one shot
    /// each; when one fails its fields simply stay absent in the record.
    pub async fn fetch(&self, id: ProductId) -> Result<ProductRecord, CatalogError> {
        let detail = self.product_detail(id).await?;
        tracing::debug!(product_id = %id, "detail call succeeded, fetching sku and shipping");

        let (sku, shipping) = tokio::join!(self.sku_detail(id), self.shipping_info(id));
        let sku = absorb(id, "sku_detail", sku);
        let shipping = absorb(id, "shipping_info", shipping);

        let mut record =
            ProductRecord::from_parts(id, detail, sku, shipping, &self.options.currency)?;
        if let Some(rate) = self.options.tax_rate {
            record.apply_tax_rate(rate);
        }
        Ok(record)
    }

    async fn product_detail(&self, id: ProductId) -> Result<ProductDetail, CatalogError> {
        retry::retry_with_backoff(self.options.retries, self.options.retry_backoff_ms, || {
            self.product_detail_once(id)
        })
        .await
    }

    async fn product_detail_once(&self, id: ProductId) -> Result<ProductDetail, CatalogError> {
        let envelope: DetailEnvelope = self
            .call_signed(
                METHOD_DETAIL,
                vec![
                    ("product_ids".to_string(), id.to_string()),
                    ("fields".to_string(), DETAIL_FIELDS.to_string()),
                ],
            )
            .await?;
        check_error(envelope.error_response)?;

        // An envelope without products is the gateway's way of saying the
        // id does not exist (any more).
        envelope
            .response
            .and_then(|r| r.result)
            .and_then(|r| r.products.into_iter().next())
            .ok_or(CatalogError::NotFound(id))
    }

    async fn sku_detail(&self, id: ProductId) -> Result<SkuResult, CatalogError> {
        let envelope: SkuEnvelope = self
            .call_signed(METHOD_SKU, vec![("product_id".to_string(), id.to_string())])
            .await?;
        check_error(envelope.error_response)?;

        envelope
            .response
            .and_then(|r| r.result)
            .ok_or(CatalogError::Empty { call: METHOD_SKU })
    }

    async fn shipping_info(&self, id: ProductId) -> Result<ShippingResult, CatalogError> {
        let envelope: ShippingEnvelope = self
            .call_signed(
                METHOD_SHIPPING,
                vec![
                    ("product_id".to_string(), id.to_string()),
                    (
                        "send_goods_country_code".to_string(),
                        SEND_GOODS_COUNTRY.to_string(),
                    ),
                    (
                        "target_country_code".to_string(),
                        self.options.ship_to_country.to_ascii_uppercase(),
                    ),
                ],
            )
            .await?;
        check_error(envelope.error_response)?;

        envelope
            .response
            .and_then(|r| r.result)
            .ok_or(CatalogError::Empty {
                call: METHOD_SHIPPING,
            })
    }

    /// POST one signed method call and decode the JSON envelope.
    async fn call_signed<T>(
        &self,
        method: &'static str,
        extra: Vec<(String, String)>,
    ) -> Result<T, CatalogError>
    where
        T: DeserializeOwned,
    {
        let mut params = self.common_params(method);
        params.extend(extra);
        let signature = sign::sign(&params, &self.options.app_secret);
        params.push(("sign".to_string(), signature));

        let response = self.client.post(&self.base_url).form(&params).send().await?;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(CatalogError::RateLimited("http 429".to_string()));
        }
        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| CatalogError::Decode {
            context: method.to_string(),
            source: e,
        })
    }

    fn common_params(&self, method: &str) -> Vec<(String, String)> {
        let mut params = vec![
            ("app_key".to_string(), self.options.app_key.clone()),
            ("method".to_string(), method.to_string()),
            (
                "timestamp".to_string(),
                chrono::Utc::now().timestamp_millis().to_string(),
            ),
            ("format".to_string(), "json".to_string()),
            ("v".to_string(), "2.0".to_string()),
            ("sign_method".to_string(), "md5".to_string()),
            (
                "target_currency".to_string(),
                self.options.currency.to_ascii_uppercase(),
            ),
            (
                "target_language".to_string(),
                self.options.language.to_ascii_uppercase(),
            ),
            (
                "ship_to_country".to_string(),
                self.options.ship_to_country.to_ascii_uppercase(),
            ),
        ];
        if let Some(token) = &self.options.access_token {
            params.push(("session".to_string(), token.clone()));
        }
        params
    }
}

/// Secondary-call failures degrade the record instead of failing the fetch.
fn absorb<T>(id: ProductId, call: &'static str, outcome: Result<T, CatalogError>) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(
                product_id = %id,
                call,
                error = %error,
                "secondary catalog call failed, leaving its fields absent"
            );
            None
        }
    }
}

fn check_error(error: Option<ErrorEnvelope>) -> Result<(), CatalogError> {
    let Some(error) = error else {
        return Ok(());
    };
    if error.is_rate_limit() {
        return Err(CatalogError::RateLimited(error.code_string()));
    }
    Err(CatalogError::Api {
        code: error.code_string(),
        message: error.message(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CatalogConfig {
        CatalogConfig {
            app_key: "test-key".into(),
            app_secret: "test-secret".into(),
            ..CatalogConfig::default()
        }
    }

    #[test]
    fn common_params_carry_protocol_constants() {
        let client = CatalogClient::new(&test_config());
        let params = client.common_params(METHOD_DETAIL);
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("app_key"), Some("test-key"));
        assert_eq!(get("method"), Some(METHOD_DETAIL));
        assert_eq!(get("format"), Some("json"));
        assert_eq!(get("v"), Some("2.0"));
        assert_eq!(get("sign_method"), Some("md5"));
        assert_eq!(get("target_language"), Some("AR"));
        assert_eq!(get("ship_to_country"), Some("DZ"));
        assert!(get("session").is_none());
    }

    #[test]
    fn session_param_appears_with_access_token() {
        let mut config = test_config();
        config.access_token = Some("tok-123".into());
        let client = CatalogClient::new(&config);
        let params = client.common_params(METHOD_SKU);
        assert!(params.iter().any(|(k, v)| k == "session" && v == "tok-123"));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = CatalogClient::with_base_url(&test_config(), "http://127.0.0.1:9/sync/");
        assert_eq!(client.base_url, "http://127.0.0.1:9/sync");
    }

    #[test]
    fn gateway_error_maps_to_api_error() {
        let error = ErrorEnvelope {
            code: Some(25),
            msg: Some("invalid signature".into()),
            sub_code: None,
            sub_msg: None,
        };
        let err = check_error(Some(error)).unwrap_err();
        assert!(matches!(err, CatalogError::Api { .. }));
    }

    #[test]
    fn gateway_throttle_maps_to_rate_limited() {
        let error = ErrorEnvelope {
            code: Some(7),
            msg: Some("api call limited".into()),
            sub_code: None,
            sub_msg: None,
        };
        let err = check_error(Some(error)).unwrap_err();
        assert!(matches!(err, CatalogError::RateLimited(_)));
    }
}
