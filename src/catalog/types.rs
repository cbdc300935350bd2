//! Wire types for the affiliate gateway.
//!
//! Every field the gateway may omit is an `Option` (or defaulted
//! collection) so "missing" is a typed state, never a lookup miss. Field
//! names follow the gateway verbatim, including its `lastest_volume` typo.

use serde::Deserialize;

// ─── productdetail.get ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DetailEnvelope {
    #[serde(rename = "aliexpress_affiliate_productdetail_get_response")]
    pub response: Option<DetailResponse>,
    #[serde(default)]
    pub error_response: Option<ErrorEnvelope>,
}

#[derive(Debug, Deserialize)]
pub struct DetailResponse {
    pub result: Option<DetailResult>,
}

#[derive(Debug, Deserialize)]
pub struct DetailResult {
    #[serde(default)]
    pub products: Vec<ProductDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductDetail {
    pub product_id: Option<u64>,
    pub product_title: Option<String>,
    pub product_main_image_url: Option<String>,
    #[serde(default)]
    pub product_small_image_urls: Vec<String>,
    pub product_detail_url: Option<String>,
    /// Decimal string in the requested target currency, e.g. `"5.99"`.
    pub target_sale_price: Option<String>,
    pub target_sale_price_currency: Option<String>,
    pub target_original_price: Option<String>,
    /// Percentage string, e.g. `"95.4%"`.
    pub evaluate_rate: Option<String>,
    pub lastest_volume: Option<u64>,
    pub shop_name: Option<String>,
    pub shop_id: Option<u64>,
    pub shop_url: Option<String>,
}

// ─── product.sku.detail.get ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SkuEnvelope {
    #[serde(rename = "aliexpress_affiliate_product_sku_detail_get_response")]
    pub response: Option<SkuResponse>,
    #[serde(default)]
    pub error_response: Option<ErrorEnvelope>,
}

#[derive(Debug, Deserialize)]
pub struct SkuResponse {
    pub result: Option<SkuResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkuResult {
    #[serde(default)]
    pub sku_info_list: Vec<SkuInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkuInfo {
    pub sku_id: Option<String>,
    /// Property string like `"14:29#Black;5:100014064#XL"`; the part after
    /// each `#` is the human-readable label.
    pub sku_attr: Option<String>,
    pub sku_available_stock: Option<u64>,
}

// ─── product.shipping.get ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ShippingEnvelope {
    #[serde(rename = "aliexpress_affiliate_product_shipping_get_response")]
    pub response: Option<ShippingResponse>,
    #[serde(default)]
    pub error_response: Option<ErrorEnvelope>,
}

#[derive(Debug, Deserialize)]
pub struct ShippingResponse {
    pub result: Option<ShippingResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShippingResult {
    pub freight_amount: Option<String>,
    pub freight_currency: Option<String>,
    /// Free-form range like `"15-30"`, in days.
    pub estimated_delivery_days: Option<String>,
    pub service_name: Option<String>,
}

// ─── error envelope ─────────────────────────────────────────────────────────

/// Standard gateway error body, returned instead of the method envelope.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub code: Option<i64>,
    pub msg: Option<String>,
    pub sub_code: Option<String>,
    pub sub_msg: Option<String>,
}

impl ErrorEnvelope {
    /// Gateway code 7 is "api call limited"; throttling sub-codes carry an
    /// `isv.*rate-limit*` marker.
    pub fn is_rate_limit(&self) -> bool {
        self.code == Some(7)
            || self
                .sub_code
                .as_deref()
                .is_some_and(|s| s.contains("rate-limit"))
    }

    pub fn code_string(&self) -> String {
        match (self.code, self.sub_code.as_deref()) {
            (Some(code), Some(sub)) => format!("{code}/{sub}"),
            (Some(code), None) => code.to_string(),
            (None, Some(sub)) => sub.to_string(),
            (None, None) => "unknown".to_string(),
        }
    }

    pub fn message(&self) -> String {
        self.sub_msg
            .clone()
            .or_else(|| self.msg.clone())
            .unwrap_or_else(|| "no message".to_string())
    }
}
