use super::types::{ProductDetail, ShippingResult, SkuResult};
use crate::error::CatalogError;
use crate::resolver::ProductId;

/// Currency-tagged amount. The gateway sends decimal strings; they are
/// parsed exactly once, here, and formatted only by the reply layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Money {
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct Seller {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ShippingEstimate {
    pub cost: Option<Money>,
    pub delivery_days: Option<String>,
    pub service: Option<String>,
}

impl ShippingEstimate {
    fn from_wire(result: ShippingResult, fallback_currency: &str) -> Option<Self> {
        let cost = parse_money(
            result.freight_amount.as_deref(),
            result.freight_currency.as_deref(),
            fallback_currency,
        );
        let estimate = Self {
            cost,
            delivery_days: result.estimated_delivery_days,
            service: result.service_name,
        };
        let empty = estimate.cost.is_none()
            && estimate.delivery_days.is_none()
            && estimate.service.is_none();
        (!empty).then_some(estimate)
    }
}

/// Aggregated result of one product fetch.
///
/// Required fields come from the detail call. Everything optional stays
/// absent when the call that owns it failed or returned nothing — absence
/// is a valid state, not an error.
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub id: ProductId,
    pub title: String,
    pub price: Money,
    pub original_price: Option<Money>,
    /// Raw percentage string from the gateway, e.g. `"95.4%"`.
    pub rating_percent: Option<String>,
    pub orders_count: Option<u64>,
    pub seller: Option<Seller>,
    pub shipping: Option<ShippingEstimate>,
    /// Human-readable variant labels; empty means unknown.
    pub variants: Vec<String>,
    pub images: Vec<String>,
    pub detail_url: Option<String>,
}

impl ProductRecord {
    /// Merge the three call results into one record. Field ownership is
    /// strict: the detail call owns everything except `variants` (sku call)
    /// and `shipping` (shipping call).
    pub(crate) fn from_parts(
        id: ProductId,
        detail: ProductDetail,
        sku: Option<SkuResult>,
        shipping: Option<ShippingResult>,
        fallback_currency: &str,
    ) -> Result<Self, CatalogError> {
        let title = detail
            .product_title
            .filter(|t| !t.trim().is_empty())
            .ok_or(CatalogError::MissingField {
                id,
                field: "product_title",
            })?;

        let currency = detail.target_sale_price_currency.as_deref();
        let sale = parse_money(detail.target_sale_price.as_deref(), currency, fallback_currency);
        let original = parse_money(
            detail.target_original_price.as_deref(),
            currency,
            fallback_currency,
        );

        // A product page without any price is unusable; fall back to the
        // original price when the sale price alone is missing.
        let (price, original_price) = match (sale, original) {
            (Some(sale), original) => (sale, original),
            (None, Some(original)) => (original, None),
            (None, None) => {
                return Err(CatalogError::MissingField {
                    id,
                    field: "target_sale_price",
                });
            }
        };

        let mut images = Vec::new();
        if let Some(main) = detail.product_main_image_url {
            images.push(main);
        }
        for url in detail.product_small_image_urls {
            if !images.contains(&url) {
                images.push(url);
            }
        }

        let seller = match (detail.shop_name, detail.shop_id) {
            (Some(name), _) => Some(Seller {
                name,
                url: detail.shop_url,
            }),
            (None, Some(shop_id)) => Some(Seller {
                name: format!("#{shop_id}"),
                url: detail.shop_url,
            }),
            (None, None) => None,
        };

        Ok(Self {
            id,
            title,
            price,
            original_price,
            rating_percent: detail.evaluate_rate,
            orders_count: detail.lastest_volume,
            seller,
            shipping: shipping.and_then(|s| ShippingEstimate::from_wire(s, fallback_currency)),
            variants: sku.map(variant_labels).unwrap_or_default(),
            images,
            detail_url: detail.product_detail_url,
        })
    }

    /// Apply the configured multiplicative surcharge to the quoted prices.
    /// Shipping cost is left untouched. Runs after merge so rendering stays
    /// a pure function of the record.
    pub(crate) fn apply_tax_rate(&mut self, rate: f64) {
        self.price.amount = round_cents(self.price.amount * (1.0 + rate));
        if let Some(original) = self.original_price.as_mut() {
            original.amount = round_cents(original.amount * (1.0 + rate));
        }
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

fn parse_money(
    amount: Option<&str>,
    currency: Option<&str>,
    fallback_currency: &str,
) -> Option<Money> {
    let amount: f64 = amount?.trim().parse().ok()?;
    Some(Money {
        amount,
        currency: currency.unwrap_or(fallback_currency).to_string(),
    })
}

/// Turn sku property strings into display labels, in-stock first-seen
/// order. `"14:29#Black;5:100014064#XL"` becomes `"Black / XL"`.
fn variant_labels(sku: SkuResult) -> Vec<String> {
    let mut labels = Vec::new();
    for info in sku.sku_info_list {
        if info.sku_available_stock == Some(0) {
            continue;
        }
        let Some(label) = info.sku_attr.as_deref().and_then(variant_label) else {
            continue;
        };
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels
}

fn variant_label(attr: &str) -> Option<String> {
    let parts: Vec<&str> = attr
        .split(';')
        .filter_map(|prop| prop.split_once('#').map(|(_, label)| label.trim()))
        .filter(|label| !label.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" / "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::SkuInfo;

    fn detail(title: Option<&str>, sale: Option<&str>, original: Option<&str>) -> ProductDetail {
        ProductDetail {
            product_id: Some(1005001234567890),
            product_title: title.map(String::from),
            product_main_image_url: Some("https://img.example/main.jpg".into()),
            product_small_image_urls: vec![],
            product_detail_url: Some("https://www.aliexpress.com/item/1005001234567890.html".into()),
            target_sale_price: sale.map(String::from),
            target_sale_price_currency: Some("USD".into()),
            target_original_price: original.map(String::from),
            evaluate_rate: Some("95.4%".into()),
            lastest_volume: Some(1200),
            shop_name: Some("Good Shop".into()),
            shop_id: Some(1102),
            shop_url: Some("https://www.aliexpress.com/store/1102".into()),
        }
    }

    fn id() -> ProductId {
        ProductId::new(1005001234567890)
    }

    #[test]
    fn merges_all_three_parts() {
        let sku = SkuResult {
            sku_info_list: vec![SkuInfo {
                sku_id: Some("1".into()),
                sku_attr: Some("14:29#Black;5:100014064#XL".into()),
                sku_available_stock: Some(3),
            }],
        };
        let shipping = ShippingResult {
            freight_amount: Some("2.50".into()),
            freight_currency: Some("USD".into()),
            estimated_delivery_days: Some("15-30".into()),
            service_name: Some("Standard".into()),
        };
        let record = ProductRecord::from_parts(
            id(),
            detail(Some("Wireless Mouse"), Some("5.99"), Some("9.99")),
            Some(sku),
            Some(shipping),
            "USD",
        )
        .unwrap();

        assert_eq!(record.title, "Wireless Mouse");
        assert!((record.price.amount - 5.99).abs() < 1e-9);
        assert_eq!(record.price.currency, "USD");
        assert!(record.original_price.is_some());
        assert_eq!(record.variants, vec!["Black / XL".to_string()]);
        let shipping = record.shipping.unwrap();
        assert_eq!(shipping.delivery_days.as_deref(), Some("15-30"));
        assert_eq!(record.seller.unwrap().name, "Good Shop");
    }

    #[test]
    fn absent_secondaries_leave_fields_absent() {
        let record = ProductRecord::from_parts(
            id(),
            detail(Some("Wireless Mouse"), Some("5.99"), None),
            None,
            None,
            "USD",
        )
        .unwrap();
        assert!(record.variants.is_empty());
        assert!(record.shipping.is_none());
    }

    #[test]
    fn missing_title_is_an_error() {
        let err =
            ProductRecord::from_parts(id(), detail(None, Some("5.99"), None), None, None, "USD")
                .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MissingField {
                field: "product_title",
                ..
            }
        ));
    }

    #[test]
    fn price_falls_back_to_original() {
        let record = ProductRecord::from_parts(
            id(),
            detail(Some("Wireless Mouse"), None, Some("9.99")),
            None,
            None,
            "USD",
        )
        .unwrap();
        assert!((record.price.amount - 9.99).abs() < 1e-9);
        assert!(record.original_price.is_none());
    }

    #[test]
    fn missing_prices_are_an_error() {
        let err = ProductRecord::from_parts(
            id(),
            detail(Some("Wireless Mouse"), None, None),
            None,
            None,
            "USD",
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::MissingField { .. }));
    }

    #[test]
    fn out_of_stock_variants_are_skipped() {
        let sku = SkuResult {
            sku_info_list: vec![
                SkuInfo {
                    sku_id: Some("1".into()),
                    sku_attr: Some("14:29#Black".into()),
                    sku_available_stock: Some(0),
                },
                SkuInfo {
                    sku_id: Some("2".into()),
                    sku_attr: Some("14:173#Blue".into()),
                    sku_available_stock: None,
                },
                SkuInfo {
                    sku_id: Some("3".into()),
                    sku_attr: Some("14:173#Blue".into()),
                    sku_available_stock: Some(7),
                },
            ],
        };
        let record = ProductRecord::from_parts(
            id(),
            detail(Some("Wireless Mouse"), Some("5.99"), None),
            Some(sku),
            None,
            "USD",
        )
        .unwrap();
        assert_eq!(record.variants, vec!["Blue".to_string()]);
    }

    #[test]
    fn tax_rate_adjusts_quoted_prices_only() {
        let shipping = ShippingResult {
            freight_amount: Some("2.50".into()),
            freight_currency: None,
            estimated_delivery_days: None,
            service_name: None,
        };
        let mut record = ProductRecord::from_parts(
            id(),
            detail(Some("Wireless Mouse"), Some("10.00"), Some("20.00")),
            None,
            Some(shipping),
            "USD",
        )
        .unwrap();

        record.apply_tax_rate(0.1);
        assert!((record.price.amount - 11.0).abs() < 1e-9);
        assert!((record.original_price.as_ref().unwrap().amount - 22.0).abs() < 1e-9);
        let cost = record.shipping.unwrap().cost.unwrap();
        assert!((cost.amount - 2.5).abs() < 1e-9, "shipping must not be taxed");
    }

    #[test]
    fn empty_shipping_result_collapses_to_none() {
        let record = ProductRecord::from_parts(
            id(),
            detail(Some("Wireless Mouse"), Some("5.99"), None),
            None,
            Some(ShippingResult::default()),
            "USD",
        )
        .unwrap();
        assert!(record.shipping.is_none());
    }
}
