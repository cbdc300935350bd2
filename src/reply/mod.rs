//! Localized reply rendering.
//!
//! Turns pipeline outcomes into chat-ready text: product cards assembled
//! from sections under the channel length budget, or fixed error lines in
//! the configured locale. Rendering is pure; the same outcome and record
//! always produce the same reply.

pub mod direction;
mod sections;

use strum::Display;

use crate::catalog::ProductRecord;

/// Terminal state of one inbound message after the pipeline ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeKind {
    /// Nothing in the message looked like a catalog link.
    NoUrl,
    /// A link was found but no product id could be recovered from it.
    Unresolvable,
    /// The catalog answered and the product does not exist.
    NotFound,
    /// The catalog could not be reached or rejected the call.
    Upstream,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedReply {
    pub text: String,
    /// Main product image, when the channel can attach one.
    pub image_url: Option<String>,
}

pub struct ReplyRenderer {
    locale: String,
    max_chars: usize,
}

impl ReplyRenderer {
    pub fn new(locale: impl Into<String>, max_chars: usize) -> Self {
        Self {
            locale: locale.into(),
            max_chars,
        }
    }

    /// Render the reply for an outcome. `NoUrl` yields `None`: chatter
    /// without links is never answered.
    pub fn render(&self, outcome: OutcomeKind, record: Option<&ProductRecord>) -> Option<FormattedReply> {
        match outcome {
            OutcomeKind::NoUrl => None,
            OutcomeKind::Unresolvable | OutcomeKind::NotFound | OutcomeKind::Upstream => {
                Some(self.error_reply(outcome))
            }
            OutcomeKind::Success => match record {
                Some(record) => Some(self.render_record(record)),
                None => {
                    tracing::error!(%outcome, "success outcome without a record");
                    Some(self.error_reply(OutcomeKind::Upstream))
                }
            },
        }
    }

    fn render_record(&self, record: &ProductRecord) -> FormattedReply {
        let blocks = sections::build(record, &self.locale);
        FormattedReply {
            text: sections::assemble(blocks, self.max_chars),
            image_url: record.images.first().cloned(),
        }
    }

    fn error_reply(&self, outcome: OutcomeKind) -> FormattedReply {
        let text = match outcome {
            OutcomeKind::Unresolvable => {
                t!("reply.error.unresolvable", locale = self.locale.as_str())
            }
            OutcomeKind::NotFound => t!("reply.error.not_found", locale = self.locale.as_str()),
            _ => t!("reply.error.upstream", locale = self.locale.as_str()),
        };
        FormattedReply {
            text: text.into_owned(),
            image_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Money;
    use crate::resolver::ProductId;

    fn record() -> ProductRecord {
        ProductRecord {
            id: ProductId::new(1005001234567890),
            title: "Wireless Mouse".into(),
            price: Money {
                amount: 5.99,
                currency: "USD".into(),
            },
            original_price: None,
            rating_percent: None,
            orders_count: None,
            seller: None,
            shipping: None,
            variants: Vec::new(),
            images: vec!["https://img.example/main.jpg".into()],
            detail_url: None,
        }
    }

    fn renderer(locale: &str) -> ReplyRenderer {
        ReplyRenderer::new(locale, 4096)
    }

    #[test]
    fn no_url_stays_silent() {
        assert_eq!(renderer("en").render(OutcomeKind::NoUrl, None), None);
    }

    #[test]
    fn error_outcomes_have_fixed_text() {
        let r = renderer("en");
        for outcome in [
            OutcomeKind::Unresolvable,
            OutcomeKind::NotFound,
            OutcomeKind::Upstream,
        ] {
            let reply = r.render(outcome, None).unwrap();
            assert!(!reply.text.is_empty());
            assert_eq!(reply.image_url, None);
        }
    }

    #[test]
    fn error_text_follows_locale() {
        let en = renderer("en").render(OutcomeKind::NotFound, None).unwrap();
        let ar = renderer("ar").render(OutcomeKind::NotFound, None).unwrap();
        assert_ne!(en.text, ar.text);
    }

    #[test]
    fn success_renders_card_with_image() {
        let reply = renderer("en")
            .render(OutcomeKind::Success, Some(&record()))
            .unwrap();
        assert!(reply.text.contains("Wireless Mouse"));
        assert!(reply.text.contains("5.99"));
        assert_eq!(
            reply.image_url.as_deref(),
            Some("https://img.example/main.jpg")
        );
    }

    #[test]
    fn success_without_record_degrades_to_upstream_error() {
        let r = renderer("en");
        let degraded = r.render(OutcomeKind::Success, None).unwrap();
        let upstream = r.render(OutcomeKind::Upstream, None).unwrap();
        assert_eq!(degraded, upstream);
    }

    #[test]
    fn rendering_is_idempotent() {
        let r = renderer("ar");
        let product = record();
        let first = r.render(OutcomeKind::Success, Some(&product)).unwrap();
        let second = r.render(OutcomeKind::Success, Some(&product)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn budget_is_enforced() {
        let reply = ReplyRenderer::new("en", 50)
            .render(OutcomeKind::Success, Some(&record()))
            .unwrap();
        assert!(reply.text.chars().count() <= 50);
    }
}
