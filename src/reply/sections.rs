//! Reply sections and the length-budget assembly.
//!
//! Sections render in a fixed order; when the assembled text would exceed
//! the channel limit, whole sections are dropped least-important-first
//! until it fits. Title and price never go away.

use super::direction;
use crate::catalog::{Money, ProductRecord};

pub(crate) const TITLE_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Section {
    Title,
    Price,
    Rating,
    Seller,
    Shipping,
    Variants,
    Link,
}

/// Dropped front-to-back when the reply is over budget.
const DROP_ORDER: [Section; 5] = [
    Section::Variants,
    Section::Seller,
    Section::Rating,
    Section::Shipping,
    Section::Link,
];

pub(crate) fn build(record: &ProductRecord, locale: &str) -> Vec<(Section, String)> {
    let mut blocks = vec![
        (Section::Title, title_block(record, locale)),
        (Section::Price, price_block(record, locale)),
    ];
    if let Some(block) = rating_block(record, locale) {
        blocks.push((Section::Rating, block));
    }
    if let Some(block) = seller_block(record, locale) {
        blocks.push((Section::Seller, block));
    }
    if let Some(block) = shipping_block(record, locale) {
        blocks.push((Section::Shipping, block));
    }
    if let Some(block) = variants_block(record, locale) {
        blocks.push((Section::Variants, block));
    }
    if let Some(block) = link_block(record, locale) {
        blocks.push((Section::Link, block));
    }
    blocks
}

/// Join blocks and enforce the budget by whole-section drops, hard-clamping
/// only if even title plus price alone would not fit.
pub(crate) fn assemble(mut blocks: Vec<(Section, String)>, max_chars: usize) -> String {
    for section in DROP_ORDER {
        if char_count(&join(&blocks)) <= max_chars {
            break;
        }
        blocks.retain(|(s, _)| *s != section);
    }

    let text = join(&blocks);
    if char_count(&text) > max_chars {
        clamp_chars(&text, max_chars)
    } else {
        text
    }
}

fn join(blocks: &[(Section, String)]) -> String {
    blocks
        .iter()
        .map(|(_, block)| block.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

fn clamp_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

// ─── Section builders ───────────────────────────────────────────────────────

fn title_block(record: &ProductRecord, locale: &str) -> String {
    let title = clamp_title(&strip_markdown(&record.title));
    format!("🛍️ *{}*", direction::shape(locale, &title))
}

fn price_block(record: &ProductRecord, locale: &str) -> String {
    let sale = direction::shape(locale, &format_money(&record.price));
    let mut lines = vec![t!("reply.price.sale", locale = locale, price = sale).into_owned()];

    if let Some(original) = &record.original_price {
        if original.amount > record.price.amount && original.amount > 0.0 {
            let percent = (original.amount - record.price.amount) / original.amount * 100.0;
            let was = direction::shape(locale, &format_money(original));
            lines.push(
                t!(
                    "reply.price.was",
                    locale = locale,
                    price = was,
                    discount = format!("{:.0}", percent.round())
                )
                .into_owned(),
            );
        }
    }

    lines.join("\n")
}

fn rating_block(record: &ProductRecord, locale: &str) -> Option<String> {
    match (record.rating_percent.as_deref(), record.orders_count) {
        (Some(rate), orders) => {
            let shaped_rate = direction::shape(locale, rate);
            let Some(stars) = stars_for(rate) else {
                return Some(
                    t!("reply.rating.unscored", locale = locale, rate = shaped_rate).into_owned(),
                );
            };
            let line = match orders {
                Some(orders) => t!(
                    "reply.rating.with_orders",
                    locale = locale,
                    stars = stars,
                    rate = shaped_rate,
                    orders = orders
                )
                .into_owned(),
                None => t!(
                    "reply.rating.plain",
                    locale = locale,
                    stars = stars,
                    rate = shaped_rate
                )
                .into_owned(),
            };
            Some(line)
        }
        (None, Some(orders)) => {
            Some(t!("reply.rating.orders_only", locale = locale, orders = orders).into_owned())
        }
        (None, None) => None,
    }
}

fn seller_block(record: &ProductRecord, locale: &str) -> Option<String> {
    let seller = record.seller.as_ref()?;
    let name = direction::shape(locale, &strip_markdown(&seller.name));
    let display = match &seller.url {
        Some(url) => format!("[{name}]({url})"),
        None => name,
    };
    Some(t!("reply.seller", locale = locale, name = display).into_owned())
}

fn shipping_block(record: &ProductRecord, locale: &str) -> Option<String> {
    let shipping = record.shipping.as_ref()?;
    let mut lines = Vec::new();

    if let Some(cost) = &shipping.cost {
        let price = direction::shape(locale, &format_money(cost));
        let line = match &shipping.service {
            Some(service) => t!(
                "reply.shipping.cost_with_service",
                locale = locale,
                cost = price,
                service = direction::shape(locale, &strip_markdown(service))
            )
            .into_owned(),
            None => t!("reply.shipping.cost", locale = locale, cost = price).into_owned(),
        };
        lines.push(line);
    }

    if let Some(days) = &shipping.delivery_days {
        lines.push(
            t!(
                "reply.shipping.days",
                locale = locale,
                days = direction::shape(locale, days)
            )
            .into_owned(),
        );
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn variants_block(record: &ProductRecord, locale: &str) -> Option<String> {
    if record.variants.is_empty() {
        return None;
    }
    let labels = record
        .variants
        .iter()
        .map(|label| strip_markdown(label))
        .collect::<Vec<_>>()
        .join(", ");
    let list = direction::shape(locale, &labels);
    Some(t!("reply.variants", locale = locale, list = list).into_owned())
}

fn link_block(record: &ProductRecord, locale: &str) -> Option<String> {
    let url = record.detail_url.as_deref()?;
    Some(t!("reply.link", locale = locale, url = url).into_owned())
}

// ─── Shared formatting helpers ──────────────────────────────────────────────

pub(crate) fn format_money(money: &Money) -> String {
    format!("{:.2} {}", money.amount, money.currency)
}

/// Gateway ratings are percentages; five stars, one per 20 points, with a
/// floor of one so a rated product never shows zero stars.
fn stars_for(rate: &str) -> Option<String> {
    let percent: f64 = rate.trim().trim_end_matches('%').parse().ok()?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = (percent / 20.0).max(0.0) as usize;
    Some("⭐".repeat(count.clamp(1, 5)))
}

/// Every piece of upstream text that lands inside a Markdown entity
/// (titles, shop names, variant labels, service names) passes through here.
fn strip_markdown(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            // Markdown control characters break Telegram's legacy parser.
            '*' | '_' | '`' | '[' | ']' => {}
            '\n' | '\r' | '\t' => cleaned.push(' '),
            _ => cleaned.push(c),
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clamp_title(title: &str) -> String {
    match title.char_indices().nth(TITLE_MAX_CHARS) {
        Some((idx, _)) => format!("{}...", title[..idx].trim_end()),
        None => title.to_string(),
    }
}
