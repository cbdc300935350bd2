//! Bidi helpers for replies rendered in right-to-left locales.
//!
//! Product titles, prices and variant labels are usually Latin-script runs.
//! Dropped bare into Arabic text they shuffle punctuation and digits around;
//! wrapping each run in directional isolates keeps the layout stable.

/// First Strong Isolate / Pop Directional Isolate pair.
const FSI: char = '\u{2068}';
const PDI: char = '\u{2069}';

pub fn is_rtl(locale: &str) -> bool {
    let language = locale.split(['-', '_']).next().unwrap_or(locale);
    matches!(language, "ar" | "he" | "fa" | "ur")
}

/// Wrap `text` in an isolate pair so it renders as one unit regardless of
/// the surrounding paragraph direction.
pub fn isolate(text: &str) -> String {
    format!("{FSI}{text}{PDI}")
}

/// Isolate `text` only when the reply locale is right-to-left.
pub fn shape(locale: &str, text: &str) -> String {
    if is_rtl(locale) {
        isolate(text)
    } else {
        text.to_string()
    }
}
