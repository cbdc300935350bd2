//! Sender gating for inbound messages.
//!
//! An empty allowlist leaves the bot open to everyone; product lookups are
//! harmless and the stock deployment serves any chat that messages it. A
//! non-empty list restricts to exact matches, with `"*"` as an explicit
//! allow-all entry.

pub(crate) fn is_allowed_user(allowed: &[String], identity: &str) -> bool {
    if allowed.is_empty() {
        return true;
    }
    if identity.is_empty() {
        return false;
    }
    allowed.iter().any(|entry| entry == "*" || entry == identity)
}

/// A Telegram sender is reachable by username and by numeric id; either
/// matching is enough.
pub(crate) fn is_any_user_allowed<'a, I>(allowed: &[String], identities: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    identities
        .into_iter()
        .any(|id| is_allowed_user(allowed, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(entries: &[&str]) -> Vec<String> {
        entries.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn empty_allowlist_is_open() {
        assert!(is_allowed_user(&[], "anyone"));
        assert!(is_allowed_user(&[], "12345"));
    }

    #[test]
    fn wildcard_allows_everyone() {
        assert!(is_allowed_user(&list(&["*"]), "anyone"));
    }

    #[test]
    fn specific_allowlist_filters() {
        let allowed = list(&["alice", "bob"]);
        assert!(is_allowed_user(&allowed, "alice"));
        assert!(is_allowed_user(&allowed, "bob"));
        assert!(!is_allowed_user(&allowed, "eve"));
    }

    #[test]
    fn exact_match_not_substring() {
        let allowed = list(&["alice"]);
        assert!(!is_allowed_user(&allowed, "alice_bot"));
        assert!(!is_allowed_user(&allowed, "alic"));
        assert!(!is_allowed_user(&allowed, "malice"));
    }

    #[test]
    fn empty_identity_denied_when_list_set() {
        assert!(!is_allowed_user(&list(&["alice"]), ""));
    }

    #[test]
    fn case_sensitive() {
        let allowed = list(&["Alice"]);
        assert!(is_allowed_user(&allowed, "Alice"));
        assert!(!is_allowed_user(&allowed, "alice"));
    }

    #[test]
    fn any_identity_match_is_enough() {
        let allowed = list(&["123456789"]);
        assert!(is_any_user_allowed(&allowed, ["unknown", "123456789"]));
        assert!(!is_any_user_allowed(&allowed, ["unknown", "987654321"]));
    }
}
