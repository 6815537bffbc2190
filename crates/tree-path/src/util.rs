use std::borrow::Cow;

/// Decodes `~1` and `~0` in one pointer component.
pub fn unescape_component(component: &str) -> Cow<'_, str> {
    match component.contains('~') {
        false => Cow::Borrowed(component),
        true => Cow::Owned(component.replace("~1", "/").replace("~0", "~")),
    }
}

pub fn escape_component(component: &str) -> Cow<'_, str> {
    match component.contains(['/', '~']) {
        false => Cow::Borrowed(component),
        true => Cow::Owned(component.replace('~', "~0").replace('/', "~1")),
    }
}

/// Whether a key names an array slot: decimal digits with no leading zero, so
/// every index has exactly one key form.
pub fn is_valid_index(key: &str) -> bool {
    match key.as_bytes() {
        [] => false,
        [b'0', _, ..] => false,
        digits => digits.iter().all(u8::is_ascii_digit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_keys() {
        assert!(is_valid_index("0"));
        assert!(is_valid_index("10"));
        assert!(!is_valid_index("01"));
        assert!(!is_valid_index(""));
        assert!(!is_valid_index("1e3"));
        assert!(!is_valid_index("-1"));
    }

    #[test]
    fn plain_components_are_borrowed() {
        assert!(matches!(escape_component("plain"), Cow::Borrowed(_)));
        assert!(matches!(unescape_component("plain"), Cow::Borrowed(_)));
        for raw in ["a/b", "a~b", "~/", "~01"] {
            assert_eq!(unescape_component(&escape_component(raw)), raw);
        }
    }
}
