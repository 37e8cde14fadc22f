//! URL and form decoding
//!
//! Decodes `application/x-www-form-urlencoded` payloads and percent-encoded
//! path segments.

use std::borrow::Cow;

/// Look up the first value for `key` in a urlencoded string
///
/// `+` decodes to a space. Pairs that fail to decode are skipped.
pub fn form_value(encoded: &str, key: &str) -> Option<String> {
    encoded
        .split('&')
        .filter(|pair| !pair.is_empty())
        .find_map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            if decode_form_component(name)? != key {
                return None;
            }
            decode_form_component(value)
        })
}

fn decode_form_component(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(Cow::into_owned)
}

/// Percent-decode a path segment; `None` if it is not valid UTF-8
///
/// Unlike form components, `+` is kept literally in paths.
pub fn decode_path(raw: &str) -> Option<Cow<'_, str>> {
    urlencoding::decode(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_value_basic() {
        assert_eq!(
            form_value("body=Hello+World", "body").as_deref(),
            Some("Hello World")
        );
        assert_eq!(
            form_value("title=x&body=a%26b%3Dc", "body").as_deref(),
            Some("a&b=c")
        );
    }

    #[test]
    fn test_form_value_first_wins() {
        assert_eq!(form_value("body=one&body=two", "body").as_deref(), Some("one"));
    }

    #[test]
    fn test_form_value_missing_and_empty() {
        assert_eq!(form_value("title=x", "body"), None);
        assert_eq!(form_value("", "body"), None);
        assert_eq!(form_value("body=", "body").as_deref(), Some(""));
        assert_eq!(form_value("body", "body").as_deref(), Some(""));
    }

    #[test]
    fn test_form_value_multiline() {
        assert_eq!(
            form_value("body=line1%0D%0Aline2", "body").as_deref(),
            Some("line1\r\nline2")
        );
    }

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("hello%20world").as_deref(), Some("hello world"));
        assert_eq!(decode_path("c++").as_deref(), Some("c++"));
        assert_eq!(decode_path("caf%C3%A9").as_deref(), Some("café"));
        assert!(decode_path("bad%FF").is_none());
    }
}
