//! Expo push-token grammar.

/// Whether a stored token is syntactically a valid Expo push endpoint.
///
/// Accepts `ExponentPushToken[...]` / `ExpoPushToken[...]` with a non-empty
/// bracket body, or a bare 64-character hex device token. Everything else,
/// including the empty string, is rejected.
pub fn is_valid_push_token(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }

    for prefix in ["ExponentPushToken[", "ExpoPushToken["] {
        if let Some(rest) = token.strip_prefix(prefix) {
            return rest.len() > 1 && rest.ends_with(']');
        }
    }

    token.len() == 64 && token.chars().all(|c| c.is_ascii_hexdigit())
}
