//! Session token generation and the session cookie.

use crate::config::Config;
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{engine::general_purpose, Engine as _};

/// Random bytes per session token.
const TOKEN_BYTES: usize = 32;

/// Encoded token length: base64url of 32 bytes without padding.
pub const TOKEN_LEN: usize = 43;

/// Generate a cryptographically random session token.
///
/// Returns a base64url string (43 characters, no padding) from 32 random
/// bytes, so it can be placed in a cookie without quoting.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::fill(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Whether a client-supplied token has the shape of an issued token.
///
/// Malformed tokens are rejected before any store lookup.
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Cookie carrying a freshly issued session token.
pub fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

/// Cookie that clears the session token on the client.
pub fn cleared_session_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name.clone(), ""))
        .path("/")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn test_generate_session_token() {
        let token = generate_session_token();

        assert_eq!(token.len(), TOKEN_LEN);

        let decoded = general_purpose::URL_SAFE_NO_PAD.decode(&token).unwrap();
        assert_eq!(decoded.len(), TOKEN_BYTES);
        assert!(is_well_formed_token(&token));
    }

    #[test]
    fn test_tokens_are_unique() {
        let token1 = generate_session_token();
        let token2 = generate_session_token();
        assert_ne!(token1, token2);
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        assert!(!is_well_formed_token(""));
        assert!(!is_well_formed_token("short"));
        assert!(!is_well_formed_token(&"a".repeat(TOKEN_LEN + 1)));
        // Standard alphabet characters are not part of the url-safe encoding
        assert!(!is_well_formed_token(&format!("{}+", "a".repeat(TOKEN_LEN - 1))));
        assert!(!is_well_formed_token(&format!("{};", "a".repeat(TOKEN_LEN - 1))));
        assert!(is_well_formed_token(&"a".repeat(TOKEN_LEN)));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let mut config = test_config();
        config.cookie_secure = true;

        let cookie = session_cookie(&config, "tok".to_string());
        assert_eq!(cookie.name(), config.session_cookie_name);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn test_cleared_cookie_has_same_name_and_path() {
        let config = test_config();
        let cookie = cleared_session_cookie(&config);
        assert_eq!(cookie.name(), config.session_cookie_name);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/"));
    }
}
