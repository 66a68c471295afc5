//! Property-based tests for the access gate

use axum::http::{HeaderMap, HeaderValue};
use proptest::prelude::*;
use remitlend_backend::config::SharedSecret;
use remitlend_backend::security::{ApiKeyGate, AuthError};

fn headers_with_key(key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-api-key", HeaderValue::from_str(key).unwrap());
    headers
}

proptest! {
    /// The configured secret is always accepted
    #[test]
    fn test_exact_key_accepted(
        secret in "[A-Za-z0-9_-]{1,64}",
    ) {
        let gate = ApiKeyGate::new(SharedSecret::new(secret.clone()));
        prop_assert_eq!(gate.check(&headers_with_key(&secret)), Ok(()));
    }

    /// Any presented key that differs from the secret is rejected
    #[test]
    fn test_other_keys_rejected(
        secret in "[A-Za-z0-9]{1,32}",
        presented in "[A-Za-z0-9]{0,32}",
    ) {
        prop_assume!(secret != presented);

        let gate = ApiKeyGate::new(SharedSecret::new(secret));
        prop_assert_eq!(gate.check(&headers_with_key(&presented)), Err(AuthError::Unauthorized));
    }

    /// Prefixes and extensions of the secret are rejected
    #[test]
    fn test_prefix_and_extension_rejected(
        secret in "[A-Za-z0-9]{2,32}",
        suffix in "[A-Za-z0-9]{1,8}",
    ) {
        let gate = ApiKeyGate::new(SharedSecret::new(secret.clone()));

        let prefix = &secret[..secret.len() - 1];
        prop_assert_eq!(gate.check(&headers_with_key(prefix)), Err(AuthError::Unauthorized));

        let extended = format!("{}{}", secret, suffix);
        prop_assert_eq!(gate.check(&headers_with_key(&extended)), Err(AuthError::Unauthorized));
    }

    /// Without a configured secret every request is a server fault
    #[test]
    fn test_unconfigured_gate_always_misconfigured(
        presented in proptest::option::of("[A-Za-z0-9]{0,32}"),
    ) {
        let gate = ApiKeyGate::new(None);
        let headers = presented.as_deref().map(headers_with_key).unwrap_or_default();
        prop_assert_eq!(gate.check(&headers), Err(AuthError::Misconfigured));
    }
}
