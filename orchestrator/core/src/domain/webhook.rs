// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Webhook Credentials
//!
//! Opaque tokens that authorize `POST /webhook/{token}`. A token is 64
//! characters drawn from `[A-Za-z0-9]`, generated once by an operator with
//! `stackd new-webhook` and stored in configuration.

use rand::distr::Alphanumeric;
use rand::Rng;
use subtle::ConstantTimeEq;

/// Length of a generated token.
pub const WEBHOOK_TOKEN_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookToken(String);

impl WebhookToken {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        let token: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(WEBHOOK_TOKEN_LEN)
            .map(char::from)
            .collect();
        Self(token)
    }

    /// Accept an operator-supplied token of the generated shape.
    pub fn parse(value: &str) -> Result<Self, String> {
        if value.is_empty() {
            return Err("webhook id cannot be empty".to_string());
        }
        if value.len() != WEBHOOK_TOKEN_LEN {
            return Err(format!(
                "webhook id must be {} characters, got {}",
                WEBHOOK_TOKEN_LEN,
                value.len()
            ));
        }
        if let Some(bad) = value.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(format!("webhook id contains invalid character '{}'", bad));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

/// Exact membership test over the configured tokens.
///
/// Every configured token is compared so the time taken does not depend on
/// which one matched.
pub fn is_authorized(tokens: &[WebhookToken], candidate: &str) -> bool {
    tokens
        .iter()
        .fold(false, |found, token| token.matches(candidate) | found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_shape() {
        let token = WebhookToken::generate();
        assert_eq!(token.as_str().len(), WEBHOOK_TOKEN_LEN);
        assert!(token.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(WebhookToken::parse(token.as_str()).is_ok());
        assert_ne!(token, WebhookToken::generate());
    }

    fn token_of(c: char) -> String {
        std::iter::repeat(c).take(WEBHOOK_TOKEN_LEN).collect()
    }

    #[test]
    fn test_parse_rejects_foreign_characters() {
        let valid = token_of('a');
        assert!(WebhookToken::parse(&valid).is_ok());
        assert!(WebhookToken::parse(&valid.replacen('a', "-", 1)).is_err());
        assert!(WebhookToken::parse(&valid.replacen('a', " ", 1)).is_err());
        assert!(WebhookToken::parse("").is_err());
    }

    #[test]
    fn test_parse_enforces_length() {
        let valid = token_of('Z');
        assert!(WebhookToken::parse(&valid[1..]).is_err());
        assert!(WebhookToken::parse(&format!("{}Z", valid)).is_err());
        assert!(WebhookToken::parse("abc123").is_err());
    }

    #[test]
    fn test_membership_is_exact() {
        let a = token_of('a');
        let z = token_of('z');
        let tokens = vec![
            WebhookToken::parse(&a).unwrap(),
            WebhookToken::parse(&z).unwrap(),
        ];
        assert!(is_authorized(&tokens, &a));
        assert!(is_authorized(&tokens, &z));
        assert!(!is_authorized(&tokens, &a[1..]));
        assert!(!is_authorized(&tokens, &format!("{}a", a)));
        assert!(!is_authorized(&[], &a));
    }
}
