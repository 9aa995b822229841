//! Bearer credentials issued by the records API.

use reqwest::header::HeaderValue;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque bearer token (access or refresh).
///
/// The token is validated at construction so that it always converts into an HTTP header value.
/// It is stored without the `Bearer ` prefix.
///
/// `Debug` never prints the token itself; it renders as `BearerToken([REDACTED])`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Get the raw token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the `Authorization` header value (`Bearer <token>`).
    ///
    /// The returned value is marked sensitive so that it is redacted in debug output.
    pub fn as_header_value(&self) -> Result<HeaderValue, BearerTokenError> {
        let mut header_value = HeaderValue::from_str(&format!("Bearer {}", self.0))
            .map_err(|_| BearerTokenError::NotAHeaderValue)?;
        header_value.set_sensitive(true);
        Ok(header_value)
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BearerToken").field(&"[REDACTED]").finish()
    }
}

impl TryFrom<String> for BearerToken {
    type Error = BearerTokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_token(&value)?;
        Ok(Self(value))
    }
}

impl TryFrom<&str> for BearerToken {
    type Error = BearerTokenError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_token(value)?;
        Ok(Self(value.to_string()))
    }
}

impl std::str::FromStr for BearerToken {
    type Err = BearerTokenError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::try_from(value)
    }
}

impl Serialize for BearerToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BearerToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Only visible ASCII (32-126) is accepted, which is what `HeaderValue::from_str` requires.
fn validate_token(token: &str) -> Result<(), BearerTokenError> {
    if token.is_empty() {
        return Err(BearerTokenError::Empty);
    }

    for (idx, ch) in token.chars().enumerate() {
        if !(32..=126).contains(&(ch as u32)) {
            return Err(BearerTokenError::InvalidCharacter {
                character: ch,
                position: idx,
            });
        }
    }

    Ok(())
}

/// Errors that can occur when constructing a [`BearerToken`].
#[derive(Debug, thiserror::Error)]
pub enum BearerTokenError {
    #[error("bearer token cannot be empty")]
    Empty,

    /// Control characters, DEL, and anything outside ASCII are rejected.
    #[error("bearer token contains invalid character '{character}' (U+{:04X}) at position {position}", *character as u32)]
    InvalidCharacter { character: char, position: usize },

    #[error("bearer token cannot be used as an HTTP header value")]
    NotAHeaderValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_value_includes_bearer_prefix_and_is_sensitive() {
        //* Given
        let token = BearerToken::try_from("abc.def.ghi").expect("valid token");

        //* When
        let header_value = token.as_header_value().expect("header value");

        //* Then
        assert_eq!(header_value.to_str().unwrap(), "Bearer abc.def.ghi");
        assert!(header_value.is_sensitive());
    }

    #[test]
    fn debug_output_is_redacted() {
        let token = BearerToken::try_from("super-secret").unwrap();
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn empty_token_is_rejected() {
        let error = BearerToken::try_from("").expect_err("empty token must fail");
        assert!(matches!(error, BearerTokenError::Empty));
    }

    #[test]
    fn newline_is_rejected_with_position() {
        let error = BearerToken::try_from("abc\ndef").expect_err("newline must fail");
        assert!(
            matches!(
                error,
                BearerTokenError::InvalidCharacter {
                    character: '\n',
                    position: 3
                }
            ),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn deserialize_rejects_invalid_tokens() {
        assert!(serde_json::from_str::<BearerToken>("\"ok-token\"").is_ok());
        assert!(serde_json::from_str::<BearerToken>("\"\"").is_err());
    }
}
