//! Reversible obfuscation of the shared secret echoed back to nodes.
//!
//! This is not encryption. The secret is base64-encoded and the encoded text is
//! reversed; a client recovers it by reversing the text and decoding it.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::domain::AppError;

/// Context variable carrying the scrambled secret.
pub const SCRAMBLED_KEY_VAR: &str = "nexus_api_key_scrambled";

pub fn scramble(secret: &str) -> String {
    STANDARD.encode(secret.as_bytes()).chars().rev().collect()
}

pub fn unscramble(scrambled: &str) -> Result<String, AppError> {
    let encoded: String = scrambled.chars().rev().collect();
    let bytes = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| AppError::config_error(format!("Scrambled key is not valid base64: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::config_error(format!("Scrambled key is not valid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn scrambles_by_reversing_base64() {
        // base64("secret") == "c2VjcmV0"
        assert_eq!(scramble("secret"), "0VmcjV2c");
    }

    #[test]
    fn rejects_garbage() {
        assert!(unscramble("not base64!").is_err());
    }

    proptest! {
        #[test]
        fn unscramble_recovers_the_secret(secret in ".{1,64}") {
            prop_assert_eq!(unscramble(&scramble(&secret)).unwrap(), secret);
        }
    }
}
