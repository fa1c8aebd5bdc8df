//! Token generation utilities.

use uuid::Uuid;

/// Generator for opaque identifiers that are not database keys.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a cryptographically secure random token, used as a session id.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // Two v4 UUIDs: 244 random bits, no time component.
        format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token() {
        let id_gen = IdGenerator::new();
        let token = id_gen.generate_token();

        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let id_gen = IdGenerator::new();
        assert_ne!(id_gen.generate_token(), id_gen.generate_token());
    }
}
