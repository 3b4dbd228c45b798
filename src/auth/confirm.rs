use sha2::{Digest, Sha256};

/// One-time confirmation token: a hex SHA-256 digest over the identity's
/// distinguishing fields and the registration timestamp. Deterministic for a
/// given input triple; opaque to the client.
pub fn confirmation_token(email: &str, document: &str, issued_at: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update(document.as_bytes());
    hasher.update(issued_at.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_deterministic() {
        let a = confirmation_token("a@b.com", "123", "2026-01-01T00:00:00Z");
        let b = confirmation_token("a@b.com", "123", "2026-01-01T00:00:00Z");
        assert_eq!(a, b);
    }

    #[test]
    fn token_is_hex_sha256() {
        let t = confirmation_token("a@b.com", "123", "2026-01-01T00:00:00Z");
        assert_eq!(t.len(), 64);
        assert!(t.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn any_input_change_changes_the_token() {
        let base = confirmation_token("a@b.com", "123", "t0");
        assert_ne!(base, confirmation_token("x@b.com", "123", "t0"));
        assert_ne!(base, confirmation_token("a@b.com", "456", "t0"));
        assert_ne!(base, confirmation_token("a@b.com", "123", "t1"));
    }
}
