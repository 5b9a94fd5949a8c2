//! bcrypt password hashes.

pub use bcrypt::BcryptError;

/// Work factor for new hashes.
pub const HASH_COST: u32 = 10;

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    bcrypt::hash(password, HASH_COST)
}

/// Checks `password` against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret123").unwrap();

        assert!(hash.starts_with("$2b$10$"));
        assert!(verify_password("secret123", &hash));
        assert!(!verify_password("secret124", &hash));
    }

    #[test]
    fn test_salt_differs_per_hash() {
        let a = hash_password("secret123").unwrap();
        let b = hash_password("secret123").unwrap();

        assert_ne!(a, b);
        assert!(verify_password("secret123", &a));
        assert!(verify_password("secret123", &b));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "plaintext"));
        assert!(!verify_password("x", "$2b$10$tooshort"));
        assert!(!verify_password("x", "sha256$c2FsdA==$ZGlnZXN0"));
    }
}
