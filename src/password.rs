//! Password hashing for administrative users.

use sha2::{Digest, Sha256};

/// Turns a plaintext password into the form sent to the connector.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;
}

#[derive(Clone, Copy, Debug, Default)]
/// Lower-case hex SHA-256 digest.
pub struct Sha256PasswordHasher;

impl PasswordHasher for Sha256PasswordHasher {
    fn hash(&self, password: &str) -> String {
        format!("{:x}", Sha256::digest(password.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_digest() {
        assert_eq!(
            Sha256PasswordHasher.hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
