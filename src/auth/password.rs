use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::auth::AuthError;
use crate::store::record::PasswordDigest;

type HmacSha256 = Hmac<Sha256>;

/// Keyed one-way digest for user passwords.
///
/// The users file stores `hex(HMAC-SHA256(key, plaintext))`. The same key
/// must be configured when the file is generated and when it is served.
#[derive(Clone)]
pub struct PasswordHasher {
    mac: HmacSha256,
}

impl PasswordHasher {
    pub fn new(key: &[u8]) -> Result<Self, AuthError> {
        let mac = HmacSha256::new_from_slice(key)
            .map_err(|e| AuthError::Internal(format!("invalid password key: {}", e)))?;
        Ok(Self { mac })
    }

    /// Lowercase hex digest of `plaintext`.
    pub fn digest(&self, plaintext: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(plaintext.as_bytes());
        format!("{:x}", mac.finalize().into_bytes())
    }

    /// Constant-time check of `plaintext` against a stored digest.
    pub fn verify(&self, plaintext: &str, stored: &PasswordDigest) -> bool {
        let Some(expected) = stored.decode() else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(plaintext.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_keyed_hex() {
        let a = PasswordHasher::new(b"key-a").unwrap();
        let b = PasswordHasher::new(b"key-b").unwrap();

        let d = a.digest("secret");
        assert_eq!(d.len(), 64);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(d, a.digest("secret"));
        assert_ne!(d, b.digest("secret"));
        assert_ne!(d, a.digest("Secret"));
    }

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 2
        let h = PasswordHasher::new(b"Jefe").unwrap();
        assert_eq!(
            h.digest("what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_verify_ignores_hex_case() {
        let h = PasswordHasher::new(b"k").unwrap();
        let stored = PasswordDigest::new(h.digest("pw").to_uppercase());
        assert!(h.verify("pw", &stored));
        assert!(!h.verify("other", &stored));
    }

    #[test]
    fn test_verify_rejects_malformed_digest() {
        let h = PasswordHasher::new(b"k").unwrap();
        let good = h.digest("pw");

        assert!(!h.verify("pw", &PasswordDigest::new("")));
        assert!(!h.verify("pw", &PasswordDigest::new(&good[..62])));
        assert!(!h.verify("pw", &PasswordDigest::new(format!("{}0", good))));
        assert!(!h.verify("pw", &PasswordDigest::new(format!("zz{}", &good[2..]))));
    }
}
