//! HMAC-SHA256 signing for time-limited read URLs.
//!
//! A signed URL carries `exp` (unix seconds) and `sig` (hex HMAC over
//! `"{path}:{exp}"`). Verification is constant-time and rejects expired or
//! tampered pairs.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies read-URL `exp`/`sig` pairs.
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
}

impl UrlSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Produce the hex signature for a path valid until `expires_at`.
    pub fn sign(&self, path: &str, expires_at: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(signing_input(path, expires_at).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verify a signature for a path at the given time.
    ///
    /// Returns false for expired, malformed, or tampered signatures.
    pub fn verify(&self, path: &str, expires_at: i64, sig: &str, now: i64) -> bool {
        if expires_at < now {
            return false;
        }
        let Ok(sig_bytes) = hex::decode(sig) else {
            return false;
        };
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(signing_input(path, expires_at).as_bytes());
        mac.verify_slice(&sig_bytes).is_ok()
    }
}

fn signing_input(path: &str, expires_at: i64) -> String {
    format!("{}:{}", path, expires_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_roundtrip() {
        let signer = UrlSigner::new(b"test-secret");
        let sig = signer.sign("output/a.png", 2_000_000_000);
        assert!(signer.verify("output/a.png", 2_000_000_000, &sig, 1_900_000_000));
    }

    #[test]
    fn test_rejects_expired() {
        let signer = UrlSigner::new(b"test-secret");
        let sig = signer.sign("output/a.png", 100);
        assert!(!signer.verify("output/a.png", 100, &sig, 101));
    }

    #[test]
    fn test_accepts_at_exact_expiry() {
        let signer = UrlSigner::new(b"test-secret");
        let sig = signer.sign("output/a.png", 100);
        assert!(signer.verify("output/a.png", 100, &sig, 100));
    }

    #[test]
    fn test_rejects_tampered_path() {
        let signer = UrlSigner::new(b"test-secret");
        let sig = signer.sign("output/a.png", 2_000_000_000);
        assert!(!signer.verify("output/b.png", 2_000_000_000, &sig, 0));
    }

    #[test]
    fn test_rejects_tampered_expiry() {
        let signer = UrlSigner::new(b"test-secret");
        let sig = signer.sign("output/a.png", 2_000_000_000);
        assert!(!signer.verify("output/a.png", 2_000_000_001, &sig, 0));
    }

    #[test]
    fn test_rejects_malformed_hex() {
        let signer = UrlSigner::new(b"test-secret");
        assert!(!signer.verify("output/a.png", 2_000_000_000, "zz-not-hex", 0));
    }

    #[test]
    fn test_different_secrets_differ() {
        let a = UrlSigner::new(b"secret-a");
        let b = UrlSigner::new(b"secret-b");
        let sig = a.sign("output/a.png", 2_000_000_000);
        assert!(!b.verify("output/a.png", 2_000_000_000, &sig, 0));
    }
}
