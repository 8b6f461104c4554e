//! Solana keypair representation.

use ed25519_dalek::SigningKey;

/// A string-encoded keypair: public identifier plus opaque secret.
///
/// The public key is the base58 encoding of the 32-byte Ed25519 verifying
/// key. The secret is the base58 encoding of the 64-byte `secret || public`
/// layout used by Solana wallets. Nothing in this crate parses the secret
/// back; it is passed through as-is.
#[derive(Clone, PartialEq, Eq)]
pub struct Keypair {
    public_key: String,
    secret_key: String,
}

impl Keypair {
    /// Builds a keypair from already-encoded parts.
    pub fn new(public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Encodes an Ed25519 signing key in Solana's wire format.
    pub fn from_signing_key(signing_key: &SigningKey) -> Self {
        let public = signing_key.verifying_key().to_bytes();
        let keypair_bytes = signing_key.to_keypair_bytes();

        Self {
            public_key: bs58::encode(public).into_string(),
            secret_key: bs58::encode(keypair_bytes).into_string(),
        }
    }

    /// Derives the keypair for an existing 32-byte secret seed.
    pub fn from_secret_key(secret_bytes: [u8; 32]) -> Self {
        Self::from_signing_key(&SigningKey::from_bytes(&secret_bytes))
    }

    /// Returns the base58 public identifier.
    #[inline]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Returns the base58 encoded secret.
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Splits the keypair into `(public_key, secret_key)`.
    pub fn into_parts(self) -> (String, String) {
        (self.public_key, self.secret_key)
    }
}

// Secrets stay out of debug output and therefore out of the logs.
impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
