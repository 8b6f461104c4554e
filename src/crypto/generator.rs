//! Keypair generation primitives.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

use super::Keypair;

/// Produces one fresh keypair per call.
///
/// Generation is infallible; implementations hold no state shared with
/// other generators, so each stream owns its own instance.
pub trait KeyGenerator: Send {
    fn generate(&mut self) -> Keypair;
}

/// Generates Solana (Ed25519) keypairs from the operating system RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Generator;

impl KeyGenerator for Ed25519Generator {
    #[inline]
    fn generate(&mut self) -> Keypair {
        let signing_key = SigningKey::generate(&mut OsRng);
        Keypair::from_signing_key(&signing_key)
    }
}
