use crate::{CryptoError, Result};
use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An Ed25519 public key. This crate's verification path is a designated
/// extension point (spec.md §4.2): `node-core` decides, via configuration,
/// whether `Signature::verify` is ever called at all.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "pk_bytes")] ed25519_dalek::VerifyingKey);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0.as_bytes()))
    }
}

mod pk_bytes {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        key: &ed25519_dalek::VerifyingKey,
        ser: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        key.as_bytes().serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        de: D,
    ) -> std::result::Result<ed25519_dalek::VerifyingKey, D::Error> {
        let bytes: [u8; 32] = Deserialize::deserialize(de)?;
        ed25519_dalek::VerifyingKey::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// An Ed25519 signature over a transaction's or block's canonical bytes.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "sig_bytes")] ed25519_dalek::Signature);

impl Signature {
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self(ed25519_dalek::Signature::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }

    pub fn verify(&self, public_key: &PublicKey, message: &[u8]) -> bool {
        public_key.0.verify(message, &self.0).is_ok()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0.to_bytes()))
    }
}

mod sig_bytes {
    use serde::{Deserializer, Serialize, Serializer};
    use serde::de::{SeqAccess, Visitor};
    use std::fmt;

    pub fn serialize<S: Serializer>(
        sig: &ed25519_dalek::Signature,
        ser: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        sig.to_bytes().serialize(ser)
    }

    struct SigBytesVisitor;

    impl<'de> Visitor<'de> for SigBytesVisitor {
        type Value = [u8; 64];

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "64 bytes")
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
            let mut bytes = [0u8; 64];
            for (i, b) in bytes.iter_mut().enumerate() {
                *b = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(i, &self))?;
            }
            Ok(bytes)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        de: D,
    ) -> std::result::Result<ed25519_dalek::Signature, D::Error> {
        let bytes = de.deserialize_tuple(64, SigBytesVisitor)?;
        Ok(ed25519_dalek::Signature::from_bytes(&bytes))
    }
}

/// A keypair, used only by test fixtures and the (optional) signing
/// extension point — the core node never needs a private key for itself.
pub struct Keypair(ed25519_dalek::SigningKey);

impl Keypair {
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        Self(ed25519_dalek::SigningKey::generate(&mut rng))
    }

    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message))
    }
}
