//! Fixed-size byte strings carried on the wire as lowercase hex.

use crate::errors::ObjectError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Decode exactly `N` bytes from lowercase hex.
///
/// Uppercase digits are rejected so that every value has a single textual
/// form; otherwise two encodings of one object would hash differently.
pub fn decode_lower_hex<const N: usize>(s: &str) -> Result<[u8; N], ObjectError> {
    if s.len() != N * 2 {
        return Err(ObjectError::InvalidHexLength {
            expected: N * 2,
            actual: s.len(),
        });
    }
    if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(ObjectError::InvalidHexCharacter(s.to_string()));
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(s, &mut out)
        .map_err(|_| ObjectError::InvalidHexCharacter(s.to_string()))?;
    Ok(out)
}

macro_rules! hex_newtype {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Length in bytes.
            pub const LEN: usize = $len;

            /// Wrap raw bytes.
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Lowercase hex form.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from lowercase hex of exactly twice the byte length.
            pub fn from_hex(s: &str) -> Result<Self, ObjectError> {
                decode_lower_hex::<$len>(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = ObjectError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_newtype!(
    /// Identifier of a network object: BLAKE2s-256 of its canonical encoding.
    ObjectId,
    32
);

hex_newtype!(
    /// Proof-of-work target. A block is valid when `id <= target` as
    /// big-endian integers.
    Target,
    32
);

hex_newtype!(
    /// Proof-of-work nonce.
    Nonce,
    32
);

hex_newtype!(
    /// Ed25519 public key that owns an output.
    PublicKey,
    32
);

hex_newtype!(
    /// Ed25519 signature authorising an input.
    Signature,
    64
);

impl ObjectId {
    /// Proof-of-work check. Both values are compared as 256-bit big-endian
    /// integers, which for equal-length byte arrays is lexicographic order.
    pub fn meets(&self, target: &Target) -> bool {
        self.0 <= target.0
    }
}

impl PublicKey {
    /// Verify `signature` over `message` with this key.
    pub fn verify(
        &self,
        message: &[u8],
        signature: &Signature,
    ) -> Result<(), shared_crypto::CryptoError> {
        shared_crypto::verify_raw(&self.0, message, &signature.0)
    }
}

impl From<shared_crypto::Ed25519PublicKey> for PublicKey {
    fn from(key: shared_crypto::Ed25519PublicKey) -> Self {
        Self(*key.as_bytes())
    }
}

impl From<shared_crypto::Ed25519Signature> for Signature {
    fn from(sig: shared_crypto::Ed25519Signature) -> Self {
        Self(*sig.as_bytes())
    }
}
