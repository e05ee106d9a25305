//! Workgroup payload privatization.
//!
//! Payloads are sealed with AES-256-GCM under the workgroup's shared key. The
//! stored form is self-describing: `hex(nonce || ciphertext || tag)`, so no
//! nonce has to be kept anywhere else.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;
/// GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Workgroup-scoped symmetric key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivatizeKey([u8; KEY_LEN]);

impl PrivatizeKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse the 64-character hex form workgroups are configured with.
    pub fn from_hex(s: &str) -> CipherResult<Self> {
        let mut bytes =
            hex::decode(s.trim()).map_err(|e| CipherError::InvalidKey(e.to_string()))?;
        if bytes.len() != KEY_LEN {
            let len = bytes.len();
            bytes.zeroize();
            return Err(CipherError::InvalidKey(format!(
                "expected {KEY_LEN} bytes, got {len}"
            )));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(Self(key))
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut key);
        Self(key)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for PrivatizeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivatizeKey(<redacted>)")
    }
}

/// Authenticated payload encryption keyed by a [`PrivatizeKey`].
pub struct PayloadCipher;

impl PayloadCipher {
    /// Seal `plaintext`, returning `nonce || ciphertext || tag`.
    pub fn encrypt(plaintext: &[u8], key: &PrivatizeKey) -> CipherResult<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| CipherError::InvalidKey(e.to_string()))?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    /// Open `nonce || ciphertext || tag`. Fails closed on any authentication
    /// error.
    pub fn decrypt(data: &[u8], key: &PrivatizeKey) -> CipherResult<Vec<u8>> {
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::TooShort { len: data.len() });
        }
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| CipherError::InvalidKey(e.to_string()))?;
        let (nonce, sealed) = data.split_at(NONCE_LEN);
        cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::DecryptionFailed)
    }

    /// Seal and hex-encode, producing the on-ledger payload format.
    pub fn privatize(plaintext: &[u8], key: &PrivatizeKey) -> CipherResult<String> {
        Ok(hex::encode(Self::encrypt(plaintext, key)?))
    }

    /// Decode and open an on-ledger payload.
    pub fn deprivatize(ciphertext: &str, key: &PrivatizeKey) -> CipherResult<Vec<u8>> {
        let data = hex::decode(ciphertext.trim())
            .map_err(|e| CipherError::InvalidEncoding(e.to_string()))?;
        Self::decrypt(&data, key)
    }

    /// Serialize `payload` as JSON and privatize it.
    pub fn privatize_payload<T: Serialize>(payload: &T, key: &PrivatizeKey) -> CipherResult<String> {
        let json =
            serde_json::to_vec(payload).map_err(|e| CipherError::Serialization(e.to_string()))?;
        Self::privatize(&json, key)
    }

    /// Deprivatize and deserialize a JSON payload.
    pub fn deprivatize_payload<T: DeserializeOwned>(
        ciphertext: &str,
        key: &PrivatizeKey,
    ) -> CipherResult<T> {
        let plaintext = Self::deprivatize(ciphertext, key)?;
        serde_json::from_slice(&plaintext).map_err(|e| CipherError::Serialization(e.to_string()))
    }
}

/// Errors from payload privatization.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid privatize key: {0}")]
    InvalidKey(String),

    #[error("ciphertext is not valid hex: {0}")]
    InvalidEncoding(String),

    #[error("ciphertext too short: {len} bytes")]
    TooShort { len: usize },

    #[error("encryption failed")]
    EncryptionFailed,

    /// Authentication failed: the payload was tampered with or the key is
    /// wrong.
    #[error("decryption failed: payload integrity check did not pass")]
    DecryptionFailed,

    #[error("payload serialization error: {0}")]
    Serialization(String),
}

/// Result alias for cipher operations.
pub type CipherResult<T> = Result<T, CipherError>;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const KEY_HEX: &str = "0c2e08bc9249fb42568e5a478e9af87a208471c46211a08f3ad9f0c5dbf57314";

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Payload {
        proof: String,
        transaction_type: String,
    }

    #[test]
    fn key_from_hex() {
        let key = PrivatizeKey::from_hex(KEY_HEX).unwrap();
        assert_eq!(key.to_hex(), KEY_HEX);
    }

    #[test]
    fn key_from_hex_rejects_bad_input() {
        assert!(matches!(PrivatizeKey::from_hex("xyz"), Err(CipherError::InvalidKey(_))));
        assert!(matches!(PrivatizeKey::from_hex("abcd"), Err(CipherError::InvalidKey(_))));
    }

    #[test]
    fn debug_redacts_key() {
        let key = PrivatizeKey::from_hex(KEY_HEX).unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains("redacted"));
        assert!(!debug.contains("0c2e08bc"));
    }

    #[test]
    fn generated_keys_differ() {
        assert_ne!(PrivatizeKey::generate().to_hex(), PrivatizeKey::generate().to_hex());
    }

    #[test]
    fn nonce_is_prepended_and_fresh() {
        let key = PrivatizeKey::generate();
        let a = PayloadCipher::encrypt(b"same", &key).unwrap();
        let b = PayloadCipher::encrypt(b"same", &key).unwrap();
        assert_eq!(a.len(), NONCE_LEN + 4 + TAG_LEN);
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn typed_payload_roundtrip() {
        let key = PrivatizeKey::from_hex(KEY_HEX).unwrap();
        let payload = Payload {
            proof: "ab".repeat(32),
            transaction_type: "Suggest".into(),
        };
        let sealed = PayloadCipher::privatize_payload(&payload, &key).unwrap();
        let opened: Payload = PayloadCipher::deprivatize_payload(&sealed, &key).unwrap();
        assert_eq!(opened, payload);
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = PayloadCipher::privatize(b"secret", &PrivatizeKey::generate()).unwrap();
        let err = PayloadCipher::deprivatize(&sealed, &PrivatizeKey::generate()).unwrap_err();
        assert_eq!(err, CipherError::DecryptionFailed);
    }

    #[test]
    fn short_input_is_rejected() {
        let key = PrivatizeKey::generate();
        assert_eq!(
            PayloadCipher::decrypt(&[0u8; NONCE_LEN + TAG_LEN - 1], &key),
            Err(CipherError::TooShort { len: NONCE_LEN + TAG_LEN - 1 })
        );
    }

    #[test]
    fn non_hex_ciphertext_is_rejected() {
        let key = PrivatizeKey::generate();
        assert!(matches!(
            PayloadCipher::deprivatize("not hex!", &key),
            Err(CipherError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn non_json_plaintext_is_a_serialization_error() {
        let key = PrivatizeKey::generate();
        let sealed = PayloadCipher::privatize(b"not json", &key).unwrap();
        let err = PayloadCipher::deprivatize_payload::<Payload>(&sealed, &key).unwrap_err();
        assert!(matches!(err, CipherError::Serialization(_)));
    }

    proptest! {
        #[test]
        fn roundtrip(plaintext in proptest::collection::vec(any::<u8>(), 0..512), key in any::<[u8; 32]>()) {
            let key = PrivatizeKey::from_bytes(key);
            let sealed = PayloadCipher::privatize(&plaintext, &key).unwrap();
            prop_assert_eq!(PayloadCipher::deprivatize(&sealed, &key).unwrap(), plaintext);
        }

        #[test]
        fn any_flipped_byte_fails(
            plaintext in proptest::collection::vec(any::<u8>(), 0..256),
            key in any::<[u8; 32]>(),
            index in any::<proptest::sample::Index>(),
            bit in 0u8..8,
        ) {
            let key = PrivatizeKey::from_bytes(key);
            let mut sealed = PayloadCipher::encrypt(&plaintext, &key).unwrap();
            let i = index.index(sealed.len());
            sealed[i] ^= 1 << bit;
            prop_assert_eq!(PayloadCipher::decrypt(&sealed, &key), Err(CipherError::DecryptionFailed));
        }

        #[test]
        fn distinct_keys_never_open(plaintext in proptest::collection::vec(any::<u8>(), 0..128), k1 in any::<[u8; 32]>(), k2 in any::<[u8; 32]>()) {
            prop_assume!(k1 != k2);
            let sealed = PayloadCipher::encrypt(&plaintext, &PrivatizeKey::from_bytes(k1)).unwrap();
            prop_assert_eq!(
                PayloadCipher::decrypt(&sealed, &PrivatizeKey::from_bytes(k2)),
                Err(CipherError::DecryptionFailed)
            );
        }
    }
}
