use aes::cipher::block_padding::Pkcs7;
use aes::cipher::BlockDecryptMut;
use aes::cipher::BlockEncryptMut;
use aes::cipher::KeyIvInit;
use aes_gcm::aead::Aead;
use aes_gcm::aead::KeyInit;
use aes_gcm::Aes256Gcm;
use aes_gcm::Nonce;
use rand::RngCore;
use serde::Deserialize;
use serde::Serialize;

use crate::jwt::CodecError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Key size for AES-256 (256 bits)
pub const KEY_SIZE: usize = 32;

/// Symmetric cipher used for the token envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeAlgorithm {
    #[default]
    #[serde(rename = "aes-256-cbc")]
    Aes256Cbc,
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
}

impl EnvelopeAlgorithm {
    fn iv_len(&self) -> usize {
        match self {
            EnvelopeAlgorithm::Aes256Cbc => 16,
            EnvelopeAlgorithm::Aes256Gcm => 12,
        }
    }
}

/// Encryption envelope around an already-signed token.
///
/// Wire format is `hex(iv) ":" hex(ciphertext)`. A fresh random IV is drawn
/// for every [`Envelope::seal`], so sealing the same token twice never yields
/// the same envelope.
#[derive(Clone)]
pub struct Envelope {
    algorithm: EnvelopeAlgorithm,
    key: [u8; KEY_SIZE],
}

impl Envelope {
    /// Create an envelope for the given algorithm and 32-byte secret.
    ///
    /// # Errors
    /// * `Key` - The secret is not exactly 32 bytes long
    pub fn new(algorithm: EnvelopeAlgorithm, secret: &[u8]) -> Result<Self, CodecError> {
        let key: [u8; KEY_SIZE] = secret.try_into().map_err(|_| {
            CodecError::Key(format!(
                "encryption secret must be {} bytes, got {}",
                KEY_SIZE,
                secret.len()
            ))
        })?;

        Ok(Self { algorithm, key })
    }

    /// Encrypt `plaintext` into the envelope format.
    ///
    /// # Errors
    /// * `Encryption` - The cipher rejected the input
    pub fn seal(&self, plaintext: &str) -> Result<String, CodecError> {
        let mut iv = vec![0u8; self.algorithm.iv_len()];
        rand::thread_rng().fill_bytes(&mut iv);

        let ciphertext = match self.algorithm {
            EnvelopeAlgorithm::Aes256Cbc => Aes256CbcEnc::new_from_slices(&self.key, &iv)
                .map_err(|e| CodecError::Encryption(e.to_string()))?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes()),
            EnvelopeAlgorithm::Aes256Gcm => Aes256Gcm::new_from_slice(&self.key)
                .map_err(|e| CodecError::Encryption(e.to_string()))?
                .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
                .map_err(|e| CodecError::Encryption(e.to_string()))?,
        };

        Ok(format!("{}:{}", hex::encode(iv), hex::encode(ciphertext)))
    }

    /// Decrypt an envelope produced by [`Envelope::seal`].
    ///
    /// # Errors
    /// * `Decryption` - Wrong key, wrong algorithm, or a corrupt envelope
    pub fn open(&self, envelope: &str) -> Result<String, CodecError> {
        let (iv_hex, ciphertext_hex) = envelope
            .split_once(':')
            .ok_or_else(|| CodecError::Decryption("missing iv separator".to_string()))?;

        let iv = hex::decode(iv_hex)
            .map_err(|e| CodecError::Decryption(format!("invalid iv encoding ({})", e)))?;
        if iv.len() != self.algorithm.iv_len() {
            return Err(CodecError::Decryption(format!(
                "invalid iv length {}",
                iv.len()
            )));
        }

        let ciphertext = hex::decode(ciphertext_hex)
            .map_err(|e| CodecError::Decryption(format!("invalid ciphertext encoding ({})", e)))?;

        let plaintext = match self.algorithm {
            EnvelopeAlgorithm::Aes256Cbc => Aes256CbcDec::new_from_slices(&self.key, &iv)
                .map_err(|e| CodecError::Decryption(e.to_string()))?
                .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
                .map_err(|_| CodecError::Decryption("bad padding".to_string()))?,
            EnvelopeAlgorithm::Aes256Gcm => Aes256Gcm::new_from_slice(&self.key)
                .map_err(|e| CodecError::Decryption(e.to_string()))?
                .decrypt(Nonce::from_slice(&iv), ciphertext.as_ref())
                .map_err(|_| CodecError::Decryption("authentication failed".to_string()))?,
        };

        String::from_utf8(plaintext)
            .map_err(|_| CodecError::Decryption("invalid utf-8 in plaintext".to_string()))
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const KEY: &[u8] = b"0123456789abcdef0123456789abcdef";
    const OTHER_KEY: &[u8] = b"fedcba9876543210fedcba9876543210";

    #[test]
    fn test_seal_and_open_cbc() {
        let envelope = Envelope::new(EnvelopeAlgorithm::Aes256Cbc, KEY).expect("Failed to build");

        let sealed = envelope.seal("header.claims.signature").expect("Failed to seal");
        let (iv, _) = sealed.split_once(':').expect("Missing separator");
        assert_eq!(iv.len(), 32); // 16 bytes hex-encoded

        let opened = envelope.open(&sealed).expect("Failed to open");
        assert_eq!(opened, "header.claims.signature");
    }

    #[test]
    fn test_seal_and_open_gcm() {
        let envelope = Envelope::new(EnvelopeAlgorithm::Aes256Gcm, KEY).expect("Failed to build");

        let sealed = envelope.seal("a.b.c").expect("Failed to seal");
        let (iv, _) = sealed.split_once(':').expect("Missing separator");
        assert_eq!(iv.len(), 24); // 12 bytes hex-encoded

        assert_eq!(envelope.open(&sealed).expect("Failed to open"), "a.b.c");
    }

    #[test]
    fn test_iv_is_fresh_per_seal() {
        let envelope = Envelope::new(EnvelopeAlgorithm::Aes256Cbc, KEY).expect("Failed to build");

        let first = envelope.seal("same").expect("Failed to seal");
        let second = envelope.seal("same").expect("Failed to seal");

        assert_ne!(first, second);
    }

    #[test]
    fn test_rejects_short_key() {
        let result = Envelope::new(EnvelopeAlgorithm::Aes256Cbc, b"short");
        assert!(matches!(result, Err(CodecError::Key(_))));
    }

    #[test]
    fn test_open_corrupt_envelopes() {
        let envelope = Envelope::new(EnvelopeAlgorithm::Aes256Cbc, KEY).expect("Failed to build");

        for corrupt in ["no-separator", "zz:00", "00:zz", "0011:2233", ""] {
            let result = envelope.open(corrupt);
            assert!(
                matches!(result, Err(CodecError::Decryption(_))),
                "expected decryption failure for {:?}",
                corrupt
            );
        }
    }

    #[test]
    fn test_open_with_other_algorithm_fails() {
        let cbc = Envelope::new(EnvelopeAlgorithm::Aes256Cbc, KEY).expect("Failed to build");
        let gcm = Envelope::new(EnvelopeAlgorithm::Aes256Gcm, KEY).expect("Failed to build");

        let sealed = cbc.seal("a.b.c").expect("Failed to seal");
        assert!(matches!(gcm.open(&sealed), Err(CodecError::Decryption(_))));
    }

    proptest! {
        #[test]
        fn prop_round_trip(text in ".{0,256}") {
            for algorithm in [EnvelopeAlgorithm::Aes256Cbc, EnvelopeAlgorithm::Aes256Gcm] {
                let envelope = Envelope::new(algorithm, KEY).unwrap();
                let sealed = envelope.seal(&text).unwrap();
                prop_assert_eq!(envelope.open(&sealed).unwrap(), text.clone());
            }
        }

        #[test]
        fn prop_other_key_fails_gcm(text in ".{1,128}") {
            let envelope = Envelope::new(EnvelopeAlgorithm::Aes256Gcm, KEY).unwrap();
            let other = Envelope::new(EnvelopeAlgorithm::Aes256Gcm, OTHER_KEY).unwrap();

            let sealed = envelope.seal(&text).unwrap();
            prop_assert!(other.open(&sealed).is_err());
        }
    }

    #[test]
    fn test_other_key_fails_cbc() {
        let envelope = Envelope::new(EnvelopeAlgorithm::Aes256Cbc, KEY).expect("Failed to build");
        let other = Envelope::new(EnvelopeAlgorithm::Aes256Cbc, OTHER_KEY).expect("Failed to build");

        let sealed = envelope
            .seal("eyJhbGciOiJIUzI1NiJ9.eyJwYXlsb2FkIjp7Im5hbWUiOiJibGFoIn19.c2ln")
            .expect("Failed to seal");

        assert!(other.open(&sealed).is_err());
    }
}
