//! Symmetric encryption of envelope payloads.

use crate::config::CipherAlgorithm;
use crate::error::{CodecError, CodecResult};
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcEnc = cbc::Encryptor<aes::Aes192>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

fn check_lengths(algorithm: CipherAlgorithm, key: &[u8], iv: &[u8]) -> CodecResult<()> {
    if key.len() != algorithm.key_len() || iv.len() != algorithm.iv_len() {
        return Err(CodecError::malformed(format!(
            "{algorithm} needs a {}-byte key and {}-byte IV, got {} and {}",
            algorithm.key_len(),
            algorithm.iv_len(),
            key.len(),
            iv.len()
        )));
    }
    Ok(())
}

/// Encrypts `plaintext` under `key`, using `iv` as the IV or nonce.
///
/// # Errors
///
/// Returns an error if the key or IV length does not fit the algorithm.
pub fn encrypt(
    algorithm: CipherAlgorithm,
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
) -> CodecResult<Vec<u8>> {
    check_lengths(algorithm, key, iv)?;
    let invalid = |_| CodecError::encode("cipher rejected key or IV");

    let ciphertext = match algorithm {
        CipherAlgorithm::Aes128Cbc => Aes128CbcEnc::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        CipherAlgorithm::Aes192Cbc => Aes192CbcEnc::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        CipherAlgorithm::Aes256Cbc => Aes256CbcEnc::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        CipherAlgorithm::Aes256Gcm => Aes256Gcm::new_from_slice(key)
            .map_err(invalid)?
            .encrypt(Nonce::from_slice(iv), plaintext)
            .map_err(|_| CodecError::encode("AES-GCM encryption failed"))?,
    };
    Ok(ciphertext)
}

/// Decrypts `ciphertext` produced by [`encrypt`] with the same inputs.
///
/// # Errors
///
/// Returns [`CodecError::Decryption`] if the padding or tag does not check
/// out, which is what a wrong password or corrupted bytes look like.
pub fn decrypt(
    algorithm: CipherAlgorithm,
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> CodecResult<Vec<u8>> {
    check_lengths(algorithm, key, iv)?;
    let invalid = |_| CodecError::Decryption;

    match algorithm {
        CipherAlgorithm::Aes128Cbc => Aes128CbcDec::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CodecError::Decryption),
        CipherAlgorithm::Aes192Cbc => Aes192CbcDec::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CodecError::Decryption),
        CipherAlgorithm::Aes256Cbc => Aes256CbcDec::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CodecError::Decryption),
        CipherAlgorithm::Aes256Gcm => Aes256Gcm::new_from_slice(key)
            .map_err(invalid)?
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|_| CodecError::Decryption),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [CipherAlgorithm; 4] = [
        CipherAlgorithm::Aes128Cbc,
        CipherAlgorithm::Aes192Cbc,
        CipherAlgorithm::Aes256Cbc,
        CipherAlgorithm::Aes256Gcm,
    ];

    fn material(alg: CipherAlgorithm) -> (Vec<u8>, Vec<u8>) {
        (vec![7u8; alg.key_len()], vec![9u8; alg.iv_len()])
    }

    #[test]
    fn every_algorithm_roundtrips() {
        for alg in ALL {
            let (key, iv) = material(alg);
            let ct = encrypt(alg, &key, &iv, b"{\"id\":\"a\"}").unwrap();
            assert_ne!(ct.as_slice(), b"{\"id\":\"a\"}");
            assert_eq!(decrypt(alg, &key, &iv, &ct).unwrap(), b"{\"id\":\"a\"}");
        }
    }

    #[test]
    fn cbc_pads_to_block_size() {
        let (key, iv) = material(CipherAlgorithm::Aes128Cbc);
        let ct = encrypt(CipherAlgorithm::Aes128Cbc, &key, &iv, b"").unwrap();
        assert_eq!(ct.len(), 16);
        let ct = encrypt(CipherAlgorithm::Aes128Cbc, &key, &iv, &[1u8; 16]).unwrap();
        assert_eq!(ct.len(), 32);
    }

    #[test]
    fn gcm_rejects_tampering() {
        let alg = CipherAlgorithm::Aes256Gcm;
        let (key, iv) = material(alg);
        let mut ct = encrypt(alg, &key, &iv, b"payload").unwrap();
        ct[0] ^= 1;
        assert_eq!(decrypt(alg, &key, &iv, &ct), Err(CodecError::Decryption));
    }

    #[test]
    fn cbc_rejects_partial_block() {
        let alg = CipherAlgorithm::Aes128Cbc;
        let (key, iv) = material(alg);
        assert_eq!(
            decrypt(alg, &key, &iv, &[0u8; 15]),
            Err(CodecError::Decryption)
        );
    }

    #[test]
    fn wrong_lengths_are_rejected_without_panicking() {
        let alg = CipherAlgorithm::Aes256Gcm;
        assert!(encrypt(alg, &[0u8; 32], &[0u8; 16], b"x").is_err());
        assert!(decrypt(alg, &[0u8; 16], &[0u8; 12], b"x").is_err());
    }
}
