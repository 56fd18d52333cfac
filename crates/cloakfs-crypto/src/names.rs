//! AES-SIV filename and directory-id encryption
//!
//! Deterministic encryption (same name + key + associated data = same
//! ciphertext) is required for names: a rename that produced a fresh
//! ciphertext on every pass would show up as churn in the synced directory
//! tree. AES-SIV provides this with authentication (SIV = Synthetic
//! Initialization Vector).
//!
//! Ciphertexts and directory tokens are encoded as RFC 4648 Base32, which is
//! safe on both case-sensitive and case-insensitive filesystems.

use data_encoding::BASE32;
use sha1::{Digest, Sha1};

use crate::engine::{AeadEngine, EnginePool, SivEngine};
use crate::error::{CryptoError, CryptoResult};
use crate::keys::KeyPair;

/// Length of a [`NameCryptor::hash_directory_id`] token: 20 SHA-1 bytes in Base32.
pub const DIRECTORY_TOKEN_LEN: usize = 32;

/// Deterministic, authenticated encryption of filenames and directory ids.
///
/// Shareable across threads by reference: the key pair is read-only and each
/// calling thread gets its own cipher engine from an internal pool.
pub struct NameCryptor<E = SivEngine> {
    keys: KeyPair,
    engines: EnginePool<E>,
}

impl NameCryptor<SivEngine> {
    pub fn new(keys: KeyPair) -> Self {
        Self::with_engine(keys)
    }
}

impl<E: AeadEngine> NameCryptor<E> {
    /// Build a name cryptor backed by a custom engine type.
    pub fn with_engine(keys: KeyPair) -> Self {
        Self {
            keys,
            engines: EnginePool::new(),
        }
    }

    /// Map a cleartext directory id to a fixed-length, one-way token.
    ///
    /// The id is encrypted before hashing so the token also depends on the key:
    /// tokens cannot be correlated across vaults or guessed from a dictionary.
    pub fn hash_directory_id(&self, cleartext_dir_id: &str) -> CryptoResult<String> {
        let ciphertext = self.engines.with_engine(&self.keys, |engine| {
            engine.encrypt(cleartext_dir_id.as_bytes(), &[])
        })?;
        let digest = Sha1::digest(&ciphertext);
        Ok(BASE32.encode(&digest))
    }

    /// Encrypt a filename, binding it to `associated_data` (order-sensitive).
    ///
    /// The result carries no file extension; callers append their own.
    pub fn encrypt_filename(
        &self,
        cleartext_name: &str,
        associated_data: &[&[u8]],
    ) -> CryptoResult<String> {
        let ciphertext = self.engines.with_engine(&self.keys, |engine| {
            engine.encrypt(cleartext_name.as_bytes(), associated_data)
        })?;

        tracing::trace!(
            cleartext_len = cleartext_name.len(),
            associated_data = associated_data.len(),
            "encrypted filename"
        );
        Ok(BASE32.encode(&ciphertext))
    }

    /// Decrypt a name produced by [`encrypt_filename`](Self::encrypt_filename).
    ///
    /// `ciphertext_name` must have any extension stripped. The same associated
    /// data, in the same order, must be supplied; anything else fails with
    /// [`CryptoError::AuthenticationFailed`].
    pub fn decrypt_filename(
        &self,
        ciphertext_name: &str,
        associated_data: &[&[u8]],
    ) -> CryptoResult<String> {
        let ciphertext = BASE32.decode(ciphertext_name.as_bytes())?;

        let cleartext = self
            .engines
            .with_engine(&self.keys, |engine| {
                engine.decrypt(&ciphertext, associated_data)
            })
            .inspect_err(|e| {
                if matches!(e, CryptoError::AuthenticationFailed) {
                    tracing::debug!(
                        ciphertext_len = ciphertext.len(),
                        associated_data = associated_data.len(),
                        "filename authentication failed"
                    );
                }
            })?;

        String::from_utf8(cleartext)
            .map_err(|_| CryptoError::Decoding("decrypted name is not UTF-8".into()))
    }

    /// Drop the calling thread's cipher engine, e.g. when a worker thread exits.
    pub fn release_thread_engine(&self) -> bool {
        self.engines.retire_current_thread()
    }
}

impl<E: AeadEngine> std::fmt::Debug for NameCryptor<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameCryptor")
            .field("keys", &self.keys)
            .field("engines", &self.engines)
            .finish()
    }
}
