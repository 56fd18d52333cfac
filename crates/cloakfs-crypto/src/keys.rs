//! Key material held for the lifetime of an unlocked vault session

use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::KEY_SIZE;

/// Encryption key + authentication (MAC) key for the name cipher.
///
/// Read-only after construction; zeroized on drop. Never serialized.
pub struct KeyPair {
    encryption_key: [u8; KEY_SIZE],
    mac_key: [u8; KEY_SIZE],
}

impl KeyPair {
    pub fn new(encryption_key: [u8; KEY_SIZE], mac_key: [u8; KEY_SIZE]) -> Self {
        Self {
            encryption_key,
            mac_key,
        }
    }

    /// Split a raw `encKey || macKey` buffer into a key pair.
    pub fn from_raw(raw: &[u8]) -> CryptoResult<Self> {
        if raw.len() != 2 * KEY_SIZE {
            return Err(CryptoError::InvalidParameter(format!(
                "key pair must be {} bytes, got {}",
                2 * KEY_SIZE,
                raw.len()
            )));
        }

        let mut encryption_key = [0u8; KEY_SIZE];
        let mut mac_key = [0u8; KEY_SIZE];
        encryption_key.copy_from_slice(&raw[..KEY_SIZE]);
        mac_key.copy_from_slice(&raw[KEY_SIZE..]);
        Ok(Self::new(encryption_key, mac_key))
    }

    pub fn encryption_key(&self) -> &[u8; KEY_SIZE] {
        &self.encryption_key
    }

    pub fn mac_key(&self) -> &[u8; KEY_SIZE] {
        &self.mac_key
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.encryption_key.zeroize();
        self.mac_key.zeroize();
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("encryption_key", &"[REDACTED]")
            .field("mac_key", &"[REDACTED]")
            .finish()
    }
}

/// Key bytes produced by passphrase derivation. Zeroized on drop.
#[derive(Clone)]
pub struct DerivedKey {
    bytes: Vec<u8>,
}

impl DerivedKey {
    pub(crate) fn from_vec(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
