//! Key derivation: scrypt passphrase → key bytes
//!
//! The passphrase is copied into a buffer owned by this module and that buffer
//! is zero-filled on every exit path, including parameter errors and unwinding.

use cloakfs_core::KdfConfig;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::DerivedKey;

/// Required by `scrypt::Params`; raw `scrypt()` takes its length from the output slice.
const PARAMS_OUTPUT_LEN: usize = 32;

/// scrypt parameters. Parallelism is fixed at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptParams {
    /// Cost parameter N: greater than 1, a power of two, less than 2^(16 * block_size)
    pub cost: u64,
    /// Block size r
    pub block_size: u32,
    /// Derived key length in bytes
    pub key_length: usize,
}

impl Default for ScryptParams {
    fn default() -> Self {
        Self {
            cost: 32768,
            block_size: 8,
            key_length: 32,
        }
    }
}

impl From<&KdfConfig> for ScryptParams {
    fn from(config: &KdfConfig) -> Self {
        Self {
            cost: config.scrypt_cost,
            block_size: config.scrypt_block_size,
            key_length: config.key_length,
        }
    }
}

impl ScryptParams {
    /// Check the parameter domain and return `log2(cost)`.
    fn log_cost(&self) -> CryptoResult<u8> {
        if self.cost <= 1 || !self.cost.is_power_of_two() {
            return Err(CryptoError::InvalidParameter(format!(
                "scrypt cost must be a power of two greater than 1, got {}",
                self.cost
            )));
        }
        if self.block_size == 0 {
            return Err(CryptoError::InvalidParameter(
                "scrypt block size must be at least 1".into(),
            ));
        }

        let log_n = self.cost.trailing_zeros();
        if u64::from(log_n) >= 16 * u64::from(self.block_size) {
            return Err(CryptoError::InvalidParameter(format!(
                "scrypt cost {} must be less than 2^(128 * {} / 8)",
                self.cost, self.block_size
            )));
        }
        if self.key_length == 0 {
            return Err(CryptoError::InvalidParameter(
                "derived key length must be at least 1".into(),
            ));
        }

        // log_n <= 63
        Ok(log_n as u8)
    }
}

/// Zero-fills the borrowed passphrase buffer when dropped.
struct WipeOnDrop<'a>(&'a mut Vec<u8>);

impl Drop for WipeOnDrop<'_> {
    fn drop(&mut self) {
        self.0.as_mut_slice().zeroize();
    }
}

/// Derive a key from a passphrase using scrypt.
///
/// The salt should be randomly generated and stored alongside the vault (it
/// does not need to be secret). The returned key is zeroized on drop.
pub fn derive_key(
    passphrase: &SecretString,
    salt: &[u8],
    params: &ScryptParams,
) -> CryptoResult<DerivedKey> {
    let mut buffer = Vec::new();
    derive_key_in(&mut buffer, passphrase.expose_secret(), salt, params)
}

/// [`derive_key`] with the scrypt parameters passed individually.
pub fn derive_key_with(
    passphrase: &SecretString,
    salt: &[u8],
    cost: u64,
    block_size: u32,
    key_length: usize,
) -> CryptoResult<DerivedKey> {
    let params = ScryptParams {
        cost,
        block_size,
        key_length,
    };
    derive_key(passphrase, salt, &params)
}

/// Encode `passphrase` into `buffer`, run scrypt over it, and wipe `buffer`
/// before returning on every path. `buffer` keeps its length so callers can
/// inspect the wiped bytes.
pub(crate) fn derive_key_in(
    buffer: &mut Vec<u8>,
    passphrase: &str,
    salt: &[u8],
    params: &ScryptParams,
) -> CryptoResult<DerivedKey> {
    buffer.zeroize();
    buffer.reserve_exact(passphrase.len());
    buffer.extend_from_slice(passphrase.as_bytes());
    let password = WipeOnDrop(buffer);

    let log_n = params.log_cost()?;
    let scrypt_params = scrypt::Params::new(log_n, params.block_size, 1, PARAMS_OUTPUT_LEN)
        .map_err(|e| CryptoError::InvalidParameter(format!("scrypt params: {e}")))?;

    tracing::debug!(
        cost = params.cost,
        block_size = params.block_size,
        key_length = params.key_length,
        "deriving key from passphrase"
    );

    let mut key = DerivedKey::from_vec(vec![0u8; params.key_length]);
    scrypt::scrypt(password.0.as_slice(), salt, &scrypt_params, key.as_mut_bytes())
        .map_err(|e| CryptoError::InvalidParameter(format!("scrypt output length: {e}")))?;

    Ok(key)
}
