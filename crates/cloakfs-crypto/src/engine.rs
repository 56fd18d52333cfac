//! Deterministic AEAD engines and the per-thread engine pool
//!
//! A keyed AES-SIV instance keeps mutable scratch state (`&mut self` on every
//! call), so one instance must never serve two calls at once. Engines are
//! pooled by the identity of the worker thread that created them and moved
//! out of the pool for the duration of a call.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use aes_siv::{aead::KeyInit, siv::Aes256Siv};
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::KeyPair;
use crate::KEY_SIZE;

/// Largest associated-data sequence accepted by S2V (RFC 5297 allows 126 headers).
pub const MAX_ASSOCIATED_DATA: usize = 126;

/// A keyed deterministic AEAD instance.
///
/// `associated_data` is an ordered sequence; order is part of what gets authenticated.
pub trait AeadEngine: Send + Sized {
    fn with_keys(keys: &KeyPair) -> CryptoResult<Self>;

    fn encrypt(&mut self, plaintext: &[u8], associated_data: &[&[u8]]) -> CryptoResult<Vec<u8>>;

    /// Must fail with [`CryptoError::AuthenticationFailed`] on any tag mismatch.
    fn decrypt(&mut self, ciphertext: &[u8], associated_data: &[&[u8]])
        -> CryptoResult<Vec<u8>>;
}

/// AES-256-SIV (RFC 5297) engine.
pub struct SivEngine {
    cipher: Aes256Siv,
}

impl AeadEngine for SivEngine {
    fn with_keys(keys: &KeyPair) -> CryptoResult<Self> {
        // RFC 5297 key layout: K1 (S2V/CMAC) || K2 (CTR)
        let mut siv_key = Zeroizing::new([0u8; 2 * KEY_SIZE]);
        siv_key[..KEY_SIZE].copy_from_slice(keys.mac_key());
        siv_key[KEY_SIZE..].copy_from_slice(keys.encryption_key());

        let cipher = Aes256Siv::new_from_slice(&siv_key[..])
            .map_err(|e| CryptoError::InvalidParameter(format!("AES-SIV key: {e}")))?;
        Ok(Self { cipher })
    }

    fn encrypt(&mut self, plaintext: &[u8], associated_data: &[&[u8]]) -> CryptoResult<Vec<u8>> {
        check_associated_data(associated_data)?;
        self.cipher
            .encrypt(associated_data, plaintext)
            .map_err(|e| CryptoError::Engine(format!("AES-SIV encryption: {e}")))
    }

    fn decrypt(
        &mut self,
        ciphertext: &[u8],
        associated_data: &[&[u8]],
    ) -> CryptoResult<Vec<u8>> {
        check_associated_data(associated_data)?;
        self.cipher
            .decrypt(associated_data, ciphertext)
            .map_err(|_| CryptoError::AuthenticationFailed)
    }
}

fn check_associated_data(associated_data: &[&[u8]]) -> CryptoResult<()> {
    if associated_data.len() > MAX_ASSOCIATED_DATA {
        return Err(CryptoError::Engine(format!(
            "{} associated-data entries exceed the limit of {MAX_ASSOCIATED_DATA}",
            associated_data.len()
        )));
    }
    Ok(())
}

/// Engines keyed by the worker thread that last used them.
///
/// An engine is removed from the pool while a call runs, so at most one call
/// is ever in flight per instance, even on re-entrant use from one thread.
/// A thread with no pooled engine adopts any idle one before building a new
/// engine, so the pool never holds more engines than the peak number of
/// concurrent callers, however many threads come and go.
pub struct EnginePool<E> {
    idle: Mutex<HashMap<ThreadId, E>>,
}

impl<E: AeadEngine> EnginePool<E> {
    pub fn new() -> Self {
        Self {
            idle: Mutex::new(HashMap::new()),
        }
    }

    /// Run `op` with the calling thread's engine.
    ///
    /// Falls back to an idle engine left by another thread, then to a new one.
    /// If `op` panics the engine is dropped rather than returned.
    pub fn with_engine<R>(
        &self,
        keys: &KeyPair,
        op: impl FnOnce(&mut E) -> CryptoResult<R>,
    ) -> CryptoResult<R> {
        let owner = thread::current().id();
        let pooled = {
            let mut idle = self.lock();
            match idle.remove(&owner) {
                Some(engine) => Some(engine),
                None => {
                    let previous = idle.keys().next().copied();
                    previous.and_then(|id| idle.remove(&id))
                }
            }
        };
        let mut engine = match pooled {
            Some(engine) => engine,
            None => {
                tracing::trace!(?owner, "creating cipher engine for worker thread");
                E::with_keys(keys)?
            }
        };

        let result = op(&mut engine);
        self.lock().insert(owner, engine);
        result
    }

    /// Discard the calling thread's engine. Returns whether one was pooled.
    pub fn retire_current_thread(&self) -> bool {
        let owner = thread::current().id();
        let retired = self.lock().remove(&owner).is_some();
        if retired {
            tracing::trace!(?owner, "retired cipher engine");
        }
        retired
    }

    /// Number of idle engines currently pooled.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The map holds only idle engines; a panic elsewhere cannot leave it inconsistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<ThreadId, E>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: AeadEngine> Default for EnginePool<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: AeadEngine> std::fmt::Debug for EnginePool<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnginePool")
            .field("idle", &self.len())
            .finish()
    }
}
