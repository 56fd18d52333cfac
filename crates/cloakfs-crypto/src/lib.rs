//! cloakfs-crypto: deterministic name encryption and passphrase key derivation
//!
//! Name cipher:
//! ```text
//! filename  --UTF-8--> AES-SIV(encKey, macKey, AD...) --Base32--> ciphertext name
//! dir id    --UTF-8--> AES-SIV(encKey, macKey)        --SHA-1--> --Base32--> directory token (32 chars)
//! ```
//!
//! Passphrase KDF: scrypt (N, r, p = 1), with the passphrase buffer wiped on
//! every exit path.

pub mod engine;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod names;

pub use engine::{AeadEngine, EnginePool, SivEngine, MAX_ASSOCIATED_DATA};
pub use error::{CryptoError, CryptoResult};
pub use kdf::{derive_key, derive_key_with, ScryptParams};
pub use keys::{DerivedKey, KeyPair};
pub use names::{NameCryptor, DIRECTORY_TOKEN_LEN};

/// Size of each half of the name key pair in bytes (256-bit)
pub const KEY_SIZE: usize = 32;
