use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Failure kinds surfaced by the name cipher and key derivation.
///
/// No variant is retried or recovered locally.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Tag verification failed. Covers tampering, wrong key, wrong or
    /// reordered associated data, and truncated ciphertext alike.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Input is not valid Base32, or the authenticated cleartext is not UTF-8.
    #[error("decoding failed: {0}")]
    Decoding(String),

    /// Key or KDF parameters outside the primitive's domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The cipher refused the request (e.g. too many associated-data entries).
    #[error("cipher engine error: {0}")]
    Engine(String),
}

impl From<data_encoding::DecodeError> for CryptoError {
    fn from(err: data_encoding::DecodeError) -> Self {
        CryptoError::Decoding(err.to_string())
    }
}
