//! Pix key codec port.
//!
//! A pix key is the opaque string a requester hands to a payer. It carries
//! the requester, the value and the id of the open pix record.

use crate::domain::{PixId, UserId};

/// Error type for key decoding.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Malformed pix key")]
    Malformed,

    #[error("Pix key signature does not match")]
    BadSignature,
}

/// Fields recovered from a pix key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedKey {
    pub user_id: UserId,
    pub value: i64,
    pub register_id: PixId,
}

/// Port trait for pix key encoding.
pub trait PixKeyCodec: Send + Sync + 'static {
    /// Encodes the requester, value and pix record id into a key.
    fn encode(&self, user_id: UserId, value: i64, register_id: PixId) -> String;

    /// Recovers the fields of a key produced by [`PixKeyCodec::encode`].
    fn decode(&self, key: &str) -> Result<DecodedKey, KeyError>;
}
