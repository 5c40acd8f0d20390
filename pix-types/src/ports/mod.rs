//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod key_codec;
mod repository;

pub use key_codec::{DecodedKey, KeyError, PixKeyCodec};
pub use repository::PixRepository;
