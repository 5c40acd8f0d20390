//! Domain models for the pix service.

pub mod api_key;
pub mod pix;
pub mod user;

pub use api_key::{ApiKey, ApiKeyId};
pub use pix::{Pix, PixId, PixStatus, SettlePix, SettledPix};
pub use user::{User, UserId, UserName};
