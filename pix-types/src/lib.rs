//! # Pix Types
//!
//! Domain types and port traits for the pix wallet-transfer service.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate is the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (User, Pix, ApiKey)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    ApiKey, ApiKeyId, Pix, PixId, PixStatus, SettlePix, SettledPix, User, UserId, UserName,
};
pub use dto::*;
pub use error::{AppError, DomainError, RepoError};
pub use ports::{DecodedKey, KeyError, PixKeyCodec, PixRepository};
