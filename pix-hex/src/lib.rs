//! # Pix Hex
//!
//! Application service layer and HTTP adapter for the pix service.
//!
//! ## Architecture
//!
//! - `service/` - Application service (orchestrates domain operations)
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The service is generic over `R: PixRepository` and `K: PixKeyCodec`,
//! allowing different implementations to be injected.

pub mod inbound;
pub mod openapi;
pub mod service;


pub use service::PixService;
