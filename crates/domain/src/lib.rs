//! hash-history domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Locations, actions and construction options
//! - `codec`: Query-key embedding in hash paths
//! - `ports`: Trait definitions for the platform, state store and controller
//! - `usecases`: The hash history core and its factory

pub mod codec;
pub mod model;
pub mod ports;
pub mod usecases;

pub use codec::{QueryKeyCodec, QueryKeyMode};
pub use model::*;
pub use ports::*;
