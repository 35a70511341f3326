//! Type definitions

pub mod address;
pub mod geocode;

pub use address::*;
pub use geocode::*;
