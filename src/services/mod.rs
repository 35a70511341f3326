//! Business logic services

pub mod dispatcher;
pub mod geocoding;
pub mod google;
pub mod normalizer;
