//! Database queries

pub mod address;
