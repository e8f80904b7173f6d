//! Core wallet types: errors, network parameters, key material and units.

pub mod errors;
pub mod keys;
pub mod network;
pub mod units;
