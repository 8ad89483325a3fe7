//! Adapters shipped with the core

pub mod bogus;

pub use bogus::BogusGateway;
