//! Persistent storage for flaclink

pub mod registry;

pub use registry::{Registry, RegistryEntry};
