//! Core types and the update cycle for the abfuhr waste collection sensor.

/// Typed sensor configuration.
pub mod config;
/// Domain models for the RegioIT waste API.
pub mod model;
/// Error taxonomy and the backend trait.
pub mod ports;
/// Municipalities and their base URLs.
pub mod registry;
/// Lookup chain and date grouping.
pub mod resolver;
/// Polled sensor publishing a headline value and attributes.
pub mod sensor;
/// Headline value post-processing.
pub mod transform;

pub use config::*;
pub use model::*;
pub use ports::*;
pub use registry::{Municipality, resolve};
pub use resolver::*;
pub use sensor::*;
pub use transform::*;
