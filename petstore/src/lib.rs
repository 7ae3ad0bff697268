//! Resource model and contract scenarios for the Swagger pet-store API.

pub mod data;
mod petstore_specs;
pub mod scenarios;

pub use petstore_specs::{PetstoreSpecs, PetstoreSpecsBuilder, DEFAULT_BASE_ADDRESS};
