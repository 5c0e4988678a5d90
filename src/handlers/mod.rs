//! HTTP handlers for the model's REST surface.

pub mod rest;
pub use rest::*;
