//! Application services layer.

pub mod components;
pub mod error;
pub mod generator;
