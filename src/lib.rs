//! Localized component server backed by a two-tier cache with admission control.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
