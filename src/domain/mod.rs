//! Domain layer: component templates, localization tables and artifacts.

pub mod components;
pub mod entities;
pub mod locales;
