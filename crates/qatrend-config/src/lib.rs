//! # QA Trend Config
//!
//! Configuration for the QA trend engine: analysis defaults, cache and
//! record source settings, loaded from YAML with `QATREND_*` environment
//! overrides and validated before use.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod loader;
pub mod settings;
pub mod validation;

pub use loader::*;
pub use settings::*;
