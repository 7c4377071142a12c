//! Habla - Spanish speech synthesizer
//!
//! A small desktop front-end: type some text, pick a speed and a
//! destination directory, and a background worker asks an external
//! voice model to write the result to a `.wav` file.

pub mod app;
pub mod config;
pub mod error;
pub mod form;
pub mod submission;
pub mod synth;
pub mod worker;

pub use error::{HablaError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "habla";
pub const APP_TITLE: &str = "Spanish Speech Synthesizer";
