#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod backends;
pub mod config;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod generation;
pub mod learning;
pub mod persistence;
pub mod rules;
pub mod style;

pub use config::Config;
pub use engine::Engine;
pub use error::{Result, VoiceError};
