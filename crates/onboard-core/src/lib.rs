pub mod action;
pub mod check;
pub mod config;
pub mod error;
pub mod io;
pub mod names;
pub mod pipeline;
pub mod systemd;
pub mod template;
pub mod value;

pub use config::Configuration;
pub use error::{OnboardError, Result};
pub use pipeline::{Pipeline, RuntimeValues};
