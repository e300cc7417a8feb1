pub mod ai_client;
pub mod error;
pub mod harvest;
pub mod papers;
pub mod settings;
pub mod utils;

pub use error::{Error, Result};
