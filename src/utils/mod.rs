//! Utility modules: save files.

pub mod persistence;

pub use persistence::{SaveError, SaveManager};
