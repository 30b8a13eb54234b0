//! Utility functions and helpers.

pub mod image;
pub mod settings;

pub use image::LoadedImage;
pub use settings::Settings;
