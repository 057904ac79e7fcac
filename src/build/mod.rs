//! Build Image Module
//!
//! Auxiliary build artifacts generated next to the workflow document.

pub mod dockerfile;

pub use dockerfile::{write_dockerfile, BuildRecipe, BASE_IMAGES, DEFAULT_BASE_IMAGE};
