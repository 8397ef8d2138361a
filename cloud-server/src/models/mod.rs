//! Request/response models

pub mod incident;
pub mod scan;

pub use incident::*;
pub use scan::*;
