//! Shared types, validation and provider seams for the Money Maven dashboard.

pub mod error;
pub mod input;
pub mod traits;
pub mod types;

pub use error::*;
pub use input::*;
pub use traits::*;
pub use types::*;
