//! Hill dose-response model evaluation and inversion.

pub mod hill;

pub use hill::*;
