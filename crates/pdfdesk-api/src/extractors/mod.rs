//! Custom Axum extractors.

pub mod origin;

pub use origin::RequestOrigin;
