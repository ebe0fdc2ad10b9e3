//! HTTP handlers.

pub mod health;
pub mod operation;
pub mod output;
pub mod tools;
