//! Background maintenance for PDFDesk.
//!
//! This crate provides:
//! - A retention sweeper that deletes stale uploads, outputs and work dirs
//! - A cron scheduler that runs the sweeper periodically

pub mod scheduler;
pub mod sweeper;

pub use scheduler::CronScheduler;
pub use sweeper::{RetentionSweeper, SweepError, SweepReport};
