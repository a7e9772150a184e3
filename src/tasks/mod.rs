//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Rate limit sweep: drops ended windows at a fixed interval

mod sweep;

pub use sweep::spawn_sweep_task;
