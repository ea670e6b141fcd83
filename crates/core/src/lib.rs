#![forbid(unsafe_code)]

pub mod gaps;
pub mod grading;
pub mod insights;
pub mod model;
pub mod state;
pub mod time;

pub use time::Clock;
