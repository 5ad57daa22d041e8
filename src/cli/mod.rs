pub mod commands;
pub mod progress;

pub use progress::ProgressCounter;
