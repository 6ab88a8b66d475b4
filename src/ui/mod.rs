pub mod output;
pub mod progress;
pub mod session;

pub use output::{OutputFormatter, OutputMode};
pub use progress::ProgressManager;
