mod dashboard;
mod logging;

pub use dashboard::{LaunchOptions, launch_dashboard};
pub use logging::init_logging;
