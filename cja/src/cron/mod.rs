mod registry;
mod worker;

pub use registry::{CronRegistry, TickError};
pub use worker::Worker;
