//! Sub-configurations shared by several builders

mod communicator;
mod http;
mod output;
mod shutdown;

pub use communicator::{Communicator, COMMUNICATOR_TYPES};
pub use http::HttpConfig;
pub use output::OutputConfig;
pub use shutdown::ShutdownConfig;
