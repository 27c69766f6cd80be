pub mod agent_interface;
pub mod structuring_agent;

pub use agent_interface::*;
pub use structuring_agent::*;
