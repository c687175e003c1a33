mod auth_gateway;
mod task_service;

pub use auth_gateway::*;
pub use task_service::*;
