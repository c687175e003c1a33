mod auth_gateway_fake;
mod auth_gateway_impl;
mod task_service_impl;

pub use auth_gateway_fake::*;
pub use auth_gateway_impl::*;
pub use task_service_impl::*;
