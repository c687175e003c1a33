mod auth_signal;
mod client;
mod credential;
mod pipeline;
mod refresh;
mod session_state;

pub use auth_signal::*;
pub use client::*;
pub use credential::*;
pub use pipeline::*;
pub use refresh::*;
pub use session_state::*;
