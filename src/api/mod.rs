//! Backend API client.
//!
//! [`ApiClient`] owns bearer-token attachment, envelope unwrapping and session
//! renewal; the endpoint modules add typed calls on top of it.

mod auth;
mod client;
mod envelope;
mod error;
mod health;
mod keys;
mod monitor;
mod navigator;
mod packages;
mod refresh;
mod session;
mod usage;
mod users;

#[cfg(test)]
mod mock;

pub use client::*;
pub use envelope::{Envelope, SUCCESS_CODE};
pub use error::*;
pub use monitor::{ErrorMonitor, ErrorReport, TracingMonitor};
pub use navigator::{redirect_to_login, LoggingNavigator, Navigator};
pub use refresh::RefreshCoordinator;
pub use session::*;
