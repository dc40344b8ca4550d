//! Navigation to the login entry point when a session cannot be renewed.

use std::sync::{Mutex, PoisonError};

/// Where the client currently "is" and how it moves to the login page.
pub trait Navigator: Send + Sync {
    fn current_location(&self) -> String;
    fn navigate(&self, location: &str);
}

/// Send the navigator to `login_path` unless it is already there.
///
/// Returns whether a navigation happened.
pub fn redirect_to_login(navigator: &dyn Navigator, login_path: &str) -> bool {
    if navigator.current_location() == login_path {
        return false;
    }
    navigator.navigate(login_path);
    true
}

/// Navigator that only tracks the location and logs moves.
///
/// Used by the CLI, where "navigating" means telling the user to log in again.
#[derive(Debug)]
pub struct LoggingNavigator {
    location: Mutex<String>,
}

impl LoggingNavigator {
    pub fn new(start: &str) -> Self {
        Self {
            location: Mutex::new(start.to_string()),
        }
    }
}

impl Default for LoggingNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for LoggingNavigator {
    fn current_location(&self) -> String {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn navigate(&self, location: &str) {
        tracing::warn!("Session expired, navigating to {}", location);
        *self.location.lock().unwrap_or_else(PoisonError::into_inner) = location.to_string();
    }
}
