//! Client-side navigation state.
//!
//! The portal has no router of its own; it publishes the route it wants to be
//! on and whichever front end is attached (the CLI, a UI shell) reacts.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Auth,
    Dashboard,
    Other(String),
}

impl Route {
    pub fn path(&self) -> &str {
        match self {
            Route::Home => "/",
            Route::Auth => "/auth",
            Route::Dashboard => "/dashboard",
            Route::Other(path) => path,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone)]
pub struct Navigator {
    sender: Arc<watch::Sender<Route>>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Route::Home);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn navigate(&self, route: Route) {
        debug!("navigating to {}", route);
        // send_replace never fails, even with no receivers attached.
        self.sender.send_replace(route);
    }

    pub fn current(&self) -> Route {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.sender.subscribe()
    }
}
