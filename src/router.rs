// =============================================================================
// ROUTER MODULE
// =============================================================================
// Fixed route table gated by the session state.
//
//   Anonymous:      /signin  /signup            anything else -> /signin
//   Authenticated:  /  /skus  /attributes  /products   anything else -> /
// =============================================================================

use std::fmt;

use crate::session::AuthState;

pub const SIGN_IN_PATH: &str = "/signin";
pub const DASHBOARD_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    SignIn,
    SignUp,
    Dashboard,
    Skus,
    Attributes,
    Products,
}

impl Route {
    pub const PUBLIC: [Route; 2] = [Route::SignIn, Route::SignUp];
    pub const PRIVATE: [Route; 4] = [Route::Dashboard, Route::Skus, Route::Attributes, Route::Products];

    pub fn path(self) -> &'static str {
        match self {
            Route::SignIn => SIGN_IN_PATH,
            Route::SignUp => "/signup",
            Route::Dashboard => DASHBOARD_PATH,
            Route::Skus => "/skus",
            Route::Attributes => "/attributes",
            Route::Products => "/products",
        }
    }

    /// Routes reachable in the given state.
    pub fn table(state: AuthState) -> &'static [Route] {
        match state {
            AuthState::Anonymous => &Self::PUBLIC,
            AuthState::Authenticated => &Self::PRIVATE,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// What the shell should do for a requested path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Mount(Route),
    Redirect(&'static str),
}

/// Trailing slashes and query strings do not affect matching.
fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        DASHBOARD_PATH
    } else {
        trimmed
    }
}

pub fn resolve(path: &str, state: AuthState) -> Navigation {
    let wanted = normalize(path);
    match Route::table(state).iter().find(|r| r.path() == wanted) {
        Some(route) => Navigation::Mount(*route),
        None => match state {
            AuthState::Anonymous => Navigation::Redirect(SIGN_IN_PATH),
            AuthState::Authenticated => Navigation::Redirect(DASHBOARD_PATH),
        },
    }
}

/// Resolves and follows at most one redirect.
pub fn mount_target(path: &str, state: AuthState) -> Route {
    match resolve(path, state) {
        Navigation::Mount(route) => route,
        Navigation::Redirect(target) => match resolve(target, state) {
            Navigation::Mount(route) => route,
            Navigation::Redirect(_) => match state {
                AuthState::Anonymous => Route::SignIn,
                AuthState::Authenticated => Route::Dashboard,
            },
        },
    }
}
