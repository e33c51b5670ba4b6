//! CDP-based browser automation module.
//!
//! - One `Session` at a time: a Chrome process, an isolated browsing
//!   context, and a single page target driven over the DevTools Protocol
//! - Background initialization: `Session::launch` returns immediately and
//!   every operation awaits the completion signal before touching handles
//! - Stealth configuration: spoofed user agent plus an init script that
//!   hides the usual automation tells, applied once per page target

pub mod cdp;
pub mod launch;
pub mod session;
pub mod stealth;
pub mod tools;

use std::sync::Arc;
use tokio::sync::Mutex;

pub use session::Session;

/// The single registry slot: at most one live session.
///
/// The mutex doubles as the per-session serializer: no two operations are
/// ever issued concurrently against the same page.
pub type BrowserHost = Arc<Mutex<Option<Session>>>;

/// An empty slot.
pub fn new_host() -> BrowserHost {
    Arc::new(Mutex::new(None))
}
