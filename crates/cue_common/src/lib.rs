//! Shared types for cue components.
//!
//! The daemon (cued) and the CLI (cuectl) both speak the protocol defined
//! here; nothing in this crate touches sockets or the answer database.

pub mod ipc;
pub mod validate;

/// Default daemon socket path.
pub const SOCKET_PATH: &str = "/run/cue/cued.sock";

/// Environment variable that overrides the socket path.
pub const SOCKET_ENV: &str = "CUED_SOCKET";

/// Resolve the daemon socket path: explicit override, then environment,
/// then the default.
pub fn socket_path(explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }
    std::env::var(SOCKET_ENV).unwrap_or_else(|_| SOCKET_PATH.to_string())
}
