//! cued - the cue resolver daemon.
//!
//! Owns the answer database, matches incoming questions against it, falls
//! back to a remote completion endpoint when nothing local is close enough,
//! and serves the Unix-socket message bus that the observer session and the
//! uploader talk to.

pub mod bus;
pub mod config;
pub mod handlers;
pub mod matcher;
pub mod remote;
pub mod resolver;
pub mod server;
pub mod store;
