//! IPC protocol between the cue daemon and its peers.
//!
//! One JSON document per newline-terminated line, in both directions. Plain
//! clients (uploader, trigger, ping) send a `Request` and read one
//! `Response`. A connection that registers as the observer session is also
//! sent daemon-initiated `Request`s (`getQuestion`, `showAnswer`) and
//! answers them with `Response`s matched by id.
//!
//! Wire names (`updatedAnswers`, `isOk`, `getQuestion`, ...) are part of the
//! protocol and must not drift.

use serde::{Deserialize, Serialize};

/// A request envelope. Ids are allocated by whoever initiates the request
/// and only need to be unique per connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    #[serde(flatten)]
    pub method: Method,
}

/// A response envelope. `result` is `Err` only for transport-level problems
/// (unknown method, broken payload); domain failures such as a rejected
/// answer upload travel inside `ResponseData` with `is_ok: false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    pub result: Result<ResponseData, String>,
}

impl Response {
    pub fn ok(id: u64, data: ResponseData) -> Self {
        Self {
            id,
            result: Ok(data),
        }
    }

    pub fn error(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            result: Err(message.into()),
        }
    }
}

/// Peer roles a connection can register as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerRole {
    /// Tracks the focused text and renders answers.
    Observer,
}

/// Request methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "camelCase")]
pub enum Method {
    /// Replace the whole answer set. The payload is validated by the daemon;
    /// a bad payload is answered with `is_ok: false`, not an error.
    #[serde(rename_all = "camelCase")]
    UpdateAnswers { updated_answers: serde_json::Value },

    /// Ask the observer for the text of the element under the pointer.
    GetQuestion,

    /// Push a final answer to the observer session. Fire-and-forget: the
    /// daemon does not wait for a reply.
    ShowAnswer { message: String },

    /// Run a named trigger command (`show-answer`, `force-gpt`).
    Trigger { command: String },

    /// Upgrade this connection to a long-lived session with the given role.
    Register { role: PeerRole },

    /// Health check.
    Ping,
}

/// Response payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ResponseData {
    /// Outcome of an answer-set upload.
    #[serde(rename_all = "camelCase")]
    UpdateStatus { is_ok: bool, message: String },

    /// The observer's current question text.
    Question { question: String },

    /// Trigger accepted (including unrecognized command names, which are
    /// logged daemon-side but still acknowledged).
    Triggered,

    /// Session registration accepted.
    Registered,

    /// Health check reply.
    Pong { version: String, uptime_secs: u64 },
}
