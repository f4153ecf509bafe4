//! Unix socket client for talking to cued.

use anyhow::{anyhow, Context, Result};
use cue_common::ipc::{Method, Request, Response};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// One connection to the daemon.
pub struct CuedClient {
    stream: UnixStream,
    next_id: u64,
}

impl CuedClient {
    pub async fn connect(socket_path: &str) -> Result<Self> {
        let path = Path::new(socket_path);
        if !path.exists() {
            return Err(anyhow!(
                "cue daemon not running: socket {} does not exist",
                socket_path
            ));
        }

        let stream = UnixStream::connect(path)
            .await
            .with_context(|| format!("cannot connect to cue daemon at {socket_path}"))?;

        Ok(Self { stream, next_id: 1 })
    }

    /// Send one request and read one response.
    pub async fn call(&mut self, method: Method) -> Result<Response> {
        let request = Request {
            id: self.next_id,
            method,
        };
        self.next_id += 1;

        let request_json = serde_json::to_string(&request)?;
        self.stream
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;

        let (reader, _) = self.stream.split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        reader.read_line(&mut line).await?;

        let response: Response = serde_json::from_str(&line)
            .with_context(|| format!("malformed daemon response: {}", line.trim()))?;
        Ok(response)
    }

    /// Hand the raw stream over for session use (observe mode).
    pub fn into_stream(self) -> UnixStream {
        self.stream
    }
}
