//! Unix-socket message bus server.
//!
//! JSON-lines over a Unix domain socket. Plain clients get one response per
//! request; a connection whose first request is `register` becomes the
//! long-lived observer session and starts receiving daemon-initiated
//! requests instead.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cue_common::ipc::{Method, PeerRole, Request, Response, ResponseData};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info, warn};

use crate::bus::{SessionHub, SessionLink};
use crate::matcher::MatchConfig;
use crate::remote::RemoteClient;
use crate::store::AnswerStore;
use crate::handlers;

/// Daemon state shared across connections. The store is the only mutable
/// piece; match config and the remote client are fixed at startup.
pub struct DaemonState {
    pub version: String,
    pub start_time: std::time::Instant,
    pub store: RwLock<AnswerStore>,
    pub matching: MatchConfig,
    pub remote: Arc<dyn RemoteClient>,
    pub hub: SessionHub,
}

impl DaemonState {
    pub fn new(matching: MatchConfig, remote: Arc<dyn RemoteClient>) -> Arc<Self> {
        Arc::new(Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            store: RwLock::new(AnswerStore::new()),
            matching,
            remote,
            hub: SessionHub::new(),
        })
    }
}

/// Bind the socket and serve forever.
pub async fn start_server(state: Arc<DaemonState>, socket_path: String) -> Result<()> {
    let path = Path::new(&socket_path);
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .context("failed to create socket directory")?;
    }

    // Remove a stale socket from a previous run.
    let _ = tokio::fs::remove_file(path).await;

    let listener = UnixListener::bind(path).context("failed to bind Unix socket")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o666))?;
    }

    info!("message bus listening on {}", socket_path);

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, state).await {
                        error!("connection handler error: {e}");
                    }
                });
            }
            Err(e) => {
                error!("failed to accept connection: {e}");
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, state: Arc<DaemonState>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .context("failed to read from socket")?;

        if bytes_read == 0 {
            break;
        }

        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                warn!("invalid request JSON: {e}");
                continue;
            }
        };

        match request.method {
            Method::Register {
                role: PeerRole::Observer,
            } => {
                return run_observer_session(request.id, reader, writer, state).await;
            }
            method => {
                let response = handlers::handle_request(request.id, method, &state).await;
                write_response(&mut writer, response).await?;
            }
        }
    }

    Ok(())
}

async fn write_response(writer: &mut OwnedWriteHalf, response: Response) -> Result<()> {
    let json = serde_json::to_string(&response)? + "\n";
    writer
        .write_all(json.as_bytes())
        .await
        .context("failed to write response")
}

/// Drive a registered observer connection: forward daemon requests out,
/// route reply lines back to their waiters by id.
async fn run_observer_session(
    ack_id: u64,
    mut reader: BufReader<OwnedReadHalf>,
    mut writer: OwnedWriteHalf,
    state: Arc<DaemonState>,
) -> Result<()> {
    let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<Request>();
    let link = SessionLink::new(outgoing_tx);

    // Register before acknowledging, so a client that has read the ack can
    // rely on the hub slot already pointing at this session.
    state.hub.register_observer(Arc::clone(&link)).await;
    if let Err(e) = write_response(&mut writer, Response::ok(ack_id, ResponseData::Registered)).await
    {
        state.hub.unregister(&link).await;
        return Err(e);
    }
    info!("observer session registered");

    let write_task = tokio::spawn(async move {
        while let Some(request) = outgoing_rx.recv().await {
            let json = match serde_json::to_string(&request) {
                Ok(json) => json + "\n",
                Err(e) => {
                    error!("failed to encode session request: {e}");
                    continue;
                }
            };
            if writer.write_all(json.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => match serde_json::from_str::<Response>(&line) {
                Ok(reply) => link.deliver_reply(reply).await,
                Err(e) => {
                    // The waiter for this reply can never be matched by id;
                    // wake it with a disconnect instead of stranding it.
                    warn!("invalid session reply: {e}");
                    link.fail_pending().await;
                }
            },
            Err(e) => {
                warn!("observer session read error: {e}");
                break;
            }
        }
    }

    // Fail pending waiters first: a get_question waiter holds the hub slot
    // lock, so unregistering before waking it would deadlock.
    link.fail_pending().await;
    state.hub.unregister(&link).await;
    write_task.abort();
    info!("observer session closed");
    Ok(())
}
