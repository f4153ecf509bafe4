//! Command execution for cuectl.

use anyhow::{anyhow, Context, Result};
use cue_common::ipc::{Method, PeerRole, Request, Response, ResponseData};
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

use crate::client::CuedClient;
use crate::observer::{PointerEvent, QuestionObserver};

/// Upload an answer set from a file (or stdin with "-") and print the
/// daemon's verdict.
pub async fn upload(socket_path: &str, file: &str) -> Result<()> {
    let raw = if file == "-" {
        let mut buf = String::new();
        use tokio::io::AsyncReadExt;
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("cannot read {file}"))?
    };

    // Parse locally first so a file that is not JSON at all gets a local
    // error instead of a round trip. Shape validation stays daemon-side.
    let updated_answers: serde_json::Value =
        serde_json::from_str(&raw).context("answer file is not valid JSON")?;

    let mut client = CuedClient::connect(socket_path).await?;
    let response = client
        .call(Method::UpdateAnswers { updated_answers })
        .await?;

    match response.result {
        Ok(ResponseData::UpdateStatus { is_ok: true, message }) => {
            println!("{}", message.green());
            Ok(())
        }
        Ok(ResponseData::UpdateStatus { is_ok: false, message }) => {
            eprintln!("{}", message.red());
            Err(anyhow!("upload rejected"))
        }
        other => Err(anyhow!("unexpected daemon response: {other:?}")),
    }
}

/// Fire a named trigger command.
pub async fn trigger(socket_path: &str, command: &str) -> Result<()> {
    let mut client = CuedClient::connect(socket_path).await?;
    let response = client
        .call(Method::Trigger {
            command: command.to_string(),
        })
        .await?;

    match response.result {
        Ok(ResponseData::Triggered) => Ok(()),
        Ok(other) => Err(anyhow!("unexpected daemon response: {other:?}")),
        Err(e) => Err(anyhow!("trigger failed: {e}")),
    }
}

/// Health check.
pub async fn ping(socket_path: &str) -> Result<()> {
    let mut client = CuedClient::connect(socket_path).await?;
    let response = client.call(Method::Ping).await?;

    match response.result {
        Ok(ResponseData::Pong {
            version,
            uptime_secs,
        }) => {
            println!("cued v{version}, up {uptime_secs}s");
            Ok(())
        }
        other => Err(anyhow!("unexpected daemon response: {other:?}")),
    }
}

/// Run the observer session.
///
/// Pointer events arrive as JSON lines on stdin; the daemon's requests
/// arrive on the socket. `getQuestion` is answered from the observer state,
/// `showAnswer` messages go to stdout (this is the presenter seam).
pub async fn observe(socket_path: &str) -> Result<()> {
    let mut client = CuedClient::connect(socket_path).await?;
    let ack = client
        .call(Method::Register {
            role: PeerRole::Observer,
        })
        .await?;
    match ack.result {
        Ok(ResponseData::Registered) => {}
        other => return Err(anyhow!("registration refused: {other:?}")),
    }

    let stream = client.into_stream();
    let (reader, mut writer) = stream.into_split();
    let mut socket_lines = BufReader::new(reader).lines();
    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();

    let mut observer = QuestionObserver::new();
    eprintln!("observing (pointer events on stdin, ctrl-d to stop)");

    loop {
        tokio::select! {
            event_line = stdin_lines.next_line() => {
                match event_line? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => match serde_json::from_str::<PointerEvent>(&line) {
                        Ok(event) => observer.on_pointer_move(event),
                        Err(e) => warn!("ignoring malformed pointer event: {e}"),
                    },
                    None => break,
                }
            }
            request_line = socket_lines.next_line() => {
                let Some(line) = request_line? else { break };
                let request: Request = match serde_json::from_str(&line) {
                    Ok(request) => request,
                    Err(e) => {
                        warn!("ignoring malformed daemon request: {e}");
                        continue;
                    }
                };
                match request.method {
                    Method::GetQuestion => {
                        let reply = Response::ok(
                            request.id,
                            ResponseData::Question {
                                question: observer.current_question(),
                            },
                        );
                        let json = serde_json::to_string(&reply)? + "\n";
                        writer.write_all(json.as_bytes()).await?;
                    }
                    Method::ShowAnswer { message } => {
                        println!("{message}");
                    }
                    other => warn!("ignoring unexpected daemon request: {other:?}"),
                }
            }
        }
    }

    Ok(())
}
