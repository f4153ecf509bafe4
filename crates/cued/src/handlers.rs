//! Request routing and the trigger flow.

use std::sync::Arc;

use cue_common::ipc::{Method, Response, ResponseData};
use cue_common::validate;
use tracing::{error, info, warn};

use crate::matcher::MatchConfig;
use crate::resolver;
use crate::server::DaemonState;

/// Route one client request. Session-only methods that show up on a plain
/// client connection are answered with a transport error; everything else is
/// recovered in-band.
pub async fn handle_request(id: u64, method: Method, state: &Arc<DaemonState>) -> Response {
    match method {
        Method::UpdateAnswers { updated_answers } => {
            match validate::answer_map(&updated_answers) {
                Ok(entries) => {
                    let count = entries.len();
                    state.store.write().await.replace(entries);
                    info!("answer set replaced, {count} entries");
                    Response::ok(
                        id,
                        ResponseData::UpdateStatus {
                            is_ok: true,
                            message: validate::ACCEPT_MESSAGE.to_string(),
                        },
                    )
                }
                Err(e) => {
                    warn!("rejected answer upload: {e}");
                    Response::ok(
                        id,
                        ResponseData::UpdateStatus {
                            is_ok: false,
                            message: validate::REJECT_MESSAGE.to_string(),
                        },
                    )
                }
            }
        }

        Method::Trigger { command } => {
            // Resolution runs detached; the trigger caller only needs the
            // acknowledgment, the answer goes to the observer session.
            let state = Arc::clone(state);
            tokio::spawn(async move {
                run_trigger(state, &command).await;
            });
            Response::ok(id, ResponseData::Triggered)
        }

        Method::Ping => Response::ok(
            id,
            ResponseData::Pong {
                version: state.version.clone(),
                uptime_secs: state.start_time.elapsed().as_secs(),
            },
        ),

        Method::GetQuestion | Method::ShowAnswer { .. } => {
            Response::error(id, "method is daemon-to-observer only")
        }

        Method::Register { .. } => Response::error(id, "register must be the first request"),
    }
}

/// One trigger: fetch the question from the observer, resolve it, push the
/// answer back. Every failure mode here is terminal for this flow only.
pub async fn run_trigger(state: Arc<DaemonState>, command: &str) {
    let force_remote = match command {
        "show-answer" => false,
        "force-gpt" => true,
        other => {
            error!("unrecognized trigger command {other:?}");
            return;
        }
    };

    let question = match state.hub.get_question().await {
        Ok(reply) => question_from_reply(reply),
        Err(e) => {
            error!("failed to fetch question from observer: {e}");
            return;
        }
    };

    let config = MatchConfig {
        force_remote: force_remote || state.matching.force_remote,
        ..state.matching.clone()
    };

    // Snapshot so the store stays writable during a slow remote round trip.
    let store = state.store.read().await.clone();
    let outcome = resolver::resolve(&question, &store, &config, state.remote.as_ref()).await;
    let message = resolver::format_answer(&outcome);

    if let Err(e) = state.hub.show_answer(message).await {
        error!("failed to deliver answer to observer: {e}");
    }
}

/// Pull the question text out of the observer's reply. A reply of the wrong
/// shape degrades to an empty question with a warning, it does not abort
/// the flow.
fn question_from_reply(reply: cue_common::ipc::Response) -> String {
    match reply.result {
        Ok(ResponseData::Question { question }) => question,
        Ok(other) => {
            warn!("malformed observer reply: {other:?}");
            String::new()
        }
        Err(e) => {
            warn!("observer reported error: {e}");
            String::new()
        }
    }
}
