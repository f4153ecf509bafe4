//! Observer session registry.
//!
//! The daemon holds at most one observer link. Requests to the observer are
//! matched to replies by id through per-request oneshot channels; the slot
//! mutex is held for the whole `getQuestion` round trip, so overlapping
//! triggers queue up instead of racing for each other's replies.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cue_common::ipc::{Method, Request, Response};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, warn};

/// Delivery failures on the bus. Both flavors are recovered the same way:
/// log, drop the flow, show nothing.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("no observer session is connected")]
    NoObserver,

    #[error("observer session disconnected mid-request")]
    Disconnected,
}

/// One registered session connection. The connection task owns the other
/// end of `outgoing` and forwards replies back via [`SessionLink::deliver_reply`].
pub struct SessionLink {
    outgoing: mpsc::UnboundedSender<Request>,
    pending: Mutex<HashMap<u64, oneshot::Sender<Response>>>,
    next_id: AtomicU64,
}

impl SessionLink {
    pub fn new(outgoing: mpsc::UnboundedSender<Request>) -> Arc<Self> {
        Arc::new(Self {
            outgoing,
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Send a request and wait for its reply.
    pub async fn request(&self, method: Method) -> Result<Response, ChannelError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.lock().await.insert(id, reply_tx);

        if self.outgoing.send(Request { id, method }).is_err() {
            self.pending.lock().await.remove(&id);
            return Err(ChannelError::Disconnected);
        }

        reply_rx.await.map_err(|_| ChannelError::Disconnected)
    }

    /// Send a request without waiting for a reply.
    pub fn notify(&self, method: Method) -> Result<(), ChannelError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.outgoing
            .send(Request { id, method })
            .map_err(|_| ChannelError::Disconnected)
    }

    /// Drop every pending reply waiter. Their `request` futures resolve to
    /// [`ChannelError::Disconnected`]. The connection task calls this when
    /// the session can no longer produce matched replies (disconnect, or a
    /// reply line that does not parse), so no waiter hangs on a reply that
    /// will never arrive.
    pub async fn fail_pending(&self) {
        self.pending.lock().await.clear();
    }

    /// Route a reply from the connection task to whoever is waiting on its
    /// id. Unmatched replies are dropped with a log line (stale reply from
    /// a request whose waiter already gave up).
    pub async fn deliver_reply(&self, response: Response) {
        match self.pending.lock().await.remove(&response.id) {
            Some(reply_tx) => {
                let _ = reply_tx.send(response);
            }
            None => debug!("dropping reply with unknown id {}", response.id),
        }
    }
}

/// Single-slot registry for the observer session.
#[derive(Default)]
pub struct SessionHub {
    observer: Mutex<Option<Arc<SessionLink>>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer link. Last registration wins; a replaced link is
    /// simply dropped and its connection task winds down on its own.
    pub async fn register_observer(&self, link: Arc<SessionLink>) {
        let mut slot = self.observer.lock().await;
        if slot.is_some() {
            warn!("replacing existing observer session");
        }
        *slot = Some(link);
    }

    /// Clear the slot if it still holds this exact link. A newer
    /// registration is left alone.
    pub async fn unregister(&self, link: &Arc<SessionLink>) {
        let mut slot = self.observer.lock().await;
        if slot.as_ref().is_some_and(|held| Arc::ptr_eq(held, link)) {
            *slot = None;
        }
    }

    /// Ask the observer for the current question text.
    ///
    /// The slot lock is held across the await on purpose: it serializes
    /// overlapping triggers (see DESIGN.md). The connection task must fail
    /// pending waiters on teardown, or this await would pin the lock and
    /// wedge registration and every later trigger.
    pub async fn get_question(&self) -> Result<Response, ChannelError> {
        let slot = self.observer.lock().await;
        let link = slot.as_ref().ok_or(ChannelError::NoObserver)?;
        link.request(Method::GetQuestion).await
    }

    /// Fire-and-forget an answer to the observer session.
    pub async fn show_answer(&self, message: String) -> Result<(), ChannelError> {
        let slot = self.observer.lock().await;
        let link = slot.as_ref().ok_or(ChannelError::NoObserver)?;
        link.notify(Method::ShowAnswer { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cue_common::ipc::ResponseData;

    /// Connection-task stand-in: answers every getQuestion with a fixed
    /// question string.
    fn spawn_echo_observer(
        link: Arc<SessionLink>,
        mut outgoing_rx: mpsc::UnboundedReceiver<Request>,
        question: &'static str,
    ) {
        tokio::spawn(async move {
            while let Some(request) = outgoing_rx.recv().await {
                if matches!(request.method, Method::GetQuestion) {
                    link.deliver_reply(Response::ok(
                        request.id,
                        ResponseData::Question {
                            question: question.to_string(),
                        },
                    ))
                    .await;
                }
            }
        });
    }

    #[tokio::test]
    async fn get_question_without_observer_fails() {
        let hub = SessionHub::new();
        assert!(matches!(
            hub.get_question().await,
            Err(ChannelError::NoObserver)
        ));
        assert!(matches!(
            hub.show_answer("x".to_string()).await,
            Err(ChannelError::NoObserver)
        ));
    }

    #[tokio::test]
    async fn get_question_round_trip() {
        let hub = SessionHub::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let link = SessionLink::new(tx);
        spawn_echo_observer(link.clone(), rx, "what is 2+2");
        hub.register_observer(link).await;

        let response = hub.get_question().await.unwrap();
        match response.result {
            Ok(ResponseData::Question { question }) => assert_eq!(question, "what is 2+2"),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let hub = SessionHub::new();

        let (tx1, rx1) = mpsc::unbounded_channel();
        let first = SessionLink::new(tx1);
        spawn_echo_observer(first.clone(), rx1, "from first");
        hub.register_observer(first.clone()).await;

        let (tx2, rx2) = mpsc::unbounded_channel();
        let second = SessionLink::new(tx2);
        spawn_echo_observer(second.clone(), rx2, "from second");
        hub.register_observer(second).await;

        let response = hub.get_question().await.unwrap();
        match response.result {
            Ok(ResponseData::Question { question }) => assert_eq!(question, "from second"),
            other => panic!("unexpected reply: {other:?}"),
        }

        // Unregistering the stale first link must not evict the second.
        hub.unregister(&first).await;
        assert!(hub.get_question().await.is_ok());
    }

    #[tokio::test]
    async fn disconnect_mid_request_wakes_the_waiter() {
        let hub = SessionHub::new();
        let (tx, mut outgoing_rx) = mpsc::unbounded_channel();
        let link = SessionLink::new(tx);

        // Connection task that takes the request and then goes away without
        // replying, failing its pending waiters the way session teardown does.
        let task_link = link.clone();
        tokio::spawn(async move {
            let _ = outgoing_rx.recv().await;
            drop(outgoing_rx);
            task_link.fail_pending().await;
        });
        hub.register_observer(link).await;

        let result = tokio::time::timeout(std::time::Duration::from_secs(2), hub.get_question())
            .await
            .expect("get_question must resolve after the observer vanishes");
        assert!(matches!(result, Err(ChannelError::Disconnected)));

        // The slot lock was released, so a replacement observer works.
        let (tx, rx) = mpsc::unbounded_channel();
        let replacement = SessionLink::new(tx);
        spawn_echo_observer(replacement.clone(), rx, "back again");
        hub.register_observer(replacement).await;
        assert!(hub.get_question().await.is_ok());
    }

    #[tokio::test]
    async fn dropped_session_reports_disconnect() {
        let hub = SessionHub::new();
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        hub.register_observer(SessionLink::new(tx)).await;

        assert!(matches!(
            hub.get_question().await,
            Err(ChannelError::Disconnected)
        ));
    }
}
