//! In-memory transport that replays queued responses per path.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::fetch::transport::{Request, Transport, TransportError};

type Reply = Result<Vec<u8>, TransportError>;

enum Scripted {
    Reply(Reply),
    Gated(oneshot::Receiver<Reply>),
    Hang,
}

/// Holds back one scripted response until released.
pub struct Gate {
    tx: oneshot::Sender<Reply>,
}

impl Gate {
    pub fn release(self, reply: Reply) {
        // the request may already have been dropped (superseded or timed out)
        let _ = self.tx.send(reply);
    }

    pub fn release_json<T: Serialize>(self, value: &T) {
        self.release(Ok(to_body(value)));
    }
}

fn to_body<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

#[derive(Default)]
struct Inner {
    queues: HashMap<String, VecDeque<Scripted>>,
    requests: Vec<Request>,
}

/// Transport that serves queued responses in FIFO order per request path and
/// records every request it sees.
///
/// A path with an empty queue answers with [`TransportError::Other`].
#[derive(Default)]
pub struct ScriptedTransport {
    inner: Mutex<Inner>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, path: &str, scripted: Scripted) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .queues
            .entry(path.to_string())
            .or_default()
            .push_back(scripted);
    }

    pub fn push_json<T: Serialize>(&self, path: &str, value: &T) {
        self.push(path, Scripted::Reply(Ok(to_body(value))));
    }

    pub fn push_body(&self, path: &str, body: Vec<u8>) {
        self.push(path, Scripted::Reply(Ok(body)));
    }

    pub fn push_error(&self, path: &str, error: TransportError) {
        self.push(path, Scripted::Reply(Err(error)));
    }

    /// Queue a response that never arrives; only a timeout ends the attempt.
    pub fn push_hang(&self, path: &str) {
        self.push(path, Scripted::Hang);
    }

    /// Queue a response that is delivered when the returned [`Gate`] is released.
    pub fn push_gated(&self, path: &str) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.push(path, Scripted::Gated(rx));
        Gate { tx }
    }

    /// Every request seen so far, in arrival order.
    pub fn requests(&self) -> Vec<Request> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.requests.clone()
    }

    pub fn request_count(&self, path: &str) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.requests.iter().filter(|r| r.path == path).count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, request: &Request) -> Result<Vec<u8>, TransportError> {
        let next = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner.requests.push(request.clone());
            inner
                .queues
                .get_mut(&request.path)
                .and_then(|queue| queue.pop_front())
        };

        match next {
            Some(Scripted::Reply(reply)) => reply,
            Some(Scripted::Gated(rx)) => match rx.await {
                Ok(reply) => reply,
                Err(_) => Err(TransportError::Other("gate dropped".to_string())),
            },
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(TransportError::Other(format!(
                "no scripted response for {}",
                request.path
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replays_in_fifo_order_per_path() {
        let transport = ScriptedTransport::new();
        transport.push_json("dates", &json!(["a"]));
        transport.push_json("dates", &json!(["b"]));
        transport.push_error("publishers", TransportError::Status(500));

        let request = Request::new("dates");
        assert_eq!(transport.get(&request).await.unwrap(), b"[\"a\"]".to_vec());
        assert_eq!(transport.get(&request).await.unwrap(), b"[\"b\"]".to_vec());
        assert!(matches!(
            transport.get(&request).await,
            Err(TransportError::Other(_))
        ));
        assert_eq!(
            transport.get(&Request::new("publishers")).await,
            Err(TransportError::Status(500))
        );
        assert_eq!(transport.request_count("dates"), 3);
        assert_eq!(transport.requests().len(), 4);
    }

    #[tokio::test]
    async fn gated_reply_waits_for_release() {
        let transport = std::sync::Arc::new(ScriptedTransport::new());
        let gate = transport.push_gated("dates");

        let pending = {
            let transport = transport.clone();
            tokio::spawn(async move { transport.get(&Request::new("dates")).await })
        };
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        gate.release_json(&json!([]));
        assert_eq!(pending.await.unwrap().unwrap(), b"[]".to_vec());
    }
}
