// Test doubles shared by the unit tests in this crate.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use vento_proto::codec::{FUNC_RESPONSE, START_MARKER, checksum};
use vento_proto::{Error, Transport};

/// What the stub does for one exchange.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Data(Vec<u8>),
    /// Answer after a delay.
    Slow(Duration, Vec<u8>),
    Silent,
    Hang,
}

/// Scripted transport. Once the script runs out, `fallback` repeats.
#[derive(Clone)]
pub(crate) struct StubTransport {
    script: Arc<Mutex<VecDeque<Reply>>>,
    fallback: Reply,
    calls: Arc<AtomicU32>,
}

impl StubTransport {
    pub(crate) fn new(script: impl IntoIterator<Item = Reply>, fallback: Reply) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            fallback,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Answers every request with `frame`.
    pub(crate) fn always(frame: Vec<u8>) -> Self {
        Self::new([], Reply::Data(frame))
    }

    pub(crate) fn silent() -> Self {
        Self::new([], Reply::Silent)
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for StubTransport {
    async fn exchange(&self, _frame: &[u8]) -> Result<Bytes, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match next {
            Reply::Data(data) => Ok(Bytes::from(data)),
            Reply::Slow(delay, data) => {
                tokio::time::sleep(delay).await;
                Ok(Bytes::from(data))
            }
            Reply::Silent => Err(Error::Timeout {
                addr: "stub".into(),
                timeout_ms: 0,
            }),
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// A well-formed response frame carrying the raw `params` section.
pub(crate) fn response(params: &[u8]) -> Vec<u8> {
    let mut body = vec![0x02, 0x10];
    body.extend_from_slice(b"DEFAULT_DEVICEID");
    body.push(0x04);
    body.extend_from_slice(b"1111");
    body.push(FUNC_RESPONSE);
    body.extend_from_slice(params);
    let sum = checksum(&body);

    let mut frame = START_MARKER.to_vec();
    frame.extend_from_slice(&body);
    frame.extend_from_slice(&sum.to_le_bytes());
    frame
}
