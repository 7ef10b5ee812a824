//! One-shot delivery of the approval result to the command waiting for it.

use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;
use tracing::warn;

use crate::OracleError;

/// Creates a connected signal and receiver.
#[must_use]
pub fn completion() -> (CompletionSignal, CompletionReceiver) {
    let (tx, rx) = oneshot::channel();
    (
        CompletionSignal {
            tx: Mutex::new(Some(tx)),
        },
        CompletionReceiver { rx },
    )
}

/// Sending half. Only the first result is delivered.
#[derive(Debug)]
pub struct CompletionSignal {
    tx: Mutex<Option<oneshot::Sender<Result<(), OracleError>>>>,
}

impl CompletionSignal {
    /// Delivers `result`. Returns `false` if a result was already delivered
    /// or the receiver is gone; never blocks.
    pub fn complete(&self, result: Result<(), OracleError>) -> bool {
        let sender = self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(sender) = sender else {
            warn!(?result, "completion already signalled, dropping result");
            return false;
        };
        sender.send(result).is_ok()
    }
}

/// Receiving half.
#[derive(Debug)]
pub struct CompletionReceiver {
    rx: oneshot::Receiver<Result<(), OracleError>>,
}

impl CompletionReceiver {
    /// Waits for the result.
    ///
    /// # Errors
    /// The delivered error, or [`OracleError::CompletionDropped`] if the
    /// signal was dropped without delivering.
    pub async fn wait(self) -> Result<(), OracleError> {
        self.rx.await.map_err(|_| OracleError::CompletionDropped)?
    }
}
