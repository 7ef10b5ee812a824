//! Routes subscribed events to their handlers.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    events::{ChainEvent, EventSource, EventStream},
    OracleError,
};

/// Reacts to events matching one query.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Subscription query selecting the events to handle.
    fn query(&self) -> String;

    /// Handles one event. Errors are logged by the dispatcher.
    async fn handle(&self, event: ChainEvent) -> Result<(), OracleError>;
}

/// How a subscription task ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubscriptionOutcome {
    /// The dispatcher was closed
    Cancelled,
    /// The event source ended the stream
    StreamEnded,
    /// The task panicked
    Failed(String),
}

/// Runs one task per subscription, each invoking its handler for every
/// event in order.
///
/// A failing handler does not stop its subscription or any other.
pub struct Dispatcher {
    source: Arc<dyn EventSource>,
    cancel: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<SubscriptionOutcome>)>,
}

impl Dispatcher {
    /// Creates a dispatcher subscribing through `source`.
    #[must_use]
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self {
            source,
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    /// Subscribes to the handler's query and starts feeding it events.
    ///
    /// Events emitted after this returns are delivered to `handler`.
    ///
    /// # Errors
    /// Fails if the subscription cannot be opened.
    pub async fn register(&mut self, handler: Arc<dyn EventHandler>) -> Result<(), OracleError> {
        let query = handler.query();
        let stream = self.source.subscribe(&query).await?;
        info!(handler = handler.name(), %query, "subscribed");

        let name = handler.name();
        let task = tokio::spawn(run_subscription(handler, stream, self.cancel.child_token()));
        self.tasks.push((name, task));
        Ok(())
    }

    /// Stops every subscription and closes the event source.
    ///
    /// A handler already running finishes its current event.
    pub async fn close(self) -> Vec<(&'static str, SubscriptionOutcome)> {
        self.cancel.cancel();
        if let Err(e) = self.source.close().await {
            warn!(error = %e, "failed to close the event source");
        }

        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for (name, task) in self.tasks {
            let outcome = task
                .await
                .unwrap_or_else(|e| SubscriptionOutcome::Failed(e.to_string()));
            outcomes.push((name, outcome));
        }
        outcomes
    }
}

async fn run_subscription(
    handler: Arc<dyn EventHandler>,
    mut stream: EventStream,
    cancel: CancellationToken,
) -> SubscriptionOutcome {
    let name = handler.name();
    loop {
        tokio::select! {
            () = cancel.cancelled() => return SubscriptionOutcome::Cancelled,
            next = stream.next() => match next {
                None => {
                    warn!(handler = name, "event stream ended");
                    return SubscriptionOutcome::StreamEnded;
                }
                Some(Err(e)) => error!(handler = name, error = %e, "bad event from subscription"),
                Some(Ok(event)) => {
                    if let Err(e) = handler.handle(event).await {
                        error!(handler = name, error = %e, "event handler failed");
                    }
                }
            },
        }
    }
}
