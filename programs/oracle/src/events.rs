//! Chain events and where they come from.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use tendermint_rpc::{event::Event, query::Query, SubscriptionClient, WebSocketClient};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, warn};

use crate::OracleError;

/// An event matching a subscription.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainEvent {
    /// Query the event matched
    pub query: String,
    /// Attributes keyed by `{event type}.{attribute key}`
    pub attributes: HashMap<String, Vec<String>>,
}

impl ChainEvent {
    /// First value of attribute `key` of events of type `event_type`.
    #[must_use]
    pub fn attribute(&self, event_type: &str, key: &str) -> Option<&str> {
        self.attributes
            .get(&format!("{event_type}.{key}"))
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Like [`ChainEvent::attribute`], failing if it is absent.
    ///
    /// # Errors
    /// Returns [`OracleError::MissingAttribute`].
    pub fn require(&self, event_type: &str, key: &str) -> Result<&str, OracleError> {
        self.attribute(event_type, key)
            .ok_or_else(|| OracleError::MissingAttribute(format!("{event_type}.{key}")))
    }
}

impl From<Event> for ChainEvent {
    fn from(event: Event) -> Self {
        Self {
            query: event.query,
            attributes: event.events.unwrap_or_default(),
        }
    }
}

/// Stream of events for one subscription.
pub type EventStream = BoxStream<'static, Result<ChainEvent, OracleError>>;

/// Push subscriptions to chain events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Subscribes to events matching `query`.
    async fn subscribe(&self, query: &str) -> Result<EventStream, OracleError>;

    /// Ends every subscription and the underlying connection.
    async fn close(&self) -> Result<(), OracleError>;
}

/// [`EventSource`] over a Tendermint websocket.
pub struct WebSocketEventSource {
    client: WebSocketClient,
    driver: Mutex<Option<JoinHandle<Result<(), tendermint_rpc::Error>>>>,
}

impl WebSocketEventSource {
    /// Connects to the websocket endpoint at `addr` and starts its driver.
    ///
    /// # Errors
    /// Returns [`OracleError::Subscription`] if the connection fails.
    pub async fn connect(addr: &str) -> Result<Self, OracleError> {
        let (client, driver) = WebSocketClient::new(addr)
            .await
            .map_err(|e| OracleError::Subscription(format!("{addr}: {e}")))?;
        let driver = tokio::spawn(driver.run());

        Ok(Self {
            client,
            driver: Mutex::new(Some(driver)),
        })
    }
}

#[async_trait]
impl EventSource for WebSocketEventSource {
    async fn subscribe(&self, query: &str) -> Result<EventStream, OracleError> {
        let parsed: Query = query
            .parse()
            .map_err(|e| OracleError::Subscription(format!("query `{query}`: {e}")))?;
        let subscription = self
            .client
            .subscribe(parsed)
            .await
            .map_err(|e| OracleError::Subscription(e.to_string()))?;
        debug!(query, "websocket subscription opened");

        Ok(subscription
            .map(|event| {
                event
                    .map(ChainEvent::from)
                    .map_err(|e| OracleError::Subscription(e.to_string()))
            })
            .boxed())
    }

    async fn close(&self) -> Result<(), OracleError> {
        let Some(driver) = self.driver.lock().await.take() else {
            return Ok(());
        };
        self.client
            .clone()
            .close()
            .map_err(|e| OracleError::Subscription(e.to_string()))?;

        match driver.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(OracleError::Subscription(e.to_string())),
            Err(e) => {
                warn!(error = %e, "websocket driver task panicked");
                Err(OracleError::Subscription(e.to_string()))
            }
        }
    }
}
