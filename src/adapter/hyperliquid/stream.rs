//! Hyperliquid WebSocket stream adapter.
//!
//! Implements [`UserEventStream`] over the exchange's multiplexed WebSocket:
//! one connection carries every (address, family) subscription, with frames
//! tagged by channel and attributed to their user. The adapter surfaces
//! connection loss as [`StreamEvent::Disconnected`] and leaves reconnection
//! policy to the monitor loop.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::messages::{family_for_channel, SubscribeRequest, WsMessage};
use crate::config::Network;
use crate::domain::{Address, EventFamily};
use crate::error::TransportError;
use crate::port::{RawEvent, StreamEvent, UserEventStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Live user-event stream over the Hyperliquid WebSocket API.
pub struct HyperliquidStream {
    url: String,
    ws: Option<WsStream>,
}

impl HyperliquidStream {
    /// Create a stream for the given network's endpoint.
    #[must_use]
    pub fn new(network: Network) -> Self {
        Self::with_url(network.ws_url().to_string())
    }

    /// Create a stream for an explicit WebSocket URL.
    #[must_use]
    pub const fn with_url(url: String) -> Self {
        Self { url, ws: None }
    }

    async fn send_request(&mut self, request: &SubscribeRequest) -> Result<(), TransportError> {
        let ws = self.ws.as_mut().ok_or(TransportError::NotConnected)?;
        let json = serde_json::to_string(request)?;
        ws.send(Message::Text(json)).await?;
        Ok(())
    }

    fn route_message(msg: WsMessage) -> Option<StreamEvent> {
        match msg {
            WsMessage::SubscriptionResponse(ack) => {
                if ack.method != "subscribe" {
                    return None;
                }
                let family = family_for_channel(&ack.subscription.kind)?;
                Some(StreamEvent::SubscriptionAck {
                    address: Address::from(ack.subscription.user),
                    family,
                })
            }
            WsMessage::UserFills(data) => {
                if data.is_snapshot {
                    // The snapshot replays historical fills on subscribe;
                    // only live events flow downstream.
                    return None;
                }
                Some(StreamEvent::Payload(RawEvent {
                    address: Address::from(data.user),
                    family: EventFamily::Fills,
                    payload: data.fills,
                }))
            }
            WsMessage::OrderUpdates(data) => Some(StreamEvent::Payload(RawEvent {
                address: Address::from(data.user),
                family: EventFamily::OrderUpdates,
                payload: data.updates,
            })),
            WsMessage::Unknown => None,
        }
    }
}

#[async_trait]
impl UserEventStream for HyperliquidStream {
    async fn connect(&mut self) -> Result<(), TransportError> {
        info!(url = %self.url, "Connecting to WebSocket");
        let (ws_stream, response) = connect_async(&self.url).await?;
        info!(status = %response.status(), "WebSocket connected");
        self.ws = Some(ws_stream);
        Ok(())
    }

    async fn subscribe(
        &mut self,
        address: &Address,
        family: EventFamily,
    ) -> Result<(), TransportError> {
        info!(address = %address, family = %family, "Subscribing");
        self.send_request(&SubscribeRequest::subscribe(address, family))
            .await
    }

    async fn unsubscribe(
        &mut self,
        address: &Address,
        family: EventFamily,
    ) -> Result<(), TransportError> {
        info!(address = %address, family = %family, "Unsubscribing");
        self.send_request(&SubscribeRequest::unsubscribe(address, family))
            .await
    }

    async fn next_event(&mut self) -> Option<StreamEvent> {
        let ws = self.ws.as_mut()?;

        loop {
            match ws.next().await? {
                Ok(Message::Text(text)) => {
                    debug!(raw = %text, "Received message");
                    match serde_json::from_str::<WsMessage>(&text) {
                        Ok(msg) => {
                            if let Some(event) = Self::route_message(msg) {
                                return Some(event);
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, raw = %text, "Failed to parse message");
                        }
                    }
                }
                Ok(Message::Ping(data)) => {
                    debug!("Received ping");
                    if ws.send(Message::Pong(data)).await.is_err() {
                        self.ws = None;
                        return Some(StreamEvent::Disconnected {
                            address: None,
                            reason: "Failed to send pong".into(),
                        });
                    }
                }
                Ok(Message::Close(frame)) => {
                    info!(frame = ?frame, "WebSocket closed by server");
                    self.ws = None;
                    return Some(StreamEvent::Disconnected {
                        address: None,
                        reason: frame.map(|f| f.reason.to_string()).unwrap_or_default(),
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "WebSocket error");
                    self.ws = None;
                    return Some(StreamEvent::Disconnected {
                        address: None,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}
