// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Client messaging bridge
//!
//! Worker ↔ page control channel. Outbound messages are wrapped in a
//! [`MessageQueueMsg`] that decides fan-out; inbound messages mutate the
//! shared [`SessionStore`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::session::SessionStore;

/// Login state carried by `login_status_change`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoginStatus {
    /// Worker has dropped the session
    ConfirmLogout,
    /// Worker asks the page to log out
    RequestLogout,
}

/// Tagged message exchanged between worker and pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum GlobalMessage {
    /// Worker → page: session state changed
    #[serde(rename = "login_status_change")]
    LoginStatusChange(LoginStatus),
    /// Page → worker: user logged out
    #[serde(rename = "request-logout")]
    RequestLogout,
    /// Page → worker: replace the held token
    #[serde(rename = "update_user_token", alias = "update_uesr_token")]
    UpdateUserToken(String),
}

impl GlobalMessage {
    /// Broadcast payload confirming the worker dropped the session
    pub fn confirm_logout() -> Self {
        GlobalMessage::LoginStatusChange(LoginStatus::ConfirmLogout)
    }

    /// Wire name of the event tag
    pub fn event(&self) -> &'static str {
        match self {
            GlobalMessage::LoginStatusChange(_) => "login_status_change",
            GlobalMessage::RequestLogout => "request-logout",
            GlobalMessage::UpdateUserToken(_) => "update_user_token",
        }
    }
}

/// Fan-out mode for an outbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumeType {
    /// Every connected client
    All,
    /// Exactly one uniformly chosen client
    One,
}

/// Outbound message envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageQueueMsg {
    pub consume_type: ConsumeType,
    pub message: GlobalMessage,
}

impl MessageQueueMsg {
    /// Envelope delivered to every client
    pub fn broadcast(message: GlobalMessage) -> Self {
        Self {
            consume_type: ConsumeType::All,
            message,
        }
    }

    /// Envelope delivered to one client
    pub fn unicast(message: GlobalMessage) -> Self {
        Self {
            consume_type: ConsumeType::One,
            message,
        }
    }
}

/// A connected page
pub trait Client: Send + Sync {
    /// Stable client identifier
    fn id(&self) -> &str;

    /// Deliver a message to the page
    fn post_message(&self, message: &GlobalMessage) -> Result<()>;
}

/// Page client backed by an unbounded channel
pub struct ChannelClient {
    id: String,
    tx: mpsc::UnboundedSender<GlobalMessage>,
}

impl ChannelClient {
    /// Create a client and the receiving end the page reads from
    pub fn new(id: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<GlobalMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id: id.into(), tx }, rx)
    }
}

impl Client for ChannelClient {
    fn id(&self) -> &str {
        &self.id
    }

    fn post_message(&self, message: &GlobalMessage) -> Result<()> {
        self.tx
            .send(message.clone())
            .map_err(|_| Error::delivery(&self.id, "receiver closed"))
    }
}

/// Connected page clients
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<Vec<Arc<dyn Client>>>,
    claimed: AtomicBool,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page; a client with the same id is replaced
    pub fn register(&self, client: Arc<dyn Client>) {
        let mut clients = self.clients.write();
        clients.retain(|c| c.id() != client.id());
        clients.push(client);
    }

    /// Remove a page, returning whether it was registered
    pub fn unregister(&self, id: &str) -> bool {
        let mut clients = self.clients.write();
        let before = clients.len();
        clients.retain(|c| c.id() != id);
        clients.len() != before
    }

    /// Snapshot of every connected client
    pub fn match_all(&self) -> Vec<Arc<dyn Client>> {
        self.clients.read().clone()
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }

    /// Take control of every open page
    pub fn claim(&self) -> usize {
        self.claimed.store(true, Ordering::SeqCst);
        self.len()
    }

    /// Whether the worker controls open pages
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }
}

/// Routes messages between the worker and its pages
pub struct MessageBridge {
    clients: Arc<ClientRegistry>,
    session: Arc<SessionStore>,
}

impl MessageBridge {
    pub fn new(clients: Arc<ClientRegistry>, session: Arc<SessionStore>) -> Self {
        Self { clients, session }
    }

    /// Connected clients
    pub fn clients(&self) -> &Arc<ClientRegistry> {
        &self.clients
    }

    /// Deliver an envelope, returning how many clients received it
    pub fn send_message_to_client(&self, envelope: &MessageQueueMsg) -> usize {
        let mut clients = self.clients.match_all();
        let targets: &[Arc<dyn Client>] = match envelope.consume_type {
            ConsumeType::All => &clients,
            ConsumeType::One => {
                clients.shuffle(&mut rand::thread_rng());
                clients.get(..1).unwrap_or(&[])
            }
        };

        let mut delivered = 0;
        for client in targets {
            match client.post_message(&envelope.message) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(client = client.id(), error = %e, "postMessage failed");
                }
            }
        }

        tracing::debug!(
            event = envelope.message.event(),
            consume_type = ?envelope.consume_type,
            delivered,
            "sent message to clients"
        );
        delivered
    }

    /// Broadcast to all clients
    pub fn broadcast(&self, message: GlobalMessage) -> usize {
        self.send_message_to_client(&MessageQueueMsg::broadcast(message))
    }

    /// Handle a control message posted by a page
    pub fn receive_message_from_client(&self, message: GlobalMessage) {
        match message {
            GlobalMessage::RequestLogout => {
                self.session.clear();
                self.broadcast(GlobalMessage::confirm_logout());
            }
            GlobalMessage::UpdateUserToken(token) => {
                self.session.set_token(token);
            }
            GlobalMessage::LoginStatusChange(status) => {
                tracing::debug!(?status, "ignoring worker-bound login_status_change");
            }
        }
    }

    /// Handle a raw JSON payload from a page
    ///
    /// Dispatches on the `event` tag alone; `data` is only read by events that
    /// carry one. Unknown events and unusable payloads are logged and dropped.
    /// Input that is not an object with an `event` string is an error.
    pub fn receive_raw_message(&self, raw: &str) -> Result<()> {
        #[derive(Deserialize)]
        struct RawMessage {
            event: String,
            #[serde(default)]
            data: serde_json::Value,
        }

        let RawMessage { event, data } = serde_json::from_str(raw)?;
        match event.as_str() {
            "request-logout" => self.receive_message_from_client(GlobalMessage::RequestLogout),
            "update_user_token" | "update_uesr_token" => match data {
                serde_json::Value::String(token) => {
                    self.receive_message_from_client(GlobalMessage::UpdateUserToken(token))
                }
                other => {
                    tracing::warn!(event = %event, data = %other, "token update without a string token, ignored");
                }
            },
            "login_status_change" => {
                tracing::debug!("ignoring worker-bound login_status_change");
            }
            _ => tracing::warn!(event = %event, "ignoring unknown client message"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge_with(n: usize) -> (MessageBridge, Vec<mpsc::UnboundedReceiver<GlobalMessage>>) {
        let registry = Arc::new(ClientRegistry::new());
        let mut receivers = Vec::new();
        for i in 0..n {
            let (client, rx) = ChannelClient::new(format!("client-{}", i));
            registry.register(Arc::new(client));
            receivers.push(rx);
        }
        (
            MessageBridge::new(registry, Arc::new(SessionStore::new())),
            receivers,
        )
    }

    fn drain(receivers: &mut [mpsc::UnboundedReceiver<GlobalMessage>]) -> Vec<usize> {
        receivers
            .iter_mut()
            .map(|rx| {
                let mut count = 0;
                while rx.try_recv().is_ok() {
                    count += 1;
                }
                count
            })
            .collect()
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(GlobalMessage::confirm_logout()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"event": "login_status_change", "data": "confirm-logout"})
        );

        let logout: GlobalMessage =
            serde_json::from_str(r#"{"event": "request-logout"}"#).unwrap();
        assert_eq!(logout, GlobalMessage::RequestLogout);

        let update: GlobalMessage =
            serde_json::from_str(r#"{"event": "update_user_token", "data": "t1"}"#).unwrap();
        assert_eq!(update, GlobalMessage::UpdateUserToken("t1".into()));

        let envelope = serde_json::to_value(MessageQueueMsg::unicast(GlobalMessage::RequestLogout))
            .unwrap();
        assert_eq!(envelope["consumeType"], "one");
    }

    #[test]
    fn test_legacy_token_event_name() {
        let update: GlobalMessage =
            serde_json::from_str(r#"{"event": "update_uesr_token", "data": "t2"}"#).unwrap();
        assert_eq!(update, GlobalMessage::UpdateUserToken("t2".into()));
    }

    #[test]
    fn test_broadcast_reaches_every_client_once() {
        let (bridge, mut receivers) = bridge_with(4);

        let delivered = bridge.broadcast(GlobalMessage::confirm_logout());

        assert_eq!(delivered, 4);
        assert_eq!(drain(&mut receivers), vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_unicast_with_no_clients() {
        let (bridge, _) = bridge_with(0);
        let envelope = MessageQueueMsg::unicast(GlobalMessage::confirm_logout());
        assert_eq!(bridge.send_message_to_client(&envelope), 0);
    }

    #[test]
    fn test_unicast_single_client() {
        let (bridge, mut receivers) = bridge_with(1);
        let envelope = MessageQueueMsg::unicast(GlobalMessage::confirm_logout());

        assert_eq!(bridge.send_message_to_client(&envelope), 1);
        assert_eq!(drain(&mut receivers), vec![1]);
    }

    #[test]
    fn test_unicast_picks_exactly_one() {
        let (bridge, mut receivers) = bridge_with(5);
        let envelope = MessageQueueMsg::unicast(GlobalMessage::confirm_logout());

        for _ in 0..50 {
            assert_eq!(bridge.send_message_to_client(&envelope), 1);
            let counts = drain(&mut receivers);
            assert_eq!(counts.iter().sum::<usize>(), 1);
        }
    }

    #[test]
    fn test_closed_client_is_skipped() {
        let (bridge, mut receivers) = bridge_with(3);
        receivers.remove(1);

        assert_eq!(bridge.broadcast(GlobalMessage::confirm_logout()), 2);
    }

    #[test]
    fn test_request_logout_is_idempotent() {
        let (bridge, mut receivers) = bridge_with(2);
        bridge.session.set_token("abc");

        bridge.receive_message_from_client(GlobalMessage::RequestLogout);
        bridge.receive_message_from_client(GlobalMessage::RequestLogout);

        assert!(!bridge.session.has_token());
        assert_eq!(drain(&mut receivers), vec![2, 2]);
    }

    #[test]
    fn test_update_user_token() {
        let (bridge, _) = bridge_with(1);
        bridge
            .receive_raw_message(r#"{"event": "update_user_token", "data": "fresh"}"#)
            .unwrap();
        assert_eq!(bridge.session.token().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_raw_logout_ignores_payload() {
        for raw in [
            r#"{"event": "request-logout", "data": "now"}"#,
            r#"{"event": "request-logout", "data": {}}"#,
            r#"{"event": "request-logout", "data": null}"#,
            r#"{"event": "request-logout"}"#,
        ] {
            let (bridge, mut receivers) = bridge_with(1);
            bridge.session.set_token("T");

            bridge.receive_raw_message(raw).unwrap();

            assert!(!bridge.session.has_token(), "token survived {}", raw);
            assert_eq!(drain(&mut receivers), vec![1]);
        }
    }

    #[test]
    fn test_raw_token_update_needs_string() {
        let (bridge, _) = bridge_with(1);
        bridge.session.set_token("T");

        for raw in [
            r#"{"event": "update_user_token", "data": null}"#,
            r#"{"event": "update_user_token", "data": 42}"#,
            r#"{"event": "update_user_token"}"#,
        ] {
            bridge.receive_raw_message(raw).unwrap();
            assert_eq!(bridge.session.token().as_deref(), Some("T"));
        }

        bridge
            .receive_raw_message(r#"{"event": "update_uesr_token", "data": "legacy"}"#)
            .unwrap();
        assert_eq!(bridge.session.token().as_deref(), Some("legacy"));
    }

    #[test]
    fn test_raw_message_unknown_and_malformed() {
        let (bridge, _) = bridge_with(1);
        assert!(bridge.receive_raw_message(r#"{"event": "ping"}"#).is_ok());
        assert!(bridge.receive_raw_message("not json").is_err());
        assert!(bridge.receive_raw_message(r#"{"data": "t"}"#).is_err());
    }

    #[test]
    fn test_register_replaces_same_id() {
        let registry = ClientRegistry::new();
        let (a, _rx_a) = ChannelClient::new("tab");
        let (b, _rx_b) = ChannelClient::new("tab");
        registry.register(Arc::new(a));
        registry.register(Arc::new(b));

        assert_eq!(registry.len(), 1);
        assert!(registry.unregister("tab"));
        assert!(registry.is_empty());
    }
}
