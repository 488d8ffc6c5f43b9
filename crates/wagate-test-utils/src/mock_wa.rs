// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted mock of the WhatsApp client port.
//!
//! The mock records every outbound call and lets tests inject protocol
//! events (pairing, connection transitions, incoming messages) as if the
//! real library emitted them.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use wagate_core::{
    ChatPresence, DeviceRecord, Jid, MediaRef, QrEvent, WaClient, WaClientFactory, WaEvent,
    WagateError,
};

/// A scripted WhatsApp client.
///
/// Configure identity and canned media before handing it to a
/// [`MockWaFactory`]; inspect `sent_messages` / `presence_updates` and drive
/// events with [`MockWaClient::emit`] afterwards.
#[derive(Default)]
pub struct MockWaClient {
    connected: AtomicBool,
    fail_connect: AtomicBool,
    fail_sends: AtomicBool,
    fail_downloads: AtomicBool,
    device_jid: Mutex<Option<Jid>>,
    lid_jid: Mutex<Option<Jid>>,
    media: Mutex<HashMap<String, Vec<u8>>>,
    events_tx: Mutex<Option<mpsc::Sender<WaEvent>>>,
    qr_tx: Mutex<Option<mpsc::Sender<QrEvent>>>,
    /// Every text message sent, as `(chat, text)`.
    pub sent_messages: Mutex<Vec<(Jid, String)>>,
    /// Every presence update sent, as `(chat, presence)`.
    pub presence_updates: Mutex<Vec<(Jid, ChatPresence)>>,
}

impl MockWaClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a mock that already carries a paired identity.
    pub fn paired(jid: Jid) -> Arc<Self> {
        let client = Self::new();
        client.set_device_jid(jid);
        client
    }

    pub fn set_device_jid(&self, jid: Jid) {
        *self.device_jid.lock().unwrap() = Some(jid);
    }

    pub fn set_lid_jid(&self, jid: Jid) {
        *self.lid_jid.lock().unwrap() = Some(jid);
    }

    /// Registers downloadable bytes under a media direct path.
    pub fn add_media(&self, direct_path: &str, bytes: Vec<u8>) {
        self.media
            .lock()
            .unwrap()
            .insert(direct_path.to_string(), bytes);
    }

    pub fn fail_connect(&self) {
        self.fail_connect.store(true, Ordering::SeqCst);
    }

    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub fn fail_downloads(&self) {
        self.fail_downloads.store(true, Ordering::SeqCst);
    }

    /// Injects a protocol event as if the library emitted it.
    ///
    /// Panics if the client was never created through a factory (no event
    /// channel exists yet).
    pub async fn emit(&self, event: WaEvent) {
        let sender = self
            .events_tx
            .lock()
            .unwrap()
            .clone()
            .expect("client not attached to a factory");
        sender.send(event).await.expect("event receiver dropped");
    }

    /// Pushes a QR code into the pairing channel opened by the registry.
    pub async fn push_qr(&self, code: &str) {
        let sender = self
            .qr_tx
            .lock()
            .unwrap()
            .clone()
            .expect("qr channel not opened");
        sender
            .send(QrEvent::Code(code.to_string()))
            .await
            .expect("qr receiver dropped");
    }

    pub fn sent_texts(&self) -> Vec<(Jid, String)> {
        self.sent_messages.lock().unwrap().clone()
    }

    pub fn presences(&self) -> Vec<(Jid, ChatPresence)> {
        self.presence_updates.lock().unwrap().clone()
    }

    fn attach_events(&self, sender: mpsc::Sender<WaEvent>) {
        *self.events_tx.lock().unwrap() = Some(sender);
    }
}

#[async_trait]
impl WaClient for MockWaClient {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn is_logged_in(&self) -> bool {
        self.device_jid.lock().unwrap().is_some()
    }

    fn device_jid(&self) -> Option<Jid> {
        self.device_jid.lock().unwrap().clone()
    }

    fn lid_jid(&self) -> Option<Jid> {
        self.lid_jid.lock().unwrap().clone()
    }

    async fn connect(&self) -> Result<(), WagateError> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(WagateError::Client {
                message: "scripted connect failure".into(),
                source: None,
            });
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        // Dropping the event sender closes the registry's pump.
        *self.events_tx.lock().unwrap() = None;
        *self.qr_tx.lock().unwrap() = None;
    }

    async fn qr_channel(&self) -> Result<mpsc::Receiver<QrEvent>, WagateError> {
        if self.is_logged_in() {
            return Err(WagateError::Client {
                message: "device already paired".into(),
                source: None,
            });
        }
        let (tx, rx) = mpsc::channel(16);
        *self.qr_tx.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn send_text(&self, chat: &Jid, text: &str) -> Result<String, WagateError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(WagateError::Client {
                message: "scripted send failure".into(),
                source: None,
            });
        }
        self.sent_messages
            .lock()
            .unwrap()
            .push((chat.clone(), text.to_string()));
        Ok(uuid::Uuid::new_v4().to_string().to_uppercase())
    }

    async fn send_chat_presence(
        &self,
        chat: &Jid,
        presence: ChatPresence,
    ) -> Result<(), WagateError> {
        self.presence_updates
            .lock()
            .unwrap()
            .push((chat.clone(), presence));
        Ok(())
    }

    async fn download(&self, media: &MediaRef) -> Result<Vec<u8>, WagateError> {
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(WagateError::Client {
                message: "scripted download failure".into(),
                source: None,
            });
        }
        self.media
            .lock()
            .unwrap()
            .get(&media.direct_path)
            .cloned()
            .ok_or_else(|| WagateError::Client {
                message: format!("no media at {}", media.direct_path),
                source: None,
            })
    }
}

/// Factory that hands out pre-scripted clients in order.
///
/// When the script is empty, a fresh default client is created; its identity
/// mirrors the device record it was built from.
#[derive(Default)]
pub struct MockWaFactory {
    scripted: Mutex<VecDeque<Arc<MockWaClient>>>,
    scripted_by_jid: Mutex<HashMap<String, Arc<MockWaClient>>>,
    created: Mutex<Vec<Arc<MockWaClient>>>,
}

impl MockWaFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a client to be returned by the next `create` call.
    pub fn push_client(&self, client: Arc<MockWaClient>) {
        self.scripted.lock().unwrap().push_back(client);
    }

    /// Scripts the client returned for a specific device JID, regardless of
    /// creation order. Useful when several sessions connect concurrently.
    pub fn push_client_for(&self, jid: &Jid, client: Arc<MockWaClient>) {
        self.scripted_by_jid
            .lock()
            .unwrap()
            .insert(jid.to_string(), client);
    }

    /// Every client this factory has created, in creation order.
    pub fn created_clients(&self) -> Vec<Arc<MockWaClient>> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl WaClientFactory for MockWaFactory {
    async fn create(
        &self,
        device: DeviceRecord,
    ) -> Result<(Arc<dyn WaClient>, mpsc::Receiver<WaEvent>), WagateError> {
        let by_jid = device.jid.as_ref().and_then(|jid| {
            self.scripted_by_jid
                .lock()
                .unwrap()
                .remove(&jid.to_string())
        });
        let client = by_jid
            .or_else(|| self.scripted.lock().unwrap().pop_front())
            .unwrap_or_else(MockWaClient::new);

        // A paired device record carries its identity into the client.
        if let Some(jid) = device.jid {
            if client.device_jid().is_none() {
                client.set_device_jid(jid);
            }
        }

        let (tx, rx) = mpsc::channel(64);
        client.attach_events(tx);
        self.created.lock().unwrap().push(Arc::clone(&client));
        Ok((client, rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wagate_core::jid::DEFAULT_USER_SERVER;

    #[tokio::test]
    async fn factory_scripts_clients_in_order() {
        let factory = MockWaFactory::new();
        let first = MockWaClient::paired(Jid::new("111", DEFAULT_USER_SERVER));
        factory.push_client(Arc::clone(&first));

        let (client, _events) = factory.create(DeviceRecord::default()).await.unwrap();
        assert_eq!(client.device_jid(), Some(Jid::new("111", DEFAULT_USER_SERVER)));
        assert_eq!(factory.created_clients().len(), 1);
    }

    #[tokio::test]
    async fn device_identity_flows_into_default_client() {
        let factory = MockWaFactory::new();
        let device = DeviceRecord {
            jid: Some(Jid::with_device("222", DEFAULT_USER_SERVER, 5)),
            key_data: vec![1],
        };
        let (client, _events) = factory.create(device).await.unwrap();
        assert!(client.is_logged_in());
        assert_eq!(client.device_jid().unwrap().device, 5);
    }

    #[tokio::test]
    async fn emit_reaches_the_event_receiver() {
        let factory = MockWaFactory::new();
        let client = MockWaClient::new();
        factory.push_client(Arc::clone(&client));
        let (_client, mut events) = factory.create(DeviceRecord::default()).await.unwrap();

        client.emit(WaEvent::Connected).await;
        assert!(matches!(events.recv().await, Some(WaEvent::Connected)));
    }

    #[tokio::test]
    async fn recorded_sends_and_downloads() {
        let client = MockWaClient::new();
        let chat = Jid::new("6281", DEFAULT_USER_SERVER);
        client.send_text(&chat, "hello").await.unwrap();
        assert_eq!(client.sent_texts(), vec![(chat.clone(), "hello".to_string())]);

        client.add_media("/v/t62.7118-24/abc", vec![9, 9]);
        let media = MediaRef {
            direct_path: "/v/t62.7118-24/abc".into(),
            ..MediaRef::default()
        };
        assert_eq!(client.download(&media).await.unwrap(), vec![9, 9]);

        client.fail_downloads();
        assert!(client.download(&media).await.is_err());
    }
}
