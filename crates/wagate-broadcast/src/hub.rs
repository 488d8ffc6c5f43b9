// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The subscriber registry and fan-out coordinator.
//!
//! All state lives inside one task; registration, removal, and publishes
//! arrive as commands on an mpsc channel, so publishes to one session are
//! totally ordered and a stalled subscriber can never block the runtime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::event::EventMessage;

/// Bound on each subscriber's outbound frame queue. A subscriber whose queue
/// fills is closed and dropped (slow consumer policy).
pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 256;

/// Depth of the coordinator's command queue.
const COMMAND_QUEUE_CAPACITY: usize = 1024;

enum Command {
    Register {
        session_id: String,
        id: u64,
        sender: mpsc::Sender<String>,
    },
    Unregister {
        session_id: String,
        id: u64,
    },
    Publish {
        session_id: String,
        frame: String,
    },
}

/// A registered subscriber's receive side.
///
/// Frames arrive in publish order. The channel closes when the subscriber is
/// unregistered or evicted; drain the remaining frames, then shut the
/// transport down.
pub struct Subscription {
    pub id: u64,
    pub session_id: String,
    pub receiver: mpsc::Receiver<String>,
}

/// Fan-out registry: session id -> set of subscriber queues.
pub struct Broadcaster {
    commands: mpsc::Sender<Command>,
    next_id: AtomicU64,
}

impl Broadcaster {
    /// Creates the broadcaster and spawns its coordinator task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        tokio::spawn(run_coordinator(rx));
        Self {
            commands: tx,
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a subscriber for one session's events.
    pub async fn subscribe(&self, session_id: &str) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);
        let _ = self
            .commands
            .send(Command::Register {
                session_id: session_id.to_string(),
                id,
                sender,
            })
            .await;
        Subscription {
            id,
            session_id: session_id.to_string(),
            receiver,
        }
    }

    /// Removes a subscriber, closing its queue.
    pub async fn unsubscribe(&self, session_id: &str, id: u64) {
        let _ = self
            .commands
            .send(Command::Unregister {
                session_id: session_id.to_string(),
                id,
            })
            .await;
    }

    /// Publishes an event to every live subscriber of `session_id`.
    ///
    /// The envelope is serialized once; enqueueing is non-blocking per
    /// subscriber.
    pub async fn publish(&self, session_id: &str, event: &EventMessage) {
        let _ = self
            .commands
            .send(Command::Publish {
                session_id: session_id.to_string(),
                frame: event.to_frame(),
            })
            .await;
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_coordinator(mut commands: mpsc::Receiver<Command>) {
    let mut sessions: HashMap<String, HashMap<u64, mpsc::Sender<String>>> = HashMap::new();

    while let Some(command) = commands.recv().await {
        match command {
            Command::Register {
                session_id,
                id,
                sender,
            } => {
                debug!(session_id = %session_id, subscriber = id, "subscriber registered");
                sessions.entry(session_id).or_default().insert(id, sender);
            }
            Command::Unregister { session_id, id } => {
                if let Some(subscribers) = sessions.get_mut(&session_id) {
                    if subscribers.remove(&id).is_some() {
                        debug!(session_id = %session_id, subscriber = id, "subscriber removed");
                    }
                    if subscribers.is_empty() {
                        sessions.remove(&session_id);
                    }
                }
            }
            Command::Publish { session_id, frame } => {
                let Some(subscribers) = sessions.get_mut(&session_id) else {
                    continue;
                };
                let mut evicted = Vec::new();
                for (id, sender) in subscribers.iter() {
                    match sender.try_send(frame.clone()) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            warn!(
                                session_id = %session_id,
                                subscriber = id,
                                "subscriber queue full, evicting"
                            );
                            evicted.push(*id);
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => {
                            evicted.push(*id);
                        }
                    }
                }
                for id in evicted {
                    subscribers.remove(&id);
                }
                if subscribers.is_empty() {
                    sessions.remove(&session_id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wagate_core::SessionStatus;

    fn status_event() -> EventMessage {
        EventMessage::status_update(SessionStatus::Connected, Some("6281@s.whatsapp.net"), None)
    }

    #[tokio::test]
    async fn subscriber_receives_frames_in_publish_order() {
        let hub = Broadcaster::new();
        let mut sub = hub.subscribe("sess-1").await;

        for code in ["one", "two", "three"] {
            hub.publish("sess-1", &EventMessage::qr_update(code)).await;
        }

        for expected in ["one", "two", "three"] {
            let frame = sub.receiver.recv().await.unwrap();
            assert!(frame.contains(expected));
        }
    }

    #[tokio::test]
    async fn publish_is_scoped_to_session() {
        let hub = Broadcaster::new();
        let mut sub_a = hub.subscribe("sess-a").await;
        let mut sub_b = hub.subscribe("sess-b").await;

        hub.publish("sess-a", &status_event()).await;
        hub.publish("sess-a", &status_event()).await;
        hub.unsubscribe("sess-b", sub_b.id).await;

        assert!(sub_a.receiver.recv().await.is_some());
        assert!(sub_a.receiver.recv().await.is_some());
        // sess-b saw nothing and its queue closed on unsubscribe.
        assert!(sub_b.receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn unsubscribe_closes_the_queue() {
        let hub = Broadcaster::new();
        let mut sub = hub.subscribe("sess-1").await;
        hub.unsubscribe("sess-1", sub.id).await;
        assert!(sub.receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn slow_subscriber_is_evicted_and_others_keep_receiving() {
        let hub = Broadcaster::new();
        // Stalled: frames pile up because the receiver is never drained.
        let mut stalled = hub.subscribe("sess-1").await;
        let mut healthy = hub.subscribe("sess-1").await;

        for i in 0..300 {
            hub.publish("sess-1", &EventMessage::qr_update(&format!("code-{i}")))
                .await;
            // Keep the healthy subscriber drained so only the stalled one fills.
            let _ = healthy.receiver.recv().await.unwrap();
        }

        // The stalled subscriber got exactly its queue capacity, then was closed.
        let mut received = 0;
        while stalled.receiver.recv().await.is_some() {
            received += 1;
        }
        assert_eq!(received, SUBSCRIBER_QUEUE_CAPACITY);

        // Later publishes still reach the healthy subscriber.
        hub.publish("sess-1", &EventMessage::qr_update("after-eviction"))
            .await;
        let frame = healthy.receiver.recv().await.unwrap();
        assert!(frame.contains("after-eviction"));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_noop() {
        let hub = Broadcaster::new();
        hub.publish("nobody-home", &status_event()).await;
    }
}
