// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp protocol backend selection.
//!
//! The protocol stack is a plug-in behind [`WaClientFactory`]. This build
//! ships without one linked: the daemon runs its full surface (storage, REST,
//! WebSocket fan-out), and session connects report a configuration error
//! until a backend crate supplies a real factory here.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use wagate_core::{DeviceRecord, WaClient, WaClientFactory, WaEvent, WagateError};

/// Factory used when no protocol backend is linked into the build.
pub struct UnlinkedBackend;

#[async_trait]
impl WaClientFactory for UnlinkedBackend {
    async fn create(
        &self,
        _device: DeviceRecord,
    ) -> Result<(Arc<dyn WaClient>, mpsc::Receiver<WaEvent>), WagateError> {
        Err(WagateError::Config(
            "no WhatsApp protocol backend is linked into this build".into(),
        ))
    }
}

/// The factory this build wires into the registry.
pub fn factory() -> Arc<dyn WaClientFactory> {
    Arc::new(UnlinkedBackend)
}
