use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

use wo_core::ports::AuthResponsePort;
use wo_core::{Account, RequestPayload};

/// Message posted back to the requesting app's tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum OriginMessage {
    AuthResponse {
        origin: Option<String>,
        domain_name: String,
        account_index: usize,
        address: String,
        scopes: Vec<String>,
    },
    Cancelled {
        origin: Option<String>,
        domain_name: String,
    },
}

/// Delivers auth decisions as JSON lines over a channel.
#[derive(Debug, Clone)]
pub struct ChannelOriginMessenger {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelOriginMessenger {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }

    fn post(&self, message: &OriginMessage) -> Result<()> {
        let json = serde_json::to_string(message).context("serialize origin message")?;
        debug!(message = %json, "posting message to origin");
        self.tx
            .send(json)
            .map_err(|_| anyhow::anyhow!("origin channel closed"))
    }
}

#[async_trait]
impl AuthResponsePort for ChannelOriginMessenger {
    async fn send_auth_response(
        &self,
        origin: Option<&Url>,
        request: &RequestPayload,
        account: &Account,
    ) -> Result<()> {
        self.post(&OriginMessage::AuthResponse {
            origin: origin.map(|url| url.origin().ascii_serialization()),
            domain_name: request.domain_name.clone(),
            account_index: account.index,
            address: account.address.clone(),
            scopes: request.scopes.clone(),
        })
    }

    async fn send_cancellation(&self, origin: Option<&Url>, request: &RequestPayload) -> Result<()> {
        self.post(&OriginMessage::Cancelled {
            origin: origin.map(|url| url.origin().ascii_serialization()),
            domain_name: request.domain_name.clone(),
        })
    }
}
