//! Async HTTP client for the lead service.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{Ack, LeadBackend, StartLeadRequest, StartedLead, StepUpdate, parse_envelope};
use crate::config::{BackendConfig, SecretString};
use crate::error::BackendError;
use crate::funnel::Channel;
use crate::otp::mask_phone;

/// Lead service reached over JSON-over-HTTP.
pub struct HttpBackend {
    base_url: String,
    api_key: Option<SecretString>,
    http: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveStepBody<'a> {
    lead_id: &'a str,
    #[serde(flatten)]
    update: &'a StepUpdate,
}

impl HttpBackend {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            http,
        })
    }

    pub fn from_config(config: &BackendConfig) -> anyhow::Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .context("backend.base_url is not configured (or run with --demo)")?;
        Self::new(
            base_url,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
        .context("Failed to build HTTP client")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST `body` to `path` and decode the envelope.
    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.http.post(self.url(path)).json(body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => {
                if !status.is_success() && value.get("ok").is_none() {
                    return Err(BackendError::Rejected(format!("{}: {}", status, text)));
                }
                parse_envelope(value)
            }
            Err(_) if !status.is_success() => {
                Err(BackendError::Rejected(format!("{}: {}", status, text.trim())))
            }
            Err(e) => Err(BackendError::Decode(e.to_string())),
        }
    }
}

#[async_trait]
impl LeadBackend for HttpBackend {
    async fn start_lead(&self, request: StartLeadRequest) -> Result<StartedLead, BackendError> {
        tracing::debug!("[http] startLead clinic={}", request.clinic_slug);
        self.post("/leads/start", &request).await
    }

    async fn save_step(&self, lead_id: &str, update: StepUpdate) -> Result<(), BackendError> {
        tracing::debug!("[http] saveStep lead={} {:?}", lead_id, update);
        let body = SaveStepBody {
            lead_id,
            update: &update,
        };
        self.post::<_, Ack>("/leads/step", &body).await.map(|_| ())
    }

    async fn send_otp(&self, lead_id: &str, phone: &str) -> Result<(), BackendError> {
        tracing::debug!("[http] sendOtp lead={} phone={}", lead_id, mask_phone(phone));
        let body = json!({ "leadId": lead_id, "phone": phone });
        self.post::<_, Ack>("/leads/otp/send", &body).await.map(|_| ())
    }

    async fn verify_otp(&self, lead_id: &str, phone: &str, code: &str) -> Result<(), BackendError> {
        tracing::debug!("[http] verifyOtp lead={} phone={}", lead_id, mask_phone(phone));
        let body = json!({ "leadId": lead_id, "phone": phone, "code": code });
        self.post::<_, Ack>("/leads/otp/verify", &body).await.map(|_| ())
    }

    async fn set_channel(&self, lead_id: &str, channel: Channel) -> Result<(), BackendError> {
        tracing::debug!("[http] setChannel lead={} channel={}", lead_id, channel.as_str());
        let body = json!({ "leadId": lead_id, "channel": channel });
        self.post::<_, Ack>("/leads/channel", &body).await.map(|_| ())
    }

    fn name(&self) -> &str {
        "http"
    }
}
