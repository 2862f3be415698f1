// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transactional e-mail client (SendGrid v3 `mail/send`).
//!
//! Used to send maintenance reports to vehicle owners with the PDF
//! attached.

use crate::error::AppError;
use crate::services::http::{check_response, transport_error};
use base64::{engine::general_purpose::STANDARD, Engine as _};

const SERVICE: &str = "mail";
const DEFAULT_BASE_URL: &str = "https://api.sendgrid.com/v3";

/// PDF file attached to an outgoing e-mail.
#[derive(Debug, Clone)]
pub struct PdfAttachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// A message ready to send.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub attachment: Option<PdfAttachment>,
}

/// Transactional e-mail API client.
#[derive(Clone)]
pub struct MailerClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    from: String,
}

impl MailerClient {
    /// Create a client. `api_key = None` disables sending.
    pub fn new(api_key: Option<String>, from: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            from,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send a message.
    pub async fn send(&self, mail: &OutgoingMail) -> Result<(), AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Forbidden("e-mail integration is not configured".to_string()))?;

        let response = self
            .http
            .post(format!("{}/mail/send", self.base_url))
            .bearer_auth(api_key)
            .json(&build_payload(&self.from, mail))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        check_response(SERVICE, response).await?;
        tracing::info!(
            subject = %mail.subject,
            with_attachment = mail.attachment.is_some(),
            "E-mail sent"
        );
        Ok(())
    }
}

/// Build the `mail/send` request body.
pub fn build_payload(from: &str, mail: &OutgoingMail) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "personalizations": [{ "to": [{ "email": mail.to }] }],
        "from": { "email": from },
        "subject": mail.subject,
        "content": [{ "type": "text/plain", "value": mail.text }],
    });

    if let Some(attachment) = &mail.attachment {
        payload["attachments"] = serde_json::json!([{
            "content": STANDARD.encode(&attachment.content),
            "filename": attachment.filename,
            "type": "application/pdf",
            "disposition": "attachment",
        }]);
    }

    payload
}
