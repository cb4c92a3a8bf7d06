//! Normalization of the webhook response envelope.
//!
//! The remote endpoints answer a `readAll` request in one of three shapes: a
//! bare JSON array of records, an envelope `{ success, data: [records] }`, or
//! an envelope whose `data` is itself a JSON-encoded string that needs a
//! second parse. [`decode_records`] accepts all three at a single boundary,
//! with that precedence, and rejects anything else as [`Error::Parse`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Request body sent to every webhook endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct WebhookRequest {
    pub operation: &'static str,
}

impl WebhookRequest {
    pub(crate) fn read_all() -> Self {
        Self {
            operation: "readAll",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WebhookResponse<T> {
    Records(Vec<T>),
    Envelope {
        #[serde(default)]
        success: Option<bool>,
        data: EnvelopeData<T>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EnvelopeData<T> {
    Records(Vec<T>),
    Encoded(String),
}

/// Decodes a webhook response body into a list of records.
///
/// Precedence: bare array, then `{ success, data: array }`, then
/// `{ success, data: string-encoded-json }`. A `success: false` envelope maps
/// to [`Error::Remote`] with the `data` string as message; any other shape
/// maps to [`Error::Parse`].
pub(crate) fn decode_records<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, Error> {
    let response: WebhookResponse<T> = serde_json::from_str(body)?;
    match response {
        WebhookResponse::Records(records) => Ok(records),
        WebhookResponse::Envelope {
            success: Some(false),
            data,
        } => Err(Error::Remote(match data {
            EnvelopeData::Encoded(message) => message,
            EnvelopeData::Records(_) => "request rejected by remote endpoint".into(),
        })),
        WebhookResponse::Envelope {
            data: EnvelopeData::Records(records),
            ..
        } => Ok(records),
        WebhookResponse::Envelope {
            data: EnvelopeData::Encoded(encoded),
            ..
        } => serde_json::from_str(&encoded).map_err(Error::from),
    }
}
