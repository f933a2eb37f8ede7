//! Handoff boundary to the wire codec
//!
//! TLV byte layout is owned by an external codec. This module defines the
//! trait such a codec implements and a JSON codec that emits the dict form.

use super::message::GsupMessage;
use crate::errors::{GsupError, Result};
use bytes::Bytes;
use tracing::debug;

/// Encoder/decoder for finished GSUP messages
pub trait GsupCodec: Send + Sync {
    fn encode(&self, message: &GsupMessage) -> Result<Bytes>;

    fn decode(&self, data: &[u8]) -> Result<GsupMessage>;
}

/// Dict-form JSON codec
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl GsupCodec for JsonCodec {
    fn encode(&self, message: &GsupMessage) -> Result<Bytes> {
        let encoded = serde_json::to_vec(message)?;
        debug!(msg_type = %message.msg_type(), len = encoded.len(), "Encoded GSUP message");
        Ok(Bytes::from(encoded))
    }

    fn decode(&self, data: &[u8]) -> Result<GsupMessage> {
        if data.is_empty() {
            return Err(GsupError::Codec("Empty payload".to_string()));
        }
        serde_json::from_slice(data).map_err(|e| GsupError::Codec(e.to_string()))
    }
}
