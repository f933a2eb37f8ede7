//! Fluent GSUP message builder

use super::ie::{Compound, Element, IeValue};
use super::lookup::{find_first_in, names};
use super::message::{attach_ie, GsupMessage, IeEntry, MsgType};
use crate::errors::{GsupError, Result};
use crate::types::{AuthTuple, CnDomain};
use metrics::counter;
use tracing::{debug, warn};

/// PDP type organisation emitted in every PDP address header
pub const PDP_TYPE_ORG_IETF: &str = "ietf";

/// Builder for a single GSUP message.
///
/// Every `with_*` call consumes and returns the builder. The first failed
/// attachment is latched and returned by [`build`](Self::build); attachments
/// after that point are ignored.
#[derive(Debug, Default)]
pub struct GsupMessageBuilder {
    msg_type: Option<MsgType>,
    ies: Vec<IeEntry>,
    error: Option<GsupError>,
}

impl GsupMessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the message type. The last call wins.
    pub fn with_msg_type(mut self, msg_type: MsgType) -> Self {
        self.msg_type = Some(msg_type);
        self
    }

    /// Attach an IE, merging into an existing entry of the same name
    pub fn with_ie(mut self, name: &str, value: impl Into<IeValue>) -> Self {
        if self.error.is_some() {
            return self;
        }
        if let Err(e) = attach_ie(&mut self.ies, name, value.into()) {
            warn!(ie = name, error = %e, "Rejected IE attachment");
            self.error = Some(e);
        }
        self
    }

    /// Attach an IE and report a failed merge to the caller right away.
    ///
    /// An error already latched by an earlier `with_*` call is returned first.
    pub fn try_with_ie(mut self, name: &str, value: impl Into<IeValue>) -> Result<Self> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        attach_ie(&mut self.ies, name, value.into())?;
        Ok(self)
    }

    /// Attach the subscriber number with its derived BCD length
    pub fn with_msisdn_ie(mut self, msisdn: &str) -> Self {
        if msisdn.is_empty() {
            if self.error.is_none() {
                self.error = Some(GsupError::malformed(
                    names::MSISDN,
                    "MSISDN digits must not be empty",
                ));
            }
            return self;
        }

        let record = Compound::new()
            .with_field(names::BCD_LEN, bcd_len(msisdn))
            .with_field(names::DIGITS, msisdn);
        self.with_ie(names::MSISDN, record)
    }

    /// Append one PDP context (id, address, APN, QoS) to `pdp_info`
    pub fn with_pdp_info_ie(self, pdp_ctx_id: u8, pdp_type: &str, apn_name: &str) -> Self {
        let existing = find_first_in(names::PDP_INFO, &self.ies)
            .and_then(IeValue::as_repeated)
            .map_or(0, |parts| parts.len());
        debug!(pdp_ctx_id, existing_parts = existing, "Adding PDP context");

        let hdr = Compound::new()
            .with_field(names::PDP_TYPE_NR, pdp_type)
            .with_field(names::PDP_TYPE_ORG, PDP_TYPE_ORG_IETF);
        let address = Compound::new()
            .with_field(names::ADDRESS, IeValue::null())
            .with_field(names::HDR, hdr);

        let parts: Vec<Element> = vec![
            Compound::new().with_field(names::PDP_CONTEXT_ID, pdp_ctx_id).into(),
            Compound::new().with_field(names::PDP_ADDRESS, address).into(),
            Compound::new().with_field(names::ACCESS_POINT_NAME, apn_name).into(),
            Compound::new().with_field(names::QOS, IeValue::null()).into(),
        ];

        self.with_ie(names::PDP_INFO, parts)
    }

    pub fn with_imsi_ie(self, imsi: &str) -> Self {
        self.with_ie(names::IMSI, imsi)
    }

    pub fn with_cause_ie(self, cause: u8) -> Self {
        self.with_ie(names::CAUSE, cause)
    }

    pub fn with_cn_domain_ie(self, domain: CnDomain) -> Self {
        self.with_ie(names::CN_DOMAIN, domain)
    }

    pub fn with_auth_tuple_ie(self, tuple: &AuthTuple) -> Self {
        self.with_ie(names::AUTH_TUPLE, Compound::from(tuple))
    }

    /// Finish the message for handoff to the codec
    pub fn build(self) -> Result<GsupMessage> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let msg_type = self.msg_type.ok_or(GsupError::IncompleteMessage)?;

        let message = GsupMessage::from_parts(msg_type, self.ies);
        counter!("gsup_messages_built_total", "msg_type" => msg_type.name()).increment(1);
        debug!(msg_type = %msg_type, ies = message.len(), "Built GSUP message");

        Ok(message)
    }
}

/// BCD byte length of a digit string: two digits per octet
fn bcd_len(digits: &str) -> usize {
    (digits.chars().count() + 1) / 2
}
