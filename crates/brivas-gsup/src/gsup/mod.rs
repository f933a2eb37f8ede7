//! GSUP (Generic Subscriber Update Protocol) message construction
//!
//! Osmocom GSUP carries authentication, location-update and subscriber-data
//! signalling between the HLR/HSS and MSC/SGSN. This module builds the
//! structured message that the external TLV codec serializes.

pub mod ie;
pub mod lookup;
mod builder;
mod codec;
mod message;

pub use builder::{GsupMessageBuilder, PDP_TYPE_ORG_IETF};
pub use codec::{GsupCodec, JsonCodec};
pub use ie::{Compound, Element, IeShape, IeValue, Scalar};
pub use lookup::{find_all, find_first, names};
pub use message::{GsupMessage, IeEntry, MsgType};
