//! GSUP message model

use super::ie::{Element, IeValue};
use super::lookup;
use crate::errors::{GsupError, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

macro_rules! msg_types {
    ($($variant:ident = $code:literal => $name:literal,)+) => {
        /// GSUP message types (Osmocom registry)
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum MsgType {
            $($variant = $code,)+
        }

        impl MsgType {
            /// Every known message type, in code order
            pub const ALL: &'static [MsgType] = &[$(MsgType::$variant,)+];

            /// Registry name, as carried in the dict form
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl TryFrom<u8> for MsgType {
            type Error = GsupError;

            fn try_from(v: u8) -> Result<Self> {
                match v {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(GsupError::UnknownMsgType(format!("0x{:02x}", v))),
                }
            }
        }

        impl FromStr for MsgType {
            type Err = GsupError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(GsupError::UnknownMsgType(s.to_string())),
                }
            }
        }
    };
}

msg_types! {
    UpdateLocationRequest = 0x04 => "UPDATE_LOCATION_REQUEST",
    UpdateLocationError = 0x05 => "UPDATE_LOCATION_ERROR",
    UpdateLocationResult = 0x06 => "UPDATE_LOCATION_RESULT",
    SendAuthInfoRequest = 0x08 => "SEND_AUTH_INFO_REQUEST",
    SendAuthInfoError = 0x09 => "SEND_AUTH_INFO_ERROR",
    SendAuthInfoResult = 0x0a => "SEND_AUTH_INFO_RESULT",
    AuthFailReport = 0x0b => "AUTH_FAIL_REPORT",
    PurgeMsRequest = 0x0c => "PURGE_MS_REQUEST",
    PurgeMsError = 0x0d => "PURGE_MS_ERROR",
    PurgeMsResult = 0x0e => "PURGE_MS_RESULT",
    InsertDataRequest = 0x10 => "INSERT_DATA_REQUEST",
    InsertDataError = 0x11 => "INSERT_DATA_ERROR",
    InsertDataResult = 0x12 => "INSERT_DATA_RESULT",
    DeleteDataRequest = 0x14 => "DELETE_DATA_REQUEST",
    DeleteDataError = 0x15 => "DELETE_DATA_ERROR",
    DeleteDataResult = 0x16 => "DELETE_DATA_RESULT",
    LocationCancelRequest = 0x1c => "LOCATION_CANCEL_REQUEST",
    LocationCancelError = 0x1d => "LOCATION_CANCEL_ERROR",
    LocationCancelResult = 0x1e => "LOCATION_CANCEL_RESULT",
    ProcSsRequest = 0x20 => "PROC_SS_REQUEST",
    ProcSsError = 0x21 => "PROC_SS_ERROR",
    ProcSsResult = 0x22 => "PROC_SS_RESULT",
    MoForwardSmRequest = 0x24 => "MO_FORWARD_SM_REQUEST",
    MoForwardSmError = 0x25 => "MO_FORWARD_SM_ERROR",
    MoForwardSmResult = 0x26 => "MO_FORWARD_SM_RESULT",
    MtForwardSmRequest = 0x28 => "MT_FORWARD_SM_REQUEST",
    MtForwardSmError = 0x29 => "MT_FORWARD_SM_ERROR",
    MtForwardSmResult = 0x2a => "MT_FORWARD_SM_RESULT",
    ReadyForSmRequest = 0x2c => "READY_FOR_SM_REQUEST",
    ReadyForSmError = 0x2d => "READY_FOR_SM_ERROR",
    ReadyForSmResult = 0x2e => "READY_FOR_SM_RESULT",
    CheckImeiRequest = 0x30 => "CHECK_IMEI_REQUEST",
    CheckImeiError = 0x31 => "CHECK_IMEI_ERROR",
    CheckImeiResult = 0x32 => "CHECK_IMEI_RESULT",
    EPrepareHandoverRequest = 0x34 => "E_PREPARE_HANDOVER_REQUEST",
    EPrepareHandoverError = 0x35 => "E_PREPARE_HANDOVER_ERROR",
    EPrepareHandoverResult = 0x36 => "E_PREPARE_HANDOVER_RESULT",
    EPrepareSubsequentHandoverRequest = 0x38 => "E_PREPARE_SUBSEQUENT_HANDOVER_REQUEST",
    EPrepareSubsequentHandoverError = 0x39 => "E_PREPARE_SUBSEQUENT_HANDOVER_ERROR",
    EPrepareSubsequentHandoverResult = 0x3a => "E_PREPARE_SUBSEQUENT_HANDOVER_RESULT",
    ESendEndSignalRequest = 0x3c => "E_SEND_END_SIGNAL_REQUEST",
    ESendEndSignalError = 0x3d => "E_SEND_END_SIGNAL_ERROR",
    ESendEndSignalResult = 0x3e => "E_SEND_END_SIGNAL_RESULT",
    EProcessAccessSignallingRequest = 0x40 => "E_PROCESS_ACCESS_SIGNALLING_REQUEST",
    EForwardAccessSignallingRequest = 0x44 => "E_FORWARD_ACCESS_SIGNALLING_REQUEST",
    EClose = 0x47 => "E_CLOSE",
    EAbort = 0x4b => "E_ABORT",
    ERoutingError = 0x4e => "E_ROUTING_ERROR",
}

impl MsgType {
    /// On-wire message type code
    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn is_request(&self) -> bool {
        self.name().ends_with("_REQUEST") || *self == Self::AuthFailReport
    }

    pub fn is_result(&self) -> bool {
        self.name().ends_with("_RESULT")
    }

    pub fn is_error(&self) -> bool {
        self.name().ends_with("_ERROR")
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for MsgType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for MsgType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse::<MsgType>().map_err(de::Error::custom)
    }
}

/// Top-level IE entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IeEntry {
    pub name: String,
    pub value: IeValue,
}

impl IeEntry {
    pub fn new(name: &str, value: impl Into<IeValue>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

impl Serialize for IeEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.value)?;
        map.end()
    }
}

struct IeEntryVisitor;

impl<'de> Visitor<'de> for IeEntryVisitor {
    type Value = IeEntry;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a single-key object mapping an IE name to its value")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<IeEntry, A::Error> {
        let (name, value) = access
            .next_entry::<String, IeValue>()?
            .ok_or_else(|| de::Error::custom("empty IE entry"))?;
        if access.next_key::<String>()?.is_some() {
            return Err(de::Error::custom(format!(
                "IE entry '{}' carries more than one name",
                name
            )));
        }
        Ok(IeEntry { name, value })
    }
}

impl<'de> Deserialize<'de> for IeEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(IeEntryVisitor)
    }
}

/// GSUP message: a type tag plus the ordered top-level IE sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GsupMessage {
    msg_type: MsgType,
    ies: Vec<IeEntry>,
}

impl GsupMessage {
    /// Create a message with an empty IE sequence
    pub fn new(msg_type: MsgType) -> Self {
        Self {
            msg_type,
            ies: Vec::new(),
        }
    }

    pub fn msg_type(&self) -> MsgType {
        self.msg_type
    }

    pub fn ies(&self) -> &[IeEntry] {
        &self.ies
    }

    pub fn len(&self) -> usize {
        self.ies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ies.is_empty()
    }

    pub fn into_parts(self) -> (MsgType, Vec<IeEntry>) {
        (self.msg_type, self.ies)
    }

    pub fn find_first(&self, name: &str) -> Option<&IeValue> {
        lookup::find_first(name, self)
    }

    pub fn find_all(&self, name: &str) -> Vec<&IeEntry> {
        lookup::find_all(name, self)
    }

    /// Dict form consumed by the external codec
    pub fn to_dict(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_dict(dict: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(dict)?)
    }

    pub(crate) fn from_parts(msg_type: MsgType, ies: Vec<IeEntry>) -> Self {
        Self { msg_type, ies }
    }
}

/// Attach `value` under `name`, merging into the first entry of that name.
///
/// A repeated entry absorbs scalars and compounds by appending and absorbs
/// repeated values by extending. A single scalar or compound entry is
/// promoted to a repeated entry when another value of the same shape
/// arrives. Any other combination is rejected and leaves the entry intact.
pub(crate) fn attach_ie(ies: &mut Vec<IeEntry>, name: &str, value: IeValue) -> Result<()> {
    if name.is_empty() {
        return Err(GsupError::malformed(name, "IE name must not be empty"));
    }

    let Some(entry) = ies.iter_mut().find(|e| e.name == name) else {
        ies.push(IeEntry::new(name, value));
        return Ok(());
    };

    let current = std::mem::replace(&mut entry.value, IeValue::null());
    entry.value = match (current, value) {
        (IeValue::Repeated(mut items), IeValue::Repeated(more)) => {
            items.extend(more);
            IeValue::Repeated(items)
        }
        (IeValue::Repeated(mut items), IeValue::Compound(c)) => {
            items.push(Element::Compound(c));
            IeValue::Repeated(items)
        }
        (IeValue::Repeated(mut items), IeValue::Scalar(s)) => {
            items.push(Element::Scalar(s));
            IeValue::Repeated(items)
        }
        (IeValue::Compound(a), IeValue::Compound(b)) => {
            IeValue::Repeated(vec![Element::Compound(a), Element::Compound(b)])
        }
        (IeValue::Scalar(a), IeValue::Scalar(b)) => {
            IeValue::Repeated(vec![Element::Scalar(a), Element::Scalar(b)])
        }
        (current, value) => {
            let err = GsupError::malformed(
                name,
                format!(
                    "cannot merge {} value into existing {} entry",
                    value.shape(),
                    current.shape()
                ),
            );
            entry.value = current;
            return Err(err);
        }
    };

    trace!(ie = name, "Merged IE into existing entry");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gsup::ie::{Compound, IeShape, Scalar};
    use crate::types::AuthTuple;

    fn record(tag: i64) -> Compound {
        Compound::new().with_field("tag", tag)
    }

    #[test]
    fn test_msg_type_codes() {
        assert_eq!(MsgType::UpdateLocationRequest.code(), 0x04);
        assert_eq!(MsgType::try_from(0x0a).unwrap(), MsgType::SendAuthInfoResult);
        assert!(MsgType::try_from(0xff).is_err());
        assert_eq!(
            "INSERT_DATA_REQUEST".parse::<MsgType>().unwrap(),
            MsgType::InsertDataRequest
        );
        assert_eq!(MsgType::PurgeMsResult.to_string(), "PURGE_MS_RESULT");
    }

    #[test]
    fn test_msg_type_roundtrips_through_registry() {
        for t in MsgType::ALL {
            assert_eq!(MsgType::try_from(t.code()).unwrap(), *t);
            assert_eq!(t.name().parse::<MsgType>().unwrap(), *t);
        }
    }

    #[test]
    fn test_msg_type_classification() {
        assert!(MsgType::UpdateLocationRequest.is_request());
        assert!(MsgType::AuthFailReport.is_request());
        assert!(MsgType::SendAuthInfoResult.is_result());
        assert!(MsgType::CheckImeiError.is_error());
        assert!(!MsgType::EClose.is_request());
    }

    #[test]
    fn test_attach_new_entry_kept_as_is() {
        let mut ies = Vec::new();
        attach_ie(&mut ies, "imsi", IeValue::from("001010000000001")).unwrap();
        attach_ie(&mut ies, "hlr", IeValue::from(record(1))).unwrap();

        assert_eq!(ies[0].value.shape(), IeShape::Scalar);
        assert_eq!(ies[1].value.shape(), IeShape::Compound);
    }

    #[test]
    fn test_attach_promotes_and_appends_compounds() {
        let mut ies = Vec::new();
        attach_ie(&mut ies, "auth_tuple", record(1).into()).unwrap();
        attach_ie(&mut ies, "imsi", "001".into()).unwrap();
        attach_ie(&mut ies, "auth_tuple", record(2).into()).unwrap();
        attach_ie(&mut ies, "auth_tuple", record(3).into()).unwrap();

        assert_eq!(ies.len(), 2);
        let tuples = ies[0].value.as_repeated().unwrap();
        let tags: Vec<i64> = tuples
            .iter()
            .filter_map(|e| e.as_compound()?.get("tag")?.as_int())
            .collect();
        assert_eq!(tags, vec![1, 2, 3]);
    }

    #[test]
    fn test_attach_extends_repeated() {
        let mut ies = Vec::new();
        attach_ie(&mut ies, "x", IeValue::Repeated(vec![record(1).into()])).unwrap();
        attach_ie(&mut ies, "x", IeValue::Repeated(vec![record(2).into(), record(3).into()]))
            .unwrap();

        assert_eq!(ies.len(), 1);
        assert_eq!(ies[0].value.as_repeated().unwrap().len(), 3);
    }

    #[test]
    fn test_attach_rejects_shape_mismatch() {
        let mut ies = Vec::new();
        attach_ie(&mut ies, "cn_domain", "ps".into()).unwrap();

        let err = attach_ie(&mut ies, "cn_domain", record(1).into()).unwrap_err();
        assert!(matches!(err, GsupError::MalformedAttachment { .. }));
        assert_eq!(ies[0].value, IeValue::Scalar(Scalar::Str("ps".to_string())));
    }

    #[test]
    fn test_attach_rejects_repeated_into_single_entry() {
        let mut ies = Vec::new();
        attach_ie(&mut ies, "hlr", record(1).into()).unwrap();
        attach_ie(&mut ies, "cause", "2".into()).unwrap();

        let seq = || IeValue::Repeated(vec![record(2).into()]);
        let err = attach_ie(&mut ies, "hlr", seq()).unwrap_err();
        assert!(matches!(err, GsupError::MalformedAttachment { .. }));
        let err = attach_ie(&mut ies, "cause", seq()).unwrap_err();
        assert!(matches!(err, GsupError::MalformedAttachment { .. }));

        assert_eq!(ies[0].value, IeValue::from(record(1)));
        assert_eq!(ies[1].value, IeValue::from("2"));
    }

    #[test]
    fn test_attach_appends_scalar_to_repeated() {
        let mut ies = Vec::new();
        attach_ie(&mut ies, "x", IeValue::Repeated(vec![record(1).into()])).unwrap();
        attach_ie(&mut ies, "x", "tail".into()).unwrap();

        let items = ies[0].value.as_repeated().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].as_scalar(), Some(&Scalar::Str("tail".to_string())));
    }

    #[test]
    fn test_attach_rejects_empty_name() {
        let mut ies = Vec::new();
        assert!(attach_ie(&mut ies, "", "x".into()).is_err());
        assert!(ies.is_empty());
    }

    #[test]
    fn test_dict_form() {
        let mut ies = Vec::new();
        attach_ie(&mut ies, "imsi", "001010000000001".into()).unwrap();
        let msg = GsupMessage::from_parts(MsgType::UpdateLocationRequest, ies);

        let dict = msg.to_dict().unwrap();
        assert_eq!(
            dict,
            serde_json::json!({
                "msg_type": "UPDATE_LOCATION_REQUEST",
                "ies": [{"imsi": "001010000000001"}]
            })
        );
        assert_eq!(GsupMessage::from_dict(dict).unwrap(), msg);
    }

    #[test]
    fn test_dict_form_keeps_compound_field_order() {
        let tuple = AuthTuple::triplet("aa", "bb", "cc");
        let mut ies = Vec::new();
        attach_ie(&mut ies, "auth_tuple", Compound::from(&tuple).into()).unwrap();
        let msg = GsupMessage::from_parts(MsgType::SendAuthInfoResult, ies);

        let dict = msg.to_dict().unwrap();
        let keys: Vec<&str> = dict["ies"][0]["auth_tuple"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["rand", "sres", "kc"]);

        let back = GsupMessage::from_dict(dict).unwrap();
        let fields: Vec<&str> = back
            .find_first("auth_tuple")
            .and_then(IeValue::as_compound)
            .unwrap()
            .fields()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(fields, vec!["rand", "sres", "kc"]);
        assert_eq!(back, msg);
    }

    #[test]
    fn test_decoded_message_may_repeat_names() {
        let dict = serde_json::json!({
            "msg_type": "INSERT_DATA_REQUEST",
            "ies": [{"pdp_info": [{"pdp_context_id": 1}]}, {"pdp_info": [{"pdp_context_id": 2}]}]
        });
        let msg = GsupMessage::from_dict(dict).unwrap();
        assert_eq!(msg.len(), 2);
    }

    #[test]
    fn test_multi_key_entry_rejected() {
        let dict = serde_json::json!({
            "msg_type": "INSERT_DATA_REQUEST",
            "ies": [{"imsi": "1", "msisdn": "2"}]
        });
        assert!(GsupMessage::from_dict(dict).is_err());
    }
}
