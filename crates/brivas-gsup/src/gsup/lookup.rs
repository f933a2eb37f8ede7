//! Read-only IE lookups over a message's top-level sequence

use super::ie::IeValue;
use super::message::{GsupMessage, IeEntry};

/// Well-known IE names
pub mod names {
    pub const IMSI: &str = "imsi";
    pub const CAUSE: &str = "cause";
    pub const AUTH_TUPLE: &str = "auth_tuple";
    pub const MSISDN: &str = "msisdn";
    pub const HLR_NUMBER: &str = "hlr_number";
    pub const PDP_INFO: &str = "pdp_info";
    pub const PDP_INFO_COMPLETE: &str = "pdp_info_compl";
    pub const CANCEL_TYPE: &str = "cancel_type";
    pub const CN_DOMAIN: &str = "cn_domain";
    pub const IMEI: &str = "imei";
    pub const IMEI_RESULT: &str = "imei_result";
    pub const MESSAGE_CLASS: &str = "message_class";
    pub const SOURCE_NAME: &str = "source_name";
    pub const DESTINATION_NAME: &str = "destination_name";

    // MSISDN sub-fields
    pub const BCD_LEN: &str = "bcd_len";
    pub const DIGITS: &str = "digits";

    // PDP context sub-parts, in emission order
    pub const PDP_CONTEXT_ID: &str = "pdp_context_id";
    pub const PDP_ADDRESS: &str = "pdp_address";
    pub const ACCESS_POINT_NAME: &str = "access_point_name";
    pub const QOS: &str = "qos";

    // PDP address sub-fields
    pub const ADDRESS: &str = "address";
    pub const HDR: &str = "hdr";
    pub const PDP_TYPE_NR: &str = "pdp_type_nr";
    pub const PDP_TYPE_ORG: &str = "pdp_type_org";
}

/// Value of the first top-level entry named `name`
pub fn find_first<'a>(name: &str, message: &'a GsupMessage) -> Option<&'a IeValue> {
    find_first_in(name, message.ies())
}

/// Every top-level entry named `name`, in message order
pub fn find_all<'a>(name: &str, message: &'a GsupMessage) -> Vec<&'a IeEntry> {
    message.ies().iter().filter(|e| e.name == name).collect()
}

pub(crate) fn find_first_in<'a>(name: &str, ies: &'a [IeEntry]) -> Option<&'a IeValue> {
    ies.iter().find(|e| e.name == name).map(|e| &e.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded() -> GsupMessage {
        GsupMessage::from_dict(serde_json::json!({
            "msg_type": "INSERT_DATA_REQUEST",
            "ies": [
                {"imsi": "001010000000001"},
                {"pdp_info": [{"pdp_context_id": 1}]},
                {"cn_domain": "ps"},
                {"pdp_info": {"pdp_context_id": 2}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_find_first_returns_earliest() {
        let msg = decoded();
        let first = find_first(names::PDP_INFO, &msg).unwrap();
        assert!(first.as_repeated().is_some());
        assert_eq!(msg.find_first(names::IMSI).and_then(IeValue::as_str), Some("001010000000001"));
    }

    #[test]
    fn test_find_all_keeps_order() {
        let msg = decoded();
        let all = find_all(names::PDP_INFO, &msg);
        assert_eq!(all.len(), 2);
        assert!(all[0].value.as_repeated().is_some());
        assert!(all[1].value.as_compound().is_some());
    }

    #[test]
    fn test_absent_name() {
        let msg = decoded();
        assert!(find_first(names::AUTH_TUPLE, &msg).is_none());
        assert!(find_all(names::AUTH_TUPLE, &msg).is_empty());
    }
}
