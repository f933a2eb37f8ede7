//! Common GSUP payload types

use crate::gsup::ie::{Compound, IeValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Core network domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CnDomain {
    /// Packet switched (SGSN)
    Ps,
    /// Circuit switched (MSC/VLR)
    Cs,
}

impl CnDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ps => "ps",
            Self::Cs => "cs",
        }
    }
}

impl fmt::Display for CnDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CnDomain> for IeValue {
    fn from(v: CnDomain) -> Self {
        IeValue::from(v.as_str())
    }
}

/// Authentication vector carried in SEND_AUTH_INFO_RESULT.
///
/// All fields are hex strings. GSM triplets carry only `rand`, `sres` and
/// `kc`; UMTS quintuplets add the remaining fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTuple {
    pub rand: String,
    pub sres: String,
    pub kc: String,
    pub ik: Option<String>,
    pub ck: Option<String>,
    pub autn: Option<String>,
    pub res: Option<String>,
}

impl AuthTuple {
    pub fn triplet(rand: &str, sres: &str, kc: &str) -> Self {
        Self {
            rand: rand.to_string(),
            sres: sres.to_string(),
            kc: kc.to_string(),
            ..Default::default()
        }
    }

    pub fn is_umts(&self) -> bool {
        self.ik.is_some() && self.ck.is_some() && self.autn.is_some()
    }
}

impl From<&AuthTuple> for Compound {
    fn from(t: &AuthTuple) -> Self {
        let mut record = Compound::new()
            .with_field("rand", t.rand.as_str())
            .with_field("sres", t.sres.as_str())
            .with_field("kc", t.kc.as_str());

        // Absent quintuplet fields are omitted rather than sent as null
        for (name, value) in [("ik", &t.ik), ("ck", &t.ck), ("autn", &t.autn), ("res", &t.res)] {
            if let Some(v) = value {
                record.push(name, v.as_str());
            }
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triplet_omits_umts_fields() {
        let t = AuthTuple::triplet("aa", "bb", "cc");
        assert!(!t.is_umts());

        let record = Compound::from(&t);
        let names: Vec<&str> = record.fields().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["rand", "sres", "kc"]);
    }

    #[test]
    fn test_quintuplet_fields() {
        let t = AuthTuple {
            ik: Some("11".to_string()),
            ck: Some("22".to_string()),
            autn: Some("33".to_string()),
            res: Some("44".to_string()),
            ..AuthTuple::triplet("aa", "bb", "cc")
        };
        assert!(t.is_umts());
        assert_eq!(Compound::from(&t).len(), 7);
    }

    #[test]
    fn test_cn_domain_names() {
        assert_eq!(IeValue::from(CnDomain::Ps).as_str(), Some("ps"));
        assert_eq!(CnDomain::Cs.to_string(), "cs");
    }
}
