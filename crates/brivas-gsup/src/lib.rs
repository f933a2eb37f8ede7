//! # Brivas GSUP
//!
//! Construction of Osmocom GSUP messages exchanged between the HSS and
//! MSC/SGSN peers:
//!
//! - **IE model** - scalar, compound and repeated information elements
//! - **Builder** - fluent construction with type-directed IE merging
//! - **Lookup** - first/all IE accessors over built or decoded messages
//! - **Transport** - queue contract used to move encoded messages, logs and
//!   metrics between services
//!
//! ## Example
//! ```rust,ignore
//! use brivas_gsup::{GsupMessageBuilder, MsgType};
//!
//! let msg = GsupMessageBuilder::new()
//!     .with_msg_type(MsgType::InsertDataRequest)
//!     .with_imsi_ie("001010000000001")
//!     .with_msisdn_ie("4915112345678")
//!     .with_pdp_info_ie(1, "ipv4", "internet")
//!     .build()?;
//! ```

pub mod config;
pub mod errors;
pub mod gsup;
pub mod telemetry;
pub mod transport;
pub mod types;

// Re-exports
pub use config::{GsupConfig, TransportConfig};
pub use errors::{GsupError, Result};
pub use gsup::{
    find_all, find_first, names, GsupCodec, GsupMessage, GsupMessageBuilder, IeEntry, IeValue,
    JsonCodec, MsgType,
};
pub use telemetry::{init_tracing, TelemetryConfig};
pub use transport::{KeyPrefix, MemoryTransport, Transport};
pub use types::{AuthTuple, CnDomain};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GSUP over IPA default port
pub const DEFAULT_GSUP_PORT: u16 = 4222;
