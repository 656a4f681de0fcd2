//! Netlink attribute policies.
//!
//! A policy maps attribute type ids to a name, an expected data type and
//! optional length bounds. Nested attributes carry their own sub-policy, so a
//! policy is a tree compiled once from a JSON document and never mutated
//! afterwards.
//!
//! Policy document shape:
//! ```json
//! {
//!     "IFLA_IFNAME": { "attr_type": 3, "data_type": "NLA_STRING", "attr_len": 16 },
//!     "IFLA_LINKINFO": {
//!         "attr_type": 18,
//!         "data_type": "NLA_NESTED",
//!         "policy": {
//!             "IFLA_INFO_KIND": { "attr_type": 1, "data_type": "NLA_STRING" }
//!         }
//!     }
//! }
//! ```

pub mod attribute;
pub mod config;
pub mod error;
pub mod policy;

mod entry;

pub use attribute::AttributeSpec;
pub use config::PolicyConfig;
pub use error::{Result, SchemaError};
pub use policy::{build_policy, AttributePolicy};
