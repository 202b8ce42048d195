//! Response normalization.
//!
//! RDAP JSON and WHOIS text are both reduced to a [`NormalizedRecord`](crate::NormalizedRecord).
//! Both paths fill the same canonical fields, so only `data_source` (and
//! `raw`) reveal which protocol answered.

pub mod fields;
pub mod rdap;
pub mod whois;

pub use rdap::{normalize_rdap, EntityIndex, EntityRole};
pub use whois::normalize_whois;
