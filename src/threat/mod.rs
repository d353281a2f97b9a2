//! Threat Detection & Firewall Matching
//!
//! Inbound traffic is checked against the firewall table first (ascending
//! priority, first match wins); surviving traffic is scored against the
//! attack signature table and high-severity threats are auto-neutralized by
//! inserting a block rule for the source.

pub mod engine;
pub mod firewall;
pub mod signatures;
pub mod types;

pub use engine::ThreatEngine;
pub use firewall::{Cidr, FirewallAction, FirewallRule};
pub use types::{RuleTriggerEvent, Threat, ThreatFilter, ThreatStatistics, ThreatStatus};
