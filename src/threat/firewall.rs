//! Firewall Rules & CIDR Matching
//!
//! Rules are evaluated in ascending priority order; the first enabled rule
//! whose source/port/protocol match decides allow or block, default allow.
//! Source matching is real IPv4 subnet arithmetic, not string prefixes.

use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// CIDR
// ============================================================================

/// IPv4 source matcher: a subnet, a single host (/32) or the wildcard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cidr {
    Any,
    Net { network: Ipv4Addr, prefix: u8 },
}

impl Cidr {
    pub fn host(addr: Ipv4Addr) -> Self {
        Cidr::Net {
            network: addr,
            prefix: 32,
        }
    }

    pub fn matches(&self, addr: Ipv4Addr) -> bool {
        match *self {
            Cidr::Any => true,
            Cidr::Net { network, prefix } => {
                let mask = if prefix == 0 {
                    0
                } else {
                    u32::MAX << (32 - prefix as u32)
                };
                (u32::from(addr) & mask) == (u32::from(network) & mask)
            }
        }
    }
}

impl FromStr for Cidr {
    type Err = CidrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("any") || s == "*" {
            return Ok(Cidr::Any);
        }
        match s.split_once('/') {
            Some((addr, prefix)) => {
                let network: Ipv4Addr = addr
                    .parse()
                    .map_err(|_| CidrParseError(s.to_string()))?;
                let prefix: u8 = prefix
                    .parse()
                    .map_err(|_| CidrParseError(s.to_string()))?;
                if prefix > 32 {
                    return Err(CidrParseError(s.to_string()));
                }
                Ok(Cidr::Net { network, prefix })
            }
            None => {
                let addr: Ipv4Addr = s.parse().map_err(|_| CidrParseError(s.to_string()))?;
                Ok(Cidr::host(addr))
            }
        }
    }
}

impl std::fmt::Display for Cidr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cidr::Any => write!(f, "any"),
            Cidr::Net { network, prefix } => write!(f, "{}/{}", network, prefix),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidrParseError(pub String);

impl std::fmt::Display for CidrParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid CIDR source: {}", self.0)
    }
}

impl std::error::Error for CidrParseError {}

// ============================================================================
// FIREWALL RULES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirewallAction {
    Allow,
    Block,
}

impl FirewallAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FirewallAction::Allow => "allow",
            FirewallAction::Block => "block",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallRule {
    pub id: String,
    pub action: FirewallAction,
    pub source: Cidr,
    /// None matches any port
    pub port: Option<u16>,
    /// "any" matches every protocol
    pub protocol: String,
    /// Lower evaluates first
    pub priority: i32,
    pub enabled: bool,
}

impl FirewallRule {
    /// Does this rule apply to the given traffic triple?
    pub fn applies(&self, source: Ipv4Addr, port: Option<u16>, protocol: &str) -> bool {
        if !self.enabled || !self.source.matches(source) {
            return false;
        }
        if let Some(rule_port) = self.port {
            if port != Some(rule_port) {
                return false;
            }
        }
        self.protocol.eq_ignore_ascii_case("any")
            || self.protocol.eq_ignore_ascii_case(protocol)
    }
}

// ============================================================================
// TABLE
// ============================================================================

/// Priority-ordered rule table. Kept sorted ascending on every mutation so
/// evaluation is a plain scan.
#[derive(Debug, Default)]
pub struct FirewallTable {
    rules: Vec<FirewallRule>,
}

impl FirewallTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// First matching rule wins; None means no explicit rule (default allow)
    pub fn evaluate(
        &self,
        source: Ipv4Addr,
        port: Option<u16>,
        protocol: &str,
    ) -> Option<&FirewallRule> {
        self.rules
            .iter()
            .find(|r| r.applies(source, port, protocol))
    }

    pub fn insert(&mut self, rule: FirewallRule) {
        self.rules.push(rule);
        self.rules.sort_by_key(|r| r.priority);
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != id);
        self.rules.len() != before
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut FirewallRule> {
        self.rules.iter_mut().find(|r| r.id == id)
    }

    pub fn resort(&mut self) {
        self.rules.sort_by_key(|r| r.priority);
    }

    /// Priority that beats every existing rule
    pub fn top_priority(&self) -> i32 {
        self.rules
            .iter()
            .map(|r| r.priority)
            .min()
            .map_or(0, |p| p - 1)
    }

    pub fn snapshot(&self) -> Vec<FirewallRule> {
        self.rules.clone()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn rule(action: FirewallAction, source: &str, priority: i32) -> FirewallRule {
        FirewallRule {
            id: Uuid::new_v4().to_string(),
            action,
            source: source.parse().unwrap(),
            port: None,
            protocol: "any".into(),
            priority,
            enabled: true,
        }
    }

    #[test]
    fn test_cidr_subnet_matching() {
        let net: Cidr = "10.1.0.0/16".parse().unwrap();
        assert!(net.matches("10.1.200.3".parse().unwrap()));
        assert!(!net.matches("10.2.0.1".parse().unwrap()));

        let host: Cidr = "192.168.1.5".parse().unwrap();
        assert!(host.matches("192.168.1.5".parse().unwrap()));
        assert!(!host.matches("192.168.1.50".parse().unwrap()));

        // Prefix matching on octet strings is exactly what this replaces:
        // 10.1.0.0/16 must not match 10.10.x.x
        assert!(!net.matches("10.10.0.1".parse().unwrap()));
    }

    #[test]
    fn test_cidr_wildcard_and_zero_prefix() {
        let any: Cidr = "any".parse().unwrap();
        assert!(any.matches("1.2.3.4".parse().unwrap()));
        let all: Cidr = "0.0.0.0/0".parse().unwrap();
        assert!(all.matches("255.255.255.255".parse().unwrap()));
    }

    #[test]
    fn test_invalid_cidr_rejected() {
        assert!("10.0.0.0/40".parse::<Cidr>().is_err());
        assert!("not-an-ip".parse::<Cidr>().is_err());
    }

    #[test]
    fn test_lowest_priority_wins_regardless_of_insertion() {
        let mut table = FirewallTable::new();
        let mut allow = rule(FirewallAction::Allow, "10.0.0.0/8", 5);
        allow.id = "allow".into();
        let mut block = rule(FirewallAction::Block, "10.0.0.0/8", 1);
        block.id = "block".into();

        // Insert allow first; block still wins on priority
        table.insert(allow);
        table.insert(block);

        let hit = table
            .evaluate("10.3.4.5".parse().unwrap(), None, "tcp")
            .unwrap();
        assert_eq!(hit.id, "block");
        assert_eq!(hit.action, FirewallAction::Block);
    }

    #[test]
    fn test_disabled_rules_skipped() {
        let mut table = FirewallTable::new();
        let mut r = rule(FirewallAction::Block, "any", 1);
        r.enabled = false;
        table.insert(r);
        assert!(table
            .evaluate("8.8.8.8".parse().unwrap(), None, "udp")
            .is_none());
    }

    #[test]
    fn test_port_and_protocol_constraints() {
        let mut table = FirewallTable::new();
        let mut r = rule(FirewallAction::Block, "any", 1);
        r.port = Some(22);
        r.protocol = "tcp".into();
        table.insert(r);

        let src: Ipv4Addr = "1.1.1.1".parse().unwrap();
        assert!(table.evaluate(src, Some(22), "tcp").is_some());
        assert!(table.evaluate(src, Some(22), "TCP").is_some());
        assert!(table.evaluate(src, Some(80), "tcp").is_none());
        assert!(table.evaluate(src, Some(22), "udp").is_none());
    }

    #[test]
    fn test_top_priority_beats_existing() {
        let mut table = FirewallTable::new();
        assert_eq!(table.top_priority(), 0);
        table.insert(rule(FirewallAction::Allow, "any", 3));
        assert_eq!(table.top_priority(), 2);
        table.insert(rule(FirewallAction::Block, "any", -4));
        assert_eq!(table.top_priority(), -5);
    }
}
