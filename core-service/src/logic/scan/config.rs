//! Scan Configuration
//!
//! Parse address range (CIDR, dash range, single address) và port spec.
//! Mọi input sai đều trả về `InvalidConfiguration`.

use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::logic::error::{EngineError, EngineResult};

/// Smallest accepted CIDR prefix (/20 = 4096 addresses)
pub const MIN_CIDR_PREFIX: u8 = 20;

/// Largest host count a range may expand to
pub const MAX_HOSTS: usize = 1 << (32 - MIN_CIDR_PREFIX as usize);

/// Ports a quick scan restricts itself to
pub const WELL_KNOWN_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 135, 139, 143, 443, 445, 993, 995, 1433, 3306, 3389, 5432,
    5900, 6379, 8000, 8080, 8443, 8888, 9200, 27017,
];

// ============================================================================
// SCAN TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    #[default]
    Quick,
    Comprehensive,
    Vulnerability,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Quick => "quick",
            ScanType::Comprehensive => "comprehensive",
            ScanType::Vulnerability => "vulnerability",
        }
    }

    /// Ports actually probed out of the requested set
    pub fn probe_ports(&self, requested: &[u16]) -> Vec<u16> {
        match self {
            ScanType::Quick => requested
                .iter()
                .copied()
                .filter(|p| WELL_KNOWN_PORTS.contains(p))
                .collect(),
            ScanType::Comprehensive | ScanType::Vulnerability => requested.to_vec(),
        }
    }

    /// Number of probe batches the host list is split into
    pub fn target_batches(&self) -> usize {
        match self {
            ScanType::Quick => 6,
            ScanType::Comprehensive | ScanType::Vulnerability => 10,
        }
    }

    /// Vulnerability scans end with a service exposure review
    pub fn reviews_exposure(&self) -> bool {
        matches!(self, ScanType::Vulnerability)
    }
}

impl std::fmt::Display for ScanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScanType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(ScanType::Quick),
            "comprehensive" => Ok(ScanType::Comprehensive),
            "vulnerability" => Ok(ScanType::Vulnerability),
            other => Err(EngineError::invalid_config(format!("unknown scan type '{}'", other))),
        }
    }
}

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub scan_type: ScanType,
    pub address_range: String,
    pub port_range: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_type: ScanType::Quick,
            address_range: "192.168.1.0/24".to_string(),
            port_range: "1-1000".to_string(),
        }
    }
}

/// Validated, expanded scan parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPlan {
    pub scan_type: ScanType,
    pub hosts: Vec<Ipv4Addr>,
    /// Ports to probe after scan-type filtering, ascending
    pub ports: Vec<u16>,
}

impl ScanConfig {
    pub fn new(scan_type: ScanType, address_range: &str, port_range: &str) -> Self {
        Self {
            scan_type,
            address_range: address_range.to_string(),
            port_range: port_range.to_string(),
        }
    }

    pub fn validate(&self) -> EngineResult<ScanPlan> {
        let hosts = parse_address_range(&self.address_range)?;
        let requested = parse_port_range(&self.port_range)?;
        let ports = self.scan_type.probe_ports(&requested);
        if ports.is_empty() {
            return Err(EngineError::invalid_config(format!(
                "{} scan has no ports to probe in '{}'",
                self.scan_type, self.port_range
            )));
        }
        Ok(ScanPlan {
            scan_type: self.scan_type,
            hosts,
            ports,
        })
    }
}

// ============================================================================
// PARSERS
// ============================================================================

fn parse_ip(s: &str) -> EngineResult<Ipv4Addr> {
    s.trim()
        .parse::<Ipv4Addr>()
        .map_err(|_| EngineError::invalid_config(format!("invalid IPv4 address '{}'", s.trim())))
}

/// `a.b.c.d/n` (n >= 20), `a.b.c.d-e`, `a.b.c.d-a.b.c.e` or a single address
pub fn parse_address_range(input: &str) -> EngineResult<Vec<Ipv4Addr>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(EngineError::invalid_config("address range is empty"));
    }

    if let Some((addr, prefix)) = input.split_once('/') {
        return parse_cidr(addr, prefix);
    }

    if let Some((start, end)) = input.split_once('-') {
        let start = parse_ip(start)?;
        let end = if end.contains('.') {
            parse_ip(end)?
        } else {
            let last: u8 = end.trim().parse().map_err(|_| {
                EngineError::invalid_config(format!("invalid range end '{}'", end.trim()))
            })?;
            let [a, b, c, _] = start.octets();
            Ipv4Addr::new(a, b, c, last)
        };
        return expand(start, end);
    }

    Ok(vec![parse_ip(input)?])
}

fn parse_cidr(addr: &str, prefix: &str) -> EngineResult<Vec<Ipv4Addr>> {
    let addr = parse_ip(addr)?;
    let prefix: u8 = prefix
        .trim()
        .parse()
        .map_err(|_| EngineError::invalid_config(format!("invalid CIDR prefix '{}'", prefix.trim())))?;
    if !(MIN_CIDR_PREFIX..=32).contains(&prefix) {
        return Err(EngineError::invalid_config(format!(
            "CIDR prefix /{} out of range (/{}../32)",
            prefix, MIN_CIDR_PREFIX
        )));
    }

    let mask = u32::MAX << (32 - u32::from(prefix));
    let network = u32::from(addr) & mask;
    let broadcast = network | !mask;

    // /31 and /32 have no network/broadcast address to skip
    let (first, last) = if prefix >= 31 {
        (network, broadcast)
    } else {
        (network + 1, broadcast - 1)
    };
    Ok((first..=last).map(Ipv4Addr::from).collect())
}

fn expand(start: Ipv4Addr, end: Ipv4Addr) -> EngineResult<Vec<Ipv4Addr>> {
    let (first, last) = (u32::from(start), u32::from(end));
    if last < first {
        return Err(EngineError::invalid_config(format!(
            "range end {} is before start {}",
            end, start
        )));
    }
    if (last - first) as usize >= MAX_HOSTS {
        return Err(EngineError::invalid_config(format!(
            "range {}-{} exceeds {} hosts",
            start, end, MAX_HOSTS
        )));
    }
    Ok((first..=last).map(Ipv4Addr::from).collect())
}

/// `1-1000`, `22,80,443` or a mix like `22,80-90`. Result is sorted, deduplicated.
pub fn parse_port_range(input: &str) -> EngineResult<Vec<u16>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(EngineError::invalid_config("port range is empty"));
    }

    let mut ports = Vec::new();
    for token in input.split(',') {
        let token = token.trim();
        match token.split_once('-') {
            Some((lo, hi)) => {
                let (lo, hi) = (parse_port(lo)?, parse_port(hi)?);
                if hi < lo {
                    return Err(EngineError::invalid_config(format!(
                        "port range '{}' is inverted",
                        token
                    )));
                }
                ports.extend(lo..=hi);
            }
            None => ports.push(parse_port(token)?),
        }
    }
    ports.sort_unstable();
    ports.dedup();
    Ok(ports)
}

fn parse_port(s: &str) -> EngineResult<u16> {
    match s.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(EngineError::invalid_config(format!("invalid port '{}'", s.trim()))),
        Ok(port) => Ok(port),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cidr_24_skips_network_and_broadcast() {
        let hosts = parse_address_range("192.168.1.0/24").unwrap();
        assert_eq!(hosts.len(), 254);
        assert_eq!(hosts[0], Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(hosts[253], Ipv4Addr::new(192, 168, 1, 254));
    }

    #[test]
    fn test_cidr_normalizes_host_bits() {
        let hosts = parse_address_range("10.0.0.77/30").unwrap();
        assert_eq!(hosts, vec![Ipv4Addr::new(10, 0, 0, 77), Ipv4Addr::new(10, 0, 0, 78)]);
        assert_eq!(parse_address_range("10.0.0.5/32").unwrap().len(), 1);
        assert_eq!(parse_address_range("10.0.0.0/20").unwrap().len(), 4094);
    }

    #[test]
    fn test_cidr_too_wide_rejected() {
        assert!(matches!(
            parse_address_range("10.0.0.0/16"),
            Err(EngineError::InvalidConfiguration(_))
        ));
        assert!(parse_address_range("10.0.0.0/33").is_err());
        assert!(parse_address_range("10.0.0.0/x").is_err());
    }

    #[test]
    fn test_dash_ranges() {
        let short = parse_address_range("192.168.1.10-20").unwrap();
        assert_eq!(short.len(), 11);
        assert_eq!(short[10], Ipv4Addr::new(192, 168, 1, 20));

        let full = parse_address_range("10.0.0.250-10.0.1.5").unwrap();
        assert_eq!(full.len(), 12);

        assert!(parse_address_range("192.168.1.20-10").is_err());
        assert!(parse_address_range("192.168.1.1-300").is_err());
        assert!(parse_address_range("10.0.0.0-10.1.0.0").is_err());
    }

    #[test]
    fn test_single_and_malformed_addresses() {
        assert_eq!(
            parse_address_range(" 172.16.0.9 ").unwrap(),
            vec![Ipv4Addr::new(172, 16, 0, 9)]
        );
        assert!(parse_address_range("").is_err());
        assert!(parse_address_range("999.1.1.1").is_err());
        assert!(parse_address_range("not-an-ip").is_err());
    }

    #[test]
    fn test_port_specs() {
        assert_eq!(parse_port_range("1-1000").unwrap().len(), 1000);
        assert_eq!(parse_port_range("443, 22,80,22").unwrap(), vec![22, 80, 443]);
        assert_eq!(parse_port_range("22,80-82").unwrap(), vec![22, 80, 81, 82]);
        assert!(parse_port_range("0").is_err());
        assert!(parse_port_range("100-10").is_err());
        assert!(parse_port_range("70000").is_err());
        assert!(parse_port_range("22,,80").is_err());
        assert!(parse_port_range("").is_err());
    }

    #[test]
    fn test_quick_scan_restricts_ports() {
        let plan = ScanConfig::new(ScanType::Quick, "192.168.1.0/28", "1-1000").validate().unwrap();
        assert!(plan.ports.iter().all(|p| WELL_KNOWN_PORTS.contains(p)));
        assert!(plan.ports.contains(&22) && plan.ports.contains(&445));
        assert!(!plan.ports.contains(&3306));

        let full = ScanConfig::new(ScanType::Comprehensive, "192.168.1.0/28", "1-1000").validate().unwrap();
        assert_eq!(full.ports.len(), 1000);
        assert_eq!(full.hosts.len(), 14);
    }

    #[test]
    fn test_quick_scan_without_known_ports_rejected() {
        let config = ScanConfig::new(ScanType::Quick, "10.0.0.1", "1000-1010");
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_scan_type_parse() {
        assert_eq!("Vulnerability".parse::<ScanType>().unwrap(), ScanType::Vulnerability);
        assert!("stealth".parse::<ScanType>().is_err());
        let config: ScanConfig =
            serde_json::from_str(r#"{"address_range":"10.0.0.1","port_range":"22"}"#).unwrap();
        assert_eq!(config.scan_type, ScanType::Quick);
    }
}
