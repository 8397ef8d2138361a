//! Risk Classification
//!
//! Gán đúng một RiskLevel cho mỗi device từ port exposure và role.

use std::collections::BTreeSet;

use super::types::{DeviceRole, Reachability, RiskLevel};

/// Remote-access and file-sharing services that are high risk on their own
pub const HIGH_RISK_PORTS: &[u16] = &[21, 23, 135, 139, 445, 3389, 5900];

/// Dev servers and data stores that should not be exposed
pub const MEDIUM_RISK_PORTS: &[u16] = &[8000, 8080, 8443, 8888, 9200, 27017, 6379];

/// More open ports than this is medium risk
pub const MAX_QUIET_PORTS: usize = 5;

/// Unknown devices with at least this many open ports are high risk
pub const UNKNOWN_DEVICE_PORT_LIMIT: usize = 3;

pub trait RiskClassifier: Send + Sync {
    fn classify(&self, role: DeviceRole, reachability: Reachability, open_ports: &BTreeSet<u16>) -> RiskLevel;
}

/// Default rules:
/// - offline: low
/// - any high-risk port, or an unknown device with 3+ ports: high
/// - any medium-risk port, or more than 5 ports: medium
/// - otherwise low
#[derive(Debug, Clone, Copy, Default)]
pub struct PortExposureClassifier;

impl RiskClassifier for PortExposureClassifier {
    fn classify(&self, role: DeviceRole, reachability: Reachability, open_ports: &BTreeSet<u16>) -> RiskLevel {
        if reachability == Reachability::Offline {
            return RiskLevel::Low;
        }
        if open_ports.iter().any(|p| HIGH_RISK_PORTS.contains(p))
            || (role == DeviceRole::UnknownDevice && open_ports.len() >= UNKNOWN_DEVICE_PORT_LIMIT)
        {
            return RiskLevel::High;
        }
        if open_ports.iter().any(|p| MEDIUM_RISK_PORTS.contains(p)) || open_ports.len() > MAX_QUIET_PORTS {
            return RiskLevel::Medium;
        }
        RiskLevel::Low
    }
}
