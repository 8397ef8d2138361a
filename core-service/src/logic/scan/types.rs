use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::ScanConfig;
use crate::logic::error::{EngineError, EngineResult};
use crate::logic::pipeline::{Progress, RunState};

// ============================================================================
// ENUMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceRole {
    Router,
    WebServer,
    DatabaseServer,
    Workstation,
    UnknownDevice,
}

impl DeviceRole {
    pub const ALL: [DeviceRole; 5] = [
        DeviceRole::Router,
        DeviceRole::WebServer,
        DeviceRole::DatabaseServer,
        DeviceRole::Workstation,
        DeviceRole::UnknownDevice,
    ];

    /// Human-readable label shown in device lists
    pub fn label(&self) -> &'static str {
        match self {
            DeviceRole::Router => "Router",
            DeviceRole::WebServer => "Web Server",
            DeviceRole::DatabaseServer => "Database Server",
            DeviceRole::Workstation => "Workstation",
            DeviceRole::UnknownDevice => "Unknown Device",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// DEVICE RECORD
// ============================================================================

/// One discovered device. An offline device never carries open ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkScanResult {
    address: Ipv4Addr,
    device_label: String,
    reachability: Reachability,
    open_ports: BTreeSet<u16>,
    risk_level: RiskLevel,
}

impl NetworkScanResult {
    pub fn new(
        address: Ipv4Addr,
        device_label: impl Into<String>,
        reachability: Reachability,
        open_ports: BTreeSet<u16>,
        risk_level: RiskLevel,
    ) -> Self {
        let open_ports = match reachability {
            Reachability::Online => open_ports,
            Reachability::Offline => {
                if !open_ports.is_empty() {
                    log::debug!("{} is offline, dropping {} reported ports", address, open_ports.len());
                }
                BTreeSet::new()
            }
        };
        Self {
            address,
            device_label: device_label.into(),
            reachability,
            open_ports,
            risk_level,
        }
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn device_label(&self) -> &str {
        &self.device_label
    }

    pub fn reachability(&self) -> Reachability {
        self.reachability
    }

    pub fn open_ports(&self) -> &BTreeSet<u16> {
        &self.open_ports
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn is_online(&self) -> bool {
        self.reachability == Reachability::Online
    }
}

// ============================================================================
// STAGE REPORT
// ============================================================================

/// Result of one scan stage. Carries counts only; device records stay
/// private until the scan completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanBatchReport {
    pub stage: String,
    pub hosts_probed: usize,
    pub hosts_responding: usize,
    /// High-risk devices found in this stage
    pub flagged: usize,
}

// ============================================================================
// RUN
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub devices: usize,
    pub online: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanRun {
    pub id: Uuid,
    pub config: ScanConfig,
    pub state: RunState,
    pub progress: Progress,
    pub hosts_total: usize,
    pub ports_probed: usize,
    pub batches: Vec<ScanBatchReport>,
    /// Empty until the scan completes
    pub devices: Vec<NetworkScanResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ScanRun {
    pub(crate) fn new(config: ScanConfig, hosts_total: usize, ports_probed: usize, progress: Progress) -> Self {
        Self {
            id: Uuid::nil(),
            config,
            state: RunState::Running,
            progress,
            hosts_total,
            ports_probed,
            batches: Vec::new(),
            devices: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub(crate) fn record(&mut self, progress: &Progress, report: &ScanBatchReport) {
        self.batches.push(report.clone());
        self.progress = progress.clone();
    }

    /// Publish the full device set and close the run
    pub(crate) fn complete(&mut self, mut devices: Vec<NetworkScanResult>) {
        devices.sort_by_key(|d| d.address());
        self.devices = devices;
        self.state = RunState::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub(crate) fn cancel(&mut self) {
        self.state = RunState::Cancelled;
        self.finished_at = Some(Utc::now());
    }

    /// Devices of a completed scan; `Cancelled` for a cancelled one
    pub fn results(&self) -> EngineResult<&[NetworkScanResult]> {
        match self.state {
            RunState::Cancelled => Err(EngineError::Cancelled(self.id)),
            _ => Ok(&self.devices),
        }
    }

    pub fn summary(&self) -> ScanSummary {
        let mut summary = ScanSummary {
            devices: self.devices.len(),
            ..ScanSummary::default()
        };
        for device in &self.devices {
            if device.is_online() {
                summary.online += 1;
            }
            match device.risk_level() {
                RiskLevel::Low => summary.low += 1,
                RiskLevel::Medium => summary.medium += 1,
                RiskLevel::High => summary.high += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_device_has_no_ports() {
        let device = NetworkScanResult::new(
            Ipv4Addr::new(192, 168, 1, 100),
            DeviceRole::Workstation.label(),
            Reachability::Offline,
            [22, 3389].into_iter().collect(),
            RiskLevel::Low,
        );
        assert!(device.open_ports().is_empty());
        assert!(!device.is_online());
    }

    #[test]
    fn test_online_device_keeps_ports() {
        let device = NetworkScanResult::new(
            Ipv4Addr::new(192, 168, 1, 1),
            "Router",
            Reachability::Online,
            [443, 22, 80].into_iter().collect(),
            RiskLevel::Low,
        );
        assert_eq!(device.open_ports().iter().copied().collect::<Vec<_>>(), vec![22, 80, 443]);
        let json = serde_json::to_value(&device).unwrap();
        assert_eq!(json["reachability"], "online");
        assert_eq!(json["address"], "192.168.1.1");
    }
}
