//! Network Scan Module
//!
//! Network scan qua pipeline runner: parse config, dò host theo batch,
//! phân loại risk, publish toàn bộ device set khi hoàn tất.
//!
//! ## Structure
//! - `config`: ScanConfig, ScanType, address/port range parsers
//! - `types`: NetworkScanResult, ScanBatchReport, ScanRun
//! - `prober`: NetworkProber trait + SimulatedProber
//! - `classifier`: RiskClassifier trait + PortExposureClassifier
//! - `engine`: ScanEngine (plan/start), ScanHandle

pub mod config;
pub mod types;
pub mod prober;
pub mod classifier;
pub mod engine;


pub use config::{parse_address_range, parse_port_range, ScanConfig, ScanPlan, ScanType};

pub use types::{
    DeviceRole,
    NetworkScanResult,
    Reachability,
    RiskLevel,
    ScanBatchReport,
    ScanRun,
    ScanSummary,
};

pub use prober::{NetworkProber, ProbeReport, SimulatedProber};
pub use classifier::{PortExposureClassifier, RiskClassifier};
pub use engine::{ScanEngine, ScanHandle, EXPOSURE_REVIEW_STAGE};
