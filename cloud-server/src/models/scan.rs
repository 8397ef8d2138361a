//! Scan request models

use serde::Deserialize;
use validator::Validate;

use secops_core::logic::scan::{ScanConfig, ScanType};

#[derive(Debug, Deserialize, Validate)]
pub struct StartScanRequest {
    #[serde(default)]
    pub scan_type: ScanType,
    #[validate(length(min = 1, max = 64))]
    pub address_range: String,
    #[validate(length(min = 1, max = 256))]
    pub port_range: String,
}

impl From<StartScanRequest> for ScanConfig {
    fn from(req: StartScanRequest) -> Self {
        ScanConfig::new(req.scan_type, &req.address_range, &req.port_range)
    }
}
