//! HTTP handlers

pub mod health;
pub mod incidents;
pub mod audits;
pub mod scans;
