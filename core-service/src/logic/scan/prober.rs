//! Network Probers
//!
//! Seam dò host. `SimulatedProber` dựng lại bộ thiết bị mẫu của dashboard
//! (router, web server, database server, workstation, unknown device) từ
//! một RNG có seed. Real probers must bound their own timeouts.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::types::{DeviceRole, Reachability};

/// What a probe found at one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub role: DeviceRole,
    pub reachability: Reachability,
    pub open_ports: BTreeSet<u16>,
}

pub trait NetworkProber: Send {
    /// `None` when nothing answers at `address`
    fn probe(&mut self, address: Ipv4Addr, ports: &[u16]) -> Option<ProbeReport>;
}

impl<F> NetworkProber for F
where
    F: FnMut(Ipv4Addr, &[u16]) -> Option<ProbeReport> + Send,
{
    fn probe(&mut self, address: Ipv4Addr, ports: &[u16]) -> Option<ProbeReport> {
        self(address, ports)
    }
}

// ============================================================================
// SIMULATION
// ============================================================================

/// Share of addresses with a device behind them
const PRESENCE_RATE: f64 = 0.08;

/// Share of discovered devices that are offline
const OFFLINE_RATE: f64 = 0.15;

/// Chance that each of a role's typical ports is open
const PORT_OPEN_RATE: f64 = 0.85;

/// Typical listening ports per role
fn role_ports(role: DeviceRole) -> &'static [u16] {
    match role {
        DeviceRole::Router => &[22, 53, 80, 443],
        DeviceRole::WebServer => &[22, 80, 443, 8080],
        DeviceRole::DatabaseServer => &[3306, 5432, 6379],
        DeviceRole::Workstation => &[22, 139, 445, 3389],
        DeviceRole::UnknownDevice => &[22, 23, 80],
    }
}

pub struct SimulatedProber {
    rng: StdRng,
}

impl SimulatedProber {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: Option<u64>) -> Self {
        seed.map(Self::new).unwrap_or_else(Self::from_entropy)
    }
}

impl NetworkProber for SimulatedProber {
    fn probe(&mut self, address: Ipv4Addr, ports: &[u16]) -> Option<ProbeReport> {
        // .1 is always the gateway
        let is_gateway = address.octets()[3] == 1;
        if !is_gateway && !self.rng.gen_bool(PRESENCE_RATE) {
            return None;
        }

        let role = if is_gateway {
            DeviceRole::Router
        } else {
            *DeviceRole::ALL[1..].choose(&mut self.rng)?
        };

        if !is_gateway && self.rng.gen_bool(OFFLINE_RATE) {
            return Some(ProbeReport {
                role,
                reachability: Reachability::Offline,
                open_ports: BTreeSet::new(),
            });
        }

        let open_ports = role_ports(role)
            .iter()
            .copied()
            .filter(|p| ports.contains(p))
            .filter(|_| self.rng.gen_bool(PORT_OPEN_RATE))
            .collect();

        Some(ProbeReport {
            role,
            reachability: Reachability::Online,
            open_ports,
        })
    }
}
