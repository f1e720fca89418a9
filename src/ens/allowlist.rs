use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;

use crate::error::{AppError, Result};

/// Source ranges trusted to deliver event-notification batches.
///
/// The webhook endpoint rejects any request whose peer address falls
/// outside these ranges before a single event is parsed or processed.
#[derive(Debug, Clone, Default)]
pub struct IpAllowlist {
    nets: Vec<IpNet>,
}

impl IpAllowlist {
    /// Parse a comma-separated list of CIDR ranges. Bare addresses are
    /// accepted as single-host ranges.
    pub fn from_cidrs(raw: &str) -> Result<Self> {
        let mut nets = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let net = IpNet::from_str(part).or_else(|_| {
                IpAddr::from_str(part)
                    .map(IpNet::from)
                    .map_err(|_| AppError::Internal(format!("invalid trusted CIDR: {part}")))
            })?;
            nets.push(net);
        }
        Ok(Self { nets })
    }

    pub fn contains(&self, addr: IpAddr) -> bool {
        self.nets.iter().any(|net| net.contains(&addr))
    }

    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }
}
