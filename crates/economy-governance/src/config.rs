//! Engine configuration
//!
//! Everything here has a default. A deployment overrides it with a YAML
//! document:
//!
//! ```yaml
//! governance:
//!   restrictedDomains: [PAYROLL, KPI_BONUS, CASH_OUT]
//!   reviewVolumeThreshold: 500
//!   hardVolumeCap: 5000
//! auditActor:
//!   id: economy-governance
//!   type: SYSTEM
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audit::AuditActor;
use crate::error::{EngineError, Result};

/// Thresholds and domain lists of the default governance policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GovernancePolicyConfig {
    /// Domains the engine accepts
    pub known_domains: BTreeSet<String>,

    /// Domains where economic actions are forbidden outright
    pub restricted_domains: BTreeSet<String>,

    /// Amount above which an action is flagged for elevated review
    pub review_volume_threshold: u64,

    /// Amount above which an action is blocked
    pub hard_volume_cap: u64,

    /// Recent operation count above which an action is flagged
    pub frequency_threshold: u32,
}

impl GovernancePolicyConfig {
    /// Known or restricted. Restricted domains are recognized so the policy
    /// can block them with a precise reason.
    pub fn is_recognized_domain(&self, domain: &str) -> bool {
        self.known_domains.contains(domain) || self.restricted_domains.contains(domain)
    }

    pub fn is_restricted_domain(&self, domain: &str) -> bool {
        self.restricted_domains.contains(domain)
    }
}

impl Default for GovernancePolicyConfig {
    fn default() -> Self {
        let set = |names: &[&str]| -> BTreeSet<String> {
            names.iter().map(|s| s.to_string()).collect()
        };
        Self {
            known_domains: set(&["STORE", "AUCTION", "RECOGNITION", "REWARD", "TRANSFER", "SAFE"]),
            restricted_domains: set(&["PAYROLL", "KPI_BONUS", "CASH_OUT"]),
            review_volume_threshold: 1_000,
            hard_volume_cap: 10_000,
            frequency_threshold: 20,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub governance: GovernancePolicyConfig,

    /// Identity stamped on every audit event the engine produces
    pub audit_actor: AuditActor,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            governance: GovernancePolicyConfig::default(),
            audit_actor: AuditActor::system("economy-governance"),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        let g = &self.governance;
        if g.review_volume_threshold > g.hard_volume_cap {
            return Err(EngineError::Config(format!(
                "reviewVolumeThreshold {} exceeds hardVolumeCap {}",
                g.review_volume_threshold, g.hard_volume_cap
            )));
        }
        if let Some(domain) = g.known_domains.intersection(&g.restricted_domains).next() {
            return Err(EngineError::Config(format!(
                "domain {domain} is both known and restricted"
            )));
        }
        if g.known_domains.iter().chain(&g.restricted_domains).any(|d| d.trim().is_empty()) {
            return Err(EngineError::Config("empty domain name".into()));
        }
        if self.audit_actor.id.trim().is_empty() {
            return Err(EngineError::Config("audit actor id is empty".into()));
        }
        Ok(())
    }
}
