use tracing::debug;

use super::GovernancePolicy;
use crate::config::GovernancePolicyConfig;
use crate::context::GovernanceContext;
use crate::decision::{GovernanceDecision, ReviewLevel, ViolationReason};

/// Default policy: domain restrictions, then volume, then frequency.
#[derive(Debug, Clone, Default)]
pub struct ThresholdGovernancePolicy {
    config: GovernancePolicyConfig,
}

impl ThresholdGovernancePolicy {
    pub fn new(config: GovernancePolicyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GovernancePolicyConfig {
        &self.config
    }
}

impl GovernancePolicy for ThresholdGovernancePolicy {
    fn evaluate(&self, ctx: &GovernanceContext) -> GovernanceDecision {
        let at = ctx.evaluated_at;
        let amount = ctx.payload.amount.unwrap_or(0);

        if self.config.is_restricted_domain(&ctx.domain) {
            debug!(domain = %ctx.domain, "restricted domain");
            return GovernanceDecision::disallowed(
                ViolationReason::RestrictedDomain,
                format!("economic actions are forbidden in domain {}", ctx.domain),
                at,
            );
        }

        if amount > self.config.hard_volume_cap {
            debug!(amount, cap = self.config.hard_volume_cap, "hard volume cap exceeded");
            return GovernanceDecision::disallowed(
                ViolationReason::AnomalousVolume,
                format!(
                    "amount {amount} exceeds the hard cap of {}",
                    self.config.hard_volume_cap
                ),
                at,
            );
        }

        if amount > self.config.review_volume_threshold {
            debug!(amount, threshold = self.config.review_volume_threshold, "volume review");
            return GovernanceDecision::review(
                ReviewLevel::Elevated,
                ViolationReason::AnomalousVolume,
                format!(
                    "amount {amount} exceeds the review threshold of {}",
                    self.config.review_volume_threshold
                ),
                at,
            );
        }

        let recent = ctx.payload.recent_operation_count.unwrap_or(0);
        if recent > self.config.frequency_threshold {
            debug!(recent, threshold = self.config.frequency_threshold, "frequency review");
            return GovernanceDecision::review(
                ReviewLevel::Routine,
                ViolationReason::SuspiciousFrequency,
                format!(
                    "{recent} recent operations exceed the frequency threshold of {}",
                    self.config.frequency_threshold
                ),
                at,
            );
        }

        GovernanceDecision::allowed(at)
    }
}
