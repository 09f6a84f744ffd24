//! Switching Costs
//!
//! One-time cost of moving every user of a cluster onto a new vendor.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;

/// Global policy used to estimate switching costs.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchingPolicy {
    training_cost_per_user: Decimal,
    migration_flat_cost: Decimal,
    early_termination_penalty_rate: Percentage,
}

impl SwitchingPolicy {
    /// Create a policy.
    ///
    /// Negative costs are treated as zero and the penalty rate is clamped to
    /// the `[0, 1]` range.
    pub fn new(
        training_cost_per_user: Decimal,
        migration_flat_cost: Decimal,
        early_termination_penalty_rate: Decimal,
    ) -> Self {
        Self {
            training_cost_per_user: training_cost_per_user.max(Decimal::ZERO),
            migration_flat_cost: migration_flat_cost.max(Decimal::ZERO),
            early_termination_penalty_rate: Percentage::from(
                early_termination_penalty_rate.clamp(Decimal::ZERO, Decimal::ONE),
            ),
        }
    }

    /// Training cost for each migrated user.
    pub fn training_cost_per_user(&self) -> Decimal {
        self.training_cost_per_user
    }

    /// Flat migration cost for the whole cluster.
    pub fn migration_flat_cost(&self) -> Decimal {
        self.migration_flat_cost
    }

    /// Share of current yearly spend paid to break existing contracts.
    pub fn early_termination_penalty_rate(&self) -> &Percentage {
        &self.early_termination_penalty_rate
    }

    /// Switching cost for moving `units` users off tools costing `current_year`.
    ///
    /// The penalty is a fraction of what is spent today, not of what is saved.
    pub fn switch_year(&self, units: u64, current_year: Decimal) -> Decimal {
        let penalty = self.early_termination_penalty_rate.clone() * current_year;

        Decimal::from(units)
            .saturating_mul(self.training_cost_per_user)
            .saturating_add(self.migration_flat_cost)
            .saturating_add(penalty)
    }
}

impl Default for SwitchingPolicy {
    fn default() -> Self {
        Self::new(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_year_adds_training_migration_and_penalty() {
        let policy = SwitchingPolicy::new(
            Decimal::from(500),
            Decimal::from(50_000),
            Decimal::new(1, 1),
        );

        // 100 x 500 + 50_000 + 10% of 200_000
        assert_eq!(
            policy.switch_year(100, Decimal::from(200_000)),
            Decimal::from(120_000)
        );
    }

    #[test]
    fn penalty_rate_is_clamped() {
        let policy = SwitchingPolicy::new(Decimal::ZERO, Decimal::ZERO, Decimal::from(3));

        assert_eq!(
            policy.switch_year(0, Decimal::from(1000)),
            Decimal::from(1000)
        );

        let policy = SwitchingPolicy::new(Decimal::from(-5), Decimal::ZERO, Decimal::from(-1));

        assert_eq!(policy.switch_year(10, Decimal::from(1000)), Decimal::ZERO);
    }

    #[test]
    fn default_policy_costs_nothing() {
        assert_eq!(
            SwitchingPolicy::default().switch_year(42, Decimal::from(9000)),
            Decimal::ZERO
        );
    }
}
