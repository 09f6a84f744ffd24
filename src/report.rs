//! Reports
//!
//! Terminal tables for cluster savings and assembled datasets.

use std::io;

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    assembly::ClusterSession,
    clusters::{Cluster, total_year},
    savings::ClusterSavings,
    summary::ClusterSummary,
};

/// Errors that can occur while writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Writing to the output failed.
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// Savings table across clusters.
#[derive(Debug)]
pub struct SavingsReport<'a> {
    entries: Vec<(&'a Cluster, ClusterSavings<'a>)>,
    currency: &'static Currency,
}

impl<'a> SavingsReport<'a> {
    /// Create an empty report; amounts are shown in `currency`.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            entries: Vec::new(),
            currency,
        }
    }

    /// Add a cluster row.
    pub fn push(&mut self, cluster: &'a Cluster, savings: ClusterSavings<'a>) {
        self.entries.push((cluster, savings));
    }

    /// Sum of savings across every cluster.
    pub fn total_saving(&self) -> Decimal {
        total_year(self.entries.iter().map(|(_, savings)| savings.saving))
    }

    /// Write the table followed by a total line.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReportError> {
        let mut builder = Builder::default();

        builder.push_record([
            "Cluster",
            "Apps",
            "Seats",
            "Vendor",
            "Current / yr",
            "Proposed / yr",
            "Saving",
            "Saving %",
        ]);

        for (cluster, savings) in &self.entries {
            builder.push_record([
                cluster.name.clone(),
                cluster.apps.len().to_string(),
                savings.total_units.to_string(),
                savings
                    .chosen_pricing
                    .map_or_else(|| "-".to_string(), |pricing| pricing.vendor_name.clone()),
                money(savings.current_year, self.currency),
                money(savings.proposed_year, self.currency),
                money(savings.saving, self.currency),
                format!("{}%", savings.saving_pct.round_dp(2)),
            ]);
        }

        write_table(&mut out, builder, 1)?;

        writeln!(
            out,
            "Total saving: {}",
            money(self.total_saving(), self.currency)
        )?;

        Ok(())
    }
}

/// Write the rows of an assembled dataset and its summary.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_session(
    mut out: impl io::Write,
    session: &ClusterSession,
    summary: &ClusterSummary,
    currency: &'static Currency,
) -> Result<(), ReportError> {
    let mut builder = Builder::default();

    builder.push_record([
        "Subsidiary",
        "Users",
        "Price / seat",
        "Period",
        "Cost / yr",
    ]);

    for row in session.rows() {
        builder.push_record([
            row.subsidiary.to_string(),
            row.users.to_string(),
            money(row.price_per_seat, currency),
            row.billing_period.to_string(),
            money(row.cost_year, currency),
        ]);
    }

    write_table(&mut out, builder, 1)?;

    writeln!(
        out,
        "Tools: {}  Users: {}  Current: {}  Potential: {}",
        summary.tools,
        summary.total_users,
        money(summary.current_cost, currency),
        money(summary.consolidation_potential, currency),
    )?;

    Ok(())
}

fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    first_numeric_column: usize,
) -> Result<(), ReportError> {
    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(first_numeric_column..), Alignment::right());

    writeln!(out, "\n{table}")?;

    Ok(())
}

/// Format `amount` in `currency`, rounded to the currency's minor unit.
fn money(amount: Decimal, currency: &'static Currency) -> String {
    let minor = amount
        .checked_mul(Decimal::from(10_u64.pow(currency.exponent)))
        .and_then(|minor| {
            minor
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
        });

    match minor {
        Some(minor) => format!("{}", Money::from_minor(minor, currency)),
        None => amount.round_dp(2).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::EUR;
    use testresult::TestResult;

    use crate::{
        assembly::FetchOutcome,
        clusters::AppDetail,
        periods::BillingPeriod,
        savings::FirstCandidate,
        switching::SwitchingPolicy,
    };

    use super::*;

    fn cluster() -> Cluster {
        Cluster {
            key: "design".into(),
            name: "Design Tools".to_string(),
            description: String::new(),
            common_features: Vec::new(),
            apps: Vec::new(),
            candidate_pricing: Vec::new(),
            subsidiaries: Vec::new(),
        }
    }

    #[test]
    fn savings_report_lists_clusters_and_total() -> TestResult {
        let cluster = cluster();
        let savings = ClusterSavings::calculate(&cluster, &FirstCandidate, &SwitchingPolicy::default());
        let mut report = SavingsReport::new(EUR);

        report.push(&cluster, savings);

        let mut out = Vec::new();
        report.write_to(&mut out)?;
        let text = String::from_utf8(out)?;

        assert!(text.contains("Design Tools"));
        assert!(text.contains("Total saving"));
        assert_eq!(report.total_saving(), Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn session_report_lists_rows() -> TestResult {
        let mut session = ClusterSession::new("design".into());

        session.select_app("sketch".into())?;
        session.resolve(FetchOutcome::Success(vec![AppDetail {
            app_id: "sketch".into(),
            subsidiary: "DE01".into(),
            users: 3,
            price_per_seat: Decimal::from(10),
            billing_period: BillingPeriod::Monthly,
            cost_year: Decimal::from(360),
        }]))?;

        let summary = session.summary(&cluster(), None, &SwitchingPolicy::default());
        let mut out = Vec::new();

        write_session(&mut out, &session, &summary, EUR)?;

        let text = String::from_utf8(out)?;

        assert!(text.contains("DE01"));
        assert!(text.contains("monthly"));
        assert!(text.contains("Users: 3"));

        Ok(())
    }
}
