//! Per-group analysis
//!
//! Runs every analysis component over one user's current-period group and
//! their history. Pure apart from logging: no I/O, no shared state, so
//! groups can be analyzed concurrently.

use tracing::debug;

use crate::aggregate::{historical_average, previous_month_spending, spending_by_category};
use crate::error::Result;
use crate::geo::determine_home_country;
use crate::models::{AnalysisReport, Transaction, TransactionGroup};
use crate::report::{ReportAssembler, ReportParts};
use crate::risk::{flag_risky_transactions, high_value_transactions};
use crate::trend::{monthly_trend, recurring_projection, recurring_year_to_date};

/// Analyze one group against the user's historical transactions
///
/// `historical` must not contain the group's own transactions; the pipeline
/// filters them out before calling this.
pub fn analyze_group(
    group: &TransactionGroup,
    historical: &[Transaction],
    assembler: &ReportAssembler,
) -> Result<AnalysisReport> {
    let current = group.transactions();
    let period = group.period();

    let average = historical_average(historical);
    let home_country = determine_home_country(historical);
    let assessment = flag_risky_transactions(current, home_country.as_deref(), average);

    debug!(
        "Analyzing {}: {} current, {} historical, home {:?}, {} flagged",
        group.key(),
        current.len(),
        historical.len(),
        home_country,
        assessment.flagged.len()
    );

    let parts = ReportParts {
        user_id: group.user_id().to_string(),
        year_month: period,
        spending_by_category: spending_by_category(current),
        previous_month_spending_by_category: previous_month_spending(historical, period),
        historical_average: average,
        home_country,
        flagged_transactions: assessment.flagged,
        unresolved_locations: assessment.unresolved,
        high_value_transactions: high_value_transactions(current, average),
        recurring_transactions_year_to_date: recurring_year_to_date(
            current,
            historical,
            period.year(),
        ),
        recurring_projection: recurring_projection(current, historical, period)?,
        monthly_spending_trend: monthly_trend(historical, current),
    };

    Ok(assembler.assemble(parts))
}
