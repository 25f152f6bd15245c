//! Report assembly
//!
//! Collects the outputs of the aggregator, geography resolver, risk
//! classifier and trend analyzer into one [`AnalysisReport`]. This is the
//! only place amounts are rounded; classification always sees exact values.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::config::AnalysisConfig;
use crate::models::{
    round_amount, AnalysisReport, FlaggedTransaction, HighValueTransaction, MonthlySpendingTrend,
    RecurringProjection, UnresolvedLocation, YearMonth,
};

/// Raw per-group analysis results, before rounding
#[derive(Debug, Clone)]
pub struct ReportParts {
    pub user_id: String,
    pub year_month: YearMonth,
    pub spending_by_category: BTreeMap<String, Decimal>,
    pub previous_month_spending_by_category: BTreeMap<String, Decimal>,
    pub historical_average: Decimal,
    pub home_country: Option<String>,
    pub flagged_transactions: Vec<FlaggedTransaction>,
    pub unresolved_locations: Vec<UnresolvedLocation>,
    pub high_value_transactions: Vec<HighValueTransaction>,
    pub recurring_transactions_year_to_date: BTreeMap<String, Decimal>,
    pub recurring_projection: Vec<RecurringProjection>,
    pub monthly_spending_trend: MonthlySpendingTrend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportAssembler {
    high_value_limit: usize,
    decimal_places: u32,
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl ReportAssembler {
    pub fn new(high_value_limit: usize, decimal_places: u32) -> Self {
        Self {
            high_value_limit,
            decimal_places,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.high_value_limit, config.report_decimal_places)
    }

    pub fn assemble(&self, parts: ReportParts) -> AnalysisReport {
        let dp = self.decimal_places;
        let round = |v: Decimal| round_amount(v, dp);
        let round_map = |m: BTreeMap<String, Decimal>| -> BTreeMap<String, Decimal> {
            m.into_iter().map(|(k, v)| (k, round(v))).collect()
        };

        let flagged_transactions = parts
            .flagged_transactions
            .into_iter()
            .map(|f| FlaggedTransaction {
                amount: round(f.amount),
                historical_average: round(f.historical_average),
                ..f
            })
            .collect();

        // Rank on exact amounts; sub-cent differences still decide the order
        let round_high = |list: Vec<HighValueTransaction>| -> Vec<HighValueTransaction> {
            list.into_iter()
                .map(|h| HighValueTransaction {
                    amount: round(h.amount),
                    ..h
                })
                .collect()
        };
        let top_high_value_transactions = round_high(top_high_value(
            &parts.high_value_transactions,
            self.high_value_limit,
        ));
        let high_value_transactions = round_high(parts.high_value_transactions);

        let recurring_projection = parts
            .recurring_projection
            .into_iter()
            .map(|p| RecurringProjection {
                observed: round(p.observed),
                projected: round(p.projected),
                vendor: p.vendor,
            })
            .collect();

        let monthly_spending_trend = MonthlySpendingTrend {
            monthly_spending: parts
                .monthly_spending_trend
                .monthly_spending
                .into_iter()
                .map(|(k, v)| (k, round(v)))
                .collect(),
            trend: parts.monthly_spending_trend.trend,
        };

        AnalysisReport {
            user_id: parts.user_id,
            year_month: parts.year_month,
            spending_by_category: round_map(parts.spending_by_category),
            previous_month_spending_by_category: round_map(
                parts.previous_month_spending_by_category,
            ),
            historical_average: round(parts.historical_average),
            home_country: parts.home_country,
            flagged_transactions,
            unresolved_locations: parts.unresolved_locations,
            high_value_transactions,
            top_high_value_transactions,
            recurring_transactions_year_to_date: round_map(
                parts.recurring_transactions_year_to_date,
            ),
            recurring_projection,
            monthly_spending_trend,
        }
    }
}

/// The `limit` largest transactions by amount; equal amounts keep input order
pub fn top_high_value(
    transactions: &[HighValueTransaction],
    limit: usize,
) -> Vec<HighValueTransaction> {
    let mut sorted = transactions.to_vec();
    sorted.sort_by(|a, b| b.amount.cmp(&a.amount));
    sorted.truncate(limit);
    sorted
}
