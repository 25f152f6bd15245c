//! Trend analysis
//!
//! Two independent computations:
//! - Monthly spending trend: a three-point monotonicity check over the most
//!   recent months (not a regression)
//! - Recurring vendors: year-to-date totals and a linear full-year projection

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::aggregate::spending_by_month;
use crate::error::{Error, Result};
use crate::models::{MonthlySpendingTrend, RecurringProjection, Transaction, TrendLabel, YearMonth};

/// Classify the three most recent months of `monthly`
///
/// `Up` when spending rose month over month (newest > middle > oldest),
/// `Down` when it fell, `Stable` for anything else.
pub fn classify_trend(monthly: &BTreeMap<YearMonth, Decimal>) -> TrendLabel {
    let recent: Vec<Decimal> = monthly.values().rev().take(3).copied().collect();
    if recent.len() < 3 {
        return TrendLabel::NotEnoughData;
    }

    let (newest, middle, oldest) = (recent[0], recent[1], recent[2]);
    if newest > middle && middle > oldest {
        TrendLabel::Up
    } else if newest < middle && middle < oldest {
        TrendLabel::Down
    } else {
        TrendLabel::Stable
    }
}

/// Per-month totals over history plus the current period, and their trend
pub fn monthly_trend(historical: &[Transaction], current: &[Transaction]) -> MonthlySpendingTrend {
    let monthly_spending = spending_by_month(historical.iter().chain(current));
    let trend = classify_trend(&monthly_spending);
    MonthlySpendingTrend {
        monthly_spending,
        trend,
    }
}

/// Total spent per recurring vendor within `year`
pub fn recurring_year_to_date(
    current: &[Transaction],
    historical: &[Transaction],
    year: i32,
) -> BTreeMap<String, Decimal> {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for tx in current.iter().chain(historical) {
        if tx.recurring && tx.period().year() == year {
            *totals.entry(tx.vendor.clone()).or_default() += tx.amount;
        }
    }
    totals
}

/// Extrapolate a full-year total from `months_elapsed` months of observations
///
/// `projected = observed + (observed / months_elapsed) * (12 - months_elapsed)`
pub fn project_annual_total(observed: Decimal, months_elapsed: u32) -> Result<Decimal> {
    if !(1..=12).contains(&months_elapsed) {
        return Err(Error::InvalidPeriod(format!(
            "cannot project from {} elapsed months",
            months_elapsed
        )));
    }
    let elapsed = Decimal::from(months_elapsed);
    let remaining = Decimal::from(12 - months_elapsed);
    Ok(observed + (observed / elapsed) * remaining)
}

/// Year-to-date and projected annual spend per recurring vendor, sorted by vendor
///
/// The year and elapsed months both come from `period`.
pub fn recurring_projection(
    current: &[Transaction],
    historical: &[Transaction],
    period: YearMonth,
) -> Result<Vec<RecurringProjection>> {
    recurring_year_to_date(current, historical, period.year())
        .into_iter()
        .map(|(vendor, observed)| {
            Ok(RecurringProjection {
                projected: project_annual_total(observed, period.month())?,
                vendor,
                observed,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn tx(id: &str, date: &str, vendor: &str, amount: Decimal, recurring: bool) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            vendor: vendor.to_string(),
            category: "Subscriptions".into(),
            amount,
            currency: "USD".into(),
            recurring,
            transaction_type: "debit".into(),
            location: "US".into(),
            description: None,
        }
    }

    fn months(values: &[(&str, Decimal)]) -> BTreeMap<YearMonth, Decimal> {
        values
            .iter()
            .map(|(k, v)| (k.parse().unwrap(), *v))
            .collect()
    }

    #[test]
    fn test_trend_up() {
        // Most recent first: 300, 200, 100
        let monthly = months(&[
            ("202403", dec!(300)),
            ("202402", dec!(200)),
            ("202401", dec!(100)),
        ]);
        assert_eq!(classify_trend(&monthly), TrendLabel::Up);
    }

    #[test]
    fn test_trend_down() {
        let monthly = months(&[
            ("202403", dec!(100)),
            ("202402", dec!(200)),
            ("202401", dec!(300)),
        ]);
        assert_eq!(classify_trend(&monthly), TrendLabel::Down);
    }

    #[test]
    fn test_trend_stable_when_not_monotonic() {
        let monthly = months(&[
            ("202403", dec!(100)),
            ("202402", dec!(300)),
            ("202401", dec!(200)),
        ]);
        assert_eq!(classify_trend(&monthly), TrendLabel::Stable);

        let flat = months(&[
            ("202403", dec!(100)),
            ("202402", dec!(100)),
            ("202401", dec!(100)),
        ]);
        assert_eq!(classify_trend(&flat), TrendLabel::Stable);
    }

    #[test]
    fn test_trend_uses_only_three_most_recent() {
        let monthly = months(&[
            ("202312", dec!(9999)),
            ("202403", dec!(300)),
            ("202402", dec!(200)),
            ("202401", dec!(100)),
        ]);
        assert_eq!(classify_trend(&monthly), TrendLabel::Up);
    }

    #[test]
    fn test_trend_not_enough_data() {
        assert_eq!(classify_trend(&BTreeMap::new()), TrendLabel::NotEnoughData);
        let monthly = months(&[("202402", dec!(200)), ("202401", dec!(100))]);
        assert_eq!(classify_trend(&monthly), TrendLabel::NotEnoughData);
    }

    #[test]
    fn test_monthly_trend_combines_history_and_current() {
        let historical = vec![
            tx("1", "2024-01-05", "A", dec!(60), false),
            tx("2", "2024-01-25", "B", dec!(40), false),
            tx("3", "2024-02-10", "A", dec!(200), false),
        ];
        let current = vec![tx("4", "2024-03-01", "A", dec!(300), false)];
        let result = monthly_trend(&historical, &current);
        let january: YearMonth = "202401".parse().unwrap();
        assert_eq!(result.monthly_spending.len(), 3);
        assert_eq!(result.monthly_spending[&january], dec!(100));
        assert_eq!(result.trend, TrendLabel::Up);
    }

    #[test]
    fn test_recurring_year_to_date() {
        let historical = vec![
            tx("1", "2024-01-15", "Netflix", dec!(15.49), true),
            tx("2", "2024-02-15", "Netflix", dec!(15.49), true),
            tx("3", "2023-12-15", "Netflix", dec!(15.49), true),
            tx("4", "2024-02-01", "Grocer", dec!(80), false),
        ];
        let current = vec![
            tx("5", "2024-03-15", "Netflix", dec!(15.49), true),
            tx("6", "2024-03-02", "Gym", dec!(40), true),
        ];
        let ytd = recurring_year_to_date(&current, &historical, 2024);
        assert_eq!(ytd.len(), 2);
        assert_eq!(ytd["Netflix"], dec!(46.47));
        assert_eq!(ytd["Gym"], dec!(40));
    }

    #[test]
    fn test_project_annual_total() {
        assert_eq!(project_annual_total(dec!(120), 3).unwrap(), dec!(480));
        assert_eq!(project_annual_total(dec!(500), 12).unwrap(), dec!(500));
        assert_eq!(project_annual_total(Decimal::ZERO, 6).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_project_rejects_zero_months() {
        assert!(matches!(
            project_annual_total(dec!(120), 0),
            Err(Error::InvalidPeriod(_))
        ));
        assert!(project_annual_total(dec!(120), 13).is_err());
    }

    #[test]
    fn test_recurring_projection() {
        let historical = vec![
            tx("1", "2024-01-10", "Spotify", dec!(40), true),
            tx("2", "2024-02-10", "Spotify", dec!(40), true),
        ];
        let current = vec![tx("3", "2024-03-10", "Spotify", dec!(40), true)];
        let projection =
            recurring_projection(&current, &historical, "202403".parse().unwrap()).unwrap();
        assert_eq!(
            projection,
            vec![RecurringProjection {
                vendor: "Spotify".into(),
                observed: dec!(120),
                projected: dec!(480),
            }]
        );
    }
}
