//! Spending aggregation
//!
//! All sums are exact decimals. Rounding for display happens in the report
//! assembler, never here.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::models::{Transaction, YearMonth};

/// Sum amounts per category
pub fn spending_by_category<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> BTreeMap<String, Decimal> {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for tx in transactions {
        *totals.entry(tx.category.clone()).or_default() += tx.amount;
    }
    totals
}

/// Sum amounts per calendar month of the transaction date
pub fn spending_by_month<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> BTreeMap<YearMonth, Decimal> {
    let mut totals: BTreeMap<YearMonth, Decimal> = BTreeMap::new();
    for tx in transactions {
        *totals.entry(tx.period()).or_default() += tx.amount;
    }
    totals
}

pub fn total_spending<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Decimal {
    transactions.into_iter().map(|tx| tx.amount).sum()
}

/// Simple arithmetic mean of historical amounts, or zero for an empty history
pub fn historical_average(historical: &[Transaction]) -> Decimal {
    if historical.is_empty() {
        return Decimal::ZERO;
    }
    total_spending(historical) / Decimal::from(historical.len())
}

/// Category totals for the month before `period`
pub fn previous_month_spending<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    period: YearMonth,
) -> BTreeMap<String, Decimal> {
    let previous = period.previous();
    spending_by_category(
        transactions
            .into_iter()
            .filter(|tx| previous.contains(tx.date)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn tx(id: &str, date: &str, category: &str, amount: Decimal) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            vendor: "Vendor".into(),
            category: category.to_string(),
            amount,
            currency: "USD".into(),
            recurring: false,
            transaction_type: "debit".into(),
            location: "US".into(),
            description: None,
        }
    }

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx("1", "2024-01-03", "Groceries", dec!(45.10)),
            tx("2", "2024-01-17", "Dining", dec!(23.45)),
            tx("3", "2024-02-02", "Groceries", dec!(61.00)),
            tx("4", "2024-02-20", "Travel", dec!(410.99)),
            tx("5", "2023-12-31", "Dining", dec!(0.1)),
            tx("6", "2023-12-31", "Dining", dec!(0.2)),
        ]
    }

    #[test]
    fn test_spending_by_category() {
        let totals = spending_by_category(&sample());
        assert_eq!(totals.len(), 3);
        assert_eq!(totals["Groceries"], dec!(106.10));
        assert_eq!(totals["Dining"], dec!(23.75));
        assert_eq!(totals["Travel"], dec!(410.99));
    }

    #[test]
    fn test_spending_by_month() {
        let totals = spending_by_month(&sample());
        let keys: Vec<String> = totals.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["202312", "202401", "202402"]);
        // 0.1 + 0.2 stays exact
        assert_eq!(totals[&ym("202312")], dec!(0.3));
        assert_eq!(totals[&ym("202402")], dec!(471.99));
    }

    #[test]
    fn test_category_and_month_totals_agree() {
        let txs = sample();
        let by_category: Decimal = spending_by_category(&txs).values().copied().sum();
        let by_month: Decimal = spending_by_month(&txs).values().copied().sum();
        assert_eq!(by_category, total_spending(&txs));
        assert_eq!(by_month, total_spending(&txs));
    }

    #[test]
    fn test_historical_average_empty_is_zero() {
        assert_eq!(historical_average(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_historical_average() {
        let history = vec![
            tx("1", "2024-01-01", "A", dec!(100)),
            tx("2", "2024-01-02", "A", dec!(100)),
            tx("3", "2024-01-03", "A", dec!(50)),
        ];
        let avg = historical_average(&history);
        assert_eq!(avg.round_dp(2), dec!(83.33));
        assert!(avg > dec!(83.33));
    }

    #[test]
    fn test_previous_month_spending_wraps_year() {
        let totals = previous_month_spending(&sample(), ym("202401"));
        assert_eq!(totals.len(), 1);
        assert_eq!(totals["Dining"], dec!(0.3));

        let totals = previous_month_spending(&sample(), ym("202402"));
        assert_eq!(totals["Groceries"], dec!(45.10));
        assert_eq!(totals["Dining"], dec!(23.45));
    }
}
