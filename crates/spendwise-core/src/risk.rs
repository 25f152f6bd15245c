//! Risk classification
//!
//! Flags current-period transactions made outside the user's home country:
//! - `High Risk` when the amount is strictly above the historical average
//! - `Moderate Risk` otherwise
//!
//! Transactions in the home country are never flagged. A transaction whose
//! location cannot be resolved is left out of flagging and reported as
//! unresolved instead of failing the pass.

use rust_decimal::Decimal;
use tracing::debug;

use crate::geo::resolve_country;
use crate::models::{
    FlaggedTransaction, HighValueTransaction, RiskLevel, Transaction, UnresolvedLocation,
};

/// Output of one risk classification pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskAssessment {
    /// Flagged transactions, in input order
    pub flagged: Vec<FlaggedTransaction>,
    /// Transactions skipped because their location has no country mapping
    pub unresolved: Vec<UnresolvedLocation>,
}

pub fn classify_risk(amount: Decimal, historical_average: Decimal) -> RiskLevel {
    if amount > historical_average {
        RiskLevel::High
    } else {
        RiskLevel::Moderate
    }
}

/// Flag transactions made outside `home_country`
///
/// With no home country nothing can be compared, so nothing is flagged.
pub fn flag_risky_transactions(
    current: &[Transaction],
    home_country: Option<&str>,
    historical_average: Decimal,
) -> RiskAssessment {
    let mut assessment = RiskAssessment::default();

    for tx in current {
        let country = match resolve_country(&tx.location) {
            Ok(c) => c,
            Err(e) => {
                debug!("Skipping transaction {} for risk flagging: {}", tx.id, e);
                assessment.unresolved.push(UnresolvedLocation {
                    transaction_id: tx.id.clone(),
                    location: tx.location.clone(),
                });
                continue;
            }
        };

        let Some(home) = home_country else {
            continue;
        };
        if country == home {
            continue;
        }

        let risk_level = classify_risk(tx.amount, historical_average);
        debug!(
            "Flagged transaction {} in {} as {} (home: {})",
            tx.id, country, risk_level, home
        );

        assessment.flagged.push(FlaggedTransaction {
            transaction_id: tx.id.clone(),
            amount: tx.amount,
            historical_average,
            location: country.to_string(),
            risk_level,
            home_country: home.to_string(),
            category: tx.category.clone(),
            vendor: tx.vendor.clone(),
            date: tx.date,
        });
    }

    assessment
}

/// Current transactions strictly above the historical average, in input order
pub fn high_value_transactions(
    current: &[Transaction],
    historical_average: Decimal,
) -> Vec<HighValueTransaction> {
    current
        .iter()
        .filter(|tx| tx.amount > historical_average)
        .map(|tx| HighValueTransaction {
            transaction_id: tx.id.clone(),
            amount: tx.amount,
            vendor: tx.vendor.clone(),
            category: tx.category.clone(),
            date: tx.date,
            location: tx.location.clone(),
        })
        .collect()
}
