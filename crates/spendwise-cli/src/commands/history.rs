//! History command implementations

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use spendwise_core::aggregate::{historical_average, spending_by_month};
use spendwise_core::geo::determine_home_country;
use spendwise_core::{format_amount, parse_statement, HistoricalStore, JsonHistoryStore};

pub async fn cmd_history_import(history_dir: &Path, file: &Path) -> Result<()> {
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let batch = parse_statement(csv_file)
        .with_context(|| format!("Failed to read statement: {}", file.display()))?;

    println!("📥 Recording {} as history...", file.display());
    println!(
        "   Found {} transactions in {} user-months",
        batch.transaction_count(),
        batch.groups.len()
    );

    let store = JsonHistoryStore::new(history_dir);
    let mut imported = 0;
    for group in &batch.groups {
        imported += store
            .append(group.user_id(), group.transactions())
            .await
            .with_context(|| format!("Failed to record history for {}", group.key()))?;
    }
    let duplicates = batch.transaction_count() - imported;

    println!("✅ Import complete!");
    println!("   Imported: {}", imported);
    println!("   Skipped (duplicates): {}", duplicates);
    if !batch.skipped.is_empty() {
        println!("   Skipped (malformed): {}", batch.skipped.len());
    }

    Ok(())
}

pub async fn cmd_history_show(history_dir: &Path, user_id: &str) -> Result<()> {
    let store = JsonHistoryStore::new(history_dir);
    let history = store
        .fetch(user_id)
        .await
        .with_context(|| format!("Failed to load history for user {}", user_id))?;

    println!();
    println!("🗂️  History for user {}", user_id);
    println!("   ─────────────────────────────────────────────────────────────");

    if history.is_empty() {
        println!("   No transactions recorded.");
        return Ok(());
    }

    let by_month = spending_by_month(&history);
    let total: Decimal = by_month.values().copied().sum();

    println!("   Transactions: {}", history.len());
    println!("   Total: ${}", format_amount(total));
    println!(
        "   Average transaction: ${}",
        format_amount(historical_average(&history))
    );
    println!(
        "   Home country: {}",
        determine_home_country(&history).as_deref().unwrap_or("unknown")
    );
    println!();
    println!("   {:8} │ {:>12} │ {:>5}", "Month", "Amount", "Count");
    println!("   ─────────┼──────────────┼──────");
    for (period, amount) in &by_month {
        let count = history.iter().filter(|tx| tx.period() == *period).count();
        println!(
            "   {:8} │ {:>12} │ {:>5}",
            period.to_string(),
            format_amount(*amount),
            count
        );
    }

    Ok(())
}
