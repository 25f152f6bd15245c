//! Analyze command implementation

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use spendwise_core::{
    format_amount, parse_statement, AnalysisConfig, AnalysisReport, JsonFilePublisher,
    JsonHistoryStore, Pipeline, PipelineOutcome, RiskLevel,
};
use tracing::debug;

use super::truncate;

pub async fn cmd_analyze(
    history_dir: &Path,
    config_path: Option<&Path>,
    file: &Path,
    out_dir: &Path,
    no_append: bool,
    json: bool,
) -> Result<()> {
    let mut config = AnalysisConfig::load(config_path).context("Failed to load analysis config")?;
    if no_append {
        config.append_history = false;
    }
    debug!(
        "History: {}, reports: {}, config: {:?}",
        history_dir.display(),
        out_dir.display(),
        config
    );

    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let batch = parse_statement(csv_file)
        .with_context(|| format!("Failed to read statement: {}", file.display()))?;

    if !json {
        println!("📥 Analyzing {}...", file.display());
        println!(
            "   Found {} transactions in {} user-months",
            batch.transaction_count(),
            batch.groups.len()
        );
    }

    let pipeline = Pipeline::new(
        Arc::new(JsonHistoryStore::new(history_dir)),
        Arc::new(JsonFilePublisher::new(out_dir)),
        config,
    );
    let outcome = pipeline.run(batch).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome, pipeline.config());
    }

    if !outcome.is_success() {
        anyhow::bail!(
            "{} of {} groups failed",
            outcome.failures.len(),
            outcome.reports.len() + outcome.failures.len()
        );
    }
    Ok(())
}

fn print_outcome(outcome: &PipelineOutcome, config: &AnalysisConfig) {
    for published in &outcome.reports {
        print_report(&published.report);
        println!("   📄 {}", published.location);
    }

    if !outcome.skipped_rows.is_empty() {
        println!();
        println!("⚠️  Skipped {} malformed rows:", outcome.skipped_rows.len());
        for row in &outcome.skipped_rows {
            println!("   line {}: {}", row.line, truncate(&row.reason, 70));
        }
    }

    if !outcome.failures.is_empty() {
        println!();
        println!("❌ {} groups failed:", outcome.failures.len());
        for failure in &outcome.failures {
            println!(
                "   {} [{}]: {}",
                failure.key, failure.stage, failure.reason
            );
        }
    }

    println!();
    println!("✅ Analysis complete!");
    println!("   Reports: {}", outcome.reports.len());
    if config.append_history {
        println!("   Added to history: {}", outcome.appended);
    } else {
        println!("   History unchanged (--no-append)");
    }
}

/// Print a human-readable summary of one report
pub fn print_report(report: &AnalysisReport) {
    println!();
    println!("📊 User {} ({})", report.user_id, report.year_month);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Total: ${}", format_amount(report.total_spending()));
    println!(
        "   Home country: {}",
        report.home_country.as_deref().unwrap_or("unknown")
    );
    println!(
        "   Historical average: ${}",
        format_amount(report.historical_average)
    );

    println!();
    println!(
        "   {:25} │ {:>10} │ {:>10}",
        "Category", "This month", "Last month"
    );
    println!("   ──────────────────────────┼────────────┼───────────");
    for (category, amount) in &report.spending_by_category {
        let previous = report
            .previous_month_spending_by_category
            .get(category)
            .map(|p| format_amount(*p))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {:25} │ {:>10} │ {:>10}",
            truncate(category, 25),
            format_amount(*amount),
            previous
        );
    }

    if !report.flagged_transactions.is_empty() {
        println!();
        println!("🚩 Flagged transactions:");
        for flagged in &report.flagged_transactions {
            let icon = match flagged.risk_level {
                RiskLevel::High => "🔴",
                RiskLevel::Moderate => "🟡",
            };
            println!(
                "   {} {} {} ${} at {} ({})",
                icon,
                flagged.date,
                flagged.risk_level,
                format_amount(flagged.amount),
                truncate(&flagged.vendor, 30),
                flagged.location
            );
            for reason in flagged.reasons() {
                println!("      - {}", reason);
            }
        }
    }

    if !report.unresolved_locations.is_empty() {
        println!();
        println!("❓ Unrecognized locations:");
        for unresolved in &report.unresolved_locations {
            println!("   {} ({})", unresolved.transaction_id, unresolved.location);
        }
    }

    if !report.top_high_value_transactions.is_empty() {
        println!();
        println!(
            "💰 Top high-value transactions ({} above average):",
            report.high_value_transactions.len()
        );
        for high in &report.top_high_value_transactions {
            println!(
                "   {} ${:>10}  {} ({})",
                high.date,
                format_amount(high.amount),
                truncate(&high.vendor, 30),
                high.category
            );
        }
    }

    if !report.recurring_projection.is_empty() {
        println!();
        println!("🔁 Recurring vendors ({}):", report.year_month.year());
        for projection in &report.recurring_projection {
            println!(
                "   {:25} ${:>10} so far, ~${} for the year",
                truncate(&projection.vendor, 25),
                format_amount(projection.observed),
                format_amount(projection.projected)
            );
        }
    }

    println!();
    println!(
        "📈 Monthly trend: {}",
        report.monthly_spending_trend.trend
    );
    let recent: Vec<String> = report
        .monthly_spending_trend
        .monthly_spending
        .iter()
        .rev()
        .take(3)
        .map(|(period, amount)| format!("{} ${}", period, format_amount(*amount)))
        .collect();
    if !recent.is_empty() {
        println!("   {}", recent.join(" · "));
    }
}
