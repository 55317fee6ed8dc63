//! Ingestion commands

use chrono::{NaiveDate, Utc};

use crate::cli::{require_user_id, CommandContext};
use crate::db::models::MetricFamily;
use crate::error::{Result, RookError};
use crate::sync::{sync_lookback_days, DateRange, FlushPolicy, IngestReport, Ingestor};

/// Ingest one family over a day range
pub async fn run(
    ctx: &CommandContext,
    family: MetricFamily,
    user_id: &str,
    from: Option<String>,
    to: Option<String>,
    flush: Option<FlushPolicy>,
) -> Result<()> {
    let user_id = require_user_id(user_id)?;
    let range = day_range(family, from.as_deref(), to.as_deref(), Utc::now().date_naive())?;
    let policy = flush.unwrap_or_else(|| FlushPolicy::default_for(family));

    println!("Using database: {}", ctx.db_path.display());
    println!(
        "Ingesting {} for {} from {} to {} ({} days)",
        family,
        user_id,
        range.from,
        range.to,
        range.len_days()
    );

    let mut ingestor = Ingestor::new(ctx.client()?, ctx.open_store()?);
    let report = ingestor.ingest(family, user_id, range, policy).await;
    print_report(family, &report);

    Ok(())
}

/// Ingest every family over its trailing window ending today
pub async fn sync(ctx: &CommandContext, user_id: &str) -> Result<()> {
    let user_id = require_user_id(user_id)?;
    println!("Using database: {}", ctx.db_path.display());

    let mut ingestor = Ingestor::new(ctx.client()?, ctx.open_store()?);
    let reports = ingestor.sync_all(user_id, Utc::now().date_naive()).await;
    for (family, report) in &reports {
        print_report(*family, report);
    }

    Ok(())
}

fn print_report(family: MetricFamily, report: &IngestReport) {
    let marker = if report.has_failures() { "!" } else { "+" };
    println!("[{}] {:<14} {}", marker, family.as_str(), report);
}

/// Resolve `--from`/`--to` into an inclusive day range
fn day_range(
    family: MetricFamily,
    from: Option<&str>,
    to: Option<&str>,
    today: NaiveDate,
) -> Result<DateRange> {
    let to = match to {
        Some(s) => parse_day(s)?,
        None => today,
    };
    match from {
        Some(s) => DateRange::new(parse_day(s)?, to),
        None => Ok(DateRange::trailing(to, sync_lookback_days(family))),
    }
}

fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| RookError::InvalidDateFormat(s.to_string()))
}
