//! Store status

use crate::cli::CommandContext;
use crate::db::models::MetricFamily;
use crate::error::Result;

/// Show row counts per metric table
pub async fn run(ctx: &CommandContext) -> Result<()> {
    if !ctx.db_path.exists() {
        println!("No database found at: {}", ctx.db_path.display());
        println!("Run 'rook-sync sync <USER_ID>' to create one.");
        return Ok(());
    }

    let store = ctx.open_store()?;

    println!("Database: {}", ctx.db_path.display());
    println!();
    println!("Data stored:");
    for family in MetricFamily::ALL {
        println!("  {:<14} {:>8}", family.as_str(), store.count(family)?);
    }

    Ok(())
}
