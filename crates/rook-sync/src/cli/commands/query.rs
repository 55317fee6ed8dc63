//! Read stored metrics back as JSON

use chrono::Utc;

use crate::cli::{require_user_id, CommandContext};
use crate::db::models::MetricFamily;
use crate::error::Result;
use crate::query::{resolve_family_range, to_points, GlucosePoint, HeartRatePoint, StepsPoint};

/// Print one family's records for `user_id` within the resolved range
pub async fn run(
    ctx: &CommandContext,
    family: MetricFamily,
    user_id: &str,
    start: Option<String>,
    end: Option<String>,
) -> Result<()> {
    let user_id = require_user_id(user_id)?;
    let (start, end) = resolve_family_range(family, start.as_deref(), end.as_deref(), Utc::now())?;
    let store = ctx.open_store()?;

    let json = match family {
        MetricFamily::Steps => {
            let records = store.steps_between(user_id, start.date_naive(), end.date_naive())?;
            serde_json::to_string_pretty(&to_points::<_, StepsPoint>(records))?
        }
        MetricFamily::BloodGlucose => {
            let records = store.glucose_between(user_id, start, end)?;
            serde_json::to_string_pretty(&to_points::<_, GlucosePoint>(records))?
        }
        MetricFamily::HeartRate => {
            let records = store.heart_rate_between(user_id, start, end)?;
            serde_json::to_string_pretty(&to_points::<_, HeartRatePoint>(records))?
        }
    };

    println!("{}", json);
    Ok(())
}
