use chrono::NaiveDate;
use serde::Deserialize;

/// Query string for `GET /app/summaries`: an inclusive date range
#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub start: NaiveDate,
    pub end: NaiveDate,
}
