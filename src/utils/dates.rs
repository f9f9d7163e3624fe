use chrono::NaiveDate;

/// Parse a `YYYY-MM-DD` date string.
///
/// # Errors
///
/// Returns a message suitable for a 400 response.
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{raw}', expected YYYY-MM-DD."))
}

/// Today's date in UTC as `YYYY-MM-DD`.
#[must_use]
pub fn today_iso() -> String {
    chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
}
