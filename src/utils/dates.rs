// src/utils/dates.rs
use chrono::NaiveDate;

const DATE_FMT: &str = "%Y-%m-%d";

/// Enumerates every calendar date in `[from, to]` inclusive, ascending.
/// An inverted range or an unparseable date on either side yields an empty
/// list rather than an error; callers that care should validate first.
pub fn dates_between_inclusive(from: &str, to: &str) -> Vec<NaiveDate> {
    let (Ok(from), Ok(to)) = (
        NaiveDate::parse_from_str(from, DATE_FMT),
        NaiveDate::parse_from_str(to, DATE_FMT),
    ) else {
        return Vec::new();
    };

    if from > to {
        return Vec::new();
    }

    let mut dates = Vec::new();
    let mut current = from;
    while current <= to {
        dates.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break, // end of the calendar
        }
    }
    dates
}

/// Parses a year spec like "2024", "2021-2023" or "2020,2022-2024" into a
/// sorted, deduplicated list of years.
pub fn parse_year_list(spec: &str) -> Result<Vec<u16>, String> {
    let mut years = Vec::new();

    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((start, end)) = part.split_once('-') {
            let start: u16 = start
                .trim()
                .parse()
                .map_err(|_| format!("Invalid year in range: {}", part))?;
            let end: u16 = end
                .trim()
                .parse()
                .map_err(|_| format!("Invalid year in range: {}", part))?;
            if start > end {
                return Err(format!("Inverted year range: {}", part));
            }
            years.extend(start..=end);
        } else {
            let year: u16 = part
                .parse()
                .map_err(|_| format!("Invalid year: {}", part))?;
            years.push(year);
        }
    }

    if years.is_empty() {
        return Err(format!("No years in spec: {}", spec));
    }

    years.sort_unstable();
    years.dedup();
    Ok(years)
}

/// A month-day window template ("MM-DD..MM-DD") applied per year to get an
/// absolute date range inside that year.
#[derive(Debug, Clone)]
pub struct WindowTemplate {
    from_md: String,
    to_md: String,
}

impl WindowTemplate {
    pub fn parse(spec: &str) -> Result<Self, String> {
        let (from_md, to_md) = spec
            .split_once("..")
            .ok_or_else(|| format!("Window template must be MM-DD..MM-DD, got: {}", spec))?;
        let template = Self {
            from_md: from_md.trim().to_string(),
            to_md: to_md.trim().to_string(),
        };
        // Reject templates that can never produce a valid date.
        if template.apply(2024).is_none() {
            return Err(format!("Window template has invalid month-day: {}", spec));
        }
        Ok(template)
    }

    /// Instantiates the template for one year, e.g. "06-01..09-30" at 2024
    /// becomes ("2024-06-01", "2024-09-30").
    pub fn apply(&self, year: u16) -> Option<(String, String)> {
        let from = format!("{}-{}", year, self.from_md);
        let to = format!("{}-{}", year, self.to_md);
        NaiveDate::parse_from_str(&from, DATE_FMT).ok()?;
        NaiveDate::parse_from_str(&to, DATE_FMT).ok()?;
        Some((from, to))
    }
}
