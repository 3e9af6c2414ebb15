use crate::error::SelectionError;
use crate::types::{DailyRecord, HourlyRecord, Season};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

/// Fields every table row shares, so one filter serves both tables.
pub trait RentalRecord {
    fn date(&self) -> NaiveDate;
    fn season(&self) -> Season;
    fn cnt(&self) -> u32;
    fn registered(&self) -> u32;
}

impl RentalRecord for DailyRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
    fn season(&self) -> Season {
        self.season
    }
    fn cnt(&self) -> u32 {
        self.cnt
    }
    fn registered(&self) -> u32 {
        self.registered
    }
}

impl RentalRecord for HourlyRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
    fn season(&self) -> Season {
        self.season
    }
    fn cnt(&self) -> u32 {
        self.cnt
    }
    fn registered(&self) -> u32 {
        self.registered
    }
}

/// The user's current year and season choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub year: i32,
    pub seasons: BTreeSet<Season>,
}

impl Selection {
    pub fn new(year: i32, seasons: impl IntoIterator<Item = Season>) -> Self {
        Self {
            year,
            seasons: seasons.into_iter().collect(),
        }
    }

    /// Parse a comma-separated list such as `spring,Fall`.
    pub fn parse_seasons(list: &str) -> Result<BTreeSet<Season>, SelectionError> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<Season>())
            .collect()
    }

    pub fn matches<R: RentalRecord>(&self, row: &R) -> bool {
        row.date().year() == self.year && self.seasons.contains(&row.season())
    }

    pub fn seasons_label(&self) -> String {
        if self.seasons.is_empty() {
            return "(none)".to_string();
        }
        self.seasons
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Copy out the rows matching `selection`. The input is left untouched.
pub fn filter<R: RentalRecord + Clone>(rows: &[R], selection: &Selection) -> Vec<R> {
    rows.iter().filter(|r| selection.matches(*r)).cloned().collect()
}

/// Sorted, de-duplicated years present in the daily table.
pub fn available_years(daily: &[DailyRecord]) -> Vec<i32> {
    daily
        .iter()
        .map(|r| r.date.year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Seasons in order of first appearance; the default season selection.
pub fn available_seasons(daily: &[DailyRecord]) -> Vec<Season> {
    let mut seen = Vec::new();
    for r in daily {
        if !seen.contains(&r.season) {
            seen.push(r.season);
        }
    }
    seen
}

/// Check that `year` exists in the data before building a selection for it.
pub fn validate_year(daily: &[DailyRecord], year: i32) -> Result<i32, SelectionError> {
    let years = available_years(daily);
    if years.contains(&year) {
        return Ok(year);
    }
    Err(SelectionError::UnknownYear {
        year,
        available: years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}
