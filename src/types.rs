use crate::error::{MappingError, SelectionError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    /// Map the dataset's 1-based season code to a label.
    ///
    /// Codes outside 1..=4 are rejected rather than passed through, so a
    /// corrupt file fails at load time instead of producing blank groups.
    pub fn from_code(code: i64) -> Result<Self, MappingError> {
        match code {
            1 => Ok(Season::Spring),
            2 => Ok(Season::Summer),
            3 => Ok(Season::Fall),
            4 => Ok(Season::Winter),
            other => Err(MappingError::Season(other)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Season {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Season::ALL
            .into_iter()
            .find(|season| season.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SelectionError::UnknownSeason(wanted.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Weather {
    Clear,
    Mist,
    #[serde(rename = "Light Snow/Rain")]
    LightSnowRain,
    #[serde(rename = "Heavy Rain/Snow")]
    HeavyRainSnow,
}

impl Weather {
    /// Map the dataset's `weathersit` code to a label. Same policy as
    /// [`Season::from_code`].
    pub fn from_code(code: i64) -> Result<Self, MappingError> {
        match code {
            1 => Ok(Weather::Clear),
            2 => Ok(Weather::Mist),
            3 => Ok(Weather::LightSnowRain),
            4 => Ok(Weather::HeavyRainSnow),
            other => Err(MappingError::Weather(other)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weather::Clear => "Clear",
            Weather::Mist => "Mist",
            Weather::LightSnowRain => "Light Snow/Rain",
            Weather::HeavyRainSnow => "Heavy Rain/Snow",
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One CSV row as it appears in either `day.csv` or `hour.csv`.
///
/// `hr` only exists in the hourly file, and `workingday` is required there;
/// the loader checks the header for those before reading rows.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    pub instant: Option<u32>,
    pub dteday: String,
    pub season: i64,
    pub yr: Option<u8>,
    pub mnth: Option<u8>,
    pub hr: Option<i64>,
    pub holiday: Option<u8>,
    pub weekday: Option<u8>,
    pub workingday: Option<i64>,
    pub weathersit: i64,
    pub temp: Option<f64>,
    pub atemp: Option<f64>,
    pub hum: Option<f64>,
    pub windspeed: Option<f64>,
    pub casual: Option<u32>,
    pub registered: u32,
    pub cnt: u32,
}

/// Columns carried through from the source but not used by any view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtraColumns {
    pub instant: Option<u32>,
    pub yr: Option<u8>,
    pub mnth: Option<u8>,
    pub holiday: Option<u8>,
    pub weekday: Option<u8>,
    pub temp: Option<f64>,
    pub atemp: Option<f64>,
    pub hum: Option<f64>,
    pub windspeed: Option<f64>,
    pub casual: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub season: Season,
    pub weather: Weather,
    pub working_day: Option<bool>,
    pub registered: u32,
    pub cnt: u32,
    pub extra: ExtraColumns,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRecord {
    pub date: NaiveDate,
    pub hour: u8,
    pub season: Season,
    pub weather: Weather,
    pub working_day: bool,
    pub registered: u32,
    pub cnt: u32,
    pub extra: ExtraColumns,
}

/// Both normalized tables. Never mutated once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datasets {
    pub daily: Vec<DailyRecord>,
    pub hourly: Vec<HourlyRecord>,
}

/// The four headline numbers. `None` marks "no data" for the current
/// selection and renders as `N/A`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_rentals: u64,
    pub avg_daily_rentals: Option<f64>,
    pub peak_daily_rentals: Option<u32>,
    pub pct_registered: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonAverage {
    pub season: Season,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherAverage {
    pub weather: Weather,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyAverage {
    pub hour: u8,
    pub working_day: bool,
    pub average: f64,
}

/// One point of the monthly trend, labelled by the last day of the month.
/// `average` is `None` for a month inside the range that has no rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAverage {
    pub month_end: NaiveDate,
    pub average: Option<f64>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MetricRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SeasonRow {
    #[serde(rename = "Season")]
    #[tabled(rename = "Season")]
    pub season: String,
    #[serde(rename = "AvgRentals")]
    #[tabled(rename = "AvgRentals")]
    pub avg_rentals: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct WeatherRow {
    #[serde(rename = "Weather")]
    #[tabled(rename = "Weather")]
    pub weather: String,
    #[serde(rename = "AvgRentals")]
    #[tabled(rename = "AvgRentals")]
    pub avg_rentals: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct HourlyRow {
    #[serde(rename = "Hour")]
    #[tabled(rename = "Hour")]
    pub hour: u8,
    #[serde(rename = "WorkingDay")]
    #[tabled(rename = "WorkingDay")]
    pub working_day: String,
    #[serde(rename = "AvgRentals")]
    #[tabled(rename = "AvgRentals")]
    pub avg_rentals: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthlyRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "AvgRentals")]
    #[tabled(rename = "AvgRentals")]
    pub avg_rentals: String,
}
