use crate::filter::{filter, RentalRecord, Selection};
use crate::types::{
    DailyRecord, Datasets, HourlyAverage, HourlyRecord, MonthlyAverage, SeasonAverage, Summary,
    WeatherAverage,
};
use crate::util::{average, month_end, next_month, year_month};
use serde::Serialize;
use std::collections::BTreeMap;

/// Mean of `value` per `key`, ordered by key.
fn mean_by<R, K: Ord>(rows: &[R], key: impl Fn(&R) -> K, value: impl Fn(&R) -> u32) -> BTreeMap<K, f64> {
    #[derive(Default)]
    struct Acc {
        sum: u64,
        count: usize,
    }
    let mut map: BTreeMap<K, Acc> = BTreeMap::new();
    for r in rows {
        let e = map.entry(key(r)).or_default();
        e.sum += u64::from(value(r));
        e.count += 1;
    }
    map.into_iter()
        .map(|(k, acc)| (k, acc.sum as f64 / acc.count as f64))
        .collect()
}

pub fn total_rentals<R: RentalRecord>(rows: &[R]) -> u64 {
    rows.iter().map(|r| u64::from(r.cnt())).sum()
}

/// `100 * registered / cnt`, or `None` when there were no rentals at all.
pub fn pct_registered<R: RentalRecord>(rows: &[R]) -> Option<f64> {
    let total = total_rentals(rows);
    if total == 0 {
        return None;
    }
    let registered: u64 = rows.iter().map(|r| u64::from(r.registered())).sum();
    Some(registered as f64 * 100.0 / total as f64)
}

/// Headline metrics over an already filtered daily table.
pub fn summarize(daily: &[DailyRecord]) -> Summary {
    let counts: Vec<f64> = daily.iter().map(|r| f64::from(r.cnt)).collect();
    Summary {
        total_rentals: total_rentals(daily),
        avg_daily_rentals: average(&counts),
        peak_daily_rentals: daily.iter().map(|r| r.cnt).max(),
        pct_registered: pct_registered(daily),
    }
}

pub fn seasonal_pattern(daily: &[DailyRecord]) -> Vec<SeasonAverage> {
    mean_by(daily, |r| r.season, |r| r.cnt)
        .into_iter()
        .map(|(season, average)| SeasonAverage { season, average })
        .collect()
}

pub fn weather_pattern(daily: &[DailyRecord]) -> Vec<WeatherAverage> {
    mean_by(daily, |r| r.weather, |r| r.cnt)
        .into_iter()
        .map(|(weather, average)| WeatherAverage { weather, average })
        .collect()
}

/// Mean rentals per (hour, working day), ordered by hour then flag.
pub fn hourly_pattern(hourly: &[HourlyRecord]) -> Vec<HourlyAverage> {
    mean_by(hourly, |r| (r.hour, r.working_day), |r| r.cnt)
        .into_iter()
        .map(|((hour, working_day), average)| HourlyAverage {
            hour,
            working_day,
            average,
        })
        .collect()
}

/// Monthly mean of daily rentals from the first to the last month present.
///
/// Months in between with no rows are kept with `average: None` so the trend
/// line shows the gap.
pub fn monthly_trend(daily: &[DailyRecord]) -> Vec<MonthlyAverage> {
    let buckets = mean_by(daily, |r| year_month(r.date), |r| r.cnt);
    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Vec::new();
    };

    let mut points = Vec::new();
    let mut current = first;
    loop {
        if let Some(end) = month_end(current.0, current.1) {
            points.push(MonthlyAverage {
                month_end: end,
                average: buckets.get(&current).copied(),
            });
        }
        if current >= last {
            break;
        }
        current = next_month(current.0, current.1);
    }
    points
}

/// Everything the dashboard shows for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub selection: Selection,
    pub daily_rows: usize,
    pub hourly_rows: usize,
    pub summary: Summary,
    pub seasonal: Vec<SeasonAverage>,
    pub weather: Vec<WeatherAverage>,
    pub hourly: Vec<HourlyAverage>,
    pub monthly: Vec<MonthlyAverage>,
}

impl DashboardView {
    /// Filter both tables with `selection` and compute every view.
    pub fn compute(data: &Datasets, selection: &Selection) -> Self {
        let daily = filter(&data.daily, selection);
        let hourly = filter(&data.hourly, selection);
        log::debug!(
            "Selection {} [{}] keeps {} daily and {} hourly rows",
            selection.year,
            selection.seasons_label(),
            daily.len(),
            hourly.len()
        );
        Self {
            selection: selection.clone(),
            daily_rows: daily.len(),
            hourly_rows: hourly.len(),
            summary: summarize(&daily),
            seasonal: seasonal_pattern(&daily),
            weather: weather_pattern(&daily),
            hourly: hourly_pattern(&hourly),
            monthly: monthly_trend(&daily),
        }
    }
}
