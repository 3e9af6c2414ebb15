use crate::filter::Selection;
use crate::reports::DashboardView;
use crate::types::{
    HourlyAverage, HourlyRow, MetricRow, MonthlyAverage, MonthlyRow, SeasonAverage, SeasonRow,
    Summary, WeatherAverage, WeatherRow,
};
use crate::util::{format_int, format_number};
use serde::Serialize;
use std::error::Error;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub const DATA_SOURCE: &str =
    "Data source: Bike Sharing Dataset (https://www.kaggle.com/datasets/lakshmi25npathi/bike-sharing-dataset)";

const NO_DATA: &str = "N/A";

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn table_string<T>(rows: &[T]) -> String
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows.to_vec()).with(Style::markdown()).to_string()
}

pub fn metric_rows(summary: &Summary) -> Vec<MetricRow> {
    let metric = |name: &str, value: String| MetricRow {
        metric: name.to_string(),
        value,
    };
    vec![
        metric("Total Rentals", format_int(summary.total_rentals)),
        metric(
            "Avg Daily Rentals",
            summary
                .avg_daily_rentals
                .map_or_else(|| NO_DATA.to_string(), |v| format!("{:.0}", v)),
        ),
        metric(
            "Peak Daily Rentals",
            summary
                .peak_daily_rentals
                .map_or_else(|| NO_DATA.to_string(), format_int),
        ),
        metric(
            "% Registered Users",
            summary
                .pct_registered
                .map_or_else(|| NO_DATA.to_string(), |v| format!("{:.1}%", v)),
        ),
    ]
}

pub fn season_rows(rows: &[SeasonAverage]) -> Vec<SeasonRow> {
    rows.iter()
        .map(|r| SeasonRow {
            season: r.season.to_string(),
            avg_rentals: format_number(r.average, 2),
        })
        .collect()
}

pub fn weather_rows(rows: &[WeatherAverage]) -> Vec<WeatherRow> {
    rows.iter()
        .map(|r| WeatherRow {
            weather: r.weather.to_string(),
            avg_rentals: format_number(r.average, 2),
        })
        .collect()
}

pub fn hourly_rows(rows: &[HourlyAverage]) -> Vec<HourlyRow> {
    rows.iter()
        .map(|r| HourlyRow {
            hour: r.hour,
            working_day: if r.working_day { "Yes" } else { "No" }.to_string(),
            avg_rentals: format_number(r.average, 2),
        })
        .collect()
}

pub fn monthly_rows(rows: &[MonthlyAverage]) -> Vec<MonthlyRow> {
    rows.iter()
        .map(|r| MonthlyRow {
            month: r.month_end.format("%Y-%m").to_string(),
            avg_rentals: r
                .average
                .map_or_else(|| NO_DATA.to_string(), |v| format_number(v, 2)),
        })
        .collect()
}

/// Render the whole dashboard as text for the terminal.
pub fn render_dashboard(view: &DashboardView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Bike Sharing Dashboard");
    let _ = writeln!(out, "Year: {} | Seasons: {}\n", view.selection.year, view.selection.seasons_label());

    let sections: [(&str, String); 5] = [
        ("Summary", table_string(&metric_rows(&view.summary))),
        ("Average Daily Rentals by Season", table_string(&season_rows(&view.seasonal))),
        ("Average Daily Rentals by Weather", table_string(&weather_rows(&view.weather))),
        (
            "Average Hourly Rentals (Workingday vs Holiday)",
            table_string(&hourly_rows(&view.hourly)),
        ),
        ("Monthly Average Rentals", table_string(&monthly_rows(&view.monthly))),
    ];
    for (title, table) in sections {
        let _ = writeln!(out, "{}\n", title);
        let _ = writeln!(out, "{}\n", table);
    }
    let _ = writeln!(out, "---");
    let _ = writeln!(out, "{}", DATA_SOURCE);
    out
}

#[derive(Serialize)]
struct ExportSummary<'a> {
    selection: &'a Selection,
    daily_rows: usize,
    hourly_rows: usize,
    summary: &'a Summary,
}

/// Write every view of `view` into `dir` and return the files written.
pub fn export_dashboard(dir: &Path, view: &DashboardView) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    std::fs::create_dir_all(dir)?;
    let summary_path = dir.join("summary.json");
    write_json(
        &summary_path,
        &ExportSummary {
            selection: &view.selection,
            daily_rows: view.daily_rows,
            hourly_rows: view.hourly_rows,
            summary: &view.summary,
        },
    )?;

    let seasonal = dir.join("seasonal_pattern.csv");
    write_csv(&seasonal, &view.seasonal)?;
    let weather = dir.join("weather_pattern.csv");
    write_csv(&weather, &view.weather)?;
    let hourly = dir.join("hourly_pattern.csv");
    write_csv(&hourly, &view.hourly)?;
    let monthly = dir.join("monthly_trend.csv");
    write_csv(&monthly, &view.monthly)?;

    Ok(vec![summary_path, seasonal, weather, hourly, monthly])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{day, hour};
    use crate::loader::tests::write_fixture;
    use crate::types::{Datasets, Season, Weather};

    fn view() -> DashboardView {
        let data = Datasets {
            daily: vec![
                day("2011-01-01", Season::Spring, Weather::Clear, 1500, 600),
                day("2011-03-01", Season::Spring, Weather::LightSnowRain, 2500, 1000),
            ],
            hourly: vec![hour("2011-01-01", 7, true, Season::Spring, 120)],
        };
        DashboardView::compute(&data, &Selection::new(2011, Season::ALL))
    }

    #[test]
    fn formats_metrics_like_the_dashboard() {
        let rows = metric_rows(&view().summary);
        let values: Vec<&str> = rows.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, ["4,000", "2000", "2,500", "40.0%"]);
    }

    #[test]
    fn missing_metrics_render_as_na() {
        let summary = Summary {
            total_rentals: 0,
            avg_daily_rentals: None,
            peak_daily_rentals: None,
            pct_registered: None,
        };
        let values: Vec<String> = metric_rows(&summary).into_iter().map(|r| r.value).collect();
        assert_eq!(values, ["0", "N/A", "N/A", "N/A"]);
    }

    #[test]
    fn gap_months_render_as_na() {
        let rows = monthly_rows(&view().monthly);
        let months: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.month.as_str(), r.avg_rentals.as_str()))
            .collect();
        assert_eq!(
            months,
            [("2011-01", "1,500.00"), ("2011-02", "N/A"), ("2011-03", "2,500.00")]
        );
    }

    #[test]
    fn renders_every_section() {
        let text = render_dashboard(&view());
        for title in [
            "Year: 2011 | Seasons: Spring, Summer, Fall, Winter",
            "Average Daily Rentals by Season",
            "Light Snow/Rain",
            "Average Hourly Rentals (Workingday vs Holiday)",
            "Monthly Average Rentals",
            DATA_SOURCE,
        ] {
            assert!(text.contains(title), "missing `{title}` in:\n{text}");
        }
    }

    #[test]
    fn exports_json_and_csv_files() {
        let dir = write_fixture("export", &[]);
        let files = export_dashboard(&dir.join("out"), &view()).unwrap();
        assert_eq!(files.len(), 5);
        assert!(files.iter().all(|f| f.exists()));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
        assert_eq!(json["summary"]["total_rentals"], 4000);
        assert_eq!(json["selection"]["year"], 2011);

        let monthly = std::fs::read_to_string(dir.join("out").join("monthly_trend.csv")).unwrap();
        assert_eq!(
            monthly.lines().collect::<Vec<_>>(),
            ["month_end,average", "2011-01-31,1500.0", "2011-02-28,", "2011-03-31,2500.0"]
        );
    }
}
