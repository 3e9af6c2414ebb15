use crate::error::LoadError;
use crate::types::{DailyRecord, Datasets, ExtraColumns, HourlyRecord, RawRow, Season, Weather};
use crate::util::parse_date_safe;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use once_cell::sync::OnceCell;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DAILY_COLUMNS: &[&str] = &["dteday", "season", "weathersit", "cnt", "registered"];
const HOURLY_COLUMNS: &[&str] = &[
    "dteday",
    "season",
    "weathersit",
    "cnt",
    "registered",
    "hr",
    "workingday",
];

/// Where the two source tables live. Also the cache key for [`CachedLoader`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourcePaths {
    pub daily: PathBuf,
    pub hourly: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub daily_rows: usize,
    pub hourly_rows: usize,
}

/// Read and normalize both tables.
pub fn load(paths: &SourcePaths) -> Result<(Datasets, LoadReport), LoadError> {
    let daily = load_daily(&paths.daily)?;
    let hourly = load_hourly(&paths.hourly)?;
    let report = LoadReport {
        daily_rows: daily.len(),
        hourly_rows: hourly.len(),
    };
    Ok((Datasets { daily, hourly }, report))
}

pub fn load_daily(path: &Path) -> Result<Vec<DailyRecord>, LoadError> {
    read_rows(path, DAILY_COLUMNS)?
        .into_iter()
        .map(|(line, row)| -> Result<DailyRecord, LoadError> {
            let (date, season, weather) = normalize_common(path, line, &row)?;
            let working_day = match row.workingday {
                Some(flag) => Some(parse_flag(path, line, flag)?),
                None => None,
            };
            Ok(DailyRecord {
                date,
                season,
                weather,
                working_day,
                registered: row.registered,
                cnt: row.cnt,
                extra: extra_columns(&row),
            })
        })
        .collect()
}

pub fn load_hourly(path: &Path) -> Result<Vec<HourlyRecord>, LoadError> {
    read_rows(path, HOURLY_COLUMNS)?
        .into_iter()
        .map(|(line, row)| -> Result<HourlyRecord, LoadError> {
            let (date, season, weather) = normalize_common(path, line, &row)?;
            let hour = match row.hr {
                Some(h) if (0..=23).contains(&h) => h as u8,
                Some(h) => return Err(malformed(path, line, format!("hour {h} outside 0-23"))),
                None => return Err(malformed(path, line, "missing `hr` value")),
            };
            let working_day = match row.workingday {
                Some(flag) => parse_flag(path, line, flag)?,
                None => return Err(malformed(path, line, "missing `workingday` value")),
            };
            Ok(HourlyRecord {
                date,
                hour,
                season,
                weather,
                working_day,
                registered: row.registered,
                cnt: row.cnt,
                extra: extra_columns(&row),
            })
        })
        .collect()
}

/// Open `path`, check the header for `required` columns and deserialize every
/// row, keeping its line number for error messages.
fn read_rows(path: &Path, required: &[&'static str]) -> Result<Vec<(u64, RawRow)>, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::DataLoad {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(file);
    let headers = rdr
        .headers()
        .map_err(|source| LoadError::DataLoad {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    check_columns(path, &headers, required)?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| record_error(path, e))?;
        let line = record.position().map_or(0, |p| p.line());
        let row: RawRow = record
            .deserialize(Some(&headers))
            .map_err(|e| malformed(path, line, e.to_string()))?;
        rows.push((line, row));
    }
    Ok(rows)
}

fn check_columns(path: &Path, headers: &StringRecord, required: &[&'static str]) -> Result<(), LoadError> {
    for &column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(LoadError::Schema {
                path: path.to_path_buf(),
                column,
            });
        }
    }
    Ok(())
}

fn normalize_common(path: &Path, line: u64, row: &RawRow) -> Result<(NaiveDate, Season, Weather), LoadError> {
    let date = parse_date_safe(&row.dteday)
        .ok_or_else(|| malformed(path, line, format!("invalid date `{}`", row.dteday)))?;
    let mapping = |source| LoadError::Mapping {
        path: path.to_path_buf(),
        line,
        source,
    };
    let season = Season::from_code(row.season).map_err(mapping)?;
    let weather = Weather::from_code(row.weathersit).map_err(mapping)?;
    Ok((date, season, weather))
}

fn parse_flag(path: &Path, line: u64, flag: i64) -> Result<bool, LoadError> {
    match flag {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(malformed(path, line, format!("workingday flag {other} is not 0 or 1"))),
    }
}

fn extra_columns(row: &RawRow) -> ExtraColumns {
    ExtraColumns {
        instant: row.instant,
        yr: row.yr,
        mnth: row.mnth,
        holiday: row.holiday,
        weekday: row.weekday,
        temp: row.temp,
        atemp: row.atemp,
        hum: row.hum,
        windspeed: row.windspeed,
        casual: row.casual,
    }
}

fn record_error(path: &Path, e: csv::Error) -> LoadError {
    if e.is_io_error() {
        return LoadError::DataLoad {
            path: path.to_path_buf(),
            source: e,
        };
    }
    let line = e.position().map_or(0, |p| p.line());
    malformed(path, line, e.to_string())
}

fn malformed(path: &Path, line: u64, message: impl Into<String>) -> LoadError {
    LoadError::Malformed {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

/// Loads both tables on first use and hands out the same snapshot afterwards.
///
/// The paths are fixed at construction, so one instance is one cache entry.
/// A failed load is not cached.
#[derive(Debug)]
pub struct CachedLoader {
    paths: SourcePaths,
    cell: OnceCell<Arc<Datasets>>,
}

impl CachedLoader {
    pub fn new(paths: SourcePaths) -> Self {
        Self {
            paths,
            cell: OnceCell::new(),
        }
    }

    pub fn get(&self) -> Result<Arc<Datasets>, LoadError> {
        self.cell
            .get_or_try_init(|| {
                let (data, report) = load(&self.paths)?;
                log::info!(
                    "Loaded {} daily rows from {} and {} hourly rows from {}",
                    report.daily_rows,
                    self.paths.daily.display(),
                    report.hourly_rows,
                    self.paths.hourly.display()
                );
                Ok(Arc::new(data))
            })
            .map(Arc::clone)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::MappingError;
    use std::fs;

    pub(crate) const DAY_CSV: &str = "\
instant,dteday,season,yr,mnth,holiday,weekday,workingday,weathersit,temp,atemp,hum,windspeed,casual,registered,cnt
1,2011-01-01,1,0,1,0,6,0,2,0.344167,0.363625,0.805833,0.160446,331,654,985
2,2011-01-02,1,0,1,0,0,0,2,0.363478,0.353739,0.696087,0.248539,131,670,801
3,2012-07-01,3,1,7,0,0,0,1,0.5,0.5,0.5,0.1,100,200,300
";

    pub(crate) const HOUR_CSV: &str = "\
instant,dteday,season,yr,mnth,hr,holiday,weekday,workingday,weathersit,temp,atemp,hum,windspeed,casual,registered,cnt
1,2011-01-01,1,0,1,0,0,6,0,1,0.24,0.2879,0.81,0,3,13,16
2,2011-01-01,1,0,1,1,0,6,0,1,0.22,0.2727,0.8,0,8,32,40
3,2011-01-03,1,0,1,1,0,1,1,3,0.22,0.2727,0.8,0.1,0,2,2
";

    /// Write `files` into a fresh directory under the system temp dir.
    pub(crate) fn write_fixture(name: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bike_dashboard_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        for (file, contents) in files {
            fs::write(dir.join(file), contents).unwrap();
        }
        dir
    }

    fn paths_in(dir: &Path) -> SourcePaths {
        SourcePaths {
            daily: dir.join("day.csv"),
            hourly: dir.join("hour.csv"),
        }
    }

    #[test]
    fn loads_and_normalizes_both_tables() {
        let dir = write_fixture("happy", &[("day.csv", DAY_CSV), ("hour.csv", HOUR_CSV)]);
        let (data, report) = load(&paths_in(&dir)).unwrap();

        assert_eq!(report, LoadReport { daily_rows: 3, hourly_rows: 3 });
        let first = &data.daily[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2011, 1, 1).unwrap());
        assert_eq!(first.season, Season::Spring);
        assert_eq!(first.weather, Weather::Mist);
        assert_eq!(first.working_day, Some(false));
        assert_eq!((first.cnt, first.registered), (985, 654));
        assert_eq!(first.extra.casual, Some(331));
        assert_eq!(data.daily[2].season, Season::Fall);

        let hour = &data.hourly[2];
        assert_eq!(hour.hour, 1);
        assert!(hour.working_day);
        assert_eq!(hour.weather, Weather::LightSnowRain);
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let day = "dteday,season,weathersit,registered,cnt\n2011-03-01,2,4,5,10\n";
        let dir = write_fixture("minimal", &[("day.csv", day)]);
        let rows = load_daily(&dir.join("day.csv")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].weather, Weather::HeavyRainSnow);
        assert_eq!(rows[0].working_day, None);
        assert_eq!(rows[0].extra, ExtraColumns::default());
    }

    #[test]
    fn missing_file_is_a_data_load_error() {
        let dir = write_fixture("missing", &[("day.csv", DAY_CSV)]);
        let err = load(&paths_in(&dir)).unwrap_err();
        assert!(matches!(err, LoadError::DataLoad { ref path, .. } if path.ends_with("hour.csv")));
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let day = "dteday,weathersit,registered,cnt\n2011-01-01,1,5,10\n";
        let dir = write_fixture("schema", &[("day.csv", day)]);
        let err = load_daily(&dir.join("day.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Schema { column: "season", .. }));

        let dir = write_fixture("schema_hourly", &[("hour.csv", DAY_CSV)]);
        let err = load_hourly(&dir.join("hour.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Schema { column: "hr", .. }));
    }

    #[test]
    fn unknown_code_is_a_mapping_error() {
        let day = "dteday,season,weathersit,registered,cnt\n2011-01-01,1,1,5,10\n2011-01-02,5,1,5,10\n";
        let dir = write_fixture("mapping", &[("day.csv", day)]);
        let err = load_daily(&dir.join("day.csv")).unwrap_err();
        match err {
            LoadError::Mapping { line, source, .. } => {
                assert_eq!(line, 3);
                assert_eq!(source, MappingError::Season(5));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_values_are_malformed() {
        let day = "dteday,season,weathersit,registered,cnt\n01/02/2011,1,1,5,10\n";
        let dir = write_fixture("bad_date", &[("day.csv", day)]);
        let err = load_daily(&dir.join("day.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { line: 2, .. }));

        let day = "dteday,season,weathersit,registered,cnt\n2011-01-02,1,1,5,lots\n";
        let dir = write_fixture("bad_int", &[("day.csv", day)]);
        let err = load_daily(&dir.join("day.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { line: 2, .. }));

        let hour = "dteday,season,weathersit,registered,cnt,hr,workingday\n2011-01-02,1,1,5,10,24,1\n";
        let dir = write_fixture("bad_hour", &[("hour.csv", hour)]);
        let err = load_hourly(&dir.join("hour.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { line: 2, .. }));
    }

    #[test]
    fn cached_loader_reads_files_once() {
        let dir = write_fixture("cache", &[("day.csv", DAY_CSV), ("hour.csv", HOUR_CSV)]);
        let loader = CachedLoader::new(paths_in(&dir));

        let first = loader.get().unwrap();
        fs::remove_dir_all(&dir).unwrap();
        let second = loader.get().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.daily.len(), 3);
    }

    #[test]
    fn cached_loader_does_not_cache_failures() {
        let dir = write_fixture("cache_retry", &[("day.csv", DAY_CSV)]);
        let loader = CachedLoader::new(paths_in(&dir));
        assert!(matches!(loader.get(), Err(LoadError::DataLoad { .. })));

        fs::write(dir.join("hour.csv"), HOUR_CSV).unwrap();
        assert_eq!(loader.get().unwrap().hourly.len(), 3);
    }
}
