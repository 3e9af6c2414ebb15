// Utility helpers for date parsing, basic statistics and number formatting.
//
// Everything here is pure so the loader and the reports can share it.
use chrono::{Datelike, NaiveDate};
use num_format::{Locale, ToFormattedString};

pub fn parse_date_safe(s: &str) -> Option<NaiveDate> {
    // Source dates are strictly `YYYY-MM-DD`.
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Last calendar day of the given month, or `None` for an invalid month.
pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (y, m) = next_month(year, month);
    NaiveDate::from_ymd_opt(y, m, 1)?.pred_opt()
}

/// `(year, month)` of the month after the given one.
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

pub fn year_month(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

pub fn average(v: &[f64]) -> Option<f64> {
    // Arithmetic mean; `None` for an empty slice instead of NaN.
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed number of decimals plus thousands separators, e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
