//! Descriptive statistics over a [`FilteredTable`].
//!
//! Each report is a pure read of the table. Modes break ties by taking the
//! smallest value, and reports that need at least one row return `None` for an
//! empty table.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::BikeshareError;
use crate::filter::{day_name_for_code, month_name};
use crate::schema::{derived, trip};
use crate::table::FilteredTable;

/// Most frequent value. Ties go to the smallest value; `None` for no values.
pub fn mode<T: Ord, I: IntoIterator<Item = T>>(values: I) -> Option<T> {
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        match &best {
            Some((_, best_count)) if *best_count >= count => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value)
}

/// Round half to even: 2.5 → 2, 3.5 → 4.
pub fn round_half_even(value: f64) -> i64 {
    value.round_ties_even() as i64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Counts per distinct value, by count descending then name ascending.
fn category_counts<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    let mut result: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    // stable sort keeps the BTreeMap's name order among equal counts
    result.sort_by(|a, b| b.count.cmp(&a.count));
    result
}

fn i32_values(table: &FilteredTable, column: &str) -> Result<Vec<i32>, BikeshareError> {
    let values = table.frame().column(column)?.i32()?;
    Ok(values.into_iter().flatten().collect())
}

fn str_mode(table: &FilteredTable, column: &str) -> Result<Option<String>, BikeshareError> {
    let values = table.frame().column(column)?.str()?;
    Ok(mode(values.into_iter().flatten()).map(str::to_string))
}

// ── Time of travel ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeStats {
    pub month: i32,
    pub month_name: String,
    /// 0 = Monday … 6 = Sunday.
    pub day_of_week: i32,
    pub day_name: String,
    pub hour: i32,
}

pub fn time_stats(table: &FilteredTable) -> Result<Option<TimeStats>, BikeshareError> {
    let month = mode(i32_values(table, derived::MONTH)?);
    let day_of_week = mode(i32_values(table, derived::DAY_OF_WEEK)?);
    let hour = mode(i32_values(table, derived::HOUR)?);

    let (Some(month), Some(day_of_week), Some(hour)) = (month, day_of_week, hour) else {
        return Ok(None);
    };

    Ok(Some(TimeStats {
        month,
        month_name: month_name(month).unwrap_or_else(|| month.to_string()),
        day_of_week,
        day_name: day_name_for_code(day_of_week)
            .map(str::to_string)
            .unwrap_or_else(|| day_of_week.to_string()),
        hour,
    }))
}

// ── Stations ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationStats {
    pub start_station: String,
    pub end_station: String,
    pub route: String,
}

pub fn station_stats(table: &FilteredTable) -> Result<Option<StationStats>, BikeshareError> {
    let start_station = str_mode(table, trip::START_STATION)?;
    let end_station = str_mode(table, trip::END_STATION)?;
    let route = str_mode(table, derived::ROUTE)?;

    Ok(match (start_station, end_station, route) {
        (Some(start_station), Some(end_station), Some(route)) => Some(StationStats {
            start_station,
            end_station,
            route,
        }),
        _ => None,
    })
}

// ── Trip duration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub trips: usize,
    pub total_minutes: i64,
    pub mean_minutes: i64,
}

pub fn trip_duration_stats(table: &FilteredTable) -> Result<Option<DurationStats>, BikeshareError> {
    let durations: Vec<f64> = table
        .frame()
        .column(derived::DURATION_MINUTES)?
        .f64()?
        .into_iter()
        .flatten()
        .collect();
    if durations.is_empty() {
        return Ok(None);
    }

    let total: f64 = durations.iter().sum();
    let mean = total / durations.len() as f64;
    Ok(Some(DurationStats {
        trips: durations.len(),
        total_minutes: round_half_even(total),
        mean_minutes: round_half_even(mean),
    }))
}

// ── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BirthYearStats {
    pub earliest: i32,
    pub most_recent: i32,
    pub most_common: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Demographics {
    /// The dataset has no `Gender` or no `Birth Year` column.
    Unavailable,
    Available {
        genders: Vec<CategoryCount>,
        /// `None` when every birth year in the table is null.
        birth_years: Option<BirthYearStats>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub user_types: Vec<CategoryCount>,
    pub demographics: Demographics,
}

pub fn user_stats(table: &FilteredTable) -> Result<UserStats, BikeshareError> {
    let user_types = category_counts(
        table
            .frame()
            .column(trip::USER_TYPE)?
            .str()?
            .into_iter()
            .flatten(),
    );

    if !table.capabilities().has_demographics() {
        return Ok(UserStats {
            user_types,
            demographics: Demographics::Unavailable,
        });
    }

    let genders = category_counts(
        table
            .frame()
            .column(trip::GENDER)?
            .str()?
            .into_iter()
            .flatten(),
    );

    let years = i32_values(table, trip::BIRTH_YEAR)?;
    let birth_years = match (years.iter().min(), years.iter().max(), mode(years.iter())) {
        (Some(&earliest), Some(&most_recent), Some(&most_common)) => Some(BirthYearStats {
            earliest,
            most_recent,
            most_common,
        }),
        _ => None,
    };

    Ok(UserStats {
        user_types,
        demographics: Demographics::Available {
            genders,
            birth_years,
        },
    })
}
