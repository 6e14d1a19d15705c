//! City table and month/day filter vocabularies.
//!
//! Two index spaces meet here. Filter names are looked up by their position in
//! [`MONTHS`] and [`DAYS`], where index 0 is the `"all"` sentinel and `DAYS`
//! starts on sunday. Derived columns use calendar codes instead: months are
//! 1–12 and days of the week are 0 (Monday) – 6 (Sunday). Every conversion
//! between the two goes through this module.

use std::fmt;
use std::str::FromStr;

use chrono::Month;
use serde::Serialize;

use crate::error::BikeshareError;

/// City name → dataset file, relative to the data directory.
pub const CITY_DATA: [(&str, &str); 3] = [
    ("chicago", "chicago.csv"),
    ("new york city", "new_york_city.csv"),
    ("washington", "washington.csv"),
];

pub const MONTHS: [&str; 7] = [
    "all", "january", "february", "march", "april", "may", "june",
];

pub const DAYS: [&str; 8] = [
    "all",
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

const DAYS_PER_WEEK: usize = 7;

fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

// ── City ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum City {
    Chicago,
    NewYorkCity,
    Washington,
}

impl City {
    pub const ALL: [City; 3] = [City::Chicago, City::NewYorkCity, City::Washington];

    fn position(self) -> usize {
        match self {
            City::Chicago => 0,
            City::NewYorkCity => 1,
            City::Washington => 2,
        }
    }

    pub fn name(self) -> &'static str {
        CITY_DATA[self.position()].0
    }

    pub fn dataset_file(self) -> &'static str {
        CITY_DATA[self.position()].1
    }
}

impl FromStr for City {
    type Err = BikeshareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        City::ALL
            .into_iter()
            .find(|city| city.name() == key)
            .ok_or(BikeshareError::InvalidFilterInput {
                kind: "city",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Month ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthFilter {
    #[default]
    All,
    /// Index into [`MONTHS`], 1..=6.
    Month(usize),
}

impl MonthFilter {
    /// Calendar month number (january = 1) to keep, or `None` for no filter.
    pub fn month_number(self) -> Option<i32> {
        match self {
            MonthFilter::All => None,
            MonthFilter::Month(index) => Some(index as i32),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MonthFilter::All => MONTHS[0],
            MonthFilter::Month(index) => MONTHS[index],
        }
    }
}

impl FromStr for MonthFilter {
    type Err = BikeshareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match MONTHS.iter().position(|m| *m == normalize(s)) {
            Some(0) => Ok(MonthFilter::All),
            Some(index) => Ok(MonthFilter::Month(index)),
            None => Err(BikeshareError::InvalidFilterInput {
                kind: "month",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lower-case English name for a calendar month number (1–12).
pub fn month_name(number: i32) -> Option<String> {
    let number = u8::try_from(number).ok()?;
    let month = Month::try_from(number).ok()?;
    Some(month.name().to_lowercase())
}

// ── Day of week ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayFilter {
    #[default]
    All,
    /// Index into [`DAYS`], 1 (sunday) ..= 7 (saturday).
    Day(usize),
}

/// Monday-based code (0 = Monday … 6 = Sunday) for an index into [`DAYS`].
///
/// `DAYS` starts on sunday, so index 1 maps to 6 and index 2 maps to 0.
pub fn day_code_for_index(index: usize) -> i32 {
    debug_assert!((1..=DAYS_PER_WEEK).contains(&index));
    ((index + DAYS_PER_WEEK - 2) % DAYS_PER_WEEK) as i32
}

/// Inverse of [`day_code_for_index`].
pub fn day_index_for_code(code: i32) -> Option<usize> {
    let code = usize::try_from(code).ok().filter(|c| *c < DAYS_PER_WEEK)?;
    Some((code + 1) % DAYS_PER_WEEK + 1)
}

/// Day name for a Monday-based day-of-week code.
pub fn day_name_for_code(code: i32) -> Option<&'static str> {
    day_index_for_code(code).map(|index| DAYS[index])
}

impl DayFilter {
    /// Monday-based day-of-week code to keep, or `None` for no filter.
    pub fn day_code(self) -> Option<i32> {
        match self {
            DayFilter::All => None,
            DayFilter::Day(index) => Some(day_code_for_index(index)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DayFilter::All => DAYS[0],
            DayFilter::Day(index) => DAYS[index],
        }
    }
}

impl FromStr for DayFilter {
    type Err = BikeshareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match DAYS.iter().position(|d| *d == normalize(s)) {
            Some(0) => Ok(DayFilter::All),
            Some(index) => Ok(DayFilter::Day(index)),
            None => Err(BikeshareError::InvalidFilterInput {
                kind: "day",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DayFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A complete filter choice for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub city: City,
    #[serde(serialize_with = "serialize_display")]
    pub month: MonthFilter,
    #[serde(serialize_with = "serialize_display")]
    pub day: DayFilter,
}

fn serialize_display<T: fmt::Display, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn city_parse_is_case_insensitive() {
        assert_eq!("Chicago".parse::<City>().unwrap(), City::Chicago);
        assert_eq!("  NEW YORK CITY ".parse::<City>().unwrap(), City::NewYorkCity);
        assert_eq!("washington".parse::<City>().unwrap(), City::Washington);
    }

    #[test]
    fn city_parse_rejects_unknown() {
        let err = "boston".parse::<City>().unwrap_err();
        assert!(matches!(
            err,
            BikeshareError::InvalidFilterInput { kind: "city", .. }
        ));
    }

    #[test]
    fn city_dataset_files() {
        assert_eq!(City::Chicago.dataset_file(), "chicago.csv");
        assert_eq!(City::NewYorkCity.dataset_file(), "new_york_city.csv");
        assert_eq!(City::Washington.dataset_file(), "washington.csv");
    }

    #[test]
    fn month_numbers_follow_table_index() {
        assert_eq!("all".parse::<MonthFilter>().unwrap().month_number(), None);
        assert_eq!("January".parse::<MonthFilter>().unwrap().month_number(), Some(1));
        assert_eq!("june".parse::<MonthFilter>().unwrap().month_number(), Some(6));
    }

    #[test]
    fn month_parse_rejects_second_half_of_year() {
        assert!("july".parse::<MonthFilter>().is_err());
        assert!("".parse::<MonthFilter>().is_err());
    }

    #[test]
    fn month_name_covers_whole_year() {
        assert_eq!(month_name(1).as_deref(), Some("january"));
        assert_eq!(month_name(12).as_deref(), Some("december"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    #[test]
    fn day_codes_match_monday_based_numbering() {
        let expected = [
            ("sunday", Weekday::Sun),
            ("monday", Weekday::Mon),
            ("tuesday", Weekday::Tue),
            ("wednesday", Weekday::Wed),
            ("thursday", Weekday::Thu),
            ("friday", Weekday::Fri),
            ("saturday", Weekday::Sat),
        ];
        for (name, weekday) in expected {
            let filter: DayFilter = name.parse().unwrap();
            assert_eq!(
                filter.day_code(),
                Some(weekday.num_days_from_monday() as i32),
                "{name}"
            );
        }
    }

    #[test]
    fn sunday_and_monday_boundaries() {
        assert_eq!(day_code_for_index(1), 6);
        assert_eq!(day_code_for_index(2), 0);
        assert_eq!(day_code_for_index(7), 5);
    }

    #[test]
    fn day_code_round_trips_through_name() {
        for name in &DAYS[1..] {
            let code = name.parse::<DayFilter>().unwrap().day_code().unwrap();
            assert_eq!(day_name_for_code(code), Some(*name));
        }
    }

    #[test]
    fn day_name_rejects_out_of_range_codes() {
        assert_eq!(day_name_for_code(-1), None);
        assert_eq!(day_name_for_code(7), None);
    }

    #[test]
    fn all_sentinel_parses_to_no_filter() {
        assert_eq!("ALL".parse::<DayFilter>().unwrap(), DayFilter::All);
        assert_eq!(DayFilter::All.day_code(), None);
    }

    #[test]
    fn selection_serializes_filter_names() {
        let selection = Selection {
            city: City::NewYorkCity,
            month: MonthFilter::Month(3),
            day: DayFilter::All,
        };
        let json = serde_json::to_value(selection).unwrap();
        assert_eq!(json["city"], "new_york_city");
        assert_eq!(json["month"], "march");
        assert_eq!(json["day"], "all");
    }
}
