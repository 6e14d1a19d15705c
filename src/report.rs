//! Console and JSON rendering of the four statistics sections.

use std::io::Write;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::error::BikeshareError;
use crate::filter::Selection;
use crate::stats::{
    station_stats, time_stats, trip_duration_stats, user_stats, CategoryCount, Demographics,
    DurationStats, StationStats, TimeStats, UserStats,
};
use crate::table::FilteredTable;

const NO_DATA: &str = "No data available for the selected filters.";
const SECTION_RULE: usize = 40;

/// Wall-clock time spent computing each section.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionTimings {
    pub time: Duration,
    pub stations: Duration,
    pub duration: Duration,
    pub users: Duration,
}

/// All statistics for one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub selection: Selection,
    pub rows: usize,
    pub time: Option<TimeStats>,
    pub stations: Option<StationStats>,
    pub duration: Option<DurationStats>,
    pub users: UserStats,
    #[serde(skip)]
    pub timings: SectionTimings,
}

fn timed<T>(
    f: impl FnOnce() -> Result<T, BikeshareError>,
) -> Result<(T, Duration), BikeshareError> {
    let start = Instant::now();
    let value = f()?;
    Ok((value, start.elapsed()))
}

impl Summary {
    pub fn compute(table: &FilteredTable, selection: Selection) -> Result<Self, BikeshareError> {
        let (time, time_elapsed) = timed(|| time_stats(table))?;
        let (stations, stations_elapsed) = timed(|| station_stats(table))?;
        let (duration, duration_elapsed) = timed(|| trip_duration_stats(table))?;
        let (users, users_elapsed) = timed(|| user_stats(table))?;
        debug!(rows = table.height(), "summary computed");

        Ok(Self {
            selection,
            rows: table.height(),
            time,
            stations,
            duration,
            users,
            timings: SectionTimings {
                time: time_elapsed,
                stations: stations_elapsed,
                duration: duration_elapsed,
                users: users_elapsed,
            },
        })
    }
}

// ── Text rendering ──────────────────────────────────────────────────────────

fn write_footer(out: &mut impl Write, elapsed: Duration) -> std::io::Result<()> {
    writeln!(out, "\nThis took {} seconds.", elapsed.as_secs_f64())?;
    writeln!(out, "{}", "-".repeat(SECTION_RULE))
}

fn write_counts(out: &mut impl Write, title: &str, counts: &[CategoryCount]) -> std::io::Result<()> {
    writeln!(out, "{title}")?;
    if counts.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for c in counts {
        writeln!(out, "  {}: {}", c.category, c.count)?;
    }
    writeln!(out)
}

fn write_time(out: &mut impl Write, stats: Option<&TimeStats>) -> std::io::Result<()> {
    writeln!(out, "\nCalculating The Most Frequent Times of Travel...\n")?;
    match stats {
        Some(s) => {
            writeln!(out, "Most common month: {}", s.month_name)?;
            writeln!(out, "Most common day of week: {}", s.day_name)?;
            writeln!(out, "Most common start hour (0-23): {}", s.hour)
        }
        None => writeln!(out, "{NO_DATA}"),
    }
}

fn write_stations(out: &mut impl Write, stats: Option<&StationStats>) -> std::io::Result<()> {
    writeln!(out, "\nCalculating The Most Popular Stations and Trip...\n")?;
    match stats {
        Some(s) => {
            writeln!(out, "Most commonly used start station: {}", s.start_station)?;
            writeln!(out, "Most commonly used end station: {}", s.end_station)?;
            writeln!(out, "Most common route: {}", s.route)
        }
        None => writeln!(out, "{NO_DATA}"),
    }
}

fn write_duration(out: &mut impl Write, stats: Option<&DurationStats>) -> std::io::Result<()> {
    writeln!(out, "\nCalculating Trip Duration...\n")?;
    match stats {
        Some(s) => {
            writeln!(out, "Total travel time in minutes: {}", s.total_minutes)?;
            writeln!(out, "Average travel time in minutes: {}", s.mean_minutes)
        }
        None => writeln!(out, "{NO_DATA}"),
    }
}

fn write_users(out: &mut impl Write, stats: &UserStats) -> std::io::Result<()> {
    writeln!(out, "\nCalculating User Stats...\n")?;
    write_counts(out, "Counts of user types:", &stats.user_types)?;

    match &stats.demographics {
        Demographics::Unavailable => {
            writeln!(out, "Gender and birth year data not available in this dataset")
        }
        Demographics::Available {
            genders,
            birth_years,
        } => {
            write_counts(out, "Counts of gender:", genders)?;
            match birth_years {
                Some(b) => {
                    writeln!(out, "Earliest year of birth: {}", b.earliest)?;
                    writeln!(out, "Most recent year of birth: {}", b.most_recent)?;
                    writeln!(out, "Most common year of birth: {}", b.most_common)
                }
                None => writeln!(out, "No birth year data for the selected filters."),
            }
        }
    }
}

/// Write the summary as console text, one section at a time.
pub fn render(summary: &Summary, out: &mut impl Write) -> std::io::Result<()> {
    let t = &summary.timings;
    write_time(out, summary.time.as_ref())?;
    write_footer(out, t.time)?;
    write_stations(out, summary.stations.as_ref())?;
    write_footer(out, t.stations)?;
    write_duration(out, summary.duration.as_ref())?;
    write_footer(out, t.duration)?;
    write_users(out, &summary.users)?;
    write_footer(out, t.users)
}
