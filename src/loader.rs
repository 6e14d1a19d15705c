use std::path::{Path, PathBuf};

use polars::datatypes::TimeUnit;
use polars::prelude::*;
use tracing::{debug, info, instrument};

use crate::error::BikeshareError;
use crate::filter::{City, DayFilter, MonthFilter};
use crate::schema::{derived, format, trip};
use crate::table::{DatasetCapabilities, FilteredTable};

const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// Loads a city's trip CSV and turns it into a [`FilteredTable`].
///
/// Loading is all-or-nothing: a missing or unparseable start/end timestamp
/// anywhere in the file fails the whole load with
/// [`BikeshareError::MalformedRecord`].
#[derive(Debug, Clone)]
pub struct TripLoader {
    base_path: PathBuf,
    timestamp_format: String,
}

impl TripLoader {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            timestamp_format: format::DEFAULT_TIMESTAMP.to_string(),
        }
    }

    /// Format used to parse `Start Time` and `End Time`, e.g. `"%Y-%m-%d %H:%M:%S"`.
    pub fn with_timestamp_format(mut self, timestamp_format: impl Into<String>) -> Self {
        self.timestamp_format = timestamp_format.into();
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn dataset_path(&self, city: City) -> PathBuf {
        self.base_path.join(city.dataset_file())
    }

    // ── Loading ─────────────────────────────────────────────────────────────

    /// Load `city` and keep only the rows matching `month` and `day`.
    #[instrument(skip_all, fields(city = %city, month = %month, day = %day))]
    pub fn load(
        &self,
        city: City,
        month: MonthFilter,
        day: DayFilter,
    ) -> Result<FilteredTable, BikeshareError> {
        let path = self.dataset_path(city);
        if !path.is_file() {
            return Err(BikeshareError::DatasetNotFound {
                city: city.name().to_string(),
                path,
            });
        }

        let raw = read_csv_as_strings(&path)?;
        info!(path = %path.display(), rows = raw.height(), "dataset read");

        let table = self.prepare(raw, month, day)?;
        info!(rows = table.height(), "filters applied");
        Ok(table)
    }

    /// Like [`load`](Self::load) but takes the raw strings a user typed.
    ///
    /// An unknown city is reported as [`BikeshareError::DatasetNotFound`];
    /// an unknown month or day as [`BikeshareError::InvalidFilterInput`].
    pub fn load_named(
        &self,
        city: &str,
        month: &str,
        day: &str,
    ) -> Result<FilteredTable, BikeshareError> {
        let city: City = city.parse().map_err(|_| BikeshareError::DatasetNotFound {
            city: city.to_string(),
            path: self.base_path.clone(),
        })?;
        self.load(city, month.parse()?, day.parse()?)
    }

    /// Parse, derive and filter an all-string trip frame.
    pub fn prepare(
        &self,
        raw: DataFrame,
        month: MonthFilter,
        day: DayFilter,
    ) -> Result<FilteredTable, BikeshareError> {
        require_columns(&raw, &trip::REQUIRED)?;
        let capabilities = DatasetCapabilities::from_schema(&raw.schema());

        let mut df = raw.clone();
        for column in trip::TIMESTAMPS {
            df = parse_datetime_column(df, column, &self.timestamp_format)?;
            ensure_parsed(&raw, &df, column)?;
        }

        if capabilities.has_birth_year {
            df = parse_year_column(df, trip::BIRTH_YEAR)?;
        }

        let mut lazy = df.lazy().with_columns(derived_columns());

        if let Some(number) = month.month_number() {
            debug!(month = number, "filtering by month");
            lazy = lazy.filter(col(derived::MONTH).eq(lit(number)));
        }
        if let Some(code) = day.day_code() {
            debug!(day_of_week = code, "filtering by day of week");
            lazy = lazy.filter(col(derived::DAY_OF_WEEK).eq(lit(code)));
        }

        let frame = lazy.collect()?;
        Ok(FilteredTable::new(frame, capabilities))
    }
}

// ── Derived columns ─────────────────────────────────────────────────────────

fn derived_columns() -> [Expr; 5] {
    let start = || col(trip::START_TIME);
    [
        start().dt().month().cast(DataType::Int32).alias(derived::MONTH),
        // ISO weekday is 1 = Monday .. 7 = Sunday
        (start().dt().weekday().cast(DataType::Int32) - lit(1i32)).alias(derived::DAY_OF_WEEK),
        start().dt().hour().cast(DataType::Int32).alias(derived::HOUR),
        concat_str(
            [col(trip::START_STATION), col(trip::END_STATION)],
            derived::ROUTE_SEPARATOR,
            false,
        )
        .alias(derived::ROUTE),
        // Datetime columns are microseconds since the epoch once cast to Int64.
        ((col(trip::END_TIME).cast(DataType::Int64) - start().cast(DataType::Int64))
            .cast(DataType::Float64)
            / lit(MICROS_PER_MINUTE))
        .alias(derived::DURATION_MINUTES),
    ]
}

// ── Private helpers ─────────────────────────────────────────────────────────

/// Read a CSV file with all columns as String dtype.
/// Trims whitespace from column names.
fn read_csv_as_strings(path: &Path) -> Result<DataFrame, BikeshareError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), BikeshareError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(BikeshareError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

/// Parse a string column to Datetime. Cells that do not match `format` become null.
fn parse_datetime_column(
    df: DataFrame,
    column: &str,
    format: &str,
) -> Result<DataFrame, BikeshareError> {
    let df = df
        .lazy()
        .with_columns([col(column)
            .str()
            .strip_chars(lit(" \t\r\n"))
            .str()
            .to_datetime(
                Some(TimeUnit::Microseconds),
                None,
                StrptimeOptions {
                    format: Some(format.into()),
                    strict: false,
                    ..Default::default()
                },
                lit("raise"),
            )])
        .collect()?;
    Ok(df)
}

/// Fail on the first row whose timestamp is null after parsing.
fn ensure_parsed(raw: &DataFrame, parsed: &DataFrame, column: &str) -> Result<(), BikeshareError> {
    let parsed_col = parsed.column(column)?;
    if parsed_col.null_count() == 0 {
        return Ok(());
    }

    let row_index = parsed_col
        .is_null()
        .into_iter()
        .position(|is_null| is_null == Some(true))
        .unwrap_or_default();
    let raw_value = raw
        .column(column)?
        .str()?
        .get(row_index)
        .map(|s| s.to_string());

    Err(BikeshareError::MalformedRecord {
        column: column.to_string(),
        row_index,
        raw: raw_value,
    })
}

/// Parse a year column such as `"1989"` or `"1989.0"` to Int32. Unparseable cells become null.
fn parse_year_column(df: DataFrame, column: &str) -> Result<DataFrame, BikeshareError> {
    let df = df
        .lazy()
        .with_columns([col(column)
            .str()
            .strip_chars(lit(" \t\r\n"))
            .cast(DataType::Float64)
            .cast(DataType::Int32)])
        .collect()?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str = "Start Time,End Time,Trip Duration,Start Station,End Station,User Type";

    fn raw_trips(starts: &[&str], ends: &[&str]) -> DataFrame {
        let n = starts.len();
        df!(
            trip::START_TIME => starts,
            trip::END_TIME => ends,
            trip::START_STATION => vec!["Clark St"; n],
            trip::END_STATION => vec!["Lake St"; n],
            trip::USER_TYPE => vec!["Subscriber"; n],
        )
        .unwrap()
    }

    fn write_city(dir: &TempDir, city: City, content: &str) {
        let mut f = std::fs::File::create(dir.path().join(city.dataset_file())).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    fn f64_column(table: &FilteredTable, name: &str) -> Vec<f64> {
        table
            .frame()
            .column(name)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    fn i32_column(table: &FilteredTable, name: &str) -> Vec<i32> {
        table
            .frame()
            .column(name)
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    #[test]
    fn duration_in_fractional_minutes() {
        let raw = raw_trips(&["2024-01-01 00:00:00"], &["2024-01-01 00:05:30"]);
        let table = TripLoader::new(".")
            .prepare(raw, MonthFilter::All, DayFilter::All)
            .unwrap();
        assert_eq!(f64_column(&table, derived::DURATION_MINUTES), vec![5.5]);
    }

    #[test]
    fn negative_duration_is_kept() {
        let raw = raw_trips(&["2024-01-01 00:10:00"], &["2024-01-01 00:00:00"]);
        let table = TripLoader::new(".")
            .prepare(raw, MonthFilter::All, DayFilter::All)
            .unwrap();
        assert_eq!(f64_column(&table, derived::DURATION_MINUTES), vec![-10.0]);
    }

    #[test]
    fn calendar_fields_from_start_time() {
        // 2017-06-25 is a Sunday, 2017-03-06 a Monday
        let raw = raw_trips(
            &["2017-06-25 23:59:00", "2017-03-06 07:15:00"],
            &["2017-06-26 00:10:00", "2017-03-06 07:30:00"],
        );
        let table = TripLoader::new(".")
            .prepare(raw, MonthFilter::All, DayFilter::All)
            .unwrap();
        assert_eq!(i32_column(&table, derived::MONTH), vec![6, 3]);
        assert_eq!(i32_column(&table, derived::DAY_OF_WEEK), vec![6, 0]);
        assert_eq!(i32_column(&table, derived::HOUR), vec![23, 7]);
    }

    #[test]
    fn route_joins_stations() {
        let raw = raw_trips(&["2017-01-02 08:00:00"], &["2017-01-02 08:20:00"]);
        let table = TripLoader::new(".")
            .prepare(raw, MonthFilter::All, DayFilter::All)
            .unwrap();
        let route = table.frame().column(derived::ROUTE).unwrap().str().unwrap().get(0);
        assert_eq!(route, Some("Clark St-Lake St"));
    }

    #[test]
    fn sunday_filter_keeps_sunday_rows() {
        let raw = raw_trips(
            &["2017-06-25 10:00:00", "2017-06-26 10:00:00", "2017-06-24 10:00:00"],
            &["2017-06-25 10:30:00", "2017-06-26 10:30:00", "2017-06-24 10:30:00"],
        );
        let loader = TripLoader::new(".");

        let sunday = loader
            .prepare(raw.clone(), MonthFilter::All, "sunday".parse().unwrap())
            .unwrap();
        assert_eq!(sunday.height(), 1);
        assert_eq!(i32_column(&sunday, derived::DAY_OF_WEEK), vec![6]);

        let monday = loader
            .prepare(raw, MonthFilter::All, "monday".parse().unwrap())
            .unwrap();
        assert_eq!(i32_column(&monday, derived::DAY_OF_WEEK), vec![0]);
    }

    #[test]
    fn month_filter_may_empty_the_table() {
        let raw = raw_trips(&["2017-01-02 08:00:00"], &["2017-01-02 08:20:00"]);
        let table = TripLoader::new(".")
            .prepare(raw, "june".parse().unwrap(), DayFilter::All)
            .unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn malformed_timestamp_aborts_with_row() {
        let raw = raw_trips(
            &["2017-01-02 08:00:00", "not a time"],
            &["2017-01-02 08:20:00", "2017-01-02 09:00:00"],
        );
        let err = TripLoader::new(".")
            .prepare(raw, MonthFilter::All, DayFilter::All)
            .unwrap_err();
        match err {
            BikeshareError::MalformedRecord {
                column,
                row_index,
                raw,
            } => {
                assert_eq!(column, trip::START_TIME);
                assert_eq!(row_index, 1);
                assert_eq!(raw.as_deref(), Some("not a time"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_end_time_is_malformed() {
        let raw = df!(
            trip::START_TIME => ["2017-01-02 08:00:00"],
            trip::END_TIME => [None::<&str>],
            trip::START_STATION => ["A"],
            trip::END_STATION => ["B"],
            trip::USER_TYPE => ["Customer"],
        )
        .unwrap();
        let err = TripLoader::new(".")
            .prepare(raw, MonthFilter::All, DayFilter::All)
            .unwrap_err();
        assert!(matches!(
            err,
            BikeshareError::MalformedRecord { row_index: 0, raw: None, .. }
        ));
    }

    #[test]
    fn custom_timestamp_format() {
        let raw = raw_trips(&["01/02/2017 08:00"], &["01/02/2017 08:45"]);
        let table = TripLoader::new(".")
            .with_timestamp_format("%m/%d/%Y %H:%M")
            .prepare(raw, MonthFilter::All, DayFilter::All)
            .unwrap();
        assert_eq!(f64_column(&table, derived::DURATION_MINUTES), vec![45.0]);
    }

    #[test]
    fn missing_required_column() {
        let raw = df!(trip::START_TIME => ["2017-01-02 08:00:00"]).unwrap();
        let err = TripLoader::new(".")
            .prepare(raw, MonthFilter::All, DayFilter::All)
            .unwrap_err();
        assert!(matches!(err, BikeshareError::MissingColumn(c) if c == trip::END_TIME));
    }

    #[test]
    fn birth_year_parsed_leniently() {
        let raw = df!(
            trip::START_TIME => ["2017-01-02 08:00:00", "2017-01-02 09:00:00", "2017-01-02 10:00:00"],
            trip::END_TIME => ["2017-01-02 08:10:00", "2017-01-02 09:10:00", "2017-01-02 10:10:00"],
            trip::START_STATION => ["A", "A", "A"],
            trip::END_STATION => ["B", "B", "B"],
            trip::USER_TYPE => ["Subscriber", "Subscriber", "Customer"],
            trip::GENDER => [Some("Female"), None, Some("Male")],
            trip::BIRTH_YEAR => [Some("1989.0"), Some(""), None],
        )
        .unwrap();
        let table = TripLoader::new(".")
            .prepare(raw, MonthFilter::All, DayFilter::All)
            .unwrap();
        assert!(table.capabilities().has_demographics());
        let years: Vec<Option<i32>> = table
            .frame()
            .column(trip::BIRTH_YEAR)
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(years, vec![Some(1989), None, None]);
    }

    #[test]
    fn load_reads_city_file() {
        let dir = TempDir::new().unwrap();
        write_city(
            &dir,
            City::Washington,
            &format!(
                "{HEADER}\n 2017-04-05 12:00:00 ,2017-04-05 12:10:00,600,A,B,Subscriber\n2017-05-05 12:00:00,2017-05-05 12:20:00,1200,B,A,Customer\n"
            ),
        );
        let loader = TripLoader::new(dir.path());
        let table = loader
            .load(City::Washington, "april".parse().unwrap(), DayFilter::All)
            .unwrap();
        assert_eq!(table.height(), 1);
        assert!(!table.capabilities().has_gender);
        assert_eq!(f64_column(&table, derived::DURATION_MINUTES), vec![10.0]);
    }

    #[test]
    fn load_trims_header_names() {
        let dir = TempDir::new().unwrap();
        write_city(
            &dir,
            City::Chicago,
            "Start Time , End Time,Start Station,End Station,User Type \n2017-04-05 12:00:00,2017-04-05 12:10:00,A,B,Subscriber\n",
        );
        let table = TripLoader::new(dir.path())
            .load(City::Chicago, MonthFilter::All, DayFilter::All)
            .unwrap();
        assert_eq!(table.height(), 1);
    }

    #[test]
    fn load_missing_file_is_dataset_not_found() {
        let dir = TempDir::new().unwrap();
        let err = TripLoader::new(dir.path())
            .load(City::Chicago, MonthFilter::All, DayFilter::All)
            .unwrap_err();
        assert!(matches!(err, BikeshareError::DatasetNotFound { .. }));
    }

    #[test]
    fn load_named_rejects_unknown_city_and_day() {
        let dir = TempDir::new().unwrap();
        let loader = TripLoader::new(dir.path());
        assert!(matches!(
            loader.load_named("boston", "all", "all"),
            Err(BikeshareError::DatasetNotFound { .. })
        ));

        write_city(&dir, City::Chicago, &format!("{HEADER}\n"));
        assert!(matches!(
            loader.load_named("chicago", "all", "someday"),
            Err(BikeshareError::InvalidFilterInput { kind: "day", .. })
        ));
        assert!(loader.load_named("Chicago", "ALL", "all").unwrap().is_empty());
    }
}
