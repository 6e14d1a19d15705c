/// Column-name constants for the bikeshare trip datasets.
/// Raw names are the data provider's contract and must match the CSV headers exactly.

// ── Raw trip columns ────────────────────────────────────────────────────────
pub mod trip {
    pub const START_TIME: &str = "Start Time";
    pub const END_TIME: &str = "End Time";
    pub const START_STATION: &str = "Start Station";
    pub const END_STATION: &str = "End Station";
    pub const USER_TYPE: &str = "User Type";
    pub const GENDER: &str = "Gender";
    pub const BIRTH_YEAR: &str = "Birth Year";

    pub const REQUIRED: [&str; 5] = [START_TIME, END_TIME, START_STATION, END_STATION, USER_TYPE];

    /// Timestamp columns, in the order they are parsed.
    pub const TIMESTAMPS: [&str; 2] = [START_TIME, END_TIME];
}

// ── Derived columns ─────────────────────────────────────────────────────────
pub mod derived {
    pub const MONTH: &str = "month";
    pub const DAY_OF_WEEK: &str = "day_of_week";
    pub const HOUR: &str = "hour";
    pub const ROUTE: &str = "route";
    pub const DURATION_MINUTES: &str = "duration_minutes";

    pub const ROUTE_SEPARATOR: &str = "-";
}

// ── Formats ─────────────────────────────────────────────────────────────────
pub mod format {
    pub const DEFAULT_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";
}
