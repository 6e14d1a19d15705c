//! Exploratory statistics over bikeshare trip logs.
//!
//! A [`TripLoader`] reads a city's CSV, derives calendar, route and duration
//! columns and applies month/day filters. The [`stats`] functions summarize the
//! resulting [`FilteredTable`], and [`Session`] wraps both in the interactive
//! prompt loop.

mod error;
pub mod filter;
mod loader;
pub mod report;
pub mod schema;
mod session;
pub mod stats;
mod table;

pub use error::BikeshareError;
pub use filter::{City, DayFilter, MonthFilter, Selection};
pub use loader::TripLoader;
pub use report::{render, Summary};
pub use session::{Session, DEFAULT_PAGE_SIZE};
pub use table::{DatasetCapabilities, FilteredTable};
