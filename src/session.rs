//! The interactive prompt loop.

use std::io::{BufRead, Write};
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::BikeshareError;
use crate::filter::{City, DayFilter, MonthFilter, Selection};
use crate::loader::TripLoader;
use crate::report::{render, Summary};
use crate::table::FilteredTable;

pub const DEFAULT_PAGE_SIZE: usize = 5;

const RULE: usize = 60;

/// Drives prompts over any reader/writer pair.
///
/// End of input at any prompt is treated as the user declining, so a closed
/// stdin ends the session instead of looping.
pub struct Session<R, W> {
    loader: TripLoader,
    input: R,
    output: W,
    page_size: usize,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(loader: TripLoader, input: R, output: W) -> Self {
        Self {
            loader,
            input,
            output,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run analyses until the user declines to restart.
    pub fn run(&mut self) -> Result<(), BikeshareError> {
        loop {
            let Some(selection) = self.ask_selection()? else {
                return Ok(());
            };

            match self.loader.load(selection.city, selection.month, selection.day) {
                Ok(table) => self.report(&table, selection)?,
                Err(e) => {
                    warn!(error = %e, "analysis run failed");
                    writeln!(self.output, "\nCould not load data: {e}")?;
                }
            }

            if !self.confirm("\nWould you like to restart? Enter yes or no.\n")? {
                return Ok(());
            }
        }
    }

    fn report(&mut self, table: &FilteredTable, selection: Selection) -> Result<(), BikeshareError> {
        let summary = Summary::compute(table, selection)?;
        render(&summary, &mut self.output)?;

        if self.confirm("\nWould you like to see raw data? Enter yes or no:")? {
            self.page_raw(table)?;
        }
        Ok(())
    }

    /// Show raw rows a page at a time until the user stops or the table ends.
    fn page_raw(&mut self, table: &FilteredTable) -> Result<(), BikeshareError> {
        let mut offset = 0;
        loop {
            let page = table.page(offset, self.page_size);
            writeln!(self.output, "{page}")?;
            offset += self.page_size;
            if offset >= table.height() {
                return Ok(());
            }
            let question = format!(
                "\nWould you like to see next {} rows of data? Enter yes or no:",
                self.page_size
            );
            if !self.confirm(&question)? {
                return Ok(());
            }
        }
    }

    // ── Prompts ─────────────────────────────────────────────────────────────

    fn ask_selection(&mut self) -> Result<Option<Selection>, BikeshareError> {
        writeln!(self.output, "Hello! Let's explore some US bikeshare data!")?;
        let Some(city) = self.ask::<City>("Select city (Chicago, New York City, Washington):")? else {
            return Ok(None);
        };
        let Some(month) = self.ask::<MonthFilter>("Select month to filter by (all, January-June):")?
        else {
            return Ok(None);
        };
        let Some(day) = self.ask::<DayFilter>("Select day to filter by (all, Sunday-Saturday):")? else {
            return Ok(None);
        };
        writeln!(self.output, "{}", "-".repeat(RULE))?;
        Ok(Some(Selection { city, month, day }))
    }

    /// Re-prompt until the answer parses. `None` at end of input.
    fn ask<T: FromStr<Err = BikeshareError>>(
        &mut self,
        question: &str,
    ) -> Result<Option<T>, BikeshareError> {
        loop {
            let Some(answer) = self.read_answer(question)? else {
                return Ok(None);
            };
            match answer.parse() {
                Ok(value) => return Ok(Some(value)),
                Err(e) => debug!(error = %e, "re-prompting"),
            }
        }
    }

    /// Only "yes" (any case) counts as agreement.
    fn confirm(&mut self, question: &str) -> Result<bool, BikeshareError> {
        Ok(self
            .read_answer(question)?
            .is_some_and(|answer| answer.eq_ignore_ascii_case("yes")))
    }

    fn read_answer(&mut self, question: &str) -> Result<Option<String>, BikeshareError> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}
