mod config;
use log::{debug, warn};

use std::collections::HashSet;

use chrono::{Datelike, Local, NaiveDate};

pub mod builder;
pub mod manual;

pub use crate::config::*;

// ********* Row allocation ***********

/// Computes the row to propose for the next signature recorded on a sheet.
///
/// Arguments:
/// * `occupied` the rows already recorded for the sheet, in any order. Duplicates and
/// values outside of the sheet are tolerated.
///
/// The rows after the highest occupied row are tried first, in increasing order. If none
/// of them is free, the whole sheet is scanned again from the top, which fills the gaps
/// left by skipped or corrected rows. A full sheet yields `DEFAULT_ROW`, which then collides
/// with an occupied row (see `is_sheet_full`).
///
/// The result is always in `1..=SHEET_CAPACITY`.
pub fn next_available_row(occupied: &[i64]) -> u32 {
    let capacity = SHEET_CAPACITY as i64;
    let high = match occupied.iter().max() {
        Some(h) => *h,
        None => return DEFAULT_ROW,
    };
    let taken: HashSet<i64> = occupied.iter().cloned().collect();

    // Start at the first real row when everything is out of range below the sheet.
    let start = high.saturating_add(1).max(1);
    let row = (start..=capacity)
        .find(|r| !taken.contains(r))
        .or_else(|| (1..=capacity).find(|r| !taken.contains(r)))
        .map(|r| r as u32)
        .unwrap_or(DEFAULT_ROW);
    debug!(
        "next_available_row: occupied: {:?} high: {:?} row: {:?}",
        occupied, high, row
    );
    row
}

/// True when every row of the sheet has been recorded.
pub fn is_sheet_full(occupied: &[i64]) -> bool {
    (1..=SHEET_CAPACITY as i64).all(|r| occupied.contains(&r))
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AssignmentSource {
    /// Computed from the rows recorded for the sheet.
    Computed,
    /// Nothing was known about the sheet.
    Default,
}

/// The row proposed to the operator. It is advisory: the operator may pick another row
/// before the signature is submitted.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct RowAssignment {
    pub row: u32,
    pub source: AssignmentSource,
    pub sheet_full: bool,
}

impl RowAssignment {
    pub const DEFAULT: RowAssignment = RowAssignment {
        row: DEFAULT_ROW,
        source: AssignmentSource::Default,
        sheet_full: false,
    };

    /// The proposed row is already taken. This only happens on a full sheet.
    pub fn is_collision(&self) -> bool {
        self.sheet_full
    }
}

/// Proposes a row for a sheet.
///
/// `None` stands for missing occupancy data (no sheet number, failed lookup, ...)
/// and falls back to the first row instead of running the allocator on unknown data.
pub fn assign_row(occupancy: Option<&[i64]>) -> RowAssignment {
    match occupancy {
        None => RowAssignment::DEFAULT,
        Some(rows) => {
            let sheet_full = is_sheet_full(rows);
            if sheet_full {
                warn!(
                    "assign_row: all {} rows are taken, proposing row {}",
                    SHEET_CAPACITY, DEFAULT_ROW
                );
            }
            RowAssignment {
                row: next_available_row(rows),
                source: AssignmentSource::Computed,
                sheet_full,
            }
        }
    }
}

// ********* Collection dates ***********

/// The date written in the header of a sheet. Any part may be left empty.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct DateHeader {
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub year: Option<i32>,
}

impl DateHeader {
    /// Header prefilled from a day: month and year only, the day is left to the operator.
    pub fn prefilled(today: NaiveDate) -> DateHeader {
        DateHeader {
            month: Some(today.month()),
            day: None,
            year: Some(today.year()),
        }
    }

    pub fn current() -> DateHeader {
        DateHeader::prefilled(Local::now().date_naive())
    }

    /// The collection date recorded with a signature.
    ///
    /// A missing day is the first of the month, a missing month is January.
    /// Without a year there is no date.
    pub fn collection_date(&self) -> Result<Option<NaiveDate>, RecordError> {
        let (year, month, day) = match (self.year, self.month, self.day) {
            (None, _, _) => return Ok(None),
            (Some(y), Some(m), d) => (y, m, d.unwrap_or(1)),
            // The day is meaningless without a month.
            (Some(y), None, _) => (y, 1, 1),
        };
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Some)
            .ok_or_else(|| RecordError::InvalidDate(format!("{:04}-{:02}-{:02}", year, month, day)))
    }
}

// ********* Intake statistics ***********

/// The share of one status in the recorded signatures.
#[derive(PartialEq, Debug, Clone)]
pub struct StatusShare {
    pub status: String,
    pub count: u64,
    pub percent: f64,
}

/// Totals the per-status counts reported by the server.
pub fn status_shares(counts: &[(String, u64)]) -> (u64, Vec<StatusShare>) {
    let total: u64 = counts.iter().map(|(_, c)| *c).sum();
    let shares = counts
        .iter()
        .map(|(status, count)| StatusShare {
            status: status.clone(),
            count: *count,
            percent: percent_of(*count, total),
        })
        .collect();
    (total, shares)
}

/// Progress towards the matched-signature goal, capped at 100.
pub fn matched_progress(matched: u64, goal: u64) -> f64 {
    if goal == 0 {
        return 100.0;
    }
    percent_of(matched, goal).min(100.0)
}

/// Signatures recorded on one sheet, and how many of them matched a voter.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct SheetTally {
    pub sheet_number: u64,
    pub total: u64,
    pub valid: u64,
}

impl SheetTally {
    pub fn valid_rate(&self) -> f64 {
        percent_of(self.valid, self.total)
    }
}

fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}
