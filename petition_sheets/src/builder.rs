pub use crate::config::*;

use chrono::NaiveDate;

/// A builder for signature records.
///
/// The sheet and row are checked as they are added; the collection date is
/// required when the record is built.
///
/// ```
/// use chrono::NaiveDate;
/// use petition_sheets::builder::RecordBuilder;
/// # use petition_sheets::RecordError;
///
/// let record = RecordBuilder::new(1042)?
///     .row(3)?
///     .collected_on(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
///     .last_four("1234")?
///     .build_match("OH0012345")?;
///
/// assert_eq!(record.line.row_number, 3);
///
/// # Ok::<(), RecordError>(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RecordBuilder {
    sheet_number: u64,
    row_number: Option<u32>,
    date_collected: Option<NaiveDate>,
    last_four_ssn: Option<String>,
}

impl RecordBuilder {
    pub fn new(sheet_number: u64) -> Result<RecordBuilder, RecordError> {
        if sheet_number == 0 {
            return Err(RecordError::InvalidSheet(sheet_number));
        }
        Ok(RecordBuilder {
            sheet_number,
            row_number: None,
            date_collected: None,
            last_four_ssn: None,
        })
    }

    /// Sets the row. The operator may override a proposed row, but not with
    /// a row that is not printed on the sheet.
    pub fn row(self, row: u32) -> Result<RecordBuilder, RecordError> {
        if row < 1 || row > SHEET_CAPACITY {
            return Err(RecordError::InvalidRow(row));
        }
        Ok(RecordBuilder {
            row_number: Some(row),
            ..self
        })
    }

    pub fn collected_on(self, date: NaiveDate) -> RecordBuilder {
        RecordBuilder {
            date_collected: Some(date),
            ..self
        }
    }

    /// Sets the last four digits of the signer's SSN. An empty value leaves it unset.
    pub fn last_four(self, digits: &str) -> Result<RecordBuilder, RecordError> {
        let digits = digits.trim();
        if digits.is_empty() {
            return Ok(RecordBuilder {
                last_four_ssn: None,
                ..self
            });
        }
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(RecordError::InvalidLastFour(digits.to_string()));
        }
        Ok(RecordBuilder {
            last_four_ssn: Some(digits.to_string()),
            ..self
        })
    }

    fn line(&self) -> Result<SheetLine, RecordError> {
        Ok(SheetLine {
            sheet_number: self.sheet_number,
            row_number: self.row_number.ok_or(RecordError::MissingField("row_number"))?,
            date_collected: self
                .date_collected
                .ok_or(RecordError::MissingField("date_collected"))?,
            last_four_ssn: self.last_four_ssn.clone(),
        })
    }

    pub fn build_match(&self, voter_id: &str) -> Result<MatchRecord, RecordError> {
        let voter_id = voter_id.trim();
        if voter_id.is_empty() {
            return Err(RecordError::MissingField("voter_id"));
        }
        Ok(MatchRecord {
            line: self.line()?,
            voter_id: voter_id.to_string(),
        })
    }

    /// Builds a record for a signer that could not be found in the voter file.
    ///
    /// First and last name are required; empty optional fields are dropped.
    pub fn build_not_found(&self, person: &PersonDetails) -> Result<NotFoundRecord, RecordError> {
        if person.first_name.trim().is_empty() {
            return Err(RecordError::MissingField("first_name"));
        }
        if person.last_name.trim().is_empty() {
            return Err(RecordError::MissingField("last_name"));
        }
        let clean = |x: &Option<String>| {
            x.as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        Ok(NotFoundRecord {
            line: self.line()?,
            person: PersonDetails {
                first_name: person.first_name.trim().to_string(),
                middle_name: clean(&person.middle_name),
                last_name: person.last_name.trim().to_string(),
                address: clean(&person.address),
                apartment_number: clean(&person.apartment_number),
                city: clean(&person.city),
                state: clean(&person.state),
                zip_code: clean(&person.zip_code),
            },
        })
    }
}
