// ********* Sheet layout ***********

use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;

/// Number of signature lines printed on one petition sheet.
pub const SHEET_CAPACITY: u32 = 12;

/// The row proposed when nothing is known about a sheet.
pub const DEFAULT_ROW: u32 = 1;

/// Matched signatures needed before the intake progress reads 100%.
pub const DEFAULT_MATCHED_GOAL: u64 = 1000;

// ********* Workflow **********

/// The life of a physical sheet, from printing to shipment.
///
/// The order of the variants is the order of the workflow.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum SheetStatus {
    Printed,
    /// Handed to a circulator and out collecting signatures.
    Signing,
    /// Back at the desk, rows are being recorded.
    Summarizing,
    /// Notarized and ready to join a batch.
    Closed,
    PreShipment,
    Shipped,
}

impl SheetStatus {
    pub const ALL: [SheetStatus; 6] = [
        SheetStatus::Printed,
        SheetStatus::Signing,
        SheetStatus::Summarizing,
        SheetStatus::Closed,
        SheetStatus::PreShipment,
        SheetStatus::Shipped,
    ];

    /// The spelling used by the server.
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetStatus::Printed => "Printed",
            SheetStatus::Signing => "Signing",
            SheetStatus::Summarizing => "Summarizing",
            SheetStatus::Closed => "Closed",
            SheetStatus::PreShipment => "Pre-shipment",
            SheetStatus::Shipped => "Shipped",
        }
    }

    pub fn next(&self) -> Option<SheetStatus> {
        match self {
            SheetStatus::Printed => Some(SheetStatus::Signing),
            SheetStatus::Signing => Some(SheetStatus::Summarizing),
            SheetStatus::Summarizing => Some(SheetStatus::Closed),
            SheetStatus::Closed => Some(SheetStatus::PreShipment),
            SheetStatus::PreShipment => Some(SheetStatus::Shipped),
            SheetStatus::Shipped => None,
        }
    }

    /// Only the first two steps may be requested as a plain status update.
    /// Closing, batching and shipping go through their own operations.
    pub fn manual_transition_allowed(&self, to: SheetStatus) -> bool {
        self.next() == Some(to) && matches!(to, SheetStatus::Signing | SheetStatus::Summarizing)
    }

    pub fn check_manual_transition(&self, to: SheetStatus) -> Result<(), WorkflowError> {
        if self.manual_transition_allowed(to) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition { from: *self, to })
        }
    }

    /// True if some status may be manually moved to this one.
    pub fn is_manual_target(&self) -> bool {
        SheetStatus::ALL
            .iter()
            .any(|from| from.manual_transition_allowed(*self))
    }
}

impl Display for SheetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SheetStatus {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_status(s);
        SheetStatus::ALL
            .iter()
            .find(|st| normalize_status(st.as_str()) == key)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownStatus(s.to_string()))
    }
}

/// The life of a batch of closed sheets.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum BatchStatus {
    Building,
    PreShipment,
    Shipped,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Building => "Building",
            BatchStatus::PreShipment => "Pre-shipment",
            BatchStatus::Shipped => "Shipped",
        }
    }

    pub fn next(&self) -> Option<BatchStatus> {
        match self {
            BatchStatus::Building => Some(BatchStatus::PreShipment),
            BatchStatus::PreShipment => Some(BatchStatus::Shipped),
            BatchStatus::Shipped => None,
        }
    }

    /// The status the member sheets take when the batch reaches this status.
    pub fn sheet_status(&self) -> SheetStatus {
        match self {
            BatchStatus::Building | BatchStatus::PreShipment => SheetStatus::PreShipment,
            BatchStatus::Shipped => SheetStatus::Shipped,
        }
    }
}

impl Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// "Pre-shipment", "pre_shipment" and "preshipment" are the same status.
fn normalize_status(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// The outcome the server stores for a recorded signature.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum SignatureStatus {
    Matched,
    NoMatchFound,
}

impl SignatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureStatus::Matched => "Matched",
            SignatureStatus::NoMatchFound => "No Match Found",
        }
    }
}

// ********* Signature records ***********

/// The part of a record that locates it on paper.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SheetLine {
    pub sheet_number: u64,
    pub row_number: u32,
    pub date_collected: NaiveDate,
    pub last_four_ssn: Option<String>,
}

/// A signature matched to a registered voter.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MatchRecord {
    pub line: SheetLine,
    pub voter_id: String,
}

/// What the operator could read from the sheet about a signer
/// that is not in the voter file.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PersonDetails {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub address: Option<String>,
    pub apartment_number: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct NotFoundRecord {
    pub line: SheetLine,
    pub person: PersonDetails,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SignatureRecord {
    Match(MatchRecord),
    NotFound(NotFoundRecord),
}

impl SignatureRecord {
    pub fn line(&self) -> &SheetLine {
        match self {
            SignatureRecord::Match(m) => &m.line,
            SignatureRecord::NotFound(nf) => &nf.line,
        }
    }

    /// The status the server is expected to store for this record.
    pub fn expected_status(&self) -> SignatureStatus {
        match self {
            SignatureRecord::Match(_) => SignatureStatus::Matched,
            SignatureRecord::NotFound(_) => SignatureStatus::NoMatchFound,
        }
    }
}

// ********* Errors **********

/// Problems found while assembling a signature record.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RecordError {
    MissingField(&'static str),
    InvalidSheet(u64),
    InvalidRow(u32),
    InvalidLastFour(String),
    InvalidDate(String),
}

impl Error for RecordError {}

impl Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::MissingField(name) => write!(f, "missing required field {}", name),
            RecordError::InvalidSheet(n) => write!(f, "sheet number must be positive, got {}", n),
            RecordError::InvalidRow(r) => write!(
                f,
                "row number must be between 1 and {}, got {}",
                SHEET_CAPACITY, r
            ),
            RecordError::InvalidLastFour(s) => {
                write!(f, "last four SSN digits must be 4 digits, got {:?}", s)
            }
            RecordError::InvalidDate(s) => write!(f, "not a calendar date: {}", s),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum WorkflowError {
    UnknownStatus(String),
    InvalidTransition { from: SheetStatus, to: SheetStatus },
    NotAManualTarget(SheetStatus),
}

impl Error for WorkflowError {}

impl Display for WorkflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowError::UnknownStatus(s) => write!(f, "unknown sheet status {:?}", s),
            WorkflowError::InvalidTransition { from, to } => {
                write!(f, "invalid status transition from {} to {}", from, to)
            }
            WorkflowError::NotAManualTarget(to) => {
                write!(f, "status {} cannot be set by a status update", to)
            }
        }
    }
}
