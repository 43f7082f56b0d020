// The requests and answers exchanged with the petition server.

use std::collections::BTreeMap;

use petition_sheets::*;
use serde::{Deserialize, Serialize};

use crate::desk::DeskResult;

/// The operations of the petition server used by the desk.
///
/// `HttpSheetServer` talks to a real server; tests use an in-memory one.
pub trait SheetServer {
    /// The rows already recorded on a sheet. `None` if the answer carries no rows.
    fn row_numbers(&self, sheet_id: &str) -> DeskResult<Option<Vec<i64>>>;

    /// Submits a signature record, returns the message of the server.
    fn verify(&self, record: &SignatureRecord) -> DeskResult<String>;

    fn update_sheet_status(&self, sheet: u64, status: SheetStatus) -> DeskResult<()>;

    fn close_sheet(&self, request: &CloseSheetRequest) -> DeskResult<()>;

    fn notaries(&self) -> DeskResult<Vec<NamedRef>>;

    fn circulators(&self) -> DeskResult<Vec<NamedRef>>;

    /// Adds a closed sheet to the batch being built, returns the batch id.
    fn add_to_batch(&self, sheet: u64) -> DeskResult<u64>;

    fn close_batch(&self) -> DeskResult<u64>;

    fn ship_batch(&self, request: &ShipmentRequest) -> DeskResult<u64>;

    /// Number of recorded signatures per status.
    fn signature_stats(&self) -> DeskResult<BTreeMap<String, u64>>;

    /// The recorded rows of a sheet, for printing.
    fn sheet_entries(&self, sheet: u64) -> DeskResult<Vec<SheetEntry>>;

    fn search(&self, query: &SearchQuery) -> DeskResult<Vec<VoterResult>>;
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RowNumbersReply {
    pub row_numbers: Option<Vec<i64>>,
}

/// The answer of the endpoints that change something on the server.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerReply {
    pub success: Option<bool>,
    pub batch_id: Option<u64>,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: u64,
    pub full_name: String,
}

/// The body sent to the verification endpoint. A match carries a voter id,
/// a record without match carries the person details instead.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyPayload {
    pub sheet_number: u64,
    pub row_number: u32,
    pub date_collected: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_four_ssn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voter_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apartment_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

impl From<&SignatureRecord> for VerifyPayload {
    fn from(record: &SignatureRecord) -> VerifyPayload {
        let line = record.line();
        let base = VerifyPayload {
            sheet_number: line.sheet_number,
            row_number: line.row_number,
            date_collected: line.date_collected.format("%Y-%m-%d").to_string(),
            last_four_ssn: line.last_four_ssn.clone(),
            ..VerifyPayload::default()
        };
        match record {
            SignatureRecord::Match(m) => VerifyPayload {
                voter_id: Some(m.voter_id.clone()),
                ..base
            },
            SignatureRecord::NotFound(nf) => {
                let p = &nf.person;
                VerifyPayload {
                    first_name: Some(p.first_name.clone()),
                    middle_name: p.middle_name.clone(),
                    last_name: Some(p.last_name.clone()),
                    address: p.address.clone(),
                    apartment_number: p.apartment_number.clone(),
                    city: p.city.clone(),
                    state: p.state.clone(),
                    zip_code: p.zip_code.clone(),
                    ..base
                }
            }
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub sheet_number: u64,
    pub new_status: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CloseSheetRequest {
    pub sheet_id: u64,
    pub notary_id: u64,
    pub notarized_on: String,
    pub collector_id: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AddToBatchRequest {
    pub sheet_id: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentRequest {
    pub carrier: String,
    pub tracking_number: String,
    pub ship_date: String,
}

/// One recorded row, as returned for printing.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetEntry {
    pub row: Option<u32>,
    #[serde(rename = "voterId")]
    pub voter_id: Option<String>,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    #[serde(rename = "dateSigned")]
    pub date_signed: Option<String>,
    #[serde(rename = "ssnLast4")]
    pub ssn_last4: Option<String>,
}

impl SheetEntry {
    /// The server pads a sheet to 12 lines with entries that carry only their row.
    pub fn is_blank(&self) -> bool {
        [
            &self.voter_id,
            &self.first_name,
            &self.last_name,
            &self.address1,
            &self.address2,
            &self.city,
            &self.state,
            &self.zip,
            &self.date_signed,
            &self.ssn_last4,
        ]
        .iter()
        .all(|f| f.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true))
    }
}

/// The lines of a sheet, either wrapped with the sheet header or as a bare list.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetEntriesReply {
    Wrapped { data: Vec<SheetEntry> },
    Bare(Vec<SheetEntry>),
}

impl SheetEntriesReply {
    pub fn into_entries(self) -> Vec<SheetEntry> {
        match self {
            SheetEntriesReply::Wrapped { data } => data,
            SheetEntriesReply::Bare(entries) => entries,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number_suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apartment_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoterResult {
    #[serde(alias = "identification_number")]
    pub voter_id: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub suffix: Option<String>,
    #[serde(alias = "full_address")]
    pub address: Option<String>,
    pub apartment_number: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub status: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchReply {
    Wrapped { results: Vec<VoterResult> },
    Bare(Vec<VoterResult>),
}

impl SearchReply {
    pub fn into_results(self) -> Vec<VoterResult> {
        match self {
            SearchReply::Wrapped { results } => results,
            SearchReply::Bare(results) => results,
        }
    }
}
