use log::{debug, info, warn};

use petition_sheets::builder::RecordBuilder;
use petition_sheets::*;
use snafu::{prelude::*, Snafu};

use crate::args::{Args, Command, LineArgs, PersonArgs, SearchArgs};
use crate::desk::config_reader::*;
use crate::desk::io_common::*;
use crate::desk::io_http::HttpSheetServer;
use crate::desk::server::*;

pub mod config_reader;
mod io_common;
mod io_http;
mod print_sheet;
pub mod server;

#[derive(Debug, Snafu)]
pub enum DeskError {
    #[snafu(display("Error opening config file {path}"))]
    OpeningConfig {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing config file {path}: {source}"))]
    ParsingConfig {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Expected a positive number for {field}"))]
    ParsingJsonNumber { field: String },
    #[snafu(display("Could not understand the list of rows {input:?}"))]
    ParsingRows { input: String },
    #[snafu(display("Expected a date as YYYY-MM-DD, got {input:?}"))]
    ParsingDate {
        source: chrono::ParseError,
        input: String,
    },

    #[snafu(display("Could not set up the HTTP client: {source}"))]
    BuildingClient { source: reqwest::Error },
    #[snafu(display("Request to {url} failed: {source}"))]
    Request { source: reqwest::Error, url: String },
    #[snafu(display("Server answered {status} for {url}: {message}"))]
    ServerStatus {
        status: u16,
        url: String,
        message: String,
    },
    #[snafu(display("Could not read the answer from {url}: {source}"))]
    DecodingResponse { source: reqwest::Error, url: String },
    #[snafu(display("Server refused the request to {url}: {message}"))]
    Refused { url: String, message: String },
    #[snafu(display("Answer from {url} is missing {field}"))]
    MissingReplyField { url: String, field: String },

    #[snafu(display("Invalid signature record: {source}"))]
    InvalidRecord { source: RecordError },
    #[snafu(display("{source}"))]
    Workflow { source: WorkflowError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DeskResult<T> = Result<T, DeskError>;

/// Proposes a row for a sheet, asking the server for the rows already recorded.
///
/// A missing sheet number, a failed lookup or an answer without rows all fall back
/// to the default row.
pub fn lookup_row_assignment(server: &dyn SheetServer, sheet_id: Option<&str>) -> RowAssignment {
    let sheet_id = match sheet_id.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => {
            info!("lookup_row_assignment: no sheet number, using the default row");
            return assign_row(None);
        }
    };
    match server.row_numbers(sheet_id) {
        Ok(Some(rows)) => {
            debug!("lookup_row_assignment: sheet {}: rows {:?}", sheet_id, rows);
            assign_row(Some(rows.as_slice()))
        }
        Ok(None) => {
            warn!(
                "lookup_row_assignment: sheet {}: no rows in the answer, using the default row",
                sheet_id
            );
            assign_row(None)
        }
        Err(e) => {
            warn!(
                "lookup_row_assignment: sheet {}: lookup failed, using the default row: {}",
                sheet_id, e
            );
            assign_row(None)
        }
    }
}

fn describe_assignment(sheet: &str, a: &RowAssignment) -> String {
    let mut s = format!("Sheet {}: next row {}", sheet, a.row);
    if a.is_collision() {
        s.push_str(&format!(
            " (warning: all {} rows are taken, the sheet is full)",
            SHEET_CAPACITY
        ));
    } else if a.source == AssignmentSource::Default {
        s.push_str(" (default, no row data for this sheet)");
    }
    s
}

fn record_signature<F>(server: &dyn SheetServer, line: &LineArgs, build: F) -> DeskResult<String>
where
    F: FnOnce(&RecordBuilder) -> Result<SignatureRecord, RecordError>,
{
    let row = match line.row {
        Some(r) => r,
        None => {
            let a = lookup_row_assignment(server, Some(&line.sheet.to_string()));
            if a.is_collision() {
                whatever!(
                    "Sheet {} is full, pass --row to record on a specific row",
                    line.sheet
                )
            }
            a.row
        }
    };

    let today = DateHeader::current();
    let header = DateHeader {
        month: line.month.or(today.month),
        day: line.day,
        year: line.year.or(today.year),
    };

    let mut builder = RecordBuilder::new(line.sheet)
        .and_then(|b| b.row(row))
        .and_then(|b| b.last_four(line.last4.as_deref().unwrap_or("")))
        .context(InvalidRecordSnafu {})?;
    if let Some(date) = header.collection_date().context(InvalidRecordSnafu {})? {
        builder = builder.collected_on(date);
    }
    let record = build(&builder).context(InvalidRecordSnafu {})?;
    debug!("record_signature: {:?}", record);

    // The server has the last word on the status, so only its message is shown.
    let message = server.verify(&record)?;
    info!(
        "Recorded sheet {} row {} (sent as {}): {}",
        line.sheet,
        row,
        record.expected_status().as_str(),
        message
    );
    Ok(format!("Sheet {} row {}: {}", line.sheet, row, message))
}

fn describe_batch_step(batch_id: u64, from: BatchStatus) -> String {
    match from.next() {
        Some(to) => format!(
            "Batch {} is now {}, its sheets are {}",
            batch_id,
            to,
            to.sheet_status()
        ),
        None => format!("Batch {} is already {}", batch_id, from),
    }
}

fn person_details(p: &PersonArgs) -> PersonDetails {
    PersonDetails {
        first_name: p.first_name.clone(),
        middle_name: p.middle_name.clone(),
        last_name: p.last_name.clone(),
        address: p.address.clone(),
        apartment_number: p.apartment_number.clone(),
        city: p.city.clone(),
        state: p.state.clone(),
        zip_code: p.zip_code.clone(),
    }
}

fn search_query(a: &SearchArgs) -> SearchQuery {
    SearchQuery {
        first_name: non_empty(&a.first_name),
        middle_name: non_empty(&a.middle_name),
        last_name: non_empty(&a.last_name),
        house_number: non_empty(&a.house_number),
        house_number_suffix: non_empty(&a.house_number_suffix),
        street_name: non_empty(&a.street_name),
        apartment_number: non_empty(&a.apartment_number),
        city: non_empty(&a.city),
        state: non_empty(&a.state),
        zip_code: non_empty(&a.zip_code).map(|z| truncate_zip(&z)),
    }
}

fn render_search_results(results: &[VoterResult]) -> String {
    if results.is_empty() {
        return "No results found".to_string();
    }
    let cell = |x: &Option<String>| x.clone().unwrap_or_default();
    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|v| {
            vec![
                cell(&v.voter_id),
                cell(&v.first_name),
                cell(&v.middle_name),
                cell(&v.last_name),
                cell(&v.address),
                cell(&v.apartment_number),
                cell(&v.city),
                cell(&v.state),
                cell(&v.zip_code),
                cell(&v.status),
            ]
        })
        .collect();
    render_table(
        &[
            "Voter ID", "First", "Middle", "Last", "Address", "Apt", "City", "State", "Zip",
            "Status",
        ],
        &rows,
    )
}

fn render_stats(stats: &[(String, u64)], goal: u64) -> String {
    let (total, shares) = status_shares(stats);
    let rows: Vec<Vec<String>> = shares
        .iter()
        .map(|s| {
            vec![
                s.status.clone(),
                s.count.to_string(),
                format!("{:.2}%", s.percent),
            ]
        })
        .collect();
    let matched = stats
        .iter()
        .find(|(status, _)| status == SignatureStatus::Matched.as_str())
        .map(|(_, c)| *c)
        .unwrap_or(0);
    format!(
        "{}\nTotal signatures: {}\nProgress: {:.2}% of {} matched signatures",
        render_table(&["Status", "Count", "Share"], &rows),
        total,
        matched_progress(matched, goal),
        goal
    )
}

fn render_people(people: &[NamedRef]) -> String {
    let rows: Vec<Vec<String>> = people
        .iter()
        .map(|p| vec![p.id.to_string(), p.full_name.clone()])
        .collect();
    render_table(&["Id", "Name"], &rows)
}

/// Runs one command against a server and returns what should be shown to the operator.
pub fn execute(
    server: &dyn SheetServer,
    settings: &DeskSettings,
    command: &Command,
) -> DeskResult<String> {
    match command {
        Command::Allocate { occupied } => {
            let rows = parse_row_list(occupied)?;
            let a = assign_row(Some(rows.as_slice()));
            Ok(describe_assignment("(offline)", &a))
        }
        Command::NextRow { sheet } => {
            let a = lookup_row_assignment(server, sheet.as_deref());
            Ok(describe_assignment(
                sheet.as_deref().unwrap_or("(none)"),
                &a,
            ))
        }
        Command::Match { line, voter_id } => record_signature(server, line, |b| {
            b.build_match(voter_id).map(SignatureRecord::Match)
        }),
        Command::NotFound { line, person } => {
            let details = person_details(person);
            record_signature(server, line, |b| {
                b.build_not_found(&details).map(SignatureRecord::NotFound)
            })
        }
        Command::Search { query } => {
            let q = search_query(query);
            debug!("search: {:?}", q);
            let results = server.search(&q)?;
            Ok(render_search_results(&results))
        }
        Command::SheetStatus { sheet, to, from } => {
            let to: SheetStatus = to.parse().context(WorkflowSnafu {})?;
            match from {
                Some(from) => {
                    let from: SheetStatus = from.parse().context(WorkflowSnafu {})?;
                    from.check_manual_transition(to).context(WorkflowSnafu {})?;
                }
                None if !to.is_manual_target() => {
                    return Err(DeskError::Workflow {
                        source: WorkflowError::NotAManualTarget(to),
                    });
                }
                None => {}
            }
            server.update_sheet_status(*sheet, to)?;
            Ok(format!("Sheet {} status updated to {}", sheet, to))
        }
        Command::CloseSheet {
            sheet,
            notary,
            circulator,
            notarized_on,
        } => {
            let date = parse_date_arg(notarized_on)?;
            server.close_sheet(&CloseSheetRequest {
                sheet_id: *sheet,
                notary_id: *notary,
                notarized_on: date.format("%Y-%m-%d").to_string(),
                collector_id: *circulator,
            })?;
            Ok(format!("Sheet {} closed", sheet))
        }
        Command::AddToBatch { sheet } => {
            let batch_id = server.add_to_batch(*sheet)?;
            Ok(format!("Sheet {} added to batch {}", sheet, batch_id))
        }
        Command::CloseBatch => {
            let batch_id = server.close_batch()?;
            Ok(describe_batch_step(batch_id, BatchStatus::Building))
        }
        Command::ShipBatch {
            carrier,
            tracking,
            ship_date,
        } => {
            if carrier.trim().is_empty() || tracking.trim().is_empty() {
                whatever!("Carrier and tracking number are required to ship a batch")
            }
            let date = parse_date_arg(ship_date)?;
            let batch_id = server.ship_batch(&ShipmentRequest {
                carrier: carrier.trim().to_string(),
                tracking_number: tracking.trim().to_string(),
                ship_date: date.format("%Y-%m-%d").to_string(),
            })?;
            Ok(describe_batch_step(batch_id, BatchStatus::PreShipment))
        }
        Command::Stats => {
            let stats: Vec<(String, u64)> = server.signature_stats()?.into_iter().collect();
            Ok(render_stats(&stats, settings.matched_goal))
        }
        Command::Print { sheet } => {
            let entries = server.sheet_entries(*sheet)?;
            Ok(print_sheet::render_sheet(*sheet, &entries))
        }
        Command::Notaries => Ok(render_people(&server.notaries()?)),
        Command::Circulators => Ok(render_people(&server.circulators()?)),
    }
}

pub fn run_command(args: &Args) -> DeskResult<String> {
    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => DeskConfig::default(),
    };
    let settings = DeskSettings::resolve(&config, args.server.as_deref())?;
    info!("settings: {:?}", settings);
    let server = HttpSheetServer::new(&settings)?;
    execute(&server, &settings, &args.command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MockServer {
        rows: Option<Vec<i64>>,
        fail_lookup: bool,
        verify_message: Option<String>,
        entries: Vec<SheetEntry>,
        stats: BTreeMap<String, u64>,
        lookups: RefCell<Vec<String>>,
        recorded: RefCell<Vec<SignatureRecord>>,
        status_updates: RefCell<Vec<(u64, SheetStatus)>>,
    }

    fn unexpected<T>(what: &str) -> DeskResult<T> {
        Err(DeskError::Refused {
            url: "mock".to_string(),
            message: format!("unexpected call to {}", what),
        })
    }

    impl SheetServer for MockServer {
        fn row_numbers(&self, sheet_id: &str) -> DeskResult<Option<Vec<i64>>> {
            self.lookups.borrow_mut().push(sheet_id.to_string());
            if self.fail_lookup {
                return Err(DeskError::ServerStatus {
                    status: 500,
                    url: "mock/sheets/row_numbers".to_string(),
                    message: "database error".to_string(),
                });
            }
            Ok(self.rows.clone())
        }
        fn verify(&self, record: &SignatureRecord) -> DeskResult<String> {
            self.recorded.borrow_mut().push(record.clone());
            Ok(self
                .verify_message
                .clone()
                .unwrap_or_else(|| "recorded".to_string()))
        }
        fn update_sheet_status(&self, sheet: u64, status: SheetStatus) -> DeskResult<()> {
            self.status_updates.borrow_mut().push((sheet, status));
            Ok(())
        }
        fn close_sheet(&self, _request: &CloseSheetRequest) -> DeskResult<()> {
            unexpected("close_sheet")
        }
        fn notaries(&self) -> DeskResult<Vec<NamedRef>> {
            Ok(vec![NamedRef {
                id: 3,
                full_name: "Nora Notary".to_string(),
            }])
        }
        fn circulators(&self) -> DeskResult<Vec<NamedRef>> {
            unexpected("circulators")
        }
        fn add_to_batch(&self, _sheet: u64) -> DeskResult<u64> {
            Ok(21)
        }
        fn close_batch(&self) -> DeskResult<u64> {
            Ok(21)
        }
        fn ship_batch(&self, _request: &ShipmentRequest) -> DeskResult<u64> {
            unexpected("ship_batch")
        }
        fn signature_stats(&self) -> DeskResult<BTreeMap<String, u64>> {
            Ok(self.stats.clone())
        }
        fn sheet_entries(&self, _sheet: u64) -> DeskResult<Vec<SheetEntry>> {
            Ok(self.entries.clone())
        }
        fn search(&self, _query: &SearchQuery) -> DeskResult<Vec<VoterResult>> {
            Ok(vec![])
        }
    }

    fn settings() -> DeskSettings {
        DeskSettings::resolve(&DeskConfig::default(), None).unwrap()
    }

    fn line(sheet: u64, row: Option<u32>) -> LineArgs {
        LineArgs {
            sheet,
            row,
            month: Some(5),
            day: Some(14),
            year: Some(2024),
            last4: None,
        }
    }

    #[test]
    fn lookup_without_sheet_uses_default_row() {
        let server = MockServer::default();
        assert_eq!(lookup_row_assignment(&server, None), RowAssignment::DEFAULT);
        assert_eq!(
            lookup_row_assignment(&server, Some("  ")),
            RowAssignment::DEFAULT
        );
        assert!(server.lookups.borrow().is_empty());
    }

    #[test]
    fn lookup_failure_uses_default_row() {
        let server = MockServer {
            fail_lookup: true,
            rows: Some(vec![1, 2, 3]),
            ..MockServer::default()
        };
        assert_eq!(
            lookup_row_assignment(&server, Some("12")),
            RowAssignment::DEFAULT
        );
        assert_eq!(*server.lookups.borrow(), vec!["12".to_string()]);
    }

    #[test]
    fn lookup_without_rows_uses_default_row() {
        let server = MockServer::default();
        assert_eq!(
            lookup_row_assignment(&server, Some("12")),
            RowAssignment::DEFAULT
        );
    }

    #[test]
    fn lookup_computes_next_row() {
        let server = MockServer {
            rows: Some(vec![3, 1, 2]),
            ..MockServer::default()
        };
        let a = lookup_row_assignment(&server, Some(" 44 "));
        assert_eq!(a.row, 4);
        assert_eq!(a.source, AssignmentSource::Computed);
        assert_eq!(*server.lookups.borrow(), vec!["44".to_string()]);
    }

    #[test]
    fn every_lookup_goes_to_the_server() {
        let server = MockServer {
            rows: Some(vec![1]),
            ..MockServer::default()
        };
        lookup_row_assignment(&server, Some("5"));
        lookup_row_assignment(&server, Some("5"));
        assert_eq!(server.lookups.borrow().len(), 2);
    }

    #[test]
    fn match_without_row_uses_lookup() {
        let server = MockServer {
            rows: Some(vec![1, 2, 3]),
            ..MockServer::default()
        };
        let cmd = Command::Match {
            line: line(7, None),
            voter_id: "V-42".to_string(),
        };
        let out = execute(&server, &settings(), &cmd).unwrap();
        assert!(out.contains("row 4"), "{}", out);
        let recorded = server.recorded.borrow();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].line().row_number, 4);
        assert_eq!(
            recorded[0].line().date_collected,
            chrono::NaiveDate::from_ymd_opt(2024, 5, 14).unwrap()
        );
    }

    #[test]
    fn explicit_row_skips_lookup() {
        let server = MockServer::default();
        let cmd = Command::Match {
            line: line(7, Some(9)),
            voter_id: "V-42".to_string(),
        };
        execute(&server, &settings(), &cmd).unwrap();
        assert!(server.lookups.borrow().is_empty());
        assert_eq!(server.recorded.borrow()[0].line().row_number, 9);
    }

    #[test]
    fn full_sheet_is_not_recorded_without_row() {
        let server = MockServer {
            rows: Some((1..=12).collect()),
            ..MockServer::default()
        };
        let cmd = Command::Match {
            line: line(7, None),
            voter_id: "V-42".to_string(),
        };
        assert!(execute(&server, &settings(), &cmd).is_err());
        assert!(server.recorded.borrow().is_empty());
    }

    #[test]
    fn not_found_requires_names() {
        let server = MockServer::default();
        let cmd = Command::NotFound {
            line: line(7, Some(2)),
            person: PersonArgs {
                first_name: "Ada".to_string(),
                middle_name: None,
                last_name: "".to_string(),
                address: None,
                apartment_number: None,
                city: None,
                state: None,
                zip_code: None,
            },
        };
        let res = execute(&server, &settings(), &cmd);
        assert!(matches!(
            res,
            Err(DeskError::InvalidRecord {
                source: RecordError::MissingField("last_name")
            })
        ));
        assert!(server.recorded.borrow().is_empty());
    }

    #[test]
    fn invalid_transition_is_not_sent() {
        let server = MockServer::default();
        let cmd = Command::SheetStatus {
            sheet: 3,
            to: "Summarizing".to_string(),
            from: Some("Printed".to_string()),
        };
        assert!(matches!(
            execute(&server, &settings(), &cmd),
            Err(DeskError::Workflow { .. })
        ));
        let cmd = Command::SheetStatus {
            sheet: 3,
            to: "Shipped".to_string(),
            from: None,
        };
        assert!(execute(&server, &settings(), &cmd).is_err());
        assert!(server.status_updates.borrow().is_empty());
    }

    #[test]
    fn valid_transition_is_sent() {
        let server = MockServer::default();
        let cmd = Command::SheetStatus {
            sheet: 3,
            to: "signing".to_string(),
            from: Some("printed".to_string()),
        };
        let out = execute(&server, &settings(), &cmd).unwrap();
        assert_eq!(out, "Sheet 3 status updated to Signing");
        assert_eq!(
            *server.status_updates.borrow(),
            vec![(3, SheetStatus::Signing)]
        );
    }

    #[test]
    fn offline_allocation() {
        let server = MockServer::default();
        let cmd = Command::Allocate {
            occupied: "1, 5".to_string(),
        };
        let out = execute(&server, &settings(), &cmd).unwrap();
        assert!(out.contains("next row 6"), "{}", out);

        let cmd = Command::Allocate {
            occupied: "1,2,3,4,5,6,7,8,9,10,11,12".to_string(),
        };
        let out = execute(&server, &settings(), &cmd).unwrap();
        assert!(out.contains("next row 1"), "{}", out);
        assert!(out.contains("full"), "{}", out);
    }

    #[test]
    fn stats_show_progress() {
        let mut stats = BTreeMap::new();
        stats.insert("Matched".to_string(), 300);
        stats.insert("No Match Found".to_string(), 100);
        let server = MockServer {
            stats,
            ..MockServer::default()
        };
        let out = execute(&server, &settings(), &Command::Stats).unwrap();
        assert!(out.contains("75.00%"), "{}", out);
        assert!(out.contains("Total signatures: 400"), "{}", out);
        assert!(out.contains("Progress: 30.00% of 1000"), "{}", out);
    }

    #[test]
    fn day_alone_takes_current_month_and_year() {
        let server = MockServer::default();
        let cmd = Command::Match {
            line: LineArgs {
                month: None,
                day: Some(15),
                year: None,
                ..line(7, Some(2))
            },
            voter_id: "V-42".to_string(),
        };
        execute(&server, &settings(), &cmd).unwrap();
        let today = DateHeader::current();
        let expected = DateHeader {
            day: Some(15),
            ..today
        };
        assert_eq!(
            Some(server.recorded.borrow()[0].line().date_collected),
            expected.collection_date().unwrap()
        );
    }

    #[test]
    fn server_message_is_reported_as_is() {
        let server = MockServer {
            verify_message: Some("No match found and recorded".to_string()),
            ..MockServer::default()
        };
        let cmd = Command::Match {
            line: line(7, Some(2)),
            voter_id: "V-unknown".to_string(),
        };
        let out = execute(&server, &settings(), &cmd).unwrap();
        assert_eq!(out, "Sheet 7 row 2: No match found and recorded");
    }

    #[test]
    fn batch_and_people_commands() {
        let server = MockServer::default();
        let out = execute(&server, &settings(), &Command::AddToBatch { sheet: 8 }).unwrap();
        assert_eq!(out, "Sheet 8 added to batch 21");
        let out = execute(&server, &settings(), &Command::CloseBatch).unwrap();
        assert_eq!(out, "Batch 21 is now Pre-shipment, its sheets are Pre-shipment");
        let out = execute(&server, &settings(), &Command::Notaries).unwrap();
        assert!(out.contains("Nora Notary"));
    }

    #[test]
    fn empty_search() {
        let server = MockServer::default();
        let cmd = Command::Search {
            query: SearchArgs::default(),
        };
        assert_eq!(
            execute(&server, &settings(), &cmd).unwrap(),
            "No results found"
        );
    }

    #[test]
    fn search_query_truncates_zip() {
        let q = search_query(&SearchArgs {
            last_name: Some("Sm*th".to_string()),
            zip_code: Some("43215-1234".to_string()),
            city: Some("".to_string()),
            ..SearchArgs::default()
        });
        assert_eq!(q.last_name, Some("Sm*th".to_string()));
        assert_eq!(q.zip_code, Some("43215".to_string()));
        assert_eq!(q.city, None);
    }
}
