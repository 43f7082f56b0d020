// Printable view of a sheet.

use petition_sheets::{SheetTally, SHEET_CAPACITY};

use crate::desk::io_common::{format_sheet_date, render_table};
use crate::desk::server::SheetEntry;
use crate::desk::*;

/// Puts each entry on its line of the sheet.
///
/// Entries carrying a valid row go to that row. The others fill the free lines
/// from the top. Blank padding entries leave their line empty, and entries that
/// do not fit are dropped.
pub fn place_entries(entries: &[SheetEntry]) -> Vec<Option<&SheetEntry>> {
    let capacity = SHEET_CAPACITY as usize;
    let mut lines: Vec<Option<&SheetEntry>> = vec![None; capacity];
    let mut unplaced: Vec<&SheetEntry> = Vec::new();
    for e in entries.iter().filter(|e| !e.is_blank()) {
        match e.row.map(|r| r as usize) {
            Some(r) if (1..=capacity).contains(&r) && lines[r - 1].is_none() => {
                lines[r - 1] = Some(e);
            }
            _ => unplaced.push(e),
        }
    }
    for e in unplaced {
        match lines.iter().position(|l| l.is_none()) {
            Some(idx) => lines[idx] = Some(e),
            None => warn!("place_entries: no free line for {:?}", e),
        }
    }
    lines
}

pub fn sheet_tally(sheet_number: u64, lines: &[Option<&SheetEntry>]) -> SheetTally {
    let filled: Vec<&SheetEntry> = lines
        .iter()
        .filter_map(|l| *l)
        .filter(|e| !e.is_blank())
        .collect();
    let valid = filled
        .iter()
        .filter(|e| e.voter_id.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false))
        .count();
    SheetTally {
        sheet_number,
        total: filled.len() as u64,
        valid: valid as u64,
    }
}

pub fn render_sheet(sheet_number: u64, entries: &[SheetEntry]) -> String {
    let lines = place_entries(entries);
    let cell = |x: &Option<String>| x.clone().unwrap_or_default();
    let rows: Vec<Vec<String>> = lines
        .iter()
        .enumerate()
        .map(|(idx, l)| {
            let mut row = vec![(idx + 1).to_string()];
            if let Some(e) = l {
                row.extend(vec![
                    cell(&e.voter_id),
                    cell(&e.first_name),
                    cell(&e.last_name),
                    cell(&e.address1),
                    cell(&e.address2),
                    cell(&e.city),
                    cell(&e.state),
                    cell(&e.zip),
                    format_sheet_date(e.date_signed.as_deref().unwrap_or("")),
                    cell(&e.ssn_last4),
                ]);
            }
            row
        })
        .collect();
    let tally = sheet_tally(sheet_number, &lines);
    format!(
        "Sheet {}\n{}\nSignatures: {}  matched: {} ({:.2}%)",
        tally.sheet_number,
        render_table(
            &[
                "Row", "Voter ID", "First", "Last", "Address 1", "Address 2", "City", "State",
                "Zip", "Signed", "SSN",
            ],
            &rows,
        ),
        tally.total,
        tally.valid,
        tally.valid_rate()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(row: Option<u32>, voter_id: Option<&str>) -> SheetEntry {
        SheetEntry {
            row,
            voter_id: voter_id.map(|s| s.to_string()),
            first_name: Some("A".to_string()),
            last_name: Some("B".to_string()),
            date_signed: Some("2024-03-09".to_string()),
            ..SheetEntry::default()
        }
    }

    #[test]
    fn always_twelve_lines() {
        let lines = place_entries(&[]);
        assert_eq!(lines.len(), 12);
        let out = render_sheet(5, &[]);
        // Title, header, separator and the 12 rows, then the footer.
        assert_eq!(out.lines().count(), 16);
        assert!(out.ends_with("Signatures: 0  matched: 0 (0.00%)"));
    }

    #[test]
    fn entries_go_to_their_row() {
        let entries = vec![entry(Some(3), Some("V3")), entry(None, None), entry(Some(3), None)];
        let lines = place_entries(&entries);
        assert_eq!(lines[2].and_then(|e| e.voter_id.clone()), Some("V3".to_string()));
        // Rowless entries and the duplicate fill the first free lines.
        assert!(lines[0].is_some());
        assert!(lines[1].is_some());
        assert!(lines[3].is_none());

        let tally = sheet_tally(9, &lines);
        assert_eq!(tally.total, 3);
        assert_eq!(tally.valid, 1);
    }

    #[test]
    fn extra_entries_are_dropped() {
        let entries: Vec<SheetEntry> = (0..14).map(|_| entry(None, Some("V"))).collect();
        let lines = place_entries(&entries);
        assert!(lines.iter().all(|l| l.is_some()));
        assert_eq!(sheet_tally(1, &lines).total, 12);
    }

    #[test]
    fn padding_lines_are_not_signatures() {
        let mut entries = vec![entry(Some(1), Some("V1"))];
        entries.extend((2..=12).map(|r| SheetEntry {
            row: Some(r),
            voter_id: Some("".to_string()),
            first_name: Some("".to_string()),
            date_signed: Some("".to_string()),
            ..SheetEntry::default()
        }));
        let lines = place_entries(&entries);
        assert!(lines[0].is_some());
        assert!(lines[1..].iter().all(|l| l.is_none()));

        let out = render_sheet(4, &entries);
        assert!(out.starts_with("Sheet 4\n"), "{}", out);
        assert!(out.ends_with("Signatures: 1  matched: 1 (100.00%)"), "{}", out);
    }

    #[test]
    fn dates_are_printed_short() {
        let out = render_sheet(2, &[entry(Some(1), Some("V1"))]);
        assert!(out.contains("3/9/24"), "{}", out);
        assert!(out.contains("matched: 1 (100.00%)"), "{}", out);
    }
}
