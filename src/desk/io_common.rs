use crate::desk::*;

use chrono::{DateTime, NaiveDate};

/// Reads a list of rows such as `1,2, 5`. Blank entries are skipped.
pub fn parse_row_list(input: &str) -> DeskResult<Vec<i64>> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().ok().context(ParsingRowsSnafu { input }))
        .collect()
}

pub fn parse_date_arg(input: &str) -> DeskResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").context(ParsingDateSnafu { input })
}

/// Only the 5-digit part of a ZIP code is searched.
pub fn truncate_zip(zip: &str) -> String {
    zip.trim().chars().take(5).collect()
}

pub fn non_empty(x: &Option<String>) -> Option<String> {
    x.as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Formats a date from the server as `M/D/YY`, the way it is printed on a sheet.
/// Dates come either as `YYYY-MM-DD` or as an HTTP date.
pub fn format_sheet_date(s: &str) -> String {
    let s = s.trim();
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc2822(s).ok().map(|d| d.date_naive()));
    match date {
        Some(d) => d.format("%-m/%-d/%y").to_string(),
        None => "".to_string(),
    }
}

/// Lays out rows of cells under a header, columns padded to their widest cell.
pub fn render_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(idx) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<String>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    let mut lines = vec![line(header.to_vec())];
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<String>>()
            .join("  "),
    );
    for row in rows {
        lines.push(line(row.iter().map(|s| s.as_str()).collect()));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_lists() {
        assert_eq!(parse_row_list("1,2, 5").unwrap(), vec![1, 2, 5]);
        assert_eq!(parse_row_list("").unwrap(), Vec::<i64>::new());
        assert_eq!(parse_row_list(" 3 4,,-1").unwrap(), vec![3, 4, -1]);
        assert!(matches!(
            parse_row_list("1,two"),
            Err(DeskError::ParsingRows { .. })
        ));
    }

    #[test]
    fn dates() {
        assert_eq!(format_sheet_date("2024-03-09"), "3/9/24");
        assert_eq!(format_sheet_date("2024-11-21"), "11/21/24");
        assert_eq!(format_sheet_date("Sat, 09 Mar 2024 00:00:00 +0000"), "3/9/24");
        assert_eq!(format_sheet_date(""), "");
        assert_eq!(format_sheet_date("soon"), "");
        assert!(parse_date_arg("2024-02-30").is_err());
        assert_eq!(
            parse_date_arg(" 2024-02-29 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn zips() {
        assert_eq!(truncate_zip("43215-1234"), "43215");
        assert_eq!(truncate_zip(" 432 "), "432");
        assert_eq!(non_empty(&Some("  ".to_string())), None);
        assert_eq!(non_empty(&Some(" a ".to_string())), Some("a".to_string()));
    }

    #[test]
    fn tables() {
        let t = render_table(
            &["Id", "Name"],
            &[
                vec!["1".to_string(), "Ann".to_string()],
                vec!["22".to_string(), "Bo".to_string()],
            ],
        );
        assert_eq!(t, "Id  Name\n--  ----\n1   Ann\n22  Bo");
    }
}
