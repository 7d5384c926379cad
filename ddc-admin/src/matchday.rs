use ddc_common::calendar::MatchEvent;
use log::{debug, error};

/// Parses a matchday schedule CSV into the list of match events, in file
/// order. The file must have a `Date,Time,Summary` header; an empty Time
/// cell makes the match an all-day event, and an empty Summary cell falls
/// back to `Match`.
pub fn parse_matchday_csv(csv: &str) -> Result<Vec<MatchEvent>, Box<dyn std::error::Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv.as_bytes());

    let header: Vec<_> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if header != ["Date", "Time", "Summary"] {
        error!("Invalid header row:\n{header:?}\nExpected:\n[\"Date\", \"Time\", \"Summary\"]");
        return Err("Invalid header row".into());
    }

    let mut events = Vec::new();
    for (i, row) in reader.records().enumerate() {
        debug!("Parsing row {}", i + 1);
        let row = row?;

        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let date = row
            .get(0)
            .ok_or_else(|| format!("Row {}: Missing Date cell", i + 1))?;
        let time = row.get(1);
        let summary = match row.get(2).map(str::trim) {
            None | Some("") => "Match",
            Some(s) => s,
        };

        let event = MatchEvent::parse(date, time, summary)
            .map_err(|e| format!("Row {}: {e}", i + 1))?;
        events.push(event);
    }

    Ok(events)
}

#[cfg(test)]
mod test {
    use super::*;
    use time::macros::{date, time};

    #[test]
    fn test_parse_full_schedule() {
        let csv = "Date,Time,Summary\n\
                   2026-08-25,14:30,R1 C1: A vs B\n\
                   2026-08-25,15:00,R1 C2: C vs D\n\
                   2026-08-26,,Finals\n\
                   ,,\n";

        let events = parse_matchday_csv(csv).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            MatchEvent::new(date!(2026-08-25), Some(time!(14:30)), "R1 C1: A vs B")
        );
        assert_eq!(
            events[2],
            MatchEvent::new(date!(2026-08-26), None, "Finals")
        );
    }

    #[test]
    fn test_cells_are_trimmed() {
        let csv = "Date, Time, Summary\n 2026-08-25 , 14:30 , Semifinal \n";

        let events = parse_matchday_csv(csv).unwrap();
        assert_eq!(
            events[0],
            MatchEvent::new(date!(2026-08-25), Some(time!(14:30)), "Semifinal")
        );
    }

    #[test]
    fn test_empty_summary_falls_back() {
        let csv = "Date,Time,Summary\n2026-08-25,14:30,\n";

        let events = parse_matchday_csv(csv).unwrap();
        assert_eq!(events[0].summary, "Match");
    }

    #[test]
    fn test_rejects_unknown_header() {
        let csv = "Start,Time,Summary\n2026-08-25,14:30,M\n";

        let err = parse_matchday_csv(csv).unwrap_err();
        assert_eq!(err.to_string(), "Invalid header row");
    }

    #[test]
    fn test_reports_row_number_for_bad_date() {
        let csv = "Date,Time,Summary\n\
                   2026-08-25,14:30,Good\n\
                   25/08/2026,14:30,Bad\n";

        let err = parse_matchday_csv(csv).unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Row 2: Failed to parse date '25/08/2026':")
        );
    }

    #[test]
    fn test_reports_row_number_for_bad_time() {
        let csv = "Date,Time,Summary\n2026-08-25,noon,M\n";

        let err = parse_matchday_csv(csv).unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Row 1: Failed to parse time 'noon':")
        );
    }

    #[test]
    fn test_reports_row_number_for_start_too_late_to_end() {
        let csv = "Date,Time,Summary\n9999-12-31,23:45,M\n";

        let err = parse_matchday_csv(csv).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Row 1: End time for match at '9999-12-31 23:45' is out of range"
        );
    }
}
