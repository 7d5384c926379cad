use rand::{Rng, SeedableRng};
use std::fmt;
use thiserror::Error;
use time::{
    Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset, macros::format_description,
};
use urlencoding::encode;

pub mod popup;

/// Every scheduled match is blocked out for exactly this long.
pub const MATCH_DURATION: Duration = Duration::minutes(30);

const UID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const UID_TOKEN_LEN: usize = 11;
const FILE_NAME_STEM_LEN: usize = 40;

/// One scheduled match as the calendar integrations see it: a date, an
/// optional start time (absent means all-day), and the raw match summary.
/// The tournament title is supplied per call because the same match can be
/// rendered under different page headings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchEvent {
    pub date: Date,
    pub time: Option<Time>,
    pub summary: String,
}

impl MatchEvent {
    pub fn new(date: Date, time: Option<Time>, summary: &str) -> Self {
        Self {
            date,
            time,
            summary: summary.to_string(),
        }
    }

    /// Parses `YYYY-MM-DD` and 24h `HH:MM` strings. An absent or empty time
    /// string makes the match an all-day event.
    pub fn parse(date: &str, time: Option<&str>, summary: &str) -> Result<Self, CalendarError> {
        let date_format = format_description!("[year]-[month]-[day]");
        let time_format = format_description!("[hour repr:24 padding:none]:[minute]");

        let date = Date::parse(date.trim(), &date_format).map_err(|source| {
            CalendarError::InvalidDate {
                input: date.trim().to_string(),
                source,
            }
        })?;

        let time = match time.map(str::trim) {
            None | Some("") => None,
            Some(t) => Some(Time::parse(t, &time_format).map_err(|source| {
                CalendarError::InvalidTime {
                    input: t.to_string(),
                    source,
                }
            })?),
        };

        if let Some(t) = time {
            if date.with_time(t).checked_add(MATCH_DURATION).is_none() {
                return Err(CalendarError::EndOutOfRange {
                    input: format!("{} {:02}:{:02}", dashed_date(date), t.hour(), t.minute()),
                });
            }
        }

        Ok(Self::new(date, time, summary))
    }

    pub fn is_all_day(&self) -> bool {
        self.time.is_none()
    }

    /// Start and end of a timed match. The end is the full date-time thirty
    /// minutes after the start, so a late match ends on the following
    /// calendar day. An end past the last supported date clamps to it.
    pub fn timed_range(&self) -> Option<(PrimitiveDateTime, PrimitiveDateTime)> {
        let start = self.date.with_time(self.time?);
        let end = start
            .checked_add(MATCH_DURATION)
            .unwrap_or(PrimitiveDateTime::MAX);
        Some((start, end))
    }

    fn titled(&self, tournament: &str) -> String {
        format!("{tournament} - {}", self.summary)
    }

    /// Prefilled Google Calendar event link for this match.
    pub fn google_calendar_link(&self, tournament: &str) -> String {
        let text = encode(&self.titled(tournament)).into_owned();
        let dates = match self.timed_range() {
            Some((start, end)) => {
                format!("{}/{}", basic_date_time(start), basic_date_time(end))
            }
            None => {
                let day = basic_date(self.date);
                format!("{day}/{day}")
            }
        };

        format!(
            "https://calendar.google.com/calendar/render?action=TEMPLATE&text={text}&dates={dates}&details={text}"
        )
    }

    /// Prefilled Outlook.com compose link for this match. All-day matches
    /// cover the whole day explicitly because the compose form has no
    /// date-only mode.
    pub fn outlook_live_link(&self, tournament: &str) -> String {
        let subject = encode(&self.titled(tournament)).into_owned();
        let (startdt, enddt) = match self.timed_range() {
            Some((start, end)) => (dashed_date_time(start), dashed_date_time(end)),
            None => {
                let day = dashed_date(self.date);
                (format!("{day}T00:00:00"), format!("{day}T23:59:59"))
            }
        };

        format!(
            "https://outlook.live.com/calendar/0/action/compose?rru=addevent&subject={subject}&body={subject}&startdt={startdt}&enddt={enddt}"
        )
    }

    /// Single-event calendar payload for download. Lines are joined with
    /// `\n` and there is no trailing newline. The summary goes in verbatim
    /// apart from comma stripping; the tournament title only appears in the
    /// description.
    pub fn ics(&self, tournament: &str, now: OffsetDateTime) -> String {
        let mut lines = vec![
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            "PRODID:-//DDC Tournament Manager//EN".to_string(),
            "BEGIN:VEVENT".to_string(),
            format!(
                "UID:single-{}-{}@ddc",
                dashed_date(self.date),
                uid_token()
            ),
            format!("DTSTAMP:{}", utc_stamp(now)),
        ];

        match self.timed_range() {
            Some((start, end)) => {
                lines.push(format!("DTSTART:{}", basic_date_time(start)));
                lines.push(format!("DTEND:{}", basic_date_time(end)));
            }
            None => {
                let day = basic_date(self.date);
                lines.push(format!("DTSTART;VALUE=DATE:{day}"));
                lines.push(format!("DTEND;VALUE=DATE:{day}"));
            }
        }

        let summary = self.summary.replace(',', "");
        lines.push(format!("SUMMARY:{summary}"));
        lines.push(format!(
            "DESCRIPTION:{} - {summary}",
            tournament.replace(',', "")
        ));
        lines.push("END:VEVENT".to_string());
        lines.push("END:VCALENDAR".to_string());

        lines.join("\n")
    }

    /// Download file name: whitespace runs become single underscores, the
    /// result is lowercased and cut to forty characters, then the match
    /// date and extension are appended.
    pub fn ics_file_name(&self) -> String {
        let mut stem = String::with_capacity(self.summary.len());
        let mut prev_space = false;
        for c in self.summary.chars() {
            if c.is_whitespace() {
                if !prev_space {
                    stem.push('_');
                }
                prev_space = true;
            } else {
                stem.extend(c.to_lowercase());
                prev_space = false;
            }
        }
        let stem: String = stem.chars().take(FILE_NAME_STEM_LEN).collect();

        format!("{stem}_{}.ics", dashed_date(self.date))
    }
}

impl fmt::Display for MatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time {
            Some(time) => write!(
                f,
                "{} {:02}:{:02} {}",
                dashed_date(self.date),
                time.hour(),
                time.minute(),
                self.summary
            ),
            None => write!(f, "{} (all day) {}", dashed_date(self.date), self.summary),
        }
    }
}

fn basic_date(date: Date) -> String {
    format!(
        "{:04}{:02}{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

fn dashed_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

fn basic_date_time(dt: PrimitiveDateTime) -> String {
    format!(
        "{}T{:02}{:02}{:02}",
        basic_date(dt.date()),
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

fn dashed_date_time(dt: PrimitiveDateTime) -> String {
    format!(
        "{}T{:02}:{:02}:{:02}",
        dashed_date(dt.date()),
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

fn utc_stamp(now: OffsetDateTime) -> String {
    let utc = now.to_offset(UtcOffset::UTC);
    format!("{}Z", basic_date_time(PrimitiveDateTime::new(utc.date(), utc.time())))
}

fn uid_token() -> String {
    let mut rng = rand::rngs::StdRng::from_os_rng();
    (0..UID_TOKEN_LEN)
        .map(|_| UID_ALPHABET[rng.random_range(0..UID_ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("Failed to parse date '{input}': {source}")]
    InvalidDate {
        input: String,
        source: time::error::Parse,
    },
    #[error("Failed to parse time '{input}': {source}")]
    InvalidTime {
        input: String,
        source: time::error::Parse,
    },
    #[error("End time for match at '{input}' is out of range")]
    EndOutOfRange { input: String },
}
