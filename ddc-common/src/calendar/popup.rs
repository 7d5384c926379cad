use super::MatchEvent;
use thiserror::Error;

/// Provider links for one match, built on the first open of its popup and
/// reused afterward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalendarLinks {
    pub google: String,
    pub outlook: String,
}

impl CalendarLinks {
    pub fn build(event: &MatchEvent, tournament: &str) -> Self {
        Self {
            google: event.google_calendar_link(tournament),
            outlook: event.outlook_live_link(tournament),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Row {
    event: MatchEvent,
    links: Option<CalendarLinks>,
}

/// State of the per-match calendar popups on a matchday page: one popup
/// per listed match, at most one open at a time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchdayPopups {
    tournament: String,
    rows: Vec<Row>,
    open: Option<usize>,
}

impl MatchdayPopups {
    pub fn new(tournament: &str, events: Vec<MatchEvent>) -> Self {
        Self {
            tournament: tournament.to_string(),
            rows: events
                .into_iter()
                .map(|event| Row { event, links: None })
                .collect(),
            open: None,
        }
    }

    pub fn tournament(&self) -> &str {
        &self.tournament
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn events(&self) -> impl Iterator<Item = &MatchEvent> {
        self.rows.iter().map(|row| &row.event)
    }

    pub fn event(&self, index: usize) -> Result<&MatchEvent> {
        self.rows
            .get(index)
            .map(|row| &row.event)
            .ok_or(PopupError::InvalidIndex(index))
    }

    /// Index of the currently open popup, if any.
    pub fn open(&self) -> Option<usize> {
        self.open
    }

    /// The click interaction on a match's calendar trigger: any other open
    /// popup closes, then this one toggles. Returns whether the popup is
    /// now open. Opening a popup for the first time builds its links.
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        if index >= self.rows.len() {
            return Err(PopupError::InvalidIndex(index));
        }

        let was_open = self.open == Some(index);
        if was_open {
            self.open = None;
        } else {
            self.open = Some(index);
            let row = &mut self.rows[index];
            if row.links.is_none() {
                row.links = Some(CalendarLinks::build(&row.event, &self.tournament));
            }
        }

        Ok(!was_open)
    }

    pub fn close(&mut self, index: usize) -> Result<()> {
        if index >= self.rows.len() {
            return Err(PopupError::InvalidIndex(index));
        }
        if self.open == Some(index) {
            self.open = None;
        }
        Ok(())
    }

    /// A click anywhere outside the match rows closes every popup.
    pub fn close_all(&mut self) {
        self.open = None;
    }

    /// The cached links for a match. `Ok(None)` until the popup has been
    /// opened at least once.
    pub fn links(&self, index: usize) -> Result<Option<&CalendarLinks>> {
        self.rows
            .get(index)
            .map(|row| row.links.as_ref())
            .ok_or(PopupError::InvalidIndex(index))
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum PopupError {
    #[error("No match exists at the index {0}")]
    InvalidIndex(usize),
}

pub type Result<T> = std::result::Result<T, PopupError>;

#[cfg(test)]
mod test {
    use super::*;
    use time::macros::{date, time};

    fn popups() -> MatchdayPopups {
        MatchdayPopups::new(
            "Spring Open",
            vec![
                MatchEvent::new(date!(2026-08-25), Some(time!(14:30)), "R1 C1: A vs B"),
                MatchEvent::new(date!(2026-08-25), Some(time!(15:00)), "R1 C2: C vs D"),
                MatchEvent::new(date!(2026-08-26), None, "Finals"),
            ],
        )
    }

    #[test]
    fn test_toggle_opens_and_closes() {
        let mut popups = popups();
        assert_eq!(popups.open(), None);

        assert!(popups.toggle(0).unwrap());
        assert_eq!(popups.open(), Some(0));

        assert!(!popups.toggle(0).unwrap());
        assert_eq!(popups.open(), None);
    }

    #[test]
    fn test_at_most_one_popup_open() {
        let mut popups = popups();
        popups.toggle(0).unwrap();
        assert!(popups.toggle(1).unwrap());
        assert_eq!(popups.open(), Some(1));

        popups.toggle(2).unwrap();
        assert_eq!(popups.open(), Some(2));
    }

    #[test]
    fn test_links_build_on_first_open_and_stay_cached() {
        let mut popups = popups();
        assert_eq!(popups.links(0).unwrap(), None);

        popups.toggle(0).unwrap();
        let links = popups.links(0).unwrap().unwrap().clone();
        assert!(links.google.contains("Spring%20Open%20-%20R1%20C1%3A%20A%20vs%20B"));
        assert!(links.outlook.starts_with("https://outlook.live.com/"));

        // Closing does not drop the cached links
        popups.toggle(0).unwrap();
        assert_eq!(popups.links(0).unwrap(), Some(&links));

        popups.toggle(1).unwrap();
        assert_eq!(popups.links(0).unwrap(), Some(&links));
        assert!(popups.links(1).unwrap().is_some());
    }

    #[test]
    fn test_outside_click_closes_everything() {
        let mut popups = popups();
        popups.toggle(2).unwrap();
        popups.close_all();
        assert_eq!(popups.open(), None);

        // Links survive the close
        assert!(popups.links(2).unwrap().is_some());
    }

    #[test]
    fn test_close_only_affects_the_given_popup() {
        let mut popups = popups();
        popups.toggle(1).unwrap();

        popups.close(0).unwrap();
        assert_eq!(popups.open(), Some(1));

        popups.close(1).unwrap();
        assert_eq!(popups.open(), None);
    }

    #[test]
    fn test_out_of_range_index() {
        let mut popups = popups();
        assert_eq!(popups.toggle(3), Err(PopupError::InvalidIndex(3)));
        assert_eq!(popups.close(7), Err(PopupError::InvalidIndex(7)));
        assert_eq!(popups.links(3), Err(PopupError::InvalidIndex(3)));
        assert!(popups.event(3).is_err());
    }
}
