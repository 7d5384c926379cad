use crate::signal::{RefreshError, RefreshedGroups, SignalAdminClient, SignalGroup};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const ID_PREFIX_LEN: usize = 30;

pub const IDLE_LABEL: &str = "Refresh Groups";
pub const BUSY_LABEL: &str = "Refreshing...";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

/// Headless model of the admin recipient-groups multi-select and its
/// refresh button. The triggering control is disabled for the duration of
/// a refresh and re-enabled unconditionally, so repeated triggers are
/// serialized here rather than at the network layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPicker {
    options: Vec<PickerOption>,
    #[serde(skip)]
    refreshing: bool,
}

impl GroupPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&self) -> &[PickerOption] {
        &self.options
    }

    pub fn selected_ids(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|opt| opt.selected)
            .map(|opt| opt.id.as_str())
            .collect()
    }

    pub fn select(&mut self, id: &str) -> bool {
        match self.options.iter_mut().find(|opt| opt.id == id) {
            Some(opt) => {
                opt.selected = true;
                true
            }
            None => false,
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn control_label(&self) -> &'static str {
        if self.refreshing { BUSY_LABEL } else { IDLE_LABEL }
    }

    pub fn start_refresh(&mut self) -> Result<()> {
        if self.refreshing {
            return Err(PickerError::RefreshInProgress);
        }
        self.refreshing = true;
        Ok(())
    }

    /// Replaces the option list with one option per group that has a
    /// resolvable id, keeping the selected state of any id that was
    /// selected before. Returns the number of options produced.
    pub fn apply_groups(&mut self, groups: &[SignalGroup]) -> usize {
        let selected: Vec<String> = self
            .selected_ids()
            .into_iter()
            .map(str::to_string)
            .collect();
        debug!("Previously selected groups: {selected:?}");

        self.options.clear();
        for group in groups {
            let Some(id) = group.resolved_id() else {
                debug!("Skipping group '{}' with no id", group.display_name());
                continue;
            };

            debug!("Processing group: {} {id}", group.display_name());
            let id_prefix: String = id.chars().take(ID_PREFIX_LEN).collect();
            self.options.push(PickerOption {
                label: format!("{} ({id_prefix}...)", group.display_name()),
                selected: selected.iter().any(|s| s == id),
                id: id.to_string(),
            });
        }

        self.options.len()
    }

    /// Finishes the refresh that `start_refresh` began: applies the groups
    /// on success, leaves the options untouched on any failure, and
    /// re-enables the control in every case.
    pub fn complete_refresh(
        &mut self,
        result: std::result::Result<RefreshedGroups, RefreshError>,
    ) -> Result<RefreshNotice> {
        if !self.refreshing {
            return Err(PickerError::NoRefreshInProgress);
        }

        let notice = match result {
            Ok(refreshed) => {
                let applied = self.apply_groups(&refreshed.groups);
                debug!(
                    "Applied {applied} of {} refreshed group(s)",
                    refreshed.groups.len()
                );
                RefreshNotice::Success {
                    count: refreshed.count,
                }
            }
            Err(RefreshError::Backend(reason)) => RefreshNotice::Failed { reason },
            Err(e) => RefreshNotice::Error {
                message: e.to_string(),
            },
        };

        self.refreshing = false;
        Ok(notice)
    }

    /// The whole click interaction: disable the control, make one request,
    /// apply the outcome, re-enable the control.
    pub async fn refresh(&mut self, client: &SignalAdminClient) -> Result<RefreshNotice> {
        self.start_refresh()?;
        let result = client.refresh_groups().await;
        self.complete_refresh(result)
    }
}

/// The one blocking notification the operator sees per refresh attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshNotice {
    Success { count: u64 },
    Failed { reason: String },
    Error { message: String },
}

impl RefreshNotice {
    pub fn is_success(&self) -> bool {
        matches!(self, RefreshNotice::Success { .. })
    }
}

impl fmt::Display for RefreshNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshNotice::Success { count } => {
                write!(f, "Successfully refreshed! Found {count} group(s).")
            }
            RefreshNotice::Failed { reason } => {
                write!(f, "Failed to refresh groups: {reason}")
            }
            RefreshNotice::Error { message } => {
                write!(f, "Error refreshing groups: {message}")
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum PickerError {
    #[error("There is already a refresh in progress")]
    RefreshInProgress,
    #[error("There is no refresh in progress")]
    NoRefreshInProgress,
}

pub type Result<T> = std::result::Result<T, PickerError>;
