//! Form plumbing shared by the create/edit pages

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::shared::AdminError;

/// What a submit did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Saved; continue at this path.
    Navigate(String),
    /// Saved; stay on the page.
    Saved,
    /// Rejected locally, nothing was sent.
    Invalid(String),
    /// The backend refused; message as reported.
    Failed(String),
    /// Another mutation of this form is still in flight.
    Busy,
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Navigate(_) | Self::Saved)
    }

    /// Validation errors block the call; everything else came back from it.
    pub fn from_error(err: &AdminError) -> Self {
        match err {
            AdminError::Validation(msg) => Self::Invalid(msg.clone()),
            other => Self::Failed(other.to_string()),
        }
    }

    /// Message shown in the page's error banner.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Invalid(msg) | Self::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

/// In-flight flag of one mutation. Clones share the flag, so a front end
/// can watch it to disable controls.
#[derive(Debug, Clone, Default)]
pub struct PendingFlag(Arc<AtomicBool>);

impl PendingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Claim the flag; `None` while another holder has it. The flag drops
    /// back when the guard does, even if the request future is abandoned.
    pub fn try_begin(&self) -> Option<PendingGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| PendingGuard(self.0.clone()))
    }
}

pub struct PendingGuard(Arc<AtomicBool>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Select filter with an "all" sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Choice<T> {
    #[default]
    All,
    Only(T),
}

pub const ALL: &str = "all";

impl<T> Choice<T> {
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn selected(&self) -> Option<&T> {
        match self {
            Self::All => None,
            Self::Only(v) => Some(v),
        }
    }

    /// `"all"` (or anything `parse` rejects) selects everything.
    pub fn from_select(value: &str, parse: impl FnOnce(&str) -> Option<T>) -> Self {
        if value == ALL {
            return Self::All;
        }
        parse(value).map(Self::Only).unwrap_or(Self::All)
    }
}

/// `None` for blank input.
pub fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_flag_is_exclusive_and_self_releasing() {
        let flag = PendingFlag::new();
        let guard = flag.try_begin().unwrap();
        assert!(flag.is_pending());
        assert!(flag.clone().try_begin().is_none());
        drop(guard);
        assert!(!flag.is_pending());
        assert!(flag.try_begin().is_some());
    }

    #[test]
    fn choice_parses_sentinel() {
        let parse = |s: &str| s.parse::<u8>().ok();
        assert_eq!(Choice::from_select("all", parse), Choice::All);
        assert_eq!(Choice::from_select("7", parse), Choice::Only(7));
        assert_eq!(Choice::from_select("x", parse), Choice::All);
    }

    #[test]
    fn outcome_from_error() {
        assert_eq!(
            SubmitOutcome::from_error(&AdminError::Validation("Title must be at least 3 characters".into())),
            SubmitOutcome::Invalid("Title must be at least 3 characters".into())
        );
        let failed = SubmitOutcome::from_error(&AdminError::remote(Some(409), "duplicate key"));
        assert_eq!(failed.error_message(), Some("duplicate key"));
        assert!(!failed.is_success());
    }
}
