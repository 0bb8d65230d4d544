//! Phases section of the course show page
//!
//! Phases are edited in a dialog over the section rather than on their own
//! routes. Every mutation refetches the course's phases.

use rust_decimal::Decimal;
use tracing::info;
use validator::Validate;

use super::form::{PendingFlag, SubmitOutcome};
use crate::application::{DataProvider, Resource};
use crate::domain::{CoursePhase, Filter, ListParams, PhaseValues, Sorter};
use crate::shared::{validate_form, AdminError, AdminResult};

pub const DEFAULT_DURATION_WEEKS: i32 = 4;

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct PhaseForm {
    #[validate(range(min = 1, message = "Phase number must be at least 1"))]
    pub phase_number: i32,
    #[validate(length(min = 1, message = "Phase name is required"))]
    pub phase_name: String,
    #[validate(range(min = 1, message = "Duration must be at least 1 week"))]
    pub duration_weeks: i32,
    pub price: Decimal,
}

const ORDER: [&str; 3] = ["phase_number", "phase_name", "duration_weeks"];

impl PhaseForm {
    fn numbered(phase_number: i32) -> Self {
        Self {
            phase_number,
            phase_name: String::new(),
            duration_weeks: DEFAULT_DURATION_WEEKS,
            price: Decimal::ZERO,
        }
    }

    pub fn check(&self) -> AdminResult<()> {
        validate_form(self, &ORDER)?;
        if self.phase_name.trim().is_empty() {
            return Err(AdminError::Validation("Phase name is required".to_string()));
        }
        if self.price < Decimal::ZERO {
            return Err(AdminError::Validation("Price cannot be negative".to_string()));
        }
        Ok(())
    }

    fn values(&self, course_id: &str) -> PhaseValues {
        PhaseValues {
            course_id: course_id.to_string(),
            phase_number: self.phase_number,
            phase_name: self.phase_name.trim().to_string(),
            duration_weeks: self.duration_weeks,
            price: self.price,
        }
    }
}

impl From<&CoursePhase> for PhaseForm {
    fn from(phase: &CoursePhase) -> Self {
        Self {
            phase_number: phase.phase_number,
            phase_name: phase.phase_name.clone(),
            duration_weeks: phase.duration_weeks.unwrap_or(DEFAULT_DURATION_WEEKS),
            price: phase.price,
        }
    }
}

/// Open add / edit dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseDialog {
    /// Phase being edited; `None` when adding.
    pub editing: Option<String>,
    pub form: PhaseForm,
}

impl PhaseDialog {
    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Phase"
        } else {
            "Add Phase"
        }
    }
}

pub struct PhasesSection {
    data: DataProvider,
    course_id: String,
    phases: Vec<CoursePhase>,
    error: Option<String>,
    dialog: Option<PhaseDialog>,
    saving: PendingFlag,
    confirm_delete: Option<String>,
    deleting: PendingFlag,
}

impl PhasesSection {
    pub fn new(data: DataProvider, course_id: &str) -> Self {
        Self {
            data,
            course_id: course_id.to_string(),
            phases: Vec::new(),
            error: None,
            dialog: None,
            saving: PendingFlag::new(),
            confirm_delete: None,
            deleting: PendingFlag::new(),
        }
    }

    pub async fn fetch(&mut self) -> AdminResult<()> {
        let params = ListParams::new()
            .filter(Filter::eq("course_id", self.course_id.as_str()))
            .sort(Sorter::asc("phase_number"));
        match self
            .data
            .list::<CoursePhase>(Resource::CoursePhases, &params)
            .await
        {
            Ok(response) => {
                self.phases = response.data;
                self.error = None;
                Ok(())
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn phases(&self) -> &[CoursePhase] {
        &self.phases
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dialog(&self) -> Option<&PhaseDialog> {
        self.dialog.as_ref()
    }

    /// Mutable form of the open dialog.
    pub fn dialog_form(&mut self) -> Option<&mut PhaseForm> {
        self.dialog.as_mut().map(|d| &mut d.form)
    }

    /// New phase numbered after the existing ones.
    pub fn open_create(&mut self) {
        let next = i32::try_from(self.phases.len()).map_or(i32::MAX, |n| n.saturating_add(1));
        self.dialog = Some(PhaseDialog {
            editing: None,
            form: PhaseForm::numbered(next),
        });
    }

    pub fn open_edit(&mut self, phase_id: &str) -> bool {
        let Some(phase) = self.phases.iter().find(|p| p.id == phase_id) else {
            return false;
        };
        self.dialog = Some(PhaseDialog {
            editing: Some(phase.id.clone()),
            form: PhaseForm::from(phase),
        });
        true
    }

    pub fn close(&mut self) {
        self.dialog = None;
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_pending()
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        let Some(_guard) = self.saving.try_begin() else {
            return SubmitOutcome::Busy;
        };
        let Some(dialog) = self.dialog.clone() else {
            return SubmitOutcome::Invalid("No phase dialog is open".to_string());
        };

        let outcome = match self.save(&dialog).await {
            Ok(()) => {
                self.dialog = None;
                match self.fetch().await {
                    Ok(()) => SubmitOutcome::Saved,
                    Err(err) => SubmitOutcome::from_error(&err),
                }
            }
            Err(err) => SubmitOutcome::from_error(&err),
        };
        if let Some(message) = outcome.error_message() {
            self.error = Some(message.to_string());
        }
        outcome
    }

    async fn save(&self, dialog: &PhaseDialog) -> AdminResult<()> {
        dialog.form.check()?;
        let values = dialog.form.values(&self.course_id);
        match &dialog.editing {
            Some(id) => {
                self.data.update(Resource::CoursePhases, id, &values).await?;
            }
            None => {
                self.data.create(Resource::CoursePhases, &values).await?;
            }
        }
        info!(
            course_id = %self.course_id,
            phase_number = values.phase_number,
            "Phase saved"
        );
        Ok(())
    }

    pub fn request_delete(&mut self, phase_id: impl Into<String>) {
        self.confirm_delete = Some(phase_id.into());
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.confirm_delete.as_deref()
    }

    pub fn cancel_delete(&mut self) {
        self.confirm_delete = None;
    }

    pub async fn confirm_delete(&mut self) -> SubmitOutcome {
        let Some(_guard) = self.deleting.try_begin() else {
            return SubmitOutcome::Busy;
        };
        let Some(id) = self.confirm_delete.take() else {
            return SubmitOutcome::Invalid("Nothing selected for deletion".to_string());
        };
        if let Err(err) = self.data.delete_one(Resource::CoursePhases, &id).await {
            self.error = Some(err.to_string());
            return SubmitOutcome::from_error(&err);
        }
        info!(course_id = %self.course_id, phase_id = %id, "Phase deleted");
        match self.fetch().await {
            Ok(()) => SubmitOutcome::Saved,
            Err(err) => SubmitOutcome::from_error(&err),
        }
    }
}
