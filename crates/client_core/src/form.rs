//! Registration form controller.
//!
//! Owns the reference data, the live form state and the notice shown after a
//! submission. Rendering layers read [`RegistrationForm::view`] and feed edits
//! back through [`RegistrationForm::on_field_change`].

use std::sync::Arc;

use shared::{
    domain::{Country, CountryId, DocumentType, DocumentTypeId, ReferenceData},
    registration::{FieldValue, FormField, RegistrationInput, RegistrationVariables},
};
use tracing::{info, warn};

use crate::{
    error::{ClientError, FormError},
    RegistrationBackend,
};

pub const LOADING_MESSAGE: &str = "Loading form data...";
pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields.";
pub const NOT_READY_MESSAGE: &str = "The form is not ready for submission.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Idle,
    LoadingReferenceData,
    ReferenceError,
    Ready,
    Submitting,
    Submitted,
    SubmitError,
}

impl FormPhase {
    pub fn accepts_submission(self) -> bool {
        matches!(
            self,
            FormPhase::Ready | FormPhase::Submitted | FormPhase::SubmitError
        )
    }
}

/// Message shown to the user after a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Submission never left the client.
    Blocked {
        message: String,
        missing: Vec<FormField>,
    },
    /// Server accepted the registration.
    Success(String),
    /// Server answered `success: false`.
    Rejected(String),
    /// Transport or GraphQL failure.
    Failed(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Blocked { message, .. } => message,
            Notice::Success(message) | Notice::Rejected(message) | Notice::Failed(message) => {
                message
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Notice::Success(_))
    }
}

/// What a renderer should show right now.
#[derive(Debug, PartialEq, Eq)]
pub enum FormView<'a> {
    Loading,
    ReferenceError(&'a str),
    Ready {
        countries: &'a [Country],
        document_types: &'a [DocumentType],
        state: &'a RegistrationInput,
        busy: bool,
    },
}

impl FormView<'_> {
    pub fn headline(&self) -> String {
        match self {
            FormView::Loading => LOADING_MESSAGE.to_string(),
            FormView::ReferenceError(cause) => format!("Error loading form data: {cause}"),
            FormView::Ready { busy: true, .. } => "Registering...".to_string(),
            FormView::Ready { .. } => "Register".to_string(),
        }
    }
}

pub struct RegistrationForm {
    backend: Arc<dyn RegistrationBackend>,
    phase: FormPhase,
    reference: ReferenceData,
    reference_error: Option<String>,
    state: RegistrationInput,
    notice: Option<Notice>,
}

impl RegistrationForm {
    pub fn new(backend: Arc<dyn RegistrationBackend>) -> Self {
        Self {
            backend,
            phase: FormPhase::Idle,
            reference: ReferenceData::default(),
            reference_error: None,
            state: RegistrationInput::default(),
            notice: None,
        }
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn state(&self) -> &RegistrationInput {
        &self.state
    }

    pub fn reference_data(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Fetches countries and document types once. Later calls are no-ops.
    pub async fn load_reference_data(&mut self) {
        if !self.begin_reference_load() {
            return;
        }
        let backend = Arc::clone(&self.backend);
        let result = backend.fetch_reference_data().await;
        self.complete_reference_load(result);
    }

    /// Moves `Idle` to `LoadingReferenceData`. Returns false when a load already happened.
    pub fn begin_reference_load(&mut self) -> bool {
        if self.phase != FormPhase::Idle {
            return false;
        }
        self.phase = FormPhase::LoadingReferenceData;
        true
    }

    pub fn complete_reference_load(&mut self, result: Result<ReferenceData, ClientError>) {
        if self.phase != FormPhase::LoadingReferenceData {
            warn!(phase = ?self.phase, "ignoring reference data outside of a load");
            return;
        }
        match result {
            Ok(reference) => {
                info!(
                    countries = reference.countries.len(),
                    document_types = reference.document_types.len(),
                    "reference data loaded"
                );
                self.reference = reference;
                self.phase = FormPhase::Ready;
            }
            Err(error) => {
                warn!(%error, "failed to load reference data");
                self.reference_error = Some(error.to_string());
                self.phase = FormPhase::ReferenceError;
            }
        }
    }

    pub fn on_named_field_change(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), FormError> {
        let field = name.parse::<FormField>()?;
        self.on_field_change(field, value)
    }

    /// Applies one edit. Checkboxes take booleans, every other field takes text, and
    /// selections must name a loaded option or be cleared with "".
    pub fn on_field_change(
        &mut self,
        field: FormField,
        value: impl Into<FieldValue>,
    ) -> Result<(), FormError> {
        let value = value.into();
        if let FieldValue::Text(text) = &value {
            if field.is_selection() && !text.is_empty() && !self.offers_option(field, text) {
                return Err(FormError::UnknownOption {
                    field,
                    value: text.clone(),
                });
            }
        }
        self.state.set(field, value).map_err(|_| FormError::ValueKind {
            field,
            expected: if field.is_checkbox() { "boolean" } else { "text" },
        })
    }

    fn offers_option(&self, field: FormField, value: &str) -> bool {
        match field {
            FormField::Country => value
                .parse::<CountryId>()
                .is_ok_and(|id| self.reference.has_country(id)),
            FormField::DocumentType => value
                .parse::<DocumentTypeId>()
                .is_ok_and(|id| self.reference.has_document_type(id)),
            _ => true,
        }
    }

    /// Validates and sends the registration. The returned notice is also kept
    /// until [`RegistrationForm::dismiss_notice`].
    pub async fn submit(&mut self) -> Notice {
        if !self.phase.accepts_submission() {
            return self.block(NOT_READY_MESSAGE, Vec::new());
        }
        let missing = self.state.missing_required_fields();
        if !missing.is_empty() {
            warn!(missing = missing.len(), "registration blocked by empty required fields");
            return self.block(REQUIRED_FIELDS_MESSAGE, missing);
        }

        self.phase = FormPhase::Submitting;
        self.notice = None;
        let variables = RegistrationVariables {
            input: self.state.to_wire(),
        };
        let backend = Arc::clone(&self.backend);
        let notice = match backend.register_user(&variables).await {
            Ok(result) if result.success => {
                info!(user = ?result.user.as_ref().map(|user| user.id), "registration accepted");
                self.phase = FormPhase::Submitted;
                self.state = RegistrationInput::default();
                Notice::Success(result.message)
            }
            Ok(result) => {
                warn!(message = %result.message, "registration rejected");
                self.phase = FormPhase::SubmitError;
                Notice::Rejected(result.message)
            }
            Err(error) => {
                warn!(%error, "registration request failed");
                self.phase = FormPhase::SubmitError;
                Notice::Failed(format!("Error during registration: {error}"))
            }
        };
        self.notice = Some(notice.clone());
        notice
    }

    fn block(&mut self, message: &str, missing: Vec<FormField>) -> Notice {
        let notice = Notice::Blocked {
            message: message.to_string(),
            missing,
        };
        self.notice = Some(notice.clone());
        notice
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
        if matches!(self.phase, FormPhase::Submitted | FormPhase::SubmitError) {
            self.phase = FormPhase::Ready;
        }
    }

    pub fn view(&self) -> FormView<'_> {
        match self.phase {
            FormPhase::Idle | FormPhase::LoadingReferenceData => FormView::Loading,
            FormPhase::ReferenceError => {
                FormView::ReferenceError(self.reference_error.as_deref().unwrap_or_default())
            }
            FormPhase::Ready
            | FormPhase::Submitting
            | FormPhase::Submitted
            | FormPhase::SubmitError => FormView::Ready {
                countries: &self.reference.countries,
                document_types: &self.reference.document_types,
                state: &self.state,
                busy: self.phase == FormPhase::Submitting,
            },
        }
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
