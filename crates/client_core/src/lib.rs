use async_trait::async_trait;
use shared::{
    domain::{ReferenceData, RegistrationResult},
    registration::RegistrationVariables,
};

pub mod error;
pub mod form;
pub mod transport;

pub use error::{ClientError, FormError};
pub use form::{FormPhase, FormView, Notice, RegistrationForm};
pub use transport::{ClientConfig, GraphQlClient};

/// Remote side of the registration form: one read for the selection lists, one write.
#[async_trait]
pub trait RegistrationBackend: Send + Sync {
    async fn fetch_reference_data(&self) -> Result<ReferenceData, ClientError>;
    async fn register_user(
        &self,
        variables: &RegistrationVariables,
    ) -> Result<RegistrationResult, ClientError>;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
