use thiserror::Error;

use crate::{booking::submission::ValidationError, pricing::rules::ConfigurationError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Pricing(#[from] ConfigurationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("catalog source failure: {0}")]
    CatalogSource(String),
    #[error("relay failure: {0}")]
    Relay(String),
    #[error("promo lookup failure: {0}")]
    Promo(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "Please check the highlighted fields and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "We could not reach the booking service. Please try again in a moment."
            }
            Self::Internal { .. } => "Something went wrong on our side. Please try again later.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(DomainError::Validation(_)) => Self::BadRequest {
                message: "booking validation failed".to_owned(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Relay(message) | ApplicationError::Promo(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Domain(DomainError::Pricing(error)) => {
                Self::Internal { message: error.to_string(), correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::CatalogSource(message) | ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::booking::submission::{FieldIssue, ValidationError};
    use crate::domain::service::ServiceId;
    use crate::errors::{ApplicationError, DomainError, InterfaceError};
    use crate::pricing::rules::ConfigurationError;

    fn validation_failure() -> ValidationError {
        ValidationError {
            issues: vec![FieldIssue {
                field: "name".to_owned(),
                code: "REQUIRED_FIELD_EMPTY".to_owned(),
                message: "Please tell us your name.".to_owned(),
            }],
        }
    }

    #[test]
    fn validation_error_maps_to_bad_request_interface_error() {
        let interface = ApplicationError::from(DomainError::Validation(validation_failure()))
            .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
    }

    #[test]
    fn bad_request_has_user_safe_message() {
        let interface = ApplicationError::from(DomainError::Validation(validation_failure()))
            .into_interface("req-2");

        assert_eq!(
            interface.user_message(),
            "Please check the highlighted fields and try again."
        );
    }

    #[test]
    fn relay_error_maps_to_service_unavailable() {
        let interface =
            ApplicationError::Relay("booking relay returned 502".to_owned()).into_interface("req-3");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "We could not reach the booking service. Please try again in a moment."
        );
    }

    #[test]
    fn pricing_configuration_error_maps_to_internal() {
        let interface = ApplicationError::from(DomainError::Pricing(
            ConfigurationError::UnknownService { service_id: ServiceId("svc-ghost".to_owned()) },
        ))
        .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "Something went wrong on our side. Please try again later.");
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface =
            ApplicationError::Configuration("invalid relay url".to_owned()).into_interface("req-5");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
    }
}
