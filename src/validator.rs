// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Inquiry submission validator.
//!
//! Runs only after the rate limiter admitted a request:
//! - Content-Type validation
//! - Required fields per form kind
//! - E-mail shape
//! - Field length caps

use crate::config::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// The public forms guarded by the limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryKind {
    Contact,
    ProductInquiry,
    ServiceInquiry,
}

impl InquiryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::ProductInquiry => "product_inquiry",
            Self::ServiceInquiry => "service_inquiry",
        }
    }
}

impl fmt::Display for InquiryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted form. Which fields are required depends on the kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InquiryForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub product: Option<String>,
    pub service: Option<String>,
}

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid Content-Type: expected one of {expected:?}, got {actual:?}")]
    InvalidContentType {
        expected: Vec<String>,
        actual: Option<String>,
    },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field {field} exceeds {max} characters")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// Submission is valid
    Valid,
    /// Submission is invalid
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }
}

impl From<Result<(), ValidationError>> for ValidationResult {
    fn from(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => ValidationResult::Valid,
            Err(e) => ValidationResult::Invalid(e),
        }
    }
}

/// Inquiry submission validator.
pub struct InquiryValidator {
    config: ValidationConfig,
}

impl InquiryValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate the Content-Type header.
    pub fn validate_content_type(&self, content_type: Option<&str>) -> ValidationResult {
        let ct = content_type.map(media_type);

        let accepted = ct.as_ref().is_some_and(|actual| {
            self.config
                .accepted_content_types
                .iter()
                .any(|expected| expected.eq_ignore_ascii_case(actual))
        });

        if accepted {
            ValidationResult::Valid
        } else {
            debug!(content_type = ?ct, "Content-Type rejected");
            ValidationResult::Invalid(ValidationError::InvalidContentType {
                expected: self.config.accepted_content_types.clone(),
                actual: ct,
            })
        }
    }

    /// Validate the fields of a submission of the given kind.
    pub fn validate_form(&self, kind: InquiryKind, form: &InquiryForm) -> ValidationResult {
        self.check_form(kind, form).into()
    }

    fn check_form(&self, kind: InquiryKind, form: &InquiryForm) -> Result<(), ValidationError> {
        let short = self.config.max_field_len;

        self.required("name", form.name.as_deref(), short)?;
        let email = self.required("email", form.email.as_deref(), short)?;
        if !is_plausible_email(email) {
            debug!(%kind, "Invalid email address");
            return Err(ValidationError::InvalidEmail(email.to_string()));
        }
        self.optional("phone", form.phone.as_deref(), short)?;

        let message_max = self.config.max_message_len;
        match kind {
            InquiryKind::Contact => {
                self.required("message", form.message.as_deref(), message_max)?;
            }
            InquiryKind::ProductInquiry => {
                self.required("product", form.product.as_deref(), short)?;
                self.optional("message", form.message.as_deref(), message_max)?;
            }
            InquiryKind::ServiceInquiry => {
                self.required("service", form.service.as_deref(), short)?;
                self.optional("message", form.message.as_deref(), message_max)?;
            }
        }

        Ok(())
    }

    /// Validate a complete submission.
    pub fn validate(
        &self,
        kind: InquiryKind,
        content_type: Option<&str>,
        form: &InquiryForm,
    ) -> ValidationResult {
        let ct_result = self.validate_content_type(content_type);
        if !ct_result.is_valid() {
            return ct_result;
        }

        self.validate_form(kind, form)
    }

    fn required<'a>(
        &self,
        field: &'static str,
        value: Option<&'a str>,
        max: usize,
    ) -> Result<&'a str, ValidationError> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => {
                check_len(field, v, max)?;
                Ok(v)
            }
            _ => Err(ValidationError::MissingField(field)),
        }
    }

    fn optional(
        &self,
        field: &'static str,
        value: Option<&str>,
        max: usize,
    ) -> Result<(), ValidationError> {
        match value {
            Some(v) => check_len(field, v.trim(), max),
            None => Ok(()),
        }
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        Err(ValidationError::FieldTooLong { field, max })
    } else {
        Ok(())
    }
}

/// Extract just the media type, ignoring charset etc.
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase()
}

/// One `@`, a non-empty local part, and a dotted domain without blanks.
fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    !local.is_empty()
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
