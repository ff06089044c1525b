//! Error types for Shamba domain rules

use thiserror::Error;

/// Result type for domain validation
pub type Result<T> = std::result::Result<T, ValidationErrors>;

/// Every rule a candidate record violated, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.join(", "))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    /// Empty collection
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Record a violated rule
    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    /// `Ok(value)` when nothing was recorded
    pub fn into_result<T>(self, value: T) -> Result<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl Default for ValidationErrors {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_messages() {
        let mut errors = ValidationErrors::new();
        errors.push("Please add a title for the listing");
        errors.push("Price cannot be negative");
        assert_eq!(
            errors.to_string(),
            "Please add a title for the listing, Price cannot be negative"
        );
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationErrors::new().into_result(7), Ok(7));

        let mut errors = ValidationErrors::new();
        errors.push("bad");
        assert!(errors.into_result(()).is_err());
    }
}
