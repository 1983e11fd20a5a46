use lpscope_domain::{Capture, Severity};
use serde::Serialize;

/// A missing or unusable envelope field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Stage 1 result. Errors abort the sweep; warnings do not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// No hard errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// A report with a single hard error.
    pub fn hard_error(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            errors: vec![ValidationIssue {
                field,
                severity: Severity::Error,
                message: message.into(),
            }],
            warnings: Vec::new(),
        }
    }

    fn require(&mut self, present: bool, field: &'static str) {
        if !present {
            self.errors.push(ValidationIssue {
                field,
                severity: Severity::Error,
                message: format!("required field `{field}` is missing"),
            });
        }
    }

    fn recommend(&mut self, present: bool, field: &'static str) {
        if !present {
            self.warnings.push(ValidationIssue {
                field,
                severity: Severity::Warning,
                message: format!("optional field `{field}` is missing"),
            });
        }
    }
}

/// Checks the capture envelope.
///
/// `protocol`, `captured_at` and `content` are required; `url`, `title`
/// and `image` only produce warnings.
pub fn validate(capture: &Capture) -> ValidationReport {
    let mut report = ValidationReport::default();

    report.require(capture.protocol_name().is_some(), "protocol");
    report.require(capture.captured_at.is_some(), "captured_at");
    report.require(capture.has_content(), "content");

    report.recommend(
        capture.url.as_deref().is_some_and(|u| !u.trim().is_empty()),
        "url",
    );
    report.recommend(
        capture.title.as_deref().is_some_and(|t| !t.trim().is_empty()),
        "title",
    );
    report.recommend(capture.has_image(), "image");

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{capture, ts};

    fn fields(issues: &[ValidationIssue]) -> Vec<&'static str> {
        issues.iter().map(|i| i.field).collect()
    }

    #[test]
    fn test_complete_capture_is_clean() {
        let capture = capture("orca")
            .with_url("https://app.example/portfolio")
            .with_title("Portfolio")
            .with_image(vec![0x89, 0x50]);
        let report = validate(&capture);
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_optional_fields_warn() {
        let report = validate(&capture("orca"));
        assert!(report.is_valid());
        assert_eq!(fields(&report.warnings), vec!["url", "title", "image"]);
    }

    #[test]
    fn test_required_fields_are_errors() {
        let capture = Capture {
            protocol: Some("  ".into()),
            captured_at: None,
            content: Some(serde_json::json!("")),
            ..Capture::default()
        };
        let report = validate(&capture);
        assert!(!report.is_valid());
        assert_eq!(fields(&report.errors), vec!["protocol", "captured_at", "content"]);

        let ok = Capture::new("orca", ts(0), serde_json::json!({ "rows": [1] }));
        assert!(validate(&ok).is_valid());
    }
}
