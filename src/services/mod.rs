// Master data
pub mod clients;
pub mod qualities;

// Packing reports and their printable/spreadsheet renditions
pub mod exports;
pub mod reports;

// Sample data loader
pub mod seed;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use sea_orm::{sea_query::LikeExpr, DbErr, SqlErr};
use std::sync::Arc;
use validator::ValidationError;

/// Rejects strings that are empty once surrounding whitespace is removed.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Trims an optional text field, turning whitespace-only input into `None`.
pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `LIKE` pattern matching `term` anywhere, with `%`, `_` and `\` in `term` taken literally.
pub(crate) fn substring_pattern(term: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape('\\')
}

/// Maps a unique-index violation to the given validation message, anything else to a database error.
pub(crate) fn unique_violation(message: &'static str) -> impl FnOnce(DbErr) -> ServiceError {
    move |e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::ValidationError(message.into()),
        _ => {
            tracing::error!(error = %e, "Database write failed");
            ServiceError::DatabaseError(e)
        }
    }
}

pub(crate) async fn publish(sender: &Option<Arc<EventSender>>, event: Event) {
    if let Some(sender) = sender {
        sender.publish(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_blank_rejects_whitespace() {
        assert!(not_blank("  \t").is_err());
        assert!(not_blank("").is_err());
        assert!(not_blank(" Rct 277 ").is_ok());
    }

    #[test]
    fn trimmed_drops_empty_values() {
        assert_eq!(trimmed(Some("  ".into())), None);
        assert_eq!(trimmed(Some(" GJ05 AB 1234 ".into())), Some("GJ05 AB 1234".into()));
        assert_eq!(trimmed(None), None);
    }

    #[test]
    fn unique_violation_passes_other_errors_through() {
        let err = unique_violation("duplicate")(DbErr::Custom("boom".into()));
        assert!(matches!(err, ServiceError::DatabaseError(_)));
    }
}
