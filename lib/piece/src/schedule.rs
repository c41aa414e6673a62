//! Polling schedules returned by trigger hooks.

use crate::error::ScheduleError;
use serde::{Deserialize, Serialize};

const CRON_FIELDS: usize = 5;

/// When a polling trigger should be asked for new items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOptions {
    /// Five-field cron expression.
    pub cron_expression: String,
    /// IANA timezone for evaluation; UTC when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl ScheduleOptions {
    /// Creates a schedule evaluated in UTC.
    #[must_use]
    pub fn cron(expression: impl Into<String>) -> Self {
        Self {
            cron_expression: expression.into(),
            timezone: None,
        }
    }

    /// Sets the timezone.
    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    /// Checks the shape of the cron expression.
    ///
    /// # Errors
    ///
    /// Returns an error unless the expression has exactly five fields.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        let fields = self.cron_expression.split_whitespace().count();
        if fields != CRON_FIELDS {
            return Err(ScheduleError::InvalidCronExpression {
                expression: self.cron_expression.clone(),
                reason: format!("expected {CRON_FIELDS} fields, got {fields}"),
            });
        }
        Ok(())
    }
}
