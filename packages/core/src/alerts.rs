//! User feedback messages.
//!
//! Every page action ends in an [`Alert`]. Failures are logged here, once,
//! and reduced to the message the user should see.

use std::fmt;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Success,
    Danger,
    Warning,
    Info,
}

impl AlertLevel {
    pub fn icon(self) -> &'static str {
        match self {
            AlertLevel::Success => "check-circle",
            AlertLevel::Danger => "exclamation-triangle",
            AlertLevel::Warning => "exclamation-circle",
            AlertLevel::Info => "info-circle",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlertLevel::Success => "success",
            AlertLevel::Danger => "danger",
            AlertLevel::Warning => "warning",
            AlertLevel::Info => "info",
        }
    }

    fn marker(self) -> &'static str {
        match self {
            AlertLevel::Success => "[ok]",
            AlertLevel::Danger => "[erro]",
            AlertLevel::Warning => "[atenção]",
            AlertLevel::Info => "[info]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

impl Alert {
    pub fn new(level: AlertLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(AlertLevel::Success, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(AlertLevel::Danger, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(AlertLevel::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(AlertLevel::Info, message)
    }

    /// Turn a failed action into what the user sees.
    ///
    /// Validation failures list the offending fields; a message sent back by
    /// the backend is shown as-is; anything else shows `fallback`.
    pub fn from_error(err: &AppError, fallback: &str) -> Self {
        match err {
            AppError::Validation(errors) => {
                tracing::warn!("Form rejected: {}", errors);
                let fields: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                Alert::warning(format!("Verifique os campos: {}", fields.join("; ")))
            }
            AppError::Backend(message) => {
                tracing::error!("{} ({})", fallback, message);
                Alert::danger(message.clone())
            }
            other => {
                tracing::error!("{} ({})", fallback, other);
                Alert::danger(fallback)
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.level == AlertLevel::Success
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level.marker(), self.message)
    }
}
