use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    Success,
    Failed,
}

/// The `{status, reason}` envelope handed to callers that speak the
/// document-store status shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub status: StatusKind,
    pub reason: String,
}

impl Status {
    pub fn success(reason: impl Into<String>) -> Self {
        Self {
            status: StatusKind::Success,
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: StatusKind::Failed,
            reason: reason.into(),
        }
    }

    /// Success carries `reason`; any error carries its own message.
    pub fn from_result<T>(result: &Result<T>, reason: impl Into<String>) -> Self {
        match result {
            Ok(_) => Self::success(reason),
            Err(e) => Self::failed(e.to_string()),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == StatusKind::Success
    }
}
