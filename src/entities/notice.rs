use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeDuration {
    Short,
    Long,
}

/// Transient, dismissible message shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
    pub duration: NoticeDuration,
}

impl Notice {
    pub fn short<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
            duration: NoticeDuration::Short,
        }
    }

    pub fn long<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
            duration: NoticeDuration::Long,
        }
    }
}

impl From<&Error> for Notice {
    fn from(err: &Error) -> Self {
        if err.is_fatal() {
            Notice::long(err.message.clone())
        } else {
            Notice::short(err.message.clone())
        }
    }
}
