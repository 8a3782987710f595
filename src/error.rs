use std::env;
use std::fmt::{self, Debug, Display};
use std::io;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl Error {
    /// Internal errors (codes below 100) cannot be recovered by reverting
    /// the session to its last stable state.
    pub fn is_fatal(&self) -> bool {
        matches!(self.code, 1..=99)
    }

    pub fn is_invalid_state_error(&self) -> bool {
        self.code == 100
    }

    pub fn is_permission_denied_error(&self) -> bool {
        self.code == 102
    }

    pub fn is_routing_error(&self) -> bool {
        self.code == 103
    }

    pub fn is_navigation_error(&self) -> bool {
        self.code == 104
    }

    pub fn is_asset_copy_error(&self) -> bool {
        self.code == 6
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        io_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        reqwest_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        serde_error(err)
    }
}

pub fn invalid_state_error() -> Error {
    Error {
        code: 100,
        message: "invalid state".into(),
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: 101,
        message: "invalid input".into(),
    }
}

pub fn permission_denied_error() -> Error {
    Error {
        code: 102,
        message: "location permission denied".into(),
    }
}

pub fn routing_error<M: Into<String>>(message: M) -> Error {
    Error {
        code: 103,
        message: message.into(),
    }
}

pub fn navigation_error<M: Into<String>>(message: M) -> Error {
    Error {
        code: 104,
        message: message.into(),
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn io_error(err: io::Error) -> Error {
    Error {
        code: 2,
        message: format!("io error: {}", err),
    }
}

pub fn reqwest_error(_: reqwest::Error) -> Error {
    Error {
        code: 3,
        message: "reqwest error".into(),
    }
}

pub fn upstream_error() -> Error {
    Error {
        code: 4,
        message: "upstream error".into(),
    }
}

pub fn unexpected_error() -> Error {
    Error {
        code: 5,
        message: "unexpected error".into(),
    }
}

pub fn asset_copy_error<T: Debug>(err: T) -> Error {
    Error {
        code: 6,
        message: format!("asset copy error: {:?}", err),
    }
}

pub fn serde_error(_: serde_json::Error) -> Error {
    Error {
        code: 7,
        message: "serialization error".into(),
    }
}

#[test]
fn fatal_errors_are_internal_codes() {
    assert!(asset_copy_error("missing").is_fatal());
    assert!(upstream_error().is_fatal());
    assert!(!routing_error("no route").is_fatal());
    assert!(!navigation_error("lost").is_fatal());
    assert!(!permission_denied_error().is_fatal());
}

#[test]
fn routing_error_keeps_message() {
    let err = routing_error("No route found");

    assert!(err.is_routing_error());
    assert_eq!(err.message, "No route found");
    assert_eq!(err.to_string(), "No route found (code 103)");
}

#[test]
fn predicates_match_their_constructors() {
    assert!(permission_denied_error().is_permission_denied_error());
    assert!(navigation_error("lost").is_navigation_error());
    assert!(asset_copy_error("missing").is_asset_copy_error());
    assert!(!navigation_error("lost").is_routing_error());
    assert!(!routing_error("no route").is_navigation_error());
    assert!(!upstream_error().is_asset_copy_error());
}
