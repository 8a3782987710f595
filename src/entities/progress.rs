use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteProgress {
    /// Meters travelled from the route start.
    pub distance_along_route: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteUpdateReason {
    Refresh,
    Increment,
    LanguageChange,
    Deviation,
    ManualReplan,
    Avoid,
    WithinRange,
}

impl RouteUpdateReason {
    /// Updates that keep the drawn geometry valid.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            Self::Refresh | Self::Increment | Self::LanguageChange
        )
    }
}

#[test]
fn only_refresh_increment_and_language_are_informational() {
    use RouteUpdateReason::*;

    for reason in [Refresh, Increment, LanguageChange] {
        assert!(reason.is_informational());
    }

    for reason in [Deviation, ManualReplan, Avoid, WithinRange] {
        assert!(!reason.is_informational());
    }
}
