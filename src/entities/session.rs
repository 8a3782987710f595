use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{LocationSourceKind, RoutePlan, RouteProgress};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavigationSession {
    pub id: Uuid,
    pub plan: RoutePlan,
    pub progress: RouteProgress,
    pub source: LocationSourceKind,
    pub started_at: DateTime<Utc>,
}

impl NavigationSession {
    pub fn new(plan: RoutePlan, source: LocationSourceKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            plan,
            progress: RouteProgress {
                distance_along_route: 0.0,
            },
            source,
            started_at: Utc::now(),
        }
    }

    pub fn remaining_distance(&self) -> f64 {
        (self.plan.route().length - self.progress.distance_along_route).max(0.0)
    }
}
