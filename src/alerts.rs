use crate::events::{ActivityKind, ActivityStore, Severity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

/// Number of recent activities the monitor looks at
const ALERT_WINDOW: usize = 50;
/// Per-kind sample taken from the window
const RECENT_PER_KIND: usize = 5;
/// Motion entries in the sample needed to alert (more than this)
const MOTION_ALERT_COUNT: usize = 3;
/// Object entries in the sample needed to alert (more than this)
const OBJECT_ALERT_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AlertKind {
    HighMotion,
    MultipleObjects,
}

impl AlertKind {
    pub fn message(&self) -> &'static str {
        match self {
            AlertKind::HighMotion => "High motion activity detected",
            AlertKind::MultipleObjects => "Multiple objects detected in frame",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AlertKind::HighMotion => Severity::High,
            AlertKind::MultipleObjects => Severity::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    fn raise(kind: AlertKind) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            timestamp: Utc::now(),
        }
    }
}

/// Alerts the current activity log warrants
pub fn evaluate(store: &ActivityStore) -> Vec<Alert> {
    let recent = store.get(ALERT_WINDOW);
    let sample = |kind: ActivityKind| {
        recent
            .iter()
            .filter(|activity| activity.kind == kind)
            .take(RECENT_PER_KIND)
            .count()
    };

    let mut alerts = Vec::new();
    if sample(ActivityKind::Motion) > MOTION_ALERT_COUNT {
        alerts.push(Alert::raise(AlertKind::HighMotion));
    }
    if sample(ActivityKind::Object) > OBJECT_ALERT_COUNT {
        alerts.push(Alert::raise(AlertKind::MultipleObjects));
    }
    alerts
}

/// Raises each alert once per activation and logs it to the store
#[derive(Debug, Default)]
pub struct AlertMonitor {
    active: HashSet<AlertKind>,
}

impl AlertMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate the store and record newly raised alerts as activities.
    ///
    /// An alert that stays warranted is not repeated; once its condition
    /// clears it can be raised again.
    pub fn check(&mut self, store: &mut ActivityStore) -> Vec<Alert> {
        let current = evaluate(store);
        let raised: Vec<Alert> = current
            .iter()
            .filter(|alert| !self.active.contains(&alert.kind))
            .cloned()
            .collect();

        self.active = current.iter().map(|alert| alert.kind).collect();

        for alert in &raised {
            info!("Alert raised: {}", alert.kind.message());
            store.add(ActivityKind::Alert, alert.kind.message(), alert.severity);
        }

        raised
    }

    pub fn is_active(&self, kind: AlertKind) -> bool {
        self.active.contains(&kind)
    }
}
