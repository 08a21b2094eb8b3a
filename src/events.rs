use crate::ring_buffer::{RingBuffer, RingBufferStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

/// Maximum number of activities kept in memory
pub const ACTIVITY_CAPACITY: usize = 500;
/// Number of activities returned when the caller gives no limit
pub const DEFAULT_GET_LIMIT: usize = 100;

/// Kinds of activity the watch system records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Frame-to-frame change above the reporting level
    Motion,
    /// High-contrast scene content
    Object,
    /// Raised by the alert monitor from recent activity
    Alert,
    /// Skin-tone regions seen in consecutive frames
    Person,
}

impl ActivityKind {
    /// Get the kind as a string for filtering and display
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Motion => "motion",
            ActivityKind::Object => "object",
            ActivityKind::Alert => "alert",
            ActivityKind::Person => "person",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

/// One logged, timestamped detection event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub timestamp: DateTime<Utc>,
    pub details: String,
    pub severity: Severity,
}

impl Activity {
    /// Get a human-readable description of the activity
    pub fn description(&self) -> String {
        format!(
            "[{}] {} ({:?}): {}",
            self.timestamp.format("%H:%M:%S"),
            self.kind.as_str(),
            self.severity,
            self.details
        )
    }
}

/// Aggregate counts over the activities currently held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivityStats {
    pub total: usize,
    pub motion: usize,
    pub object: usize,
    pub alert: usize,
    pub person: usize,
}

impl ActivityStats {
    fn count_mut(&mut self, kind: ActivityKind) -> &mut usize {
        match kind {
            ActivityKind::Motion => &mut self.motion,
            ActivityKind::Object => &mut self.object,
            ActivityKind::Alert => &mut self.alert,
            ActivityKind::Person => &mut self.person,
        }
    }

    fn record(&mut self, kind: ActivityKind) {
        self.total += 1;
        *self.count_mut(kind) += 1;
    }

    fn forget(&mut self, kind: ActivityKind) {
        self.total -= 1;
        *self.count_mut(kind) -= 1;
    }

    /// Count for a single kind
    pub fn count(&self, kind: ActivityKind) -> usize {
        match kind {
            ActivityKind::Motion => self.motion,
            ActivityKind::Object => self.object,
            ActivityKind::Alert => self.alert,
            ActivityKind::Person => self.person,
        }
    }
}

/// Change delivered to subscribers after the store has been mutated
#[derive(Debug, Clone, Copy)]
pub enum StoreEvent<'a> {
    Added {
        activity: &'a Activity,
        stats: ActivityStats,
    },
    Cleared,
}

/// Handle returned by [`ActivityStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use = "dropping the handle makes the subscription impossible to cancel"]
pub struct Subscription {
    id: u64,
}

type Subscriber = Box<dyn FnMut(&StoreEvent<'_>) -> anyhow::Result<()>>;

/// Capped, newest-first activity log with synchronous notification.
///
/// Subscribers run in registration order on the caller's thread right after
/// each `add` or `clear`. A subscriber that errors or panics is logged and
/// skipped; the store and the remaining subscribers are unaffected.
pub struct ActivityStore {
    activities: RingBuffer<Activity>,
    stats: ActivityStats,
    subscribers: Vec<(u64, Subscriber)>,
    next_subscriber_id: u64,
    subscriber_failures: u64,
}

impl ActivityStore {
    pub fn new() -> Self {
        Self::with_capacity(ACTIVITY_CAPACITY)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            activities: RingBuffer::new(capacity),
            stats: ActivityStats::default(),
            subscribers: Vec::new(),
            next_subscriber_id: 0,
            subscriber_failures: 0,
        }
    }

    /// Record a new activity and notify subscribers
    pub fn add<S: Into<String>>(
        &mut self,
        kind: ActivityKind,
        details: S,
        severity: Severity,
    ) -> Activity {
        let activity = Activity {
            id: uuid::Uuid::new_v4().simple().to_string(),
            kind,
            timestamp: Utc::now(),
            details: details.into(),
            severity,
        };

        debug!("Recording activity: {}", activity.description());

        self.stats.record(kind);
        if let Some(evicted) = self.activities.push(activity.clone()) {
            self.stats.forget(evicted.kind);
        }

        let event = StoreEvent::Added {
            activity: &activity,
            stats: self.stats,
        };
        self.subscriber_failures += notify_subscribers(&mut self.subscribers, &event);

        activity
    }

    /// Record a new activity with low severity
    pub fn add_default<S: Into<String>>(&mut self, kind: ActivityKind, details: S) -> Activity {
        self.add(kind, details, Severity::default())
    }

    /// The `limit` most recent activities, newest first
    pub fn get(&self, limit: usize) -> Vec<&Activity> {
        self.activities.recent(limit).collect()
    }

    /// Iterate every held activity, newest first
    pub fn iter(&self) -> impl Iterator<Item = &Activity> + '_ {
        self.activities.iter()
    }

    pub fn stats(&self) -> ActivityStats {
        self.stats
    }

    /// Lifetime push and eviction counters of the underlying log
    pub fn buffer_stats(&self) -> RingBufferStats {
        self.activities.stats()
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Register a callback invoked after every mutation
    pub fn subscribe<F>(&mut self, callback: F) -> Subscription
    where
        F: FnMut(&StoreEvent<'_>) -> anyhow::Result<()> + 'static,
    {
        let id = self.next_subscriber_id;
        self.next_subscriber_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        debug!("Subscriber {} registered ({} total)", id, self.subscribers.len());
        Subscription { id }
    }

    /// Remove a subscriber; returns false if it was already gone
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(id, _)| *id != subscription.id);
        let removed = self.subscribers.len() != before;
        if removed {
            debug!("Subscriber {} removed", subscription.id);
        }
        removed
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Number of subscriber invocations that failed or panicked
    pub fn subscriber_failures(&self) -> u64 {
        self.subscriber_failures
    }

    /// Drop every activity and notify subscribers
    pub fn clear(&mut self) {
        info!("Clearing {} activities", self.activities.len());
        self.activities.clear();
        self.stats = ActivityStats::default();
        self.subscriber_failures += notify_subscribers(&mut self.subscribers, &StoreEvent::Cleared);
    }
}

impl Default for ActivityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ActivityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityStore")
            .field("activities", &self.activities.len())
            .field("stats", &self.stats)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Invoke each subscriber in isolation, returning how many failed
fn notify_subscribers(subscribers: &mut [(u64, Subscriber)], event: &StoreEvent<'_>) -> u64 {
    let mut failures = 0;

    for (id, callback) in subscribers.iter_mut() {
        match catch_unwind(AssertUnwindSafe(|| callback(event))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Subscriber {} failed: {:#}", id, e);
                failures += 1;
            }
            Err(_) => {
                error!("Subscriber {} panicked during notification", id);
                failures += 1;
            }
        }
    }

    failures
}
