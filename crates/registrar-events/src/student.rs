use std::sync::Arc;

use crate::bus::{EmitReport, EventBus, Subscription};

/// Kind of mutation applied to a student record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudentChange {
    Created,
    Updated,
    Deleted,
}

impl StudentChange {
    pub const ALL: [Self; 3] = [Self::Created, Self::Updated, Self::Deleted];

    /// Bus event name carrying this change.
    pub fn event_name(self) -> &'static str {
        match self {
            Self::Created => "student:created",
            Self::Updated => "student:updated",
            Self::Deleted => "student:deleted",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl<P: 'static> EventBus<P> {
    /// Subscribe one callback to all three student events. The returned
    /// subscription removes all three registrations at once.
    pub fn on_student_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(StudentChange, &P) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        Subscription::merge(StudentChange::ALL.into_iter().map(|change| {
            let handler = Arc::clone(&handler);
            self.subscribe(change.event_name(), move |payload: &P| {
                handler(change, payload)
            })
        }))
    }

    pub fn trigger_student_change(&self, change: StudentChange, payload: &P) -> EmitReport {
        self.emit(change.event_name(), payload)
    }
}
