//! Analytics summary shown on the settings screen

use crate::record::AnalyticsEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate view of the analytics log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_events: usize,
    /// Event count per event type
    pub by_type: BTreeMap<String, usize>,
    pub first_event: Option<String>,
    pub latest_event: Option<String>,
}

impl AnalyticsSummary {
    /// Summarize events as returned by the store (newest first).
    pub fn from_events(events: &[AnalyticsEvent]) -> Self {
        let mut by_type = BTreeMap::new();
        for event in events {
            *by_type.entry(event.event_type.clone()).or_insert(0) += 1;
        }

        Self {
            total_events: events.len(),
            by_type,
            first_event: events.last().map(|e| e.timestamp.clone()),
            latest_event: events.first().map(|e| e.timestamp.clone()),
        }
    }

    pub fn event_types(&self) -> usize {
        self.by_type.len()
    }
}

impl std::fmt::Display for AnalyticsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Analytics Summary:")?;
        writeln!(f, "  Total events: {}", self.total_events)?;
        writeln!(f, "  Event types: {}", self.event_types())?;
        for (event_type, count) in &self.by_type {
            writeln!(f, "    {}: {}", event_type, count)?;
        }
        writeln!(f, "  First event: {}", self.first_event.as_deref().unwrap_or("-"))?;
        write!(f, "  Latest event: {}", self.latest_event.as_deref().unwrap_or("-"))
    }
}
