//! Recovery strategies offered on the dashboard.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryStrategy {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub tips: &'static [&'static str],
}

pub const RECOVERY_STRATEGIES: &[RecoveryStrategy] = &[
    RecoveryStrategy {
        id: "rest-periods",
        name: "Rest Periods",
        description: "Schedule regular short rest breaks throughout your day.",
        tips: &[
            "Aim for 15-20 minute breaks every 1-2 hours",
            "Find a quiet, comfortable place",
            "Close your eyes if it helps reduce symptoms",
        ],
    },
    RecoveryStrategy {
        id: "hydration",
        name: "Hydration Reminders",
        description: "Stay well-hydrated to support brain recovery.",
        tips: &[
            "Drink 8-10 glasses of water daily",
            "Limit caffeine and alcohol",
            "Set regular reminders to drink water",
        ],
    },
    RecoveryStrategy {
        id: "screen-time",
        name: "Screen Time Management",
        description: "Reduce eye strain and sensory overload from screens.",
        tips: &[
            "Use night mode or blue light filters",
            "Follow the 20-20-20 rule: every 20 minutes, look 20 feet away for 20 seconds",
            "Take frequent breaks from screens",
        ],
    },
];

/// Look up a strategy by id.
#[must_use]
pub fn find(id: &str) -> Option<&'static RecoveryStrategy> {
    RECOVERY_STRATEGIES.iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_strategy() {
        assert_eq!(find("hydration").map(|s| s.name), Some("Hydration Reminders"));
        assert!(find("cold-plunge").is_none());
    }
}
