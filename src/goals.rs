//! Goal lookup. Resolution is by exact period match and never invents a
//! number; defaulting is the caller's business through [`GoalFallback`].

use crate::models::{MonthlyGoal, YearlyGoal};

/// Goal for `(year, month)`. The first matching entry wins; a match whose
/// distance is missing or not a positive number resolves as unset.
pub fn resolve_monthly_goal(goals: &[MonthlyGoal], year: i32, month: u32) -> Option<f64> {
    goals
        .iter()
        .find(|goal| goal.year == year && goal.month == month)
        .and_then(|goal| usable(goal.distance_goal))
}

pub fn resolve_yearly_goal(goals: &[YearlyGoal], year: i32) -> Option<f64> {
    goals
        .iter()
        .find(|goal| goal.year == year)
        .and_then(|goal| usable(goal.distance_goal))
}

fn usable(distance: Option<f64>) -> Option<f64> {
    distance.filter(|value| value.is_finite() && *value > 0.0)
}

/// Policy for showing something when no goal is configured.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GoalFallback {
    #[default]
    None,
    Fixed(f64),
}

impl GoalFallback {
    /// Parses an environment value: empty or `none` disables the fallback,
    /// a positive number enables it.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("none") {
            return Some(Self::None);
        }
        value
            .parse::<f64>()
            .ok()
            .filter(|km| km.is_finite() && *km > 0.0)
            .map(Self::Fixed)
    }

    pub fn apply(self, resolved: Option<f64>) -> Option<f64> {
        match (resolved, self) {
            (Some(goal), _) => Some(goal),
            (None, Self::Fixed(km)) => Some(km),
            (None, Self::None) => None,
        }
    }
}
