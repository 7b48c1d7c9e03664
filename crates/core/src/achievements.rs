use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Statistic an achievement threshold is measured against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    ExpenseCount,
    StreakDays,
    GoalsCompleted,
}

/// Read-only snapshot of the numbers achievements are judged on.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserStats {
    pub expense_count: u64,
    pub streak_days: u64,
    pub goals_completed: u64,
}

impl UserStats {
    pub fn value(&self, metric: Metric) -> u64 {
        match metric {
            Metric::ExpenseCount => self.expense_count,
            Metric::StreakDays => self.streak_days,
            Metric::GoalsCompleted => self.goals_completed,
        }
    }
}

/// Static achievement definition.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub metric: Metric,
    pub threshold: u64,
    pub points: i64,
}

impl AchievementDef {
    pub fn is_met(&self, stats: &UserStats) -> bool {
        stats.value(self.metric) >= self.threshold
    }

    /// Progress towards the threshold in percent, capped at 100.
    pub fn progress_pct(&self, stats: &UserStats) -> f64 {
        if self.threshold == 0 {
            return 100.0;
        }
        (stats.value(self.metric) as f64 / self.threshold as f64 * 100.0).min(100.0)
    }
}

/// Every achievement a user can earn. The single source of thresholds and points.
pub const CATALOGUE: &[AchievementDef] = &[
    AchievementDef {
        id: "first_expense",
        name: "First Step",
        description: "Log your first expense",
        metric: Metric::ExpenseCount,
        threshold: 1,
        points: 10,
    },
    AchievementDef {
        id: "expense_tracker",
        name: "Expense Tracker",
        description: "Log 10 expenses",
        metric: Metric::ExpenseCount,
        threshold: 10,
        points: 50,
    },
    AchievementDef {
        id: "expense_pro",
        name: "Expense Pro",
        description: "Log 50 expenses",
        metric: Metric::ExpenseCount,
        threshold: 50,
        points: 100,
    },
    AchievementDef {
        id: "budget_master",
        name: "Budget Master",
        description: "Log 100 expenses",
        metric: Metric::ExpenseCount,
        threshold: 100,
        points: 200,
    },
    AchievementDef {
        id: "week_streak",
        name: "Week Warrior",
        description: "Track expenses 7 days in a row",
        metric: Metric::StreakDays,
        threshold: 7,
        points: 75,
    },
    AchievementDef {
        id: "month_streak",
        name: "Consistency King",
        description: "Track expenses 30 days in a row",
        metric: Metric::StreakDays,
        threshold: 30,
        points: 250,
    },
    AchievementDef {
        id: "first_goal",
        name: "Goal Getter",
        description: "Complete your first savings goal",
        metric: Metric::GoalsCompleted,
        threshold: 1,
        points: 100,
    },
    AchievementDef {
        id: "goal_crusher",
        name: "Goal Crusher",
        description: "Complete 5 savings goals",
        metric: Metric::GoalsCompleted,
        threshold: 5,
        points: 300,
    },
];

pub fn find(id: &str) -> Option<&'static AchievementDef> {
    CATALOGUE.iter().find(|def| def.id == id)
}

/// Achievements whose threshold is met by `stats` and that are not in `earned`.
///
/// Returned in catalogue order. Calling again with the result added to `earned`
/// yields nothing new for the same `stats`.
pub fn newly_earned<'a, I>(stats: &UserStats, earned: I) -> Vec<&'static AchievementDef>
where
    I: IntoIterator<Item = &'a str>,
{
    let earned: HashSet<&str> = earned.into_iter().collect();
    CATALOGUE
        .iter()
        .filter(|def| !earned.contains(def.id) && def.is_met(stats))
        .collect()
}

/// Sum of points for the earned ids that exist in the catalogue.
pub fn total_points<'a, I>(earned: I) -> i64
where
    I: IntoIterator<Item = &'a str>,
{
    earned
        .into_iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .filter_map(find)
        .map(|def| def.points)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(expenses: u64, streak: u64, goals: u64) -> UserStats {
        UserStats {
            expense_count: expenses,
            streak_days: streak,
            goals_completed: goals,
        }
    }

    fn ids(defs: &[&AchievementDef]) -> Vec<&'static str> {
        defs.iter().map(|d| d.id).collect()
    }

    #[test]
    fn tenth_expense_unlocks_expense_tracker() {
        let earned = ["first_expense"];
        let before = newly_earned(&stats(9, 0, 0), earned);
        assert!(before.is_empty());

        let after = newly_earned(&stats(10, 0, 0), earned);
        assert_eq!(ids(&after), vec!["expense_tracker"]);
    }

    #[test]
    fn eleventh_expense_awards_nothing_new() {
        let earned = ["first_expense", "expense_tracker"];
        assert!(newly_earned(&stats(11, 0, 0), earned).is_empty());
    }

    #[test]
    fn reevaluation_is_idempotent() {
        for expenses in [0, 1, 9, 10, 49, 50, 120] {
            for streak in [0, 6, 7, 31] {
                for goals in [0, 1, 5, 9] {
                    let s = stats(expenses, streak, goals);
                    let mut earned: Vec<&str> = Vec::new();
                    let first = newly_earned(&s, earned.iter().copied());
                    earned.extend(first.iter().map(|d| d.id));
                    let second = newly_earned(&s, earned.iter().copied());
                    assert!(second.is_empty(), "re-awarded for {s:?}: {:?}", ids(&second));
                }
            }
        }
    }

    #[test]
    fn simultaneous_unlocks_all_awarded() {
        let awarded = newly_earned(&stats(10, 7, 1), std::iter::empty());
        assert_eq!(
            ids(&awarded),
            vec![
                "first_expense",
                "expense_tracker",
                "week_streak",
                "first_goal"
            ]
        );
    }

    #[test]
    fn unknown_earned_ids_are_ignored() {
        let awarded = newly_earned(&stats(1, 0, 0), ["legacy_badge"]);
        assert_eq!(ids(&awarded), vec!["first_expense"]);
        assert_eq!(total_points(["legacy_badge", "first_expense"]), 10);
    }

    #[test]
    fn total_points_counts_each_id_once() {
        assert_eq!(total_points(["first_goal", "first_goal", "week_streak"]), 175);
    }

    #[test]
    fn progress_is_capped() {
        let def = find("expense_tracker").unwrap();
        assert_eq!(def.progress_pct(&stats(5, 0, 0)), 50.0);
        assert_eq!(def.progress_pct(&stats(40, 0, 0)), 100.0);
    }

    #[test]
    fn catalogue_ids_are_unique() {
        let unique: HashSet<_> = CATALOGUE.iter().map(|d| d.id).collect();
        assert_eq!(unique.len(), CATALOGUE.len());
    }
}
