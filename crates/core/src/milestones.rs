//! Goal progress milestones.
//!
//! Each update to a goal's current amount produces at most one notification:
//! the highest band crossed by the update, or a plain progress note when the
//! amount grew without crossing a band.

use serde::{Deserialize, Serialize};

/// Milestone bands in percent, highest first.
pub const BANDS: &[(f64, MilestoneKind)] = &[
    (100.0, MilestoneKind::Completed),
    (90.0, MilestoneKind::Ninety),
    (75.0, MilestoneKind::SeventyFive),
    (50.0, MilestoneKind::Fifty),
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKind {
    Completed,
    Ninety,
    SeventyFive,
    Fifty,
    Progress,
}

impl MilestoneKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Ninety => "ninety",
            Self::SeventyFive => "seventy_five",
            Self::Fifty => "fifty",
            Self::Progress => "progress",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Milestone {
    pub kind: MilestoneKind,
    pub progress_pct: f64,
    pub message: String,
}

impl Milestone {
    pub fn completes_goal(&self) -> bool {
        self.kind == MilestoneKind::Completed
    }
}

pub fn progress_pct(current: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    current / target * 100.0
}

/// A goal's saved amount and target at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Funding {
    pub current: f64,
    pub target: f64,
}

impl Funding {
    pub fn new(current: f64, target: f64) -> Self {
        Self { current, target }
    }

    pub fn pct(&self) -> f64 {
        progress_pct(self.current, self.target)
    }
}

/// Kind of notification for an update from `old` to `new`.
///
/// Each side's percentage is taken against its own target. Only a grown
/// amount is reported.
pub fn classify(old: Funding, new: Funding) -> Option<MilestoneKind> {
    if new.target <= 0.0 || new.current <= old.current {
        return None;
    }
    let old_pct = old.pct();
    let new_pct = new.pct();
    let crossed = BANDS
        .iter()
        .find(|(band, _)| old_pct < *band && new_pct >= *band)
        .map(|(_, kind)| *kind);
    Some(crossed.unwrap_or(MilestoneKind::Progress))
}

/// Notification for a goal update, with a user-facing message.
pub fn detect(title: &str, old: Funding, new: Funding) -> Option<Milestone> {
    let kind = classify(old, new)?;
    let pct = new.pct();
    let message = match kind {
        MilestoneKind::Completed => format!("Goal completed: {title}"),
        MilestoneKind::Ninety => format!("90% complete: {title}"),
        MilestoneKind::SeventyFive => format!("75% complete: {title}"),
        MilestoneKind::Fifty => format!("50% complete: {title}"),
        MilestoneKind::Progress => format!("Progress updated: {title} is {pct:.0}% funded"),
    };
    Some(Milestone {
        kind,
        progress_pct: pct,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: f64 = 1000.0;

    fn kind(old_pct: f64, new_pct: f64) -> Option<MilestoneKind> {
        classify(
            Funding::new(old_pct * 10.0, TARGET),
            Funding::new(new_pct * 10.0, TARGET),
        )
    }

    #[test]
    fn crossing_seventy_five_fires_once() {
        assert_eq!(kind(70.0, 80.0), Some(MilestoneKind::SeventyFive));
        assert_eq!(kind(80.0, 85.0), Some(MilestoneKind::Progress));
    }

    #[test]
    fn eighty_to_ninety_six_fires_ninety() {
        assert_eq!(kind(80.0, 96.0), Some(MilestoneKind::Ninety));
    }

    #[test]
    fn multi_band_jump_reports_highest() {
        assert_eq!(kind(40.0, 95.0), Some(MilestoneKind::Ninety));
        assert_eq!(kind(10.0, 60.0), Some(MilestoneKind::Fifty));
    }

    #[test]
    fn reaching_target_is_always_completed() {
        for old in [0.0, 10.0, 49.9, 50.0, 75.0, 89.0, 90.0, 99.9] {
            for new in [100.0, 100.5, 150.0, 400.0] {
                assert_eq!(
                    kind(old, new),
                    Some(MilestoneKind::Completed),
                    "{old}% -> {new}%"
                );
            }
        }
    }

    #[test]
    fn exact_band_boundary_counts_as_crossed() {
        assert_eq!(kind(49.0, 50.0), Some(MilestoneKind::Fifty));
        assert_eq!(kind(50.0, 51.0), Some(MilestoneKind::Progress));
    }

    #[test]
    fn decrease_or_no_change_is_silent() {
        assert_eq!(kind(80.0, 60.0), None);
        assert_eq!(kind(60.0, 60.0), None);
    }

    #[test]
    fn already_complete_goal_only_reports_progress() {
        assert_eq!(kind(100.0, 120.0), Some(MilestoneKind::Progress));
    }

    #[test]
    fn zero_target_never_fires() {
        assert_eq!(classify(Funding::new(0.0, 0.0), Funding::new(500.0, 0.0)), None);
    }

    #[test]
    fn target_change_measures_from_the_old_target() {
        // 600 of 1000 is 60%; 620 of 700 is about 88.6%.
        let old = Funding::new(600.0, 1000.0);
        let new = Funding::new(620.0, 700.0);
        assert_eq!(classify(old, new), Some(MilestoneKind::SeventyFive));

        // Lowering the target alone moves the percentage but not the amount.
        assert_eq!(classify(old, Funding::new(600.0, 600.0)), None);

        // Raising the target can pull a goal back under a band it had passed.
        let old = Funding::new(800.0, 1000.0);
        let new = Funding::new(850.0, 2000.0);
        assert_eq!(classify(old, new), Some(MilestoneKind::Progress));
    }

    #[test]
    fn messages_name_the_goal() {
        let m = detect("Vacation", Funding::new(700.0, 1000.0), Funding::new(800.0, 1000.0)).unwrap();
        assert_eq!(m.message, "75% complete: Vacation");
        assert!(!m.completes_goal());

        let done = detect(
            "Vacation",
            Funding::new(950.0, 1000.0),
            Funding::new(1000.0, 1000.0),
        ).unwrap();
        assert_eq!(done.message, "Goal completed: Vacation");
        assert!(done.completes_goal());

        let small = detect("Vacation", Funding::new(100.0, 1000.0), Funding::new(150.0, 1000.0)).unwrap();
        assert_eq!(small.message, "Progress updated: Vacation is 15% funded");
    }
}
