/// A badge a learner can earn once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeDef {
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: &'static str,
}

pub const FIRST_STEPS: BadgeDef = BadgeDef {
    name: "First Steps",
    description: "Completed your first module",
    icon: "star",
    category: "completion",
};
pub const MOMENTUM: BadgeDef = BadgeDef {
    name: "Momentum",
    description: "Completed 5 modules",
    icon: "zap",
    category: "completion",
};
pub const DEDICATED_LEARNER: BadgeDef = BadgeDef {
    name: "Dedicated Learner",
    description: "Completed 10 modules",
    icon: "book",
    category: "completion",
};
pub const ROADMAP_CONQUEROR: BadgeDef = BadgeDef {
    name: "Roadmap Conqueror",
    description: "Completed every module of a roadmap",
    icon: "trophy",
    category: "completion",
};
pub const WEEK_WARRIOR: BadgeDef = BadgeDef {
    name: "Week Warrior",
    description: "Learned 7 days in a row",
    icon: "flame",
    category: "streak",
};
pub const HIGH_ACHIEVER: BadgeDef = BadgeDef {
    name: "High Achiever",
    description: "Completed a module with a score of 90 or more",
    icon: "target",
    category: "performance",
};

const COMPLETION_MILESTONES: [(i64, BadgeDef); 3] =
    [(1, FIRST_STEPS), (5, MOMENTUM), (10, DEDICATED_LEARNER)];
const STREAK_DAYS: i32 = 7;
const HIGH_SCORE: f64 = 90.0;

/// What the learner has achieved as of the current update.
#[derive(Debug, Clone, Copy, Default)]
pub struct Achievements {
    pub modules_completed: i64,
    pub roadmap_finished: bool,
    pub current_streak: i32,
    /// Score of the module completed by this update, if it was a completion.
    pub completion_score: Option<f64>,
}

/// Every badge the achievements qualify for. Already-held badges are
/// filtered out at insert time.
pub fn qualifying(achievements: &Achievements) -> Vec<BadgeDef> {
    let mut badges: Vec<BadgeDef> = COMPLETION_MILESTONES
        .iter()
        .filter(|(threshold, _)| achievements.modules_completed >= *threshold)
        .map(|(_, badge)| *badge)
        .collect();
    if achievements.roadmap_finished {
        badges.push(ROADMAP_CONQUEROR);
    }
    if achievements.current_streak >= STREAK_DAYS {
        badges.push(WEEK_WARRIOR);
    }
    if achievements.completion_score.is_some_and(|s| s >= HIGH_SCORE) {
        badges.push(HIGH_ACHIEVER);
    }
    badges
}
