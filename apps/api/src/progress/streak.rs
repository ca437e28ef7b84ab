use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakState {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_activity_date: Option<NaiveDate>,
    pub total_days_active: i32,
}

/// Records activity on `today`. Repeat activity on the same day, or on a date
/// earlier than the last recorded one, changes nothing.
pub fn advance(state: StreakState, today: NaiveDate) -> StreakState {
    let current_streak = match state.last_activity_date {
        Some(last) if last >= today => return state,
        Some(last) if last.succ_opt() == Some(today) => state.current_streak + 1,
        _ => 1,
    };
    StreakState {
        current_streak,
        longest_streak: state.longest_streak.max(current_streak),
        last_activity_date: Some(today),
        total_days_active: state.total_days_active + 1,
    }
}
