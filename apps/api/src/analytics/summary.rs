//! Learner analytics for the dashboard.
//!
//! Module and progress figures cover the active roadmap only. Streak and
//! badge figures are account-wide.

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::db::Db;
use crate::models::achievement::LearningStreakRow;
use crate::models::progress::{ProgressRow, ProgressStatus};
use crate::models::roadmap::{Difficulty, ModuleRow};
use crate::progress;
use crate::roadmap;

const WEEKS_SHOWN: i64 = 8;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DifficultyBreakdown {
    pub beginner: usize,
    pub intermediate: usize,
    pub advanced: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeeklyProgress {
    /// Monday of the ISO week.
    pub week_start: NaiveDate,
    pub modules_completed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserAnalytics {
    pub total_modules: usize,
    pub completed_modules: usize,
    pub in_progress_modules: usize,
    pub average_score: Option<f64>,
    pub total_time_spent: f64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub badges_earned: usize,
    /// Percentage of the active roadmap completed.
    pub completion_rate: f64,
    pub modules_by_difficulty: DifficultyBreakdown,
    pub weekly_progress: Vec<WeeklyProgress>,
}

/// Completions per ISO week for the `WEEKS_SHOWN` weeks ending with the one
/// containing `today`, oldest first.
pub fn weekly_completions(completed_on: &[NaiveDate], today: NaiveDate) -> Vec<WeeklyProgress> {
    let this_monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    (0..WEEKS_SHOWN)
        .rev()
        .map(|weeks_back| {
            let week_start = this_monday - Duration::weeks(weeks_back);
            let week_end = week_start + Duration::weeks(1);
            WeeklyProgress {
                week_start,
                modules_completed: completed_on
                    .iter()
                    .filter(|d| **d >= week_start && **d < week_end)
                    .count(),
            }
        })
        .collect()
}

pub fn summarize(
    modules: &[ModuleRow],
    progress: &[ProgressRow],
    streak: Option<&LearningStreakRow>,
    badges_earned: usize,
    today: NaiveDate,
) -> UserAnalytics {
    let on_roadmap: HashSet<Uuid> = modules.iter().map(|m| m.id).collect();
    let rows: Vec<&ProgressRow> = progress
        .iter()
        .filter(|p| on_roadmap.contains(&p.module_id))
        .collect();

    let count_status = |status: ProgressStatus| rows.iter().filter(|p| p.status == status).count();
    let completed_modules = count_status(ProgressStatus::Completed);
    let in_progress_modules = count_status(ProgressStatus::InProgress);

    let scores: Vec<f64> = rows.iter().filter_map(|p| p.score).collect();
    let average_score = (!scores.is_empty())
        .then(|| (scores.iter().sum::<f64>() / scores.len() as f64 * 100.0).round() / 100.0);

    let total_modules = modules.len();
    let completion_rate = if total_modules == 0 {
        0.0
    } else {
        (completed_modules as f64 / total_modules as f64 * 10_000.0).round() / 100.0
    };

    let mut modules_by_difficulty = DifficultyBreakdown::default();
    for module in modules {
        match module.difficulty {
            Difficulty::Beginner => modules_by_difficulty.beginner += 1,
            Difficulty::Intermediate => modules_by_difficulty.intermediate += 1,
            Difficulty::Advanced => modules_by_difficulty.advanced += 1,
        }
    }

    let completed_on: Vec<NaiveDate> = rows
        .iter()
        .filter(|p| p.status == ProgressStatus::Completed)
        .filter_map(|p| p.completed_at)
        .map(|at| at.date_naive())
        .collect();

    UserAnalytics {
        total_modules,
        completed_modules,
        in_progress_modules,
        average_score,
        total_time_spent: rows.iter().map(|p| p.time_spent).sum(),
        current_streak: streak.map_or(0, |s| s.current_streak),
        longest_streak: streak.map_or(0, |s| s.longest_streak),
        badges_earned,
        completion_rate,
        modules_by_difficulty,
        weekly_progress: weekly_completions(&completed_on, today),
    }
}

pub async fn load_analytics(
    db: &Db,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<UserAnalytics, sqlx::Error> {
    let modules = match roadmap::store::active_roadmap(db, user_id).await? {
        Some(active) => roadmap::store::modules_for(db, active.id).await?,
        None => Vec::new(),
    };
    let progress_rows = progress::store::list_progress(db, user_id).await?;
    let streak = progress::store::find_streak(db, user_id).await?;
    let badges = progress::store::list_badges(db, user_id).await?;

    Ok(summarize(
        &modules,
        &progress_rows,
        streak.as_ref(),
        badges.len(),
        today,
    ))
}
