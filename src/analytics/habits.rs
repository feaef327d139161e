/// Habit streak and completion analytics
///
/// Everything here is a pure function of a habit, its completion records and
/// the day treated as "today", so results are reproducible in tests.

use std::collections::BTreeSet;

use serde::Serialize;
use chrono::{Datelike, Duration, NaiveDate};
use crate::domain::{Habit, HabitCompletion, HabitId};

/// Default lookback window for completion rate and weekday histogram
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Longest lookback window, in days, that analytics accept
pub const MAX_WINDOW_DAYS: u32 = 365;

/// Number of trailing days in the heatmap, today included
pub const HEATMAP_DAYS: i64 = 30;

/// One heatmap cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapDay {
    pub date: NaiveDate,
    pub completed: bool,
    pub value: Option<f64>,
}

/// Computed analytics for a single habit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitAnalytics {
    pub habit_id: HabitId,
    pub window_days: u32,
    /// Percentage, two decimals
    pub completion_rate: f64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completions: u32,
    pub last_completed: Option<NaiveDate>,
    /// Completions in the window by weekday, Sunday = 0
    pub weekly_data: [u32; 7],
    /// Trailing days ending today, oldest first
    pub heatmap_data: Vec<HeatmapDay>,
}

/// Analyze a habit's completion history
///
/// Records with `completed == false` are ignored everywhere except the
/// heatmap's value column. A window of 0 is treated as 1 day.
pub fn analyze_habit(
    habit: &Habit,
    completions: &[HabitCompletion],
    window_days: u32,
    today: NaiveDate,
) -> HabitAnalytics {
    let window_days = window_days.max(1);
    let completed_desc = completed_dates_desc(completions);
    let window_start = window_start(today, window_days);

    let in_window: Vec<NaiveDate> = completed_desc
        .iter()
        .copied()
        .filter(|d| *d >= window_start && *d <= today)
        .collect();

    let mut weekly_data = [0u32; 7];
    for date in &in_window {
        weekly_data[date.weekday().num_days_from_sunday() as usize] += 1;
    }

    // Backfilled days before the start date don't count toward the rate
    let counted = in_window.iter().filter(|d| **d >= habit.start_date).count();

    HabitAnalytics {
        habit_id: habit.id.clone(),
        window_days,
        completion_rate: completion_rate(counted, habit.start_date, window_start, today),
        current_streak: current_streak(&completed_desc, today),
        longest_streak: longest_streak(&completed_desc),
        total_completions: completed_desc.len() as u32,
        last_completed: completed_desc.first().copied(),
        weekly_data,
        heatmap_data: heatmap(completions, today),
    }
}

/// First day of a `days`-long window ending on `today`
///
/// Saturates at the earliest representable date instead of overflowing.
pub fn window_start(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_signed(Duration::days(days.max(1) as i64 - 1))
        .unwrap_or(NaiveDate::MIN)
}

/// Distinct completed dates, newest first
pub fn completed_dates_desc(completions: &[HabitCompletion]) -> Vec<NaiveDate> {
    let dates: BTreeSet<NaiveDate> = completions
        .iter()
        .filter(|c| c.completed)
        .map(|c| c.date)
        .collect();
    dates.into_iter().rev().collect()
}

/// Consecutive completed days ending today or yesterday
///
/// `dates_desc` must be distinct and sorted newest first. Dates after
/// `today` are skipped.
pub fn current_streak(dates_desc: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut dates = dates_desc.iter().skip_while(|d| **d > today);

    let Some(&latest) = dates.next() else {
        return 0;
    };
    if (today - latest).num_days() > 1 {
        return 0;
    }

    let mut streak = 1;
    let mut previous = latest;
    for &date in dates {
        if (previous - date).num_days() == 1 {
            streak += 1;
            previous = date;
        } else {
            break;
        }
    }
    streak
}

/// Longest run of consecutive completed days anywhere in the history
///
/// `dates_desc` must be distinct and sorted newest first.
pub fn longest_streak(dates_desc: &[NaiveDate]) -> u32 {
    if dates_desc.is_empty() {
        return 0;
    }

    let mut longest = 1;
    let mut run = 1;
    for pair in dates_desc.windows(2) {
        if (pair[0] - pair[1]).num_days() == 1 {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
    }
    longest
}

/// Completed days in the window over elapsed days since the habit started
///
/// Returns a percentage rounded to two decimals. A habit starting after
/// `today` has no elapsed days and a rate of 0.
pub fn completion_rate(
    completed_in_window: usize,
    start_date: NaiveDate,
    window_start: NaiveDate,
    today: NaiveDate,
) -> f64 {
    let effective_start = start_date.max(window_start);
    let elapsed_days = (today - effective_start).num_days() + 1;
    if elapsed_days <= 0 || completed_in_window == 0 {
        return 0.0;
    }

    let rate = completed_in_window as f64 / elapsed_days as f64 * 100.0;
    round2(rate)
}

/// Trailing `HEATMAP_DAYS` days ending today
pub fn heatmap(completions: &[HabitCompletion], today: NaiveDate) -> Vec<HeatmapDay> {
    (0..HEATMAP_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let record = completions.iter().find(|c| c.date == date);
            HeatmapDay {
                date,
                completed: record.is_some_and(|c| c.completed),
                value: record.and_then(|c| c.value),
            }
        })
        .collect()
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, CompletionId, Frequency, GoalType, UserId};
    use chrono::Utc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habit_started(start: NaiveDate) -> Habit {
        Habit::new(
            UserId::new(),
            "Stretch".to_string(),
            None,
            Category::Fitness,
            Frequency::Daily,
            GoalType::Boolean,
        )
        .unwrap()
        .with_start_date(start)
    }

    fn record(habit: &Habit, date: NaiveDate, completed: bool, value: Option<f64>) -> HabitCompletion {
        HabitCompletion {
            id: CompletionId::new(),
            habit_id: habit.id.clone(),
            date,
            completed,
            value,
            notes: None,
            logged_at: Utc::now(),
        }
    }

    #[test]
    fn test_three_consecutive_days_ending_today() {
        let today = day(2024, 5, 15);
        let habit = habit_started(day(2024, 5, 1));
        let completions: Vec<_> = (0..3)
            .map(|offset| record(&habit, today - Duration::days(offset), true, None))
            .collect();

        let analytics = analyze_habit(&habit, &completions, DEFAULT_WINDOW_DAYS, today);

        assert_eq!(analytics.current_streak, 3);
        assert_eq!(analytics.longest_streak, 3);
        assert_eq!(analytics.total_completions, 3);
        assert_eq!(analytics.last_completed, Some(today));
    }

    #[test]
    fn test_no_completions_yields_zeros() {
        let today = day(2024, 5, 15);
        let habit = habit_started(day(2024, 4, 1));

        let analytics = analyze_habit(&habit, &[], DEFAULT_WINDOW_DAYS, today);

        assert_eq!(analytics.completion_rate, 0.0);
        assert_eq!(analytics.current_streak, 0);
        assert_eq!(analytics.longest_streak, 0);
        assert_eq!(analytics.weekly_data, [0; 7]);
        assert_eq!(analytics.heatmap_data.len(), 30);
        assert!(analytics.heatmap_data.iter().all(|d| !d.completed));
        assert_eq!(analytics.heatmap_data.last().unwrap().date, today);
        assert_eq!(analytics.heatmap_data[0].date, today - Duration::days(29));
    }

    #[test]
    fn test_gap_before_today_breaks_current_streak() {
        let today = day(2024, 5, 15);
        let habit = habit_started(day(2024, 5, 1));
        let completions = vec![record(&habit, today - Duration::days(2), true, None)];

        let analytics = analyze_habit(&habit, &completions, DEFAULT_WINDOW_DAYS, today);

        assert_eq!(analytics.current_streak, 0);
        assert_eq!(analytics.longest_streak, 1);
    }

    #[test]
    fn test_single_completion_yesterday_counts() {
        let today = day(2024, 5, 15);
        let dates = vec![today - Duration::days(1)];
        assert_eq!(current_streak(&dates, today), 1);
        assert_eq!(current_streak(&[today], today), 1);
    }

    #[test]
    fn test_longest_streak_spans_whole_history() {
        let today = day(2024, 5, 15);
        let habit = habit_started(day(2023, 1, 1));
        let mut completions: Vec<_> = (0..5)
            .map(|i| record(&habit, day(2023, 2, 10) + Duration::days(i), true, None))
            .collect();
        completions.push(record(&habit, today, true, None));
        completions.push(record(&habit, today - Duration::days(1), true, None));

        let analytics = analyze_habit(&habit, &completions, 7, today);

        assert_eq!(analytics.longest_streak, 5);
        assert_eq!(analytics.current_streak, 2);
    }

    #[test]
    fn test_uncompleted_records_are_ignored() {
        let today = day(2024, 5, 15);
        let habit = habit_started(day(2024, 5, 1));
        let completions = vec![
            record(&habit, today, false, Some(2.0)),
            record(&habit, today - Duration::days(1), true, Some(8.0)),
        ];

        let analytics = analyze_habit(&habit, &completions, DEFAULT_WINDOW_DAYS, today);

        assert_eq!(analytics.current_streak, 1);
        assert_eq!(analytics.total_completions, 1);
        let last = analytics.heatmap_data.last().unwrap();
        assert!(!last.completed);
        assert_eq!(last.value, Some(2.0));
        assert_eq!(analytics.heatmap_data[28].value, Some(8.0));
        assert!(analytics.heatmap_data[28].completed);
    }

    #[test]
    fn test_completion_rate_uses_days_since_start() {
        let today = day(2024, 5, 15);
        // Started 4 days ago: 5 elapsed days including today
        let habit = habit_started(today - Duration::days(4));
        let completions = vec![
            record(&habit, today, true, None),
            record(&habit, today - Duration::days(2), true, None),
        ];

        let analytics = analyze_habit(&habit, &completions, DEFAULT_WINDOW_DAYS, today);
        assert_eq!(analytics.completion_rate, 40.0);

        // An old habit is measured over the full window
        let old = habit_started(day(2020, 1, 1));
        let completions: Vec<_> = (0..10)
            .map(|i| record(&old, today - Duration::days(i), true, None))
            .collect();
        let analytics = analyze_habit(&old, &completions, 30, today);
        assert_eq!(analytics.completion_rate, 33.33);
    }

    #[test]
    fn test_backfill_before_start_date_keeps_rate_at_most_100() {
        let today = day(2024, 5, 15);
        let habit = habit_started(today);
        let completions: Vec<_> = (0..5)
            .map(|i| record(&habit, today - Duration::days(i), true, None))
            .collect();

        let analytics = analyze_habit(&habit, &completions, DEFAULT_WINDOW_DAYS, today);
        assert_eq!(analytics.completion_rate, 100.0);
        // The backfilled days still feed streaks and totals
        assert_eq!(analytics.current_streak, 5);
        assert_eq!(analytics.total_completions, 5);
    }

    #[test]
    fn test_window_at_the_limits() {
        let today = day(2024, 5, 15);
        let habit = habit_started(day(2023, 1, 1));
        let completions = vec![
            record(&habit, today, true, None),
            record(&habit, today - Duration::days(364), true, None),
            record(&habit, today - Duration::days(365), true, None),
        ];

        let year = analyze_habit(&habit, &completions, MAX_WINDOW_DAYS, today);
        assert_eq!(year.window_days, MAX_WINDOW_DAYS);
        assert_eq!(year.weekly_data.iter().sum::<u32>(), 2);
        assert_eq!(year.completion_rate, round2(2.0 / 365.0 * 100.0));

        // A huge window saturates instead of overflowing the calendar
        let huge = analyze_habit(&habit, &completions, u32::MAX, today);
        assert_eq!(huge.weekly_data.iter().sum::<u32>(), 3);
        assert_eq!(window_start(today, u32::MAX), NaiveDate::MIN);
        assert_eq!(window_start(today, 0), today);
    }

    #[test]
    fn test_weekly_histogram_is_sunday_based_and_windowed() {
        // 2024-05-12 was a Sunday
        let sunday = day(2024, 5, 12);
        let today = day(2024, 5, 15);
        let habit = habit_started(day(2024, 1, 1));
        let completions = vec![
            record(&habit, sunday, true, None),
            record(&habit, sunday + Duration::days(3), true, None),
            record(&habit, sunday - Duration::days(7), true, None),
            // outside both windows
            record(&habit, sunday - Duration::days(14), true, None),
        ];

        let analytics = analyze_habit(&habit, &completions, 14, today);
        assert_eq!(analytics.weekly_data, [2, 0, 0, 1, 0, 0, 0]);

        let analytics = analyze_habit(&habit, &completions, 7, today);
        assert_eq!(analytics.weekly_data, [1, 0, 0, 1, 0, 0, 0]);
    }
}
