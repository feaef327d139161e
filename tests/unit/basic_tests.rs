/// Basic unit tests to verify core functionality
use chrono::{Duration, NaiveDate, Utc};
use fitness_tracker_mcp::analytics::habits::analyze_habit;
use fitness_tracker_mcp::analytics::{estimated_one_rep_max, week_key, RecordBook, RecordDimension};
use fitness_tracker_mcp::tools::*;
use fitness_tracker_mcp::*;
use tempfile::NamedTempFile;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn days_ago(n: i64) -> String {
    (Utc::now().date_naive() - Duration::days(n)).format("%Y-%m-%d").to_string()
}

fn register(storage: &SqliteStorage, username: &str) -> String {
    register_user(
        storage,
        RegisterUserParams {
            username: username.to_string(),
            display_name: None,
            email: None,
            weight_unit: None,
        },
    )
    .unwrap()
    .user
    .id
    .to_string()
}

fn new_habit(storage: &SqliteStorage, user_id: &str, name: &str) -> String {
    create_habit(
        storage,
        CreateHabitParams {
            user_id: user_id.to_string(),
            name: name.to_string(),
            description: None,
            category: Some("health".to_string()),
            frequency: None,
            target_value: None,
            unit: None,
            start_date: Some(days_ago(30)),
        },
    )
    .unwrap()
    .habit
    .id
    .to_string()
}

fn complete(storage: &SqliteStorage, user_id: &str, habit_id: &str, date: String, value: Option<f64>) -> CompleteHabitResponse {
    complete_habit(
        storage,
        &AnalyticsEngine::default(),
        CompleteHabitParams {
            user_id: user_id.to_string(),
            habit_id: habit_id.to_string(),
            date: Some(date),
            value,
            notes: None,
        },
    )
    .unwrap()
}

fn bench(weight: f64, reps: u32) -> ExerciseInput {
    ExerciseInput {
        name: "Bench Press".to_string(),
        muscle_group: Some("Chest".to_string()),
        equipment: Some("barbell".to_string()),
        sets: vec![SetInput { reps, weight, rest_seconds: None, rpe: None }],
        notes: None,
    }
}

#[cfg(test)]
mod basic_unit_tests {
    use super::*;

    #[test]
    fn test_habit_creation() {
        let user = UserId::new();
        let habit = Habit::new(
            user.clone(),
            "Drink water".to_string(),
            Some("Eight glasses".to_string()),
            Category::Health,
            Frequency::Daily,
            GoalType::Numeric { target: 8.0, unit: Some("glasses".to_string()) },
        )
        .unwrap();
        assert_eq!(habit.name, "Drink water");
        assert_eq!(habit.user_id, user);
        assert!(habit.is_active);

        let blank = Habit::new(user, "   ".to_string(), None, Category::Health, Frequency::Daily, GoalType::Boolean);
        assert!(blank.is_err());
    }

    #[test]
    fn test_completion_rejects_future_dates() {
        let tomorrow = Utc::now().date_naive() + Duration::days(1);
        assert!(HabitCompletion::new(HabitId::new(), tomorrow, None, None).is_err());
        assert!(HabitCompletion::new(HabitId::new(), tomorrow - Duration::days(1), Some(3.0), None).is_ok());
    }

    #[test]
    fn test_streaks_and_rate_from_history() {
        let today = date("2024-03-20");
        let habit = Habit::new(UserId::new(), "Read".to_string(), None, Category::Learning, Frequency::Daily, GoalType::Boolean)
            .unwrap()
            .with_start_date(date("2024-03-01"));

        let mut completions = Vec::new();
        for d in ["2024-03-02", "2024-03-03", "2024-03-04", "2024-03-05", "2024-03-18", "2024-03-19"] {
            let mut c = HabitCompletion::new(habit.id.clone(), Utc::now().date_naive(), None, None).unwrap();
            c.date = date(d);
            completions.push(c);
        }

        let analytics = analyze_habit(&habit, &completions, 30, today);
        assert_eq!(analytics.current_streak, 2);
        assert_eq!(analytics.longest_streak, 4);
        assert_eq!(analytics.total_completions, 6);
        assert_eq!(analytics.last_completed, Some(date("2024-03-19")));
        // 6 of the 20 days since the start date
        assert_eq!(analytics.completion_rate, 30.0);
        assert_eq!(analytics.heatmap_data.len(), 30);
        assert_eq!(analytics.heatmap_data.last().unwrap().date, today);
        assert_eq!(analytics.weekly_data.iter().sum::<u32>(), 6);
    }

    #[test]
    fn test_epley_estimate_and_week_key() {
        assert_eq!(estimated_one_rep_max(100.0, 1), 100.0);
        assert!((estimated_one_rep_max(100.0, 10) - 133.333).abs() < 0.01);

        // 2024-01-01 is a Monday, so the first Sunday starts week 2
        assert_eq!(week_key(date("2024-01-06")), "2024-W01");
        assert_eq!(week_key(date("2024-01-07")), "2024-W02");
    }

    #[test]
    fn test_record_book_needs_a_baseline() {
        let user = UserId::new();
        let session = |d: &str, weight: f64| {
            let exercise = bench(weight, 5).into_exercise().unwrap();
            Workout::new(user.clone(), "Push".to_string(), date(d), vec![exercise], true, None).unwrap()
        };

        let first = session("2024-03-01", 80.0);
        assert!(RecordBook::breaks_for(&[], &first).is_empty());

        let heavier = session("2024-03-08", 85.0);
        let breaks = RecordBook::breaks_for(&[first.clone()], &heavier);
        assert!(breaks.iter().any(|b| b.dimension == RecordDimension::Weight && b.previous == 80.0));
        assert!(breaks.iter().all(|b| b.exercise == "Bench Press"));

        // Later history doesn't count against an earlier workout
        let backdated = session("2024-02-20", 70.0);
        assert!(RecordBook::breaks_for(&[first, heavier], &backdated).is_empty());
    }

    #[test]
    fn test_server_creation() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let config = ServerConfig::new(temp_file.path().to_path_buf());
        let server = tokio_test::block_on(FitnessTrackerServer::new(config)).expect("Failed to create server");

        let health = server.health();
        assert_eq!(health.status, "ok");
        assert!(health.database.connected);
    }

    #[test]
    fn test_completing_twice_keeps_one_record() {
        let storage = SqliteStorage::in_memory().unwrap();
        let user_id = register(&storage, "alice");
        let habit_id = new_habit(&storage, &user_id, "Drink water");

        let first = complete(&storage, &user_id, &habit_id, days_ago(0), Some(4.0));
        assert!(!first.updated_existing);

        let second = complete(&storage, &user_id, &habit_id, days_ago(0), Some(8.0));
        assert!(second.updated_existing);
        assert_eq!(second.completion.id, first.completion.id);
        assert_eq!(second.completion.value, Some(8.0));

        let habit = HabitId::from_string(&habit_id).unwrap();
        assert_eq!(storage.get_completions(&habit).unwrap().len(), 1);
    }

    #[test]
    fn test_uncomplete_breaks_the_streak() {
        let storage = SqliteStorage::in_memory().unwrap();
        let analytics = AnalyticsEngine::default();
        let user_id = register(&storage, "bob");
        let habit_id = new_habit(&storage, &user_id, "Stretch");

        for n in (0..3).rev() {
            complete(&storage, &user_id, &habit_id, days_ago(n), None);
        }
        let streak = complete(&storage, &user_id, &habit_id, days_ago(0), None).current_streak;
        assert_eq!(streak, 3);

        let undone = uncomplete_habit(
            &storage,
            &analytics,
            UncompleteHabitParams { user_id: user_id.clone(), habit_id: habit_id.clone(), date: Some(days_ago(1)) },
        )
        .unwrap();
        assert!(!undone.completion.unwrap().completed);
        assert_eq!(undone.current_streak, 1);

        // No record for that day: nothing changes
        let untouched = uncomplete_habit(
            &storage,
            &analytics,
            UncompleteHabitParams { user_id, habit_id, date: Some(days_ago(10)) },
        )
        .unwrap();
        assert!(untouched.completion.is_none());
    }

    #[test]
    fn test_other_users_habit_is_not_found() {
        let storage = SqliteStorage::in_memory().unwrap();
        let owner = register(&storage, "owner");
        let intruder = register(&storage, "intruder");
        let habit_id = new_habit(&storage, &owner, "Meditate");

        let result = get_habit(
            &storage,
            &AnalyticsEngine::default(),
            HabitRefParams { user_id: intruder, habit_id },
        );
        assert!(matches!(result, Err(ToolError::NotFound { entity: "Habit", .. })));
    }

    #[test]
    fn test_habit_analytics_window_is_bounded() {
        let storage = SqliteStorage::in_memory().unwrap();
        let analytics = AnalyticsEngine::default();
        let user_id = register(&storage, "carol");
        let habit_id = new_habit(&storage, &user_id, "Walk");
        complete(&storage, &user_id, &habit_id, days_ago(0), None);

        let report = habit_analytics(
            &storage,
            &analytics,
            HabitAnalyticsParams { user_id: user_id.clone(), habit_id: habit_id.clone(), window_days: Some(7) },
        )
        .unwrap();
        assert_eq!(report.analytics.window_days, 7);
        assert_eq!(report.analytics.current_streak, 1);

        let too_long = habit_analytics(
            &storage,
            &analytics,
            HabitAnalyticsParams { user_id, habit_id, window_days: Some(MAX_WINDOW_DAYS + 1) },
        );
        assert!(matches!(too_long, Err(ToolError::Validation(_))));
    }

    #[test]
    fn test_backfilled_completions_keep_rate_at_most_100() {
        let storage = SqliteStorage::in_memory().unwrap();
        let analytics = AnalyticsEngine::default();
        let user_id = register(&storage, "frank");
        let habit_id = create_habit(
            &storage,
            CreateHabitParams {
                user_id: user_id.clone(),
                name: "Plank".to_string(),
                description: None,
                category: None,
                frequency: None,
                target_value: None,
                unit: None,
                start_date: Some(days_ago(0)),
            },
        )
        .unwrap()
        .habit
        .id
        .to_string();

        for n in (0..5).rev() {
            complete(&storage, &user_id, &habit_id, days_ago(n), None);
        }

        let report = habit_analytics(
            &storage,
            &analytics,
            HabitAnalyticsParams { user_id, habit_id, window_days: None },
        )
        .unwrap();
        assert_eq!(report.analytics.completion_rate, 100.0);
        assert_eq!(report.analytics.total_completions, 5);
    }

    #[test]
    fn test_workout_analytics_days_is_bounded() {
        let storage = SqliteStorage::in_memory().unwrap();
        let analytics = AnalyticsEngine::default();
        let user_id = register(&storage, "grace");
        create_workout(
            &storage,
            CreateWorkoutParams {
                user_id: user_id.clone(),
                name: "Push".to_string(),
                date: Some(days_ago(2)),
                exercises: vec![bench(80.0, 5)],
                completed: Some(true),
                duration_seconds: None,
                notes: None,
            },
        )
        .unwrap();

        let params = |days| WorkoutAnalyticsParams {
            user_id: user_id.clone(),
            exercise: None,
            muscle_group: None,
            days,
        };

        let year = workout_analytics(&storage, &analytics, params(Some(MAX_WINDOW_DAYS))).unwrap();
        assert_eq!(year.analytics.total_workouts, 1);

        for days in [0, MAX_WINDOW_DAYS + 1, u32::MAX] {
            let rejected = workout_analytics(&storage, &analytics, params(Some(days)));
            assert!(matches!(rejected, Err(ToolError::Validation(_))), "days = {}", days);
        }
    }

    #[test]
    fn test_live_workout_lifecycle() {
        let storage = SqliteStorage::in_memory().unwrap();
        let analytics = AnalyticsEngine::default();
        let user_id = register(&storage, "dave");

        create_workout(
            &storage,
            CreateWorkoutParams {
                user_id: user_id.clone(),
                name: "Push".to_string(),
                date: Some(days_ago(7)),
                exercises: vec![bench(80.0, 5)],
                completed: None,
                duration_seconds: Some(3600),
                notes: None,
            },
        )
        .unwrap();

        let started = start_workout(
            &storage,
            StartWorkoutParams { user_id: user_id.clone(), workout_id: None, name: Some("Push again".to_string()) },
        )
        .unwrap();
        let workout_id = started.workout.id.to_string();

        let second = start_workout(&storage, StartWorkoutParams { user_id: user_id.clone(), workout_id: None, name: None });
        assert!(matches!(second, Err(ToolError::Validation(_))));

        add_exercise(
            &storage,
            AddExerciseParams { user_id: user_id.clone(), workout_id: workout_id.clone(), exercise: bench(85.0, 5) },
        )
        .unwrap();

        let action = || WorkoutActionParams { user_id: user_id.clone(), workout_id: None };
        assert_eq!(pause_workout(&storage, action()).unwrap().workout.status, WorkoutStatus::Paused);
        assert!(pause_workout(&storage, action()).is_err());
        assert_eq!(resume_workout(&storage, action()).unwrap().workout.status, WorkoutStatus::Active);

        let ended = end_workout(&storage, &analytics, action()).unwrap();
        assert_eq!(ended.workout.status, WorkoutStatus::Completed);
        assert_eq!(ended.workout.id.to_string(), workout_id);
        assert!(ended
            .records_broken
            .iter()
            .any(|b| b.dimension == RecordDimension::Weight && b.value == 85.0));

        let active = active_workout(&storage, UserRefParams { user_id: user_id.clone() }).unwrap();
        assert!(active.workout.is_none());

        let library = exercise_library(
            &storage,
            ExerciseLibraryParams { user_id, query: Some("bench".to_string()), muscle_group: None, limit: None },
        )
        .unwrap();
        assert_eq!(library.exercises.len(), 1);
        assert_eq!(library.exercises[0].usage_count, 2);
    }

    #[test]
    fn test_completed_workout_cannot_be_in_the_future() {
        let storage = SqliteStorage::in_memory().unwrap();
        let user_id = register(&storage, "erin");

        let tomorrow = (Utc::now().date_naive() + Duration::days(1)).format("%Y-%m-%d").to_string();
        let result = create_workout(
            &storage,
            CreateWorkoutParams {
                user_id,
                name: "Legs".to_string(),
                date: Some(tomorrow),
                exercises: vec![bench(60.0, 8)],
                completed: Some(true),
                duration_seconds: None,
                notes: None,
            },
        );
        assert!(matches!(result, Err(ToolError::Validation(_))));
    }
}
