mod common;

use axum::Router;
use axum::http::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use common::TestUser;
use data_architect_api::services::HabitService;

async fn create_habit(app: &Router, user: &TestUser, body: &Value) -> (StatusCode, Value) {
    let (status, body) = common::post_json_with_auth(app, "/api/v1/habits", body, &user.token).await;
    (status, common::json(&body))
}

async fn toggle(app: &Router, user: &TestUser, habit_id: &str, date: &str) -> (StatusCode, Value) {
    let (status, body) = common::post_json_with_auth(
        app,
        "/api/v1/habit-logs/toggle",
        &json!({ "habitId": habit_id, "dateISO": date }),
        &user.token,
    )
    .await;
    (status, common::json(&body))
}

#[tokio::test]
async fn test_create_habit_appends_to_order() {
    let app = common::test_app().await;
    let user = common::register_user(&app, "habitual").await;

    let (status, habit) = create_habit(
        &app,
        &user,
        &json!({ "name": "  Stretch  ", "emoji": "🧘", "targetPerWeek": 3 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(habit["name"], "Stretch");
    assert_eq!(habit["emoji"], "🧘");
    assert_eq!(habit["targetPerWeek"], 3);
    assert_eq!(habit["isActive"], true);
    assert_eq!(habit["sortOrder"], 9);

    let (_, body) = common::get_with_auth(&app, "/api/v1/habits", &user.token).await;
    let habits = common::json(&body);
    assert_eq!(habits.as_array().map(Vec::len), Some(10));
    assert_eq!(habits[9]["name"], "Stretch");
}

#[tokio::test]
async fn test_create_habit_validation() {
    let app = common::test_app().await;
    let user = common::register_user(&app, "habitual").await;

    let (status, _) = create_habit(&app, &user, &json!({ "name": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = create_habit(&app, &user, &json!({ "name": "Run", "targetPerWeek": 8 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = create_habit(&app, &user, &json!({ "name": "Run", "targetPerWeek": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_habit() {
    let app = common::test_app().await;
    let user = common::register_user(&app, "habitual").await;
    let (_, habit) = create_habit(&app, &user, &json!({ "name": "Read", "emoji": "📚" })).await;
    let uri = format!("/api/v1/habits/{}", habit["id"].as_str().unwrap_or_default());

    let (status, body) = common::patch_json_with_auth(
        &app,
        &uri,
        &json!({ "name": "Read more", "isActive": false }),
        &user.token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated = common::json(&body);
    assert_eq!(updated["name"], "Read more");
    assert_eq!(updated["isActive"], false);
    assert_eq!(updated["emoji"], "📚");

    let (_, body) =
        common::patch_json_with_auth(&app, &uri, &json!({ "emoji": null }), &user.token).await;
    assert!(common::json(&body)["emoji"].is_null());

    let (status, _) =
        common::patch_json_with_auth(&app, &uri, &json!({ "targetPerWeek": 9 }), &user.token)
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_habits_are_private() {
    let app = common::test_app().await;
    let owner = common::register_user(&app, "owner").await;
    let other = common::register_user(&app, "other").await;
    let (_, habit) = create_habit(&app, &owner, &json!({ "name": "Mine" })).await;
    let habit_id = habit["id"].as_str().unwrap_or_default();
    let uri = format!("/api/v1/habits/{habit_id}");

    let (status, _) =
        common::patch_json_with_auth(&app, &uri, &json!({ "name": "Yours" }), &other.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::delete_with_auth(&app, &uri, &other.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = toggle(&app, &other, habit_id, "2024-03-01").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_habit_removes_logs() {
    let app = common::test_app().await;
    let user = common::register_user(&app, "habitual").await;
    let (_, habit) = create_habit(&app, &user, &json!({ "name": "Floss" })).await;
    let habit_id = habit["id"].as_str().unwrap_or_default();
    toggle(&app, &user, habit_id, "2024-03-01").await;

    let (status, _) = common::delete_with_auth(
        &app,
        &format!("/api/v1/habits/{habit_id}"),
        &user.token,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) =
        common::get_with_auth(&app, "/api/v1/habit-logs?date=2024-03-01", &user.token).await;
    assert_eq!(common::json(&body).as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_toggle_creates_then_flips() {
    let app = common::test_app().await;
    let user = common::register_user(&app, "habitual").await;
    let (_, habit) = create_habit(&app, &user, &json!({ "name": "Walk" })).await;
    let habit_id = habit["id"].as_str().unwrap_or_default();

    let (status, first) = toggle(&app, &user, habit_id, "2024-03-01").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["log"]["done"], true);
    assert_eq!(first["log"]["dateISO"], "2024-03-01");
    assert!(first.get("milestone").is_none());

    let (_, second) = toggle(&app, &user, habit_id, "2024-03-01").await;
    assert_eq!(second["log"]["done"], false);
    assert_eq!(second["log"]["id"], first["log"]["id"]);

    let (_, body) =
        common::get_with_auth(&app, "/api/v1/habit-logs?date=2024-03-01", &user.token).await;
    let logs = common::json(&body);
    assert_eq!(logs.as_array().map(Vec::len), Some(1));
    assert_eq!(logs[0]["done"], false);
}

#[tokio::test]
async fn test_racing_first_toggle_is_conflict() {
    let state = common::test_state().await;
    let app = common::app_for(state.clone());
    let user = common::register_user(&app, "habitual").await;
    let (_, habit) = create_habit(&app, &user, &json!({ "name": "Walk" })).await;
    let habit_id = habit["id"].as_str().unwrap_or_default();
    let user_uuid = Uuid::parse_str(&user.id).unwrap_or_default();
    let habit_uuid = Uuid::parse_str(habit_id).unwrap_or_default();

    let first = HabitService::insert_done_log(&state.db, user_uuid, habit_uuid, "2024-03-02").await;
    assert!(first.is_ok());
    let second =
        HabitService::insert_done_log(&state.db, user_uuid, habit_uuid, "2024-03-02").await;
    assert_eq!(second.err().map(|e| e.status()), Some(StatusCode::CONFLICT));

    // The winner's log is intact and the next toggle flips it.
    let (status, body) = toggle(&app, &user, habit_id, "2024-03-02").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["log"]["done"], false);
}

#[tokio::test]
async fn test_toggle_validation() {
    let app = common::test_app().await;
    let user = common::register_user(&app, "habitual").await;
    let (_, habit) = create_habit(&app, &user, &json!({ "name": "Walk" })).await;
    let habit_id = habit["id"].as_str().unwrap_or_default();

    let (status, _) = toggle(&app, &user, habit_id, "2024-02-30").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = toggle(&app, &user, &Uuid::new_v4().to_string(), "2024-03-01").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        common::get_with_auth(&app, "/api/v1/habit-logs?date=yesterday", &user.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logs_default_to_today() {
    let app = common::test_app().await;
    let user = common::register_user(&app, "habitual").await;
    let (_, habit) = create_habit(&app, &user, &json!({ "name": "Walk" })).await;
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    toggle(&app, &user, habit["id"].as_str().unwrap_or_default(), &today).await;

    let (status, body) = common::get_with_auth(&app, "/api/v1/habit-logs", &user.token).await;
    assert_eq!(status, StatusCode::OK);
    let logs = common::json(&body);
    assert_eq!(logs.as_array().map(Vec::len), Some(1));
    assert_eq!(logs[0]["dateISO"], today.as_str());
}

#[tokio::test]
async fn test_seventh_done_day_notifies_buddies() {
    let app = common::test_app().await;
    let runner = common::register_user(&app, "runner").await;
    let buddy = common::register_user(&app, "buddy").await;
    common::make_buddies(&app, &runner, &buddy).await;

    let (_, habit) = create_habit(&app, &runner, &json!({ "name": "Run" })).await;
    let habit_id = habit["id"].as_str().unwrap_or_default();

    for day in 1..=6 {
        let (_, outcome) = toggle(&app, &runner, habit_id, &format!("2024-03-{day:02}")).await;
        assert!(outcome.get("milestone").is_none(), "day {day}");
    }
    let (_, outcome) = toggle(&app, &runner, habit_id, "2024-03-07").await;
    assert_eq!(outcome["milestone"], 7);

    let (_, body) = common::get_with_auth(&app, "/api/v1/notifications", &buddy.token).await;
    let notifications = common::json(&body);
    let milestone = notifications
        .as_array()
        .and_then(|all| all.iter().find(|n| n["type"] == "habit_milestone"))
        .cloned()
        .unwrap_or_default();
    assert_eq!(milestone["title"], "Buddy Milestone!");
    assert_eq!(milestone["body"], "runner reached 7 day streak for \"Run\"");
    assert_eq!(milestone["entityType"], "habit");
    assert_eq!(milestone["entityId"], habit_id);

    // The runner gets no milestone notification of their own.
    let (_, body) = common::get_with_auth(&app, "/api/v1/notifications", &runner.token).await;
    let own = common::json(&body);
    assert!(
        own.as_array()
            .is_some_and(|all| all.iter().all(|n| n["type"] != "habit_milestone"))
    );
}
