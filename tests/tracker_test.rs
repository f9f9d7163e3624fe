mod common;

use axum::Router;
use axum::http::StatusCode;
use serde_json::{Value, json};

use common::TestUser;

async fn tracker_state(app: &Router, user: &TestUser) -> Value {
    let (status, body) = common::get_with_auth(app, "/api/v1/tracker", &user.token).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    common::json(&body)
}

#[tokio::test]
async fn test_tracker_requires_auth() {
    let app = common::test_app().await;
    let (status, _) = common::get(&app, "/api/v1/tracker").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_fresh_tracker_has_default_habits() {
    let app = common::test_app().await;
    let user = common::register_user(&app, "tracker").await;

    let state = tracker_state(&app, &user).await;
    let habits = state["habits"].as_array().cloned().unwrap_or_default();
    assert_eq!(habits.len(), 9);
    assert_eq!(habits[0]["order"], 0);
    assert_eq!(habits[0]["id"].as_str().map(str::len), Some(9));
    assert_eq!(state["habitLogs"], json!([]));
    assert_eq!(state["plannerDays"], json!([]));
}

#[tokio::test]
async fn test_habit_edits_and_reorder() {
    let app = common::test_app().await;
    let user = common::register_user(&app, "tracker").await;

    let (status, body) = common::post_json_with_auth(
        &app,
        "/api/v1/tracker/habits",
        &json!({ "name": "Journal", "targetPerWeek": 5 }),
        &user.token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = common::json(&body)["id"].as_str().unwrap_or_default().to_string();

    let (status, _) = common::patch_json_with_auth(
        &app,
        &format!("/api/v1/tracker/habits/{id}"),
        &json!({ "isActive": false }),
        &user.token,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = common::patch_json_with_auth(
        &app,
        "/api/v1/tracker/habits/missing",
        &json!({ "isActive": false }),
        &user.token,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let state = tracker_state(&app, &user).await;
    let journal = state["habits"][9].clone();
    assert_eq!(journal["name"], "Journal");
    assert_eq!(journal["order"], 9);
    assert_eq!(journal["isActive"], false);

    let first = state["habits"][0]["id"].as_str().unwrap_or_default();
    let (status, body) = common::put_json_with_auth(
        &app,
        "/api/v1/tracker/habits/order",
        &json!({ "ids": [id, first] }),
        &user.token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let reordered = common::json(&body);
    assert_eq!(reordered["habits"].as_array().map(Vec::len), Some(2));
    assert_eq!(reordered["habits"][0]["id"], id.as_str());
    assert_eq!(reordered["habits"][1]["order"], 1);
}

#[tokio::test]
async fn test_habit_emoji_patch_sets_and_clears() {
    let app = common::test_app().await;
    let user = common::register_user(&app, "tracker").await;

    let state = tracker_state(&app, &user).await;
    let id = state["habits"][0]["id"].as_str().unwrap_or_default().to_string();
    let uri = format!("/api/v1/tracker/habits/{id}");
    assert!(state["habits"][0]["emoji"].is_string());

    let (status, _) =
        common::patch_json_with_auth(&app, &uri, &json!({ "name": "Walk" }), &user.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let habit = tracker_state(&app, &user).await["habits"][0].clone();
    assert_eq!(habit["name"], "Walk");
    assert!(habit["emoji"].is_string());

    let (status, _) =
        common::patch_json_with_auth(&app, &uri, &json!({ "emoji": null }), &user.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let habit = tracker_state(&app, &user).await["habits"][0].clone();
    assert_eq!(habit["name"], "Walk");
    assert!(habit.get("emoji").is_none());

    let (status, _) =
        common::patch_json_with_auth(&app, &uri, &json!({ "emoji": "🚶" }), &user.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(tracker_state(&app, &user).await["habits"][0]["emoji"], "🚶");
}

#[tokio::test]
async fn test_habit_log_toggle_cycle() {
    let app = common::test_app().await;
    let user = common::register_user(&app, "tracker").await;
    let state = tracker_state(&app, &user).await;
    let habit_id = state["habits"][0]["id"].as_str().unwrap_or_default();
    let toggle = json!({ "habitId": habit_id, "dateISO": "2024-05-01" });

    let (status, body) = common::post_json_with_auth(
        &app,
        "/api/v1/tracker/habit-logs/toggle",
        &toggle,
        &user.token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(common::json(&body)["log"]["done"], true);

    let (_, body) = common::post_json_with_auth(
        &app,
        "/api/v1/tracker/habit-logs/toggle",
        &toggle,
        &user.token,
    )
    .await;
    assert!(common::json(&body)["log"].is_null());

    let (status, _) = common::post_json_with_auth(
        &app,
        "/api/v1/tracker/habit-logs/toggle",
        &json!({ "habitId": habit_id, "dateISO": "May 1st" }),
        &user.token,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Deleting the habit drops its logs.
    common::post_json_with_auth(&app, "/api/v1/tracker/habit-logs/toggle", &toggle, &user.token)
        .await;
    let (status, _) = common::delete_with_auth(
        &app,
        &format!("/api/v1/tracker/habits/{habit_id}"),
        &user.token,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(tracker_state(&app, &user).await["habitLogs"], json!([]));
}

#[tokio::test]
async fn test_planner_tasks() {
    let app = common::test_app().await;
    let user = common::register_user(&app, "tracker").await;
    let day = "/api/v1/tracker/planner/2024-05-02";

    let (status, body) = common::get_with_auth(&app, day, &user.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        common::json(&body),
        json!({ "dateISO": "2024-05-02", "tasks": [] })
    );

    let (status, body) = common::post_json_with_auth(
        &app,
        &format!("{day}/tasks"),
        &json!({ "title": "Write report", "time": "09:00" }),
        &user.token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let task_id = common::json(&body)["id"].as_str().unwrap_or_default().to_string();
    let task_uri = format!("{day}/tasks/{task_id}");

    let (status, _) =
        common::post_with_auth(&app, &format!("{task_uri}/toggle"), &user.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = common::patch_json_with_auth(
        &app,
        &task_uri,
        &json!({ "notes": "first draft" }),
        &user.token,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = common::get_with_auth(&app, day, &user.token).await;
    let planner = common::json(&body);
    assert_eq!(planner["tasks"][0]["title"], "Write report");
    assert_eq!(planner["tasks"][0]["done"], true);
    assert_eq!(planner["tasks"][0]["time"], "09:00");
    assert_eq!(planner["tasks"][0]["notes"], "first draft");

    let (status, _) = common::delete_with_auth(&app, &task_uri, &user.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = common::get_with_auth(&app, day, &user.token).await;
    assert_eq!(common::json(&body)["tasks"], json!([]));

    let (status, _) =
        common::post_with_auth(&app, &format!("{task_uri}/toggle"), &user.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::post_json_with_auth(
        &app,
        &format!("{day}/tasks"),
        &json!({ "title": "  " }),
        &user.token,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        common::get_with_auth(&app, "/api/v1/tracker/planner/2024-13-01", &user.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_import_and_clear() {
    let app = common::test_app().await;
    let user = common::register_user(&app, "tracker").await;
    common::post_json_with_auth(
        &app,
        "/api/v1/tracker/planner/2024-05-03/tasks",
        &json!({ "title": "Backup" }),
        &user.token,
    )
    .await;

    let (status, exported) = common::get_with_auth(&app, "/api/v1/tracker/export", &user.token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(exported.contains('\n'), "export should be pretty-printed");

    let (status, _) = common::delete_with_auth(&app, "/api/v1/tracker", &user.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tracker_state(&app, &user).await["plannerDays"], json!([]));

    let (status, body) =
        common::post_raw_with_auth(&app, "/api/v1/tracker/import", &exported, &user.token).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(common::json(&body), common::json(&exported));

    let (status, _) = common::post_raw_with_auth(
        &app,
        "/api/v1/tracker/import",
        r#"{ "habits": [], "habitLogs": [] }"#,
        &user.token,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        common::post_raw_with_auth(&app, "/api/v1/tracker/import", "not json", &user.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Rejected imports leave the document alone.
    assert_eq!(
        tracker_state(&app, &user).await["plannerDays"][0]["tasks"][0]["title"],
        "Backup"
    );
}
