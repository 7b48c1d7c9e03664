mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use common::{TestServer, user};
use finquest_api_client::finquest_api::{
    CreateExpenseRequest, CreateGoalRequest, ExpenseListQuery, Table, UpdateGoalRequest,
    UpdateProfileRequest,
};
use finquest_api_client::{ApiClient, Caches, ChangeWatcher};

fn client_for(server: &TestServer, user_id: &str) -> ApiClient {
    let mut client = ApiClient::new(&server.base_url, Duration::from_secs(10)).unwrap();
    client.set_auth(user(user_id).token);
    client
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

#[tokio::test]
async fn typed_client_round_trips_through_the_router() {
    let server = TestServer::start(None).await;
    let client = client_for(&server, "alice");

    assert_eq!(client.me().await.unwrap().user_id, "alice");
    assert!(!client.capabilities().await.unwrap().advisor_enabled);

    let created = client
        .create_expense(&CreateExpenseRequest {
            category: "Food".into(),
            amount: 12.5,
            date: day(3),
            description: Some("Lunch".into()),
        })
        .await
        .unwrap();
    assert_eq!(created.new_achievements[0].achievement_type, "first_expense");

    let listed = client
        .list_expenses(&ExpenseListQuery {
            from: Some(day(1)),
            to: Some(day(30)),
            category: None,
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    let err = client.delete_goal("missing").await.unwrap_err();
    assert!(err.to_string().starts_with("404"), "{err}");

    let profile = client
        .update_profile(&UpdateProfileRequest {
            annual_salary: Some(72_000.0),
            display_name: None,
        })
        .await
        .unwrap();
    assert_eq!(profile.annual_salary, 72_000.0);
    assert!(client.summary().await.unwrap().total_points > 0);
}

#[tokio::test]
async fn watcher_refreshes_caches_for_touched_tables() {
    let server = TestServer::start(None).await;
    let client = Arc::new(client_for(&server, "alice"));
    client
        .create_goal(&CreateGoalRequest {
            title: "Laptop".into(),
            target_amount: 1_000.0,
            current_amount: 0.0,
            target_date: None,
        })
        .await
        .unwrap();

    let caches = Caches::new();
    let mut watcher = ChangeWatcher::new(client.clone(), caches.clone(), 5);
    watcher.prime().await.unwrap();
    assert_eq!(caches.goals.len(), 1);
    assert!(caches.expenses.is_empty());
    let primed_at = watcher.cursor();
    assert!(primed_at > 0);

    let goal_id = caches.goals.snapshot()[0].id.clone();
    client
        .update_goal(
            &goal_id,
            &UpdateGoalRequest {
                current_amount: Some(500.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Priming creates the profile row, so that insert is pending too.
    let touched = watcher.poll_once().await.unwrap();
    assert!(touched.contains(&Table::Goals), "{touched:?}");
    assert!(!touched.contains(&Table::Expenses));
    assert_eq!(caches.goals.snapshot()[0].current_amount, 500.0);
    assert!(watcher.cursor() > primed_at);
}

#[tokio::test]
async fn spawned_watcher_follows_writes() {
    let server = TestServer::start(None).await;
    let client = Arc::new(client_for(&server, "alice"));
    let caches = Caches::new();
    let handle = ChangeWatcher::new(client.clone(), caches.clone(), 2).spawn();

    client
        .create_expense(&CreateExpenseRequest {
            category: "Transport".into(),
            amount: 3.0,
            date: day(4),
            description: None,
        })
        .await
        .unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while caches.expenses.is_empty() {
        assert!(tokio::time::Instant::now() < deadline, "cache never filled");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(caches.expenses.snapshot()[0].category, "Transport");
    assert!(!handle.is_finished());
}
