mod common;

use common::{TestServer, json_with, user};
use serde_json::json;

fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}

#[tokio::test]
async fn failed_award_keeps_the_expense() {
    let server = TestServer::start(None).await;
    let alice = user("alice");
    server
        .open_db()
        .execute_batch(
            "CREATE TRIGGER block_awards BEFORE INSERT ON achievements \
             BEGIN SELECT RAISE(ABORT, 'awards unavailable'); END;",
        )
        .unwrap();

    let created = json_with(
        server
            .post(
                "/expenses",
                &alice,
                &json!({"category": "Food", "amount": 8.0, "date": today()}),
            )
            .await,
        201,
    )
    .await;
    assert_eq!(created["new_achievements"], json!([]));

    let expenses = json_with(server.get("/expenses", &alice).await, 200).await;
    assert_eq!(expenses.as_array().unwrap().len(), 1);

    let feed = json_with(server.get("/changes?since=0", &alice).await, 200).await;
    let tables: Vec<&str> = feed["changes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["table"].as_str().unwrap())
        .collect();
    assert_eq!(tables, vec!["expenses"]);

    // Once the store accepts awards again, the next evaluation catches up.
    server
        .open_db()
        .execute_batch("DROP TRIGGER block_awards;")
        .unwrap();
    let evaluated = json_with(
        server
            .post("/achievements/evaluate", &alice, &json!({}))
            .await,
        200,
    )
    .await;
    assert_eq!(
        evaluated["new_achievements"][0]["achievement_type"],
        "first_expense"
    );
}

#[tokio::test]
async fn failed_rollover_leaves_the_bill_unpaid() {
    let server = TestServer::start(None).await;
    let alice = user("alice");
    let bill = json_with(
        server
            .post(
                "/bills",
                &alice,
                &json!({"title": "Rent", "amount": 1200.0, "frequency": "monthly", "due_date": today()}),
            )
            .await,
        201,
    )
    .await;
    let id = bill["id"].as_str().unwrap().to_string();

    server
        .open_db()
        .execute_batch(
            "CREATE TRIGGER block_bills BEFORE INSERT ON bills \
             BEGIN SELECT RAISE(ABORT, 'bills unavailable'); END;",
        )
        .unwrap();

    let resp = server
        .post(&format!("/bills/{id}/pay"), &alice, &json!({}))
        .await;
    let body = json_with(resp, 500).await;
    assert_eq!(body["error"], "internal server error");

    let bills = json_with(server.get("/bills", &alice).await, 200).await;
    let bills = bills.as_array().unwrap();
    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0]["is_paid"], false);

    let feed = json_with(server.get("/changes?since=0", &alice).await, 200).await;
    let ops: Vec<&str> = feed["changes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["op"].as_str().unwrap())
        .collect();
    assert_eq!(ops, vec!["insert"]);
}
