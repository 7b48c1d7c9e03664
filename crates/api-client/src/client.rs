use std::time::Duration;

use anyhow::{Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;

use finquest_api::*;

/// Typed HTTP client for the FinQuest API.
///
/// Every method except [`ApiClient::health`] and [`ApiClient::capabilities`]
/// needs a bearer token set with [`ApiClient::set_auth`].
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl ApiClient {
    /// Create a new client with the given base URL and timeout.
    ///
    /// Long-polling [`ApiClient::changes`] calls need a timeout above the
    /// requested wait.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: None,
        }
    }

    pub fn set_auth(&mut self, token: String) {
        self.auth_token = Some(token);
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn token_or_bail(&self) -> Result<&str> {
        self.auth_token
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("auth token not set"))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_query(path, &()).await
    }

    async fn get_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T> {
        let token = self.token_or_bail()?;
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;
        parse_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        let token = self.token_or_bail()?;
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        parse_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        let token = self.token_or_bail()?;
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        parse_response(resp).await
    }

    async fn delete(&self, path: &str) -> Result<OkResponse> {
        let token = self.token_or_bail()?;
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        parse_response(resp).await
    }

    // ── Meta ──────────────────────────────────────────────────────────────

    pub async fn health(&self) -> Result<HealthResponse> {
        let resp = self.client.get(self.url("/health")).send().await?;
        parse_response(resp).await
    }

    pub async fn capabilities(&self) -> Result<CapabilitiesResponse> {
        let resp = self.client.get(self.url("/capabilities")).send().await?;
        parse_response(resp).await
    }

    pub async fn me(&self) -> Result<MeResponse> {
        self.get("/auth/me").await
    }

    // ── Profile ───────────────────────────────────────────────────────────

    pub async fn profile(&self) -> Result<Profile> {
        self.get("/profile").await
    }

    pub async fn update_profile(&self, req: &UpdateProfileRequest) -> Result<Profile> {
        self.put("/profile", req).await
    }

    // ── Expenses ──────────────────────────────────────────────────────────

    pub async fn list_expenses(&self, query: &ExpenseListQuery) -> Result<Vec<Expense>> {
        self.get_query("/expenses", query).await
    }

    pub async fn create_expense(&self, req: &CreateExpenseRequest) -> Result<ExpenseResponse> {
        self.post("/expenses", req).await
    }

    pub async fn update_expense(&self, id: &str, req: &UpdateExpenseRequest) -> Result<ExpenseResponse> {
        self.put(&format!("/expenses/{id}"), req).await
    }

    pub async fn delete_expense(&self, id: &str) -> Result<OkResponse> {
        self.delete(&format!("/expenses/{id}")).await
    }

    // ── Goals ─────────────────────────────────────────────────────────────

    pub async fn list_goals(&self) -> Result<Vec<Goal>> {
        self.get("/goals").await
    }

    pub async fn create_goal(&self, req: &CreateGoalRequest) -> Result<GoalResponse> {
        self.post("/goals", req).await
    }

    pub async fn update_goal(&self, id: &str, req: &UpdateGoalRequest) -> Result<GoalResponse> {
        self.put(&format!("/goals/{id}"), req).await
    }

    pub async fn delete_goal(&self, id: &str) -> Result<OkResponse> {
        self.delete(&format!("/goals/{id}")).await
    }

    // ── Bills ─────────────────────────────────────────────────────────────

    pub async fn list_bills(&self, query: &BillListQuery) -> Result<Vec<Bill>> {
        self.get_query("/bills", query).await
    }

    pub async fn upcoming_bills(&self, query: &UpcomingBillsQuery) -> Result<UpcomingBillsResponse> {
        self.get_query("/bills/upcoming", query).await
    }

    pub async fn create_bill(&self, req: &CreateBillRequest) -> Result<Bill> {
        self.post("/bills", req).await
    }

    pub async fn update_bill(&self, id: &str, req: &UpdateBillRequest) -> Result<Bill> {
        self.put(&format!("/bills/{id}"), req).await
    }

    pub async fn pay_bill(&self, id: &str) -> Result<PayBillResponse> {
        self.post(&format!("/bills/{id}/pay"), &serde_json::json!({})).await
    }

    pub async fn delete_bill(&self, id: &str) -> Result<OkResponse> {
        self.delete(&format!("/bills/{id}")).await
    }

    // ── Assets & liabilities ──────────────────────────────────────────────

    pub async fn list_assets(&self) -> Result<Vec<Asset>> {
        self.get("/assets").await
    }

    pub async fn create_asset(&self, req: &CreateAssetRequest) -> Result<Asset> {
        self.post("/assets", req).await
    }

    pub async fn update_asset(&self, id: &str, req: &UpdateAssetRequest) -> Result<Asset> {
        self.put(&format!("/assets/{id}"), req).await
    }

    pub async fn delete_asset(&self, id: &str) -> Result<OkResponse> {
        self.delete(&format!("/assets/{id}")).await
    }

    pub async fn list_liabilities(&self) -> Result<Vec<Liability>> {
        self.get("/liabilities").await
    }

    pub async fn create_liability(&self, req: &CreateLiabilityRequest) -> Result<Liability> {
        self.post("/liabilities", req).await
    }

    pub async fn update_liability(&self, id: &str, req: &UpdateLiabilityRequest) -> Result<Liability> {
        self.put(&format!("/liabilities/{id}"), req).await
    }

    pub async fn delete_liability(&self, id: &str) -> Result<OkResponse> {
        self.delete(&format!("/liabilities/{id}")).await
    }

    // ── Categories ────────────────────────────────────────────────────────

    pub async fn list_categories(&self) -> Result<CategoriesResponse> {
        self.get("/categories").await
    }

    pub async fn create_category(&self, req: &CreateCategoryRequest) -> Result<Category> {
        self.post("/categories", req).await
    }

    pub async fn update_category(&self, id: &str, req: &UpdateCategoryRequest) -> Result<Category> {
        self.put(&format!("/categories/{id}"), req).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<OkResponse> {
        self.delete(&format!("/categories/{id}")).await
    }

    // ── Achievements & dashboard ──────────────────────────────────────────

    pub async fn achievements(&self) -> Result<AchievementsResponse> {
        self.get("/achievements").await
    }

    pub async fn evaluate_achievements(&self) -> Result<EvaluateResponse> {
        self.post("/achievements/evaluate", &serde_json::json!({})).await
    }

    pub async fn stats(&self) -> Result<StatsResponse> {
        self.get("/stats").await
    }

    pub async fn summary(&self) -> Result<SummaryResponse> {
        self.get("/summary").await
    }

    // ── Change feed ───────────────────────────────────────────────────────

    pub async fn changes(&self, query: &ChangesQuery) -> Result<ChangesResponse> {
        self.get_query("/changes", query).await
    }

    // ── Advisors ──────────────────────────────────────────────────────────

    pub async fn budget_advisor(&self, req: &BudgetAdvisorRequest) -> Result<AdvisorResponse> {
        self.post("/advisor/budget", req).await
    }

    pub async fn tax_advisor(&self, req: &TaxAdvisorRequest) -> Result<AdvisorResponse> {
        self.post("/advisor/tax", req).await
    }

    pub async fn retirement_advisor(&self, req: &RetirementAdvisorRequest) -> Result<AdvisorResponse> {
        self.post("/advisor/retirement", req).await
    }

    pub async fn debt_advisor(&self, req: &DebtAdvisorRequest) -> Result<AdvisorResponse> {
        self.post("/advisor/debt", req).await
    }

    pub async fn net_worth_advisor(&self, req: &NetWorthAdvisorRequest) -> Result<AdvisorResponse> {
        self.post("/advisor/net-worth", req).await
    }

    pub async fn income_forecast(&self, req: &IncomeForecastRequest) -> Result<AdvisorResponse> {
        self.post("/advisor/income-forecast", req).await
    }

    pub async fn chat(&self, req: &ChatRequest) -> Result<AdvisorResponse> {
        self.post("/advisor/chat", req).await
    }
}

/// Parse an HTTP response: return the deserialized body on 2xx,
/// or an error carrying the status and the server's `error` message.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        bail!("{status}: {message}");
    }
    Ok(resp.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::get};
    use serde_json::json;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::with_client(reqwest::Client::new(), "http://localhost:8787/");
        assert_eq!(client.base_url(), "http://localhost:8787");
        assert_eq!(client.url("/goals"), "http://localhost:8787/api/goals");
        assert!(client.auth_token().is_none());
    }

    #[tokio::test]
    async fn authed_calls_need_a_token() {
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = client.list_goals().await.unwrap_err();
        assert!(err.to_string().contains("auth token not set"));
    }

    #[tokio::test]
    async fn error_bodies_surface_the_server_message() {
        let app = Router::new()
            .route(
                "/api/goals",
                get(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({"error": "goal not found"})),
                    )
                }),
            )
            .route("/api/health", get(|| async { "not json" }));
        let base = serve(app).await;

        let mut client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();
        client.set_auth("token".into());
        let err = client.list_goals().await.unwrap_err();
        assert_eq!(err.to_string(), "404 Not Found: goal not found");

        assert!(client.health().await.is_err());
    }
}
