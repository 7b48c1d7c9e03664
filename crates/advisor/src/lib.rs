//! LLM-backed financial advisors.
//!
//! Each advisor runs the same pipeline: reduce the user's rows into local
//! aggregates ([`reduce`]), render a prompt with an output schema
//! ([`prompts`]), call the gateway ([`gateway`]) and return the model's JSON
//! next to the aggregates. Nothing is retried and nothing is kept between calls.

pub mod error;
pub mod extract;
pub mod gateway;
pub mod prompts;
pub mod reduce;

use chrono::NaiveDate;
use finquest_api::{
    AdvisorKind, AdvisorResponse, BudgetAdvisorRequest, ChatRequest, DebtAdvisorRequest,
    IncomeForecastRequest, NetWorthAdvisorRequest, RetirementAdvisorRequest, TaxAdvisorRequest,
};
use serde::Serialize;
use serde_json::{Value, json};

pub use error::LlmError;
pub use gateway::{LlmClient, Prompt, ToolSpec};
pub use reduce::FinancialSnapshot;

/// A prepared advisor call: aggregates plus the prompt that embeds them.
#[derive(Debug, Clone)]
pub struct AdvisorCall {
    pub kind: AdvisorKind,
    pub metrics: Value,
    pub prompt: Prompt,
}

impl AdvisorCall {
    fn new<M: Serialize>(kind: AdvisorKind, metrics: &M, prompt: Prompt) -> Self {
        Self {
            kind,
            metrics: serde_json::to_value(metrics).unwrap_or(Value::Null),
            prompt,
        }
    }

    pub fn budget(s: &FinancialSnapshot, req: &BudgetAdvisorRequest, today: NaiveDate) -> Self {
        let m = reduce::budget(s, req, today);
        Self::new(AdvisorKind::Budget, &m, prompts::budget(&m))
    }

    pub fn tax(s: &FinancialSnapshot, req: &TaxAdvisorRequest, today: NaiveDate) -> Self {
        let m = reduce::tax(s, req, today);
        Self::new(AdvisorKind::Tax, &m, prompts::tax(&m))
    }

    pub fn retirement(
        s: &FinancialSnapshot,
        req: &RetirementAdvisorRequest,
        today: NaiveDate,
    ) -> Self {
        let m = reduce::retirement(s, req, today);
        Self::new(AdvisorKind::Retirement, &m, prompts::retirement(&m))
    }

    pub fn debt(s: &FinancialSnapshot, req: &DebtAdvisorRequest) -> Self {
        let m = reduce::debt(s, req);
        Self::new(AdvisorKind::Debt, &m, prompts::debt(&m))
    }

    pub fn net_worth(s: &FinancialSnapshot, req: &NetWorthAdvisorRequest, today: NaiveDate) -> Self {
        let m = reduce::net_worth(s, req, today);
        Self::new(AdvisorKind::NetWorth, &m, prompts::net_worth(&m))
    }

    pub fn income_forecast(
        s: &FinancialSnapshot,
        req: &IncomeForecastRequest,
        months: u32,
        today: NaiveDate,
    ) -> Self {
        let m = reduce::income_forecast(s, req, months, today);
        Self::new(AdvisorKind::IncomeForecast, &m, prompts::income_forecast(&m))
    }

    pub fn chat(s: &FinancialSnapshot, req: &ChatRequest, today: NaiveDate) -> Self {
        let context = reduce::chat_context(s, today);
        Self::new(
            AdvisorKind::Chat,
            &context,
            prompts::chat(&context, &req.messages),
        )
    }

    /// Send the prompt and wrap the model's answer.
    pub async fn run(self, client: &LlmClient) -> Result<AdvisorResponse, LlmError> {
        let analysis = if self.prompt.tool.is_some() {
            let value = client.complete_json(&self.prompt).await?;
            if !value.is_object() {
                return Err(LlmError::InvalidResponse(
                    "model output is not a JSON object".into(),
                ));
            }
            value
        } else {
            json!({ "reply": client.complete_text(&self.prompt).await?.trim() })
        };
        Ok(AdvisorResponse {
            advisor: self.kind,
            metrics: self.metrics,
            analysis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finquest_core::testing;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn calls_carry_kind_and_metrics() {
        let snapshot = FinancialSnapshot {
            profile: Some(testing::profile(60_000.0)),
            liabilities: vec![testing::liability("Car", "auto_loan", 9_000.0, 7.5, 300.0)],
            ..Default::default()
        };
        let call = AdvisorCall::debt(
            &snapshot,
            &DebtAdvisorRequest {
                extra_monthly_payment: Some(200.0),
            },
        );
        assert_eq!(call.kind, AdvisorKind::Debt);
        assert_eq!(call.metrics["total_outstanding"], 9_000.0);
        assert_eq!(call.metrics["extra_monthly_payment"], 200.0);
        assert_eq!(call.prompt.tool.as_ref().unwrap().name, "debt_plan");

        let call = AdvisorCall::net_worth(&snapshot, &NetWorthAdvisorRequest::default(), today());
        assert_eq!(call.metrics["net_worth"], -9_000.0);
        assert_eq!(call.metrics["years"], 5);
    }

    #[test]
    fn chat_call_is_free_text() {
        let req: ChatRequest = serde_json::from_value(json!({
            "messages": [{"role": "user", "content": "How am I doing?"}]
        }))
        .unwrap();
        let call = AdvisorCall::chat(&FinancialSnapshot::default(), &req, today());
        assert_eq!(call.kind, AdvisorKind::Chat);
        assert!(call.prompt.tool.is_none());
        assert!(call.metrics.get("net_worth").is_some());
    }
}
