//! Prompt templates and output schemas for each advisor.

use finquest_api::ChatMessage;
use serde::Serialize;
use serde_json::{Value, json};

use crate::gateway::{Prompt, ToolSpec};
use crate::reduce::{
    BudgetMetrics, ChatContext, DebtMetrics, IncomeForecastMetrics, NetWorthMetrics,
    RetirementMetrics, TaxMetrics,
};

const SYSTEM_BASE: &str = "You are FinQuest, a careful personal-finance advisor. \
Base every figure on the user data provided; do not invent accounts or income. \
Amounts are in the user's local currency. Keep advice practical and specific.";

fn system(role: &str) -> String {
    format!("{SYSTEM_BASE}\n\nRole: {role}")
}

fn render<T: Serialize>(metrics: &T) -> String {
    serde_json::to_string_pretty(metrics).unwrap_or_else(|_| "{}".to_string())
}

fn user_prompt<T: Serialize>(task: &str, metrics: &T, tool: &ToolSpec) -> String {
    format!(
        "{task}\n\n\
        <financial_data>\n{data}\n</financial_data>\n\n\
        Respond with a single JSON object matching this schema:\n{schema}",
        data = render(metrics),
        schema = serde_json::to_string_pretty(&tool.parameters).unwrap_or_default(),
    )
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn string_list() -> Value {
    json!({"type": "array", "items": {"type": "string"}})
}

// ── budget ──

pub fn budget_tool() -> ToolSpec {
    ToolSpec {
        name: "budget_plan",
        description: "Return an optimized monthly budget",
        parameters: object(
            json!({
                "summary": {"type": "string"},
                "recommended_budget": {
                    "type": "array",
                    "items": object(json!({
                        "category": {"type": "string"},
                        "current": {"type": "number"},
                        "recommended": {"type": "number"},
                        "reason": {"type": "string"},
                    }), &["category", "current", "recommended", "reason"]),
                },
                "monthly_savings_potential": {"type": "number"},
                "tips": string_list(),
            }),
            &["summary", "recommended_budget", "monthly_savings_potential", "tips"],
        ),
    }
}

pub fn budget(metrics: &BudgetMetrics) -> Prompt {
    let tool = budget_tool();
    let mut task = String::from(
        "Analyse the spending below and recommend a monthly budget per category \
        that raises savings while staying realistic. Prioritise the active goals.",
    );
    if !metrics.focus_categories.is_empty() {
        task.push_str(&format!(
            " Pay particular attention to: {}.",
            metrics.focus_categories.join(", ")
        ));
    }
    Prompt::single(
        system("budget optimizer"),
        user_prompt(&task, metrics, &tool),
        tool,
    )
}

// ── tax ──

pub fn tax_tool() -> ToolSpec {
    ToolSpec {
        name: "tax_plan",
        description: "Return a tax optimization plan",
        parameters: object(
            json!({
                "recommended_regime": {"type": "string", "enum": ["old", "new"]},
                "old_regime_tax": {"type": "number"},
                "new_regime_tax": {"type": "number"},
                "deductions": {
                    "type": "array",
                    "items": object(json!({
                        "section": {"type": "string"},
                        "description": {"type": "string"},
                        "current": {"type": "number"},
                        "max_limit": {"type": "number"},
                        "suggestion": {"type": "string"},
                    }), &["section", "description", "current", "max_limit", "suggestion"]),
                },
                "estimated_savings": {"type": "number"},
                "tips": string_list(),
            }),
            &[
                "recommended_regime",
                "old_regime_tax",
                "new_regime_tax",
                "deductions",
                "estimated_savings",
                "tips",
            ],
        ),
    }
}

pub fn tax(metrics: &TaxMetrics) -> Prompt {
    let tool = tax_tool();
    let task = "Compare the tax liability under the old and new income-tax regimes \
        for the income below, list the deductions the user is using or could use \
        (with statutory limits), and recommend a regime.";
    Prompt::single(
        system("tax optimization advisor"),
        user_prompt(task, metrics, &tool),
        tool,
    )
}

// ── retirement ──

pub fn retirement_tool() -> ToolSpec {
    ToolSpec {
        name: "retirement_plan",
        description: "Return a retirement corpus plan",
        parameters: object(
            json!({
                "required_corpus": {"type": "number"},
                "projected_corpus": {"type": "number"},
                "monthly_sip_needed": {"type": "number"},
                "swp_plan": object(json!({
                    "monthly_withdrawal": {"type": "number"},
                    "duration_years": {"type": "number"},
                }), &["monthly_withdrawal", "duration_years"]),
                "gap": {"type": "number"},
                "recommendations": string_list(),
            }),
            &[
                "required_corpus",
                "projected_corpus",
                "monthly_sip_needed",
                "swp_plan",
                "gap",
                "recommendations",
            ],
        ),
    }
}

pub fn retirement(metrics: &RetirementMetrics) -> Prompt {
    let tool = retirement_tool();
    let task = "Project the retirement corpus needed to sustain the monthly expenses \
        below (inflation-adjusted) and the corpus the user is on track for. \
        Give the monthly systematic investment needed to close the gap and a \
        systematic withdrawal plan for retirement.";
    Prompt::single(
        system("retirement planner"),
        user_prompt(task, metrics, &tool),
        tool,
    )
}

// ── debt ──

pub fn debt_tool() -> ToolSpec {
    ToolSpec {
        name: "debt_plan",
        description: "Return a debt payoff strategy",
        parameters: object(
            json!({
                "recommended_strategy": {"type": "string", "enum": ["avalanche", "snowball"]},
                "payoff_order": {
                    "type": "array",
                    "items": object(json!({
                        "name": {"type": "string"},
                        "reason": {"type": "string"},
                    }), &["name", "reason"]),
                },
                "months_to_debt_free": {"type": "number"},
                "interest_saved": {"type": "number"},
                "tips": string_list(),
            }),
            &[
                "recommended_strategy",
                "payoff_order",
                "months_to_debt_free",
                "interest_saved",
                "tips",
            ],
        ),
    }
}

pub fn debt(metrics: &DebtMetrics) -> Prompt {
    let tool = debt_tool();
    let task = "Recommend the avalanche or snowball payoff strategy for the debts below, \
        order the debts for payoff, and estimate the months to become debt-free and \
        the interest saved by applying the extra monthly payment.";
    Prompt::single(
        system("debt payoff strategist"),
        user_prompt(task, metrics, &tool),
        tool,
    )
}

// ── net worth ──

pub fn net_worth_tool() -> ToolSpec {
    ToolSpec {
        name: "net_worth_report",
        description: "Return a net worth analysis",
        parameters: object(
            json!({
                "health_score": {"type": "number", "minimum": 0, "maximum": 100},
                "summary": {"type": "string"},
                "projections": {
                    "type": "array",
                    "items": object(json!({
                        "year": {"type": "integer"},
                        "net_worth": {"type": "number"},
                    }), &["year", "net_worth"]),
                },
                "recommendations": string_list(),
            }),
            &["health_score", "summary", "projections", "recommendations"],
        ),
    }
}

pub fn net_worth(metrics: &NetWorthMetrics) -> Prompt {
    let tool = net_worth_tool();
    let task = format!(
        "Assess the balance sheet below: score its health from 0 to 100, comment on \
        asset allocation and leverage, and project net worth for each of the next {} \
        years at the given growth rate.",
        metrics.years
    );
    Prompt::single(
        system("net worth analyst"),
        user_prompt(&task, metrics, &tool),
        tool,
    )
}

// ── income forecast ──

pub fn income_forecast_tool() -> ToolSpec {
    ToolSpec {
        name: "income_forecast",
        description: "Return a month-by-month cash flow forecast",
        parameters: object(
            json!({
                "forecast": {
                    "type": "array",
                    "items": object(json!({
                        "month": {"type": "string", "description": "YYYY-MM"},
                        "income": {"type": "number"},
                        "expenses": {"type": "number"},
                        "savings": {"type": "number"},
                    }), &["month", "income", "expenses", "savings"]),
                },
                "insights": string_list(),
            }),
            &["forecast", "insights"],
        ),
    }
}

pub fn income_forecast(metrics: &IncomeForecastMetrics) -> Prompt {
    let tool = income_forecast_tool();
    let task = format!(
        "Forecast income, expenses and savings for each of the next {} months, \
        starting with next month, using the spend history and recurring bills below.",
        metrics.months
    );
    Prompt::single(
        system("cash flow forecaster"),
        user_prompt(&task, metrics, &tool),
        tool,
    )
}

// ── assistant ──

pub fn chat(context: &ChatContext, messages: &[ChatMessage]) -> Prompt {
    let system = format!(
        "{}\n\nAnswer the user's questions conversationally in a few short paragraphs. \
        Here is their current financial snapshot:\n<financial_data>\n{}\n</financial_data>",
        system("financial assistant"),
        render(context),
    );
    Prompt {
        system,
        messages: messages.to_vec(),
        tool: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduce::{self, FinancialSnapshot};
    use chrono::NaiveDate;
    use finquest_api::{BudgetAdvisorRequest, ChatRole};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn every_schema_lists_its_required_keys() {
        let cases = [
            (budget_tool(), "monthly_savings_potential"),
            (tax_tool(), "recommended_regime"),
            (retirement_tool(), "swp_plan"),
            (debt_tool(), "payoff_order"),
            (net_worth_tool(), "health_score"),
            (income_forecast_tool(), "forecast"),
        ];
        for (tool, key) in cases {
            let required = tool.parameters["required"].as_array().unwrap();
            assert!(
                required.iter().any(|k| k == key),
                "{} missing {key}",
                tool.name
            );
            assert!(tool.parameters["properties"].get(key).is_some());
        }
    }

    #[test]
    fn budget_prompt_embeds_metrics_and_focus() {
        let metrics = reduce::budget(
            &FinancialSnapshot::default(),
            &BudgetAdvisorRequest {
                additional_monthly_income: Some(250.0),
                focus_categories: vec!["Dining".into()],
            },
            today(),
        );
        let prompt = budget(&metrics);
        let user = &prompt.messages[0].content;
        assert!(user.contains("\"additional_monthly_income\": 250.0"), "{user}");
        assert!(user.contains("Dining"));
        assert!(user.contains("recommended_budget"));
        assert!(prompt.system.contains("budget optimizer"));
        assert_eq!(prompt.tool.as_ref().unwrap().name, "budget_plan");
    }

    #[test]
    fn chat_prompt_keeps_conversation() {
        let context = reduce::chat_context(&FinancialSnapshot::default(), today());
        let messages = vec![
            ChatMessage {
                role: ChatRole::User,
                content: "Hi".into(),
            },
            ChatMessage {
                role: ChatRole::Assistant,
                content: "Hello!".into(),
            },
            ChatMessage {
                role: ChatRole::User,
                content: "Can I afford a vacation?".into(),
            },
        ];
        let prompt = chat(&context, &messages);
        assert!(prompt.tool.is_none());
        assert_eq!(prompt.messages.len(), 3);
        assert!(prompt.system.contains("month_spend"));
    }
}
