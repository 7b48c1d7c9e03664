//! Net worth and debt aggregates over assets and liabilities.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::records::{Asset, Liability};
use crate::stats::percent_of;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetWorth {
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub net_worth: f64,
    /// Liabilities as a percent of assets; zero when there are no assets.
    pub debt_to_asset_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetAllocation {
    pub asset_type: String,
    pub value: f64,
    pub share_pct: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DebtSummary {
    pub count: u64,
    pub total_principal: f64,
    pub total_outstanding: f64,
    /// Interest rate weighted by outstanding balance.
    pub weighted_interest_rate: f64,
    pub total_emi: f64,
    /// Monthly EMI as a percent of monthly income.
    pub debt_to_income_pct: f64,
}

pub fn net_worth(assets: &[Asset], liabilities: &[Liability]) -> NetWorth {
    let total_assets: f64 = assets.iter().map(|a| a.current_value).sum();
    let total_liabilities: f64 = liabilities.iter().map(|l| l.outstanding_amount).sum();
    NetWorth {
        total_assets,
        total_liabilities,
        net_worth: total_assets - total_liabilities,
        debt_to_asset_pct: percent_of(total_liabilities, total_assets),
    }
}

/// Current value grouped by asset type, largest first.
pub fn allocation_by_type(assets: &[Asset]) -> Vec<AssetAllocation> {
    let mut map = HashMap::<&str, f64>::new();
    for a in assets {
        *map.entry(a.asset_type.as_str()).or_default() += a.current_value;
    }
    let total: f64 = map.values().sum();
    let mut result: Vec<AssetAllocation> = map
        .into_iter()
        .map(|(asset_type, value)| AssetAllocation {
            asset_type: asset_type.to_string(),
            value,
            share_pct: percent_of(value, total),
        })
        .collect();
    result.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then_with(|| a.asset_type.cmp(&b.asset_type))
    });
    result
}

/// Sum of depreciation-model values as of `today`.
pub fn total_depreciated_value(assets: &[Asset], today: NaiveDate) -> f64 {
    assets.iter().map(|a| a.depreciated_value(today)).sum()
}

pub fn debt_summary(liabilities: &[Liability], monthly_income: f64) -> DebtSummary {
    let total_outstanding: f64 = liabilities.iter().map(|l| l.outstanding_amount).sum();
    let weighted_interest_rate = if total_outstanding > 0.0 {
        liabilities
            .iter()
            .map(|l| l.interest_rate * l.outstanding_amount)
            .sum::<f64>()
            / total_outstanding
    } else {
        0.0
    };
    let total_emi: f64 = liabilities.iter().map(|l| l.emi_amount).sum();
    DebtSummary {
        count: liabilities.len() as u64,
        total_principal: liabilities.iter().map(|l| l.principal_amount).sum(),
        total_outstanding,
        weighted_interest_rate,
        total_emi,
        debt_to_income_pct: percent_of(total_emi, monthly_income),
    }
}

/// Approximate annual interest on liabilities whose type looks like a home loan.
pub fn home_loan_interest(liabilities: &[Liability]) -> f64 {
    liabilities
        .iter()
        .filter(|l| {
            let t = l.liability_type.to_ascii_lowercase();
            t.contains("home") || t.contains("housing") || t.contains("mortgage")
        })
        .map(|l| l.outstanding_amount * l.interest_rate / 100.0)
        .sum()
}
