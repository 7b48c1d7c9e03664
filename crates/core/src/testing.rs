use crate::records::{Asset, Bill, BillFrequency, Expense, Goal, Liability, Profile};
use chrono::NaiveDate;

pub const TEST_USER: &str = "user-test";
const TIMESTAMP: &str = "2025-01-01T00:00:00Z";

/// Expense owned by [`TEST_USER`].
pub fn expense(category: &str, amount: f64, date: NaiveDate) -> Expense {
    Expense {
        id: format!("exp-{}", next_id()),
        user_id: TEST_USER.to_string(),
        category: category.to_string(),
        amount,
        date,
        description: None,
        created_at: TIMESTAMP.to_string(),
        updated_at: TIMESTAMP.to_string(),
    }
}

pub fn goal(title: &str, target_amount: f64, current_amount: f64) -> Goal {
    Goal {
        id: format!("goal-{}", next_id()),
        user_id: TEST_USER.to_string(),
        title: title.to_string(),
        target_amount,
        current_amount,
        target_date: None,
        completed_at: None,
        created_at: TIMESTAMP.to_string(),
        updated_at: TIMESTAMP.to_string(),
    }
}

/// Unpaid monthly bill.
pub fn bill(title: &str, amount: f64, due_date: NaiveDate) -> Bill {
    Bill {
        id: format!("bill-{}", next_id()),
        user_id: TEST_USER.to_string(),
        title: title.to_string(),
        amount,
        frequency: BillFrequency::Monthly,
        due_date,
        is_paid: false,
        category: None,
        paid_at: None,
        created_at: TIMESTAMP.to_string(),
        updated_at: TIMESTAMP.to_string(),
    }
}

/// Non-depreciating asset bought at `current_value`.
pub fn asset(name: &str, asset_type: &str, current_value: f64) -> Asset {
    Asset {
        id: format!("asset-{}", next_id()),
        user_id: TEST_USER.to_string(),
        name: name.to_string(),
        asset_type: asset_type.to_string(),
        purchase_value: current_value,
        current_value,
        depreciation_rate: 0.0,
        purchase_date: None,
        created_at: TIMESTAMP.to_string(),
        updated_at: TIMESTAMP.to_string(),
    }
}

pub fn liability(
    name: &str,
    liability_type: &str,
    outstanding_amount: f64,
    interest_rate: f64,
    emi_amount: f64,
) -> Liability {
    Liability {
        id: format!("liab-{}", next_id()),
        user_id: TEST_USER.to_string(),
        name: name.to_string(),
        liability_type: liability_type.to_string(),
        principal_amount: outstanding_amount,
        outstanding_amount,
        interest_rate,
        emi_amount,
        created_at: TIMESTAMP.to_string(),
        updated_at: TIMESTAMP.to_string(),
    }
}

pub fn profile(annual_salary: f64) -> Profile {
    Profile {
        user_id: TEST_USER.to_string(),
        annual_salary,
        display_name: None,
        created_at: TIMESTAMP.to_string(),
        updated_at: TIMESTAMP.to_string(),
    }
}

fn next_id() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}
