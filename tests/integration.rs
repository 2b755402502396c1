//! Integration tests for the compensation engine HTTP API.
//!
//! This test suite drives the router end to end:
//! - Deduction pipeline (priority order, annual caps, formulas)
//! - Bonus withholding per tax method
//! - Commission and performance bonuses
//! - Error cases

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use tower::ServiceExt;

use compensation_engine::api::{AppState, create_router};
use compensation_engine::config::ConfigLoader;

// =============================================================================
// Test Helpers
// =============================================================================

fn create_test_state() -> AppState {
    let config = ConfigLoader::load("./config/au_2024_25").expect("Failed to load config");
    AppState::new(config)
}

fn create_router_for_test() -> Router {
    create_router(create_test_state())
}

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn decimal_at(value: &Value) -> Decimal {
    decimal(
        value
            .as_str()
            .unwrap_or_else(|| panic!("Expected decimal string, got {}", value)),
    )
}

async fn post(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

fn employee(base_salary: &str) -> Value {
    json!({
        "id": "emp_001",
        "company_id": "co_001",
        "base_salary": base_salary,
        "pay_frequency": "fortnightly",
        "employment_type": "full_time",
        "date_of_birth": "1985-04-02",
        "start_date": "2019-07-01"
    })
}

fn fixed_deduction(id: &str, deduction_type: &str, amount: &str, priority: i32) -> Value {
    json!({
        "id": id,
        "employee_id": "emp_001",
        "name": format!("Deduction {}", id),
        "deduction_type": deduction_type,
        "category": "other",
        "calculation_method": "fixed",
        "amount": amount,
        "priority": priority,
        "start_date": "2025-01-01",
        "status": "active"
    })
}

fn deduction_request(deductions: Vec<Value>, ytd_ledger: Vec<Value>) -> Value {
    json!({
        "employee": employee("78000"),
        "pay_period": {
            "start_date": "2025-03-03",
            "end_date": "2025-03-16",
            "frequency": "fortnightly"
        },
        "gross_pay": "3000",
        "taxable_income": "3000",
        "deductions": deductions,
        "ytd_ledger": ytd_ledger
    })
}

fn bonus_request(bonus_type: &str, gross_amount: &str, options: Value) -> Value {
    json!({
        "employee": employee("80000"),
        "bonus": {
            "bonus_type": bonus_type,
            "gross_amount": gross_amount,
            "payment_date": "2025-06-30",
            "options": options
        }
    })
}

fn deduction_ids(result: &Value, list: &str) -> Vec<String> {
    result["result"][list]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["deduction"]["id"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// SECTION 1: Deduction Pipeline
// =============================================================================

#[tokio::test]
async fn test_pre_tax_priority_order_reduces_taxable_income() {
    let request = deduction_request(
        vec![
            fixed_deduction("ded_low", "pre_tax", "50", 10),
            fixed_deduction("ded_high", "pre_tax", "100", 20),
        ],
        vec![],
    );

    let (status, result) = post(create_router_for_test(), "/deductions/calculate", request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(deduction_ids(&result, "pre_tax_deductions"), vec!["ded_high", "ded_low"]);
    assert_eq!(
        decimal_at(&result["result"]["taxable_income_after_deductions"]),
        decimal("2850")
    );
    assert_eq!(
        decimal_at(&result["result"]["total_pre_tax_deductions"]),
        decimal("150")
    );
}

#[tokio::test]
async fn test_meal_entertainment_clamped_to_remaining_cap() {
    let mut meal = fixed_deduction("ded_meal", "pre_tax", "800", 10);
    meal["name"] = json!("Meal Entertainment");
    meal["category"] = json!("salary_packaging");
    meal["annual_cap"] = json!("2650");
    let ledger = vec![json!({
        "employee_id": "emp_001",
        "deduction_id": "ded_meal",
        "date": "2025-02-17",
        "amount": "2000"
    })];

    let (status, result) = post(
        create_router_for_test(),
        "/deductions/calculate",
        deduction_request(vec![meal], ledger),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let applied = &result["result"]["pre_tax_deductions"][0];
    assert_eq!(decimal_at(&applied["current_amount"]), decimal("650"));
    assert_eq!(
        decimal_at(&applied["ytd_amount_after_this_period"]),
        decimal("2650")
    );
}

#[tokio::test]
async fn test_ledger_from_previous_year_does_not_count() {
    let mut meal = fixed_deduction("ded_meal", "pre_tax", "500", 10);
    meal["annual_cap"] = json!("2650");
    let ledger = vec![json!({
        "employee_id": "emp_001",
        "deduction_id": "ded_meal",
        "date": "2024-12-16",
        "amount": "2650"
    })];

    let (status, result) = post(
        create_router_for_test(),
        "/deductions/calculate",
        deduction_request(vec![meal], ledger),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let applied = &result["result"]["pre_tax_deductions"][0];
    assert_eq!(decimal_at(&applied["current_amount"]), decimal("500"));
}

#[tokio::test]
async fn test_formula_deductions() {
    let child_support = json!({
        "id": "ded_child",
        "employee_id": "emp_001",
        "name": "Child Support",
        "deduction_type": "post_tax",
        "category": "child_support",
        "calculation_method": "formula",
        "formula_parameters": { "children_count": "1" },
        "priority": 50,
        "start_date": "2025-01-01",
        "status": "active"
    });
    let union_fees = json!({
        "id": "ded_union",
        "employee_id": "emp_001",
        "name": "Union Fees",
        "deduction_type": "post_tax",
        "category": "union_fees",
        "calculation_method": "formula",
        "priority": 5,
        "start_date": "2025-01-01",
        "status": "active"
    });

    let (status, result) = post(
        create_router_for_test(),
        "/deductions/calculate",
        deduction_request(vec![union_fees, child_support], vec![]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(deduction_ids(&result, "post_tax_deductions"), vec!["ded_child", "ded_union"]);
    let post_tax = &result["result"]["post_tax_deductions"];
    // (3000 - tax(78,000)/26) * 18%
    assert_eq!(decimal_at(&post_tax[0]["current_amount"]), decimal("430.50"));
    // max(3000 * 1%, 10)
    assert_eq!(decimal_at(&post_tax[1]["current_amount"]), decimal("30"));
    assert_eq!(
        decimal_at(&result["result"]["taxable_income_after_deductions"]),
        decimal("3000")
    );
}

#[tokio::test]
async fn test_inactive_and_future_deductions_are_skipped() {
    let mut inactive = fixed_deduction("ded_inactive", "post_tax", "10", 1);
    inactive["status"] = json!("inactive");
    let mut future = fixed_deduction("ded_future", "post_tax", "10", 1);
    future["start_date"] = json!("2025-04-01");

    let (status, result) = post(
        create_router_for_test(),
        "/deductions/calculate",
        deduction_request(vec![inactive, future], vec![]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(result["result"]["post_tax_deductions"].as_array().unwrap().is_empty());
    assert_eq!(decimal_at(&result["result"]["net_pay_reduction"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_deduction_steps_recorded() {
    let (status, result) = post(
        create_router_for_test(),
        "/deductions/calculate",
        deduction_request(vec![fixed_deduction("ded_a", "pre_tax", "100", 1)], vec![]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let steps = result["result"]["steps"].as_array().unwrap();
    assert!(!steps.is_empty());
    assert_eq!(steps[0]["step_number"], 1);
    assert_eq!(steps[0]["rule_id"], "select_deductions");
}

// =============================================================================
// SECTION 2: Bonus Withholding
// =============================================================================

#[tokio::test]
async fn test_performance_bonus_marginal_rates() {
    let (status, result) = post(
        create_router_for_test(),
        "/bonuses/calculate",
        bonus_request("performance", "5000", json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let payment = &result["result"]["bonus_payment"];
    assert_eq!(payment["tax_method"], "marginal_rates");
    assert_eq!(payment["status"], "calculated");
    assert_eq!(payment["approval_status"], "pending");
    assert_eq!(payment["is_reportable"], true);
    assert_eq!(decimal_at(&payment["tax_withheld"]), decimal("1625"));
    assert_eq!(decimal_at(&payment["net_amount"]), decimal("3375"));
    assert_eq!(decimal_at(&payment["superannuation_amount"]), decimal("575"));

    let tax = &result["result"]["tax_calculation"];
    assert_eq!(decimal_at(&tax["medicare_levy"]), decimal("100"));
    assert_eq!(decimal_at(&tax["total_tax_liability"]), decimal("1725"));
}

#[tokio::test]
async fn test_referral_bonus_fixed_rate_warnings() {
    let (status, result) = post(
        create_router_for_test(),
        "/bonuses/calculate",
        bonus_request("referral", "2000", json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        decimal_at(&result["result"]["bonus_payment"]["tax_withheld"]),
        decimal("940")
    );
    let codes: Vec<&str> = result["result"]["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["FIXED_RATE_APPLIED", "MEDICARE_LEVY_DOUBLE_COUNTED"]);
}

#[tokio::test]
async fn test_profit_sharing_average_rates() {
    let (status, result) = post(
        create_router_for_test(),
        "/bonuses/calculate",
        bonus_request("profit_sharing", "5000", json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["result"]["bonus_payment"]["tax_method"], "average_rates");
    // 5000 * 16,467 / 80,000
    assert_eq!(
        decimal_at(&result["result"]["bonus_payment"]["tax_withheld"]),
        decimal("1029.19")
    );
}

#[tokio::test]
async fn test_termination_payment_etp() {
    let (status, result) = post(
        create_router_for_test(),
        "/bonuses/calculate",
        bonus_request("termination", "20000", json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["result"]["bonus_payment"]["tax_method"], "etp");
    assert_eq!(
        decimal_at(&result["result"]["bonus_payment"]["tax_withheld"]),
        decimal("1270.92")
    );
    assert!(result["result"]["tax_calculation"]["medicare_levy"].is_null());
}

#[tokio::test]
async fn test_tax_method_override_and_pro_rata() {
    let (status, result) = post(
        create_router_for_test(),
        "/bonuses/calculate",
        bonus_request(
            "retention",
            "10000",
            json!({ "tax_method": "fixed_rate", "pro_rata_days": 182, "exclude_superannuation": true }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let payment = &result["result"]["bonus_payment"];
    assert_eq!(payment["tax_method"], "fixed_rate");
    assert_eq!(decimal_at(&payment["gross_amount"]), decimal("4986.30"));
    assert_eq!(decimal_at(&payment["superannuation_amount"]), Decimal::ZERO);
    assert_eq!(
        decimal_at(&payment["net_amount"]) + decimal_at(&payment["tax_withheld"]),
        decimal_at(&payment["gross_amount"])
    );
}

#[tokio::test]
async fn test_reimbursement_not_reportable() {
    let (status, result) = post(
        create_router_for_test(),
        "/bonuses/calculate",
        bonus_request("reimbursement", "120", json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["result"]["bonus_payment"]["is_reportable"], false);
}

// =============================================================================
// SECTION 3: Commission and Performance
// =============================================================================

#[tokio::test]
async fn test_flat_commission() {
    let body = json!({
        "employee": employee("80000"),
        "commission": {
            "sales_amount": "100000",
            "commission_rate": "0.05",
            "payment_date": "2025-06-30"
        }
    });

    let (status, result) = post(create_router_for_test(), "/bonuses/commission", body).await;

    assert_eq!(status, StatusCode::OK);
    let payment = &result["result"]["bonus_payment"];
    assert_eq!(decimal_at(&payment["gross_amount"]), decimal("5000"));
    assert_eq!(payment["bonus_type"], "commission");
    assert_eq!(payment["tax_method"], "schedule_5");
}

#[tokio::test]
async fn test_commission_through_general_bonus_endpoint() {
    let body = json!({
        "employee": employee("80000"),
        "bonus": {
            "bonus_type": "commission",
            "gross_amount": "1",
            "sales_amount": "100000",
            "commission_rate": "0.05",
            "payment_date": "2025-06-30"
        }
    });

    let (status, result) = post(create_router_for_test(), "/bonuses/calculate", body).await;

    assert_eq!(status, StatusCode::OK);
    let payment = &result["result"]["bonus_payment"];
    assert_eq!(decimal_at(&payment["gross_amount"]), decimal("5000"));
    assert_eq!(payment["tax_method"], "schedule_5");
    let warnings = result["result"]["warnings"].as_array().unwrap();
    assert!(warnings
        .iter()
        .any(|w| w["code"] == "COMMISSION_GROSS_RECALCULATED"));
}

#[tokio::test]
async fn test_tiered_commission() {
    let body = json!({
        "employee": employee("80000"),
        "commission": {
            "sales_amount": "150000",
            "tiers": [
                { "threshold": "0", "rate": "0.02" },
                { "threshold": "50000", "rate": "0.05" },
                { "threshold": "100000", "rate": "0.08" }
            ],
            "payment_date": "2025-06-30"
        }
    });

    let (status, result) = post(create_router_for_test(), "/bonuses/commission", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        decimal_at(&result["result"]["bonus_payment"]["gross_amount"]),
        decimal("7500")
    );
    let tiers = result["result"]["bonus_payment"]["calculation_details"]["commission"]["tiers"]
        .as_array()
        .unwrap();
    assert_eq!(tiers.len(), 3);
}

#[tokio::test]
async fn test_commission_below_minimum_sales() {
    let body = json!({
        "employee": employee("80000"),
        "commission": {
            "sales_amount": "9000",
            "commission_rate": "0.05",
            "minimum_sales": "10000",
            "payment_date": "2025-06-30"
        }
    });

    let (status, error) = post(create_router_for_test(), "/bonuses/commission", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "BELOW_MINIMUM_SALES");
}

#[tokio::test]
async fn test_performance_bonus_with_team_and_company() {
    let body = json!({
        "employee": employee("80000"),
        "performance": {
            "base_amount": "10000",
            "performance_score": "85",
            "team_score": "80",
            "company_score": "50",
            "payment_date": "2025-06-30"
        }
    });

    let (status, result) = post(create_router_for_test(), "/bonuses/performance", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        decimal_at(&result["result"]["bonus_payment"]["gross_amount"]),
        decimal("9306")
    );
}

// =============================================================================
// SECTION 4: Error Cases
// =============================================================================

#[tokio::test]
async fn test_error_malformed_json() {
    let router = create_router_for_test();

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/deductions/calculate")
                .header("Content-Type", "application/json")
                .body(Body::from("{invalid json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let error: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(error["code"], "MALFORMED_JSON");
}

#[tokio::test]
async fn test_error_invalid_bonus_lists_every_failure() {
    let body = json!({
        "employee": employee("80000"),
        "bonus": {
            "bonus_type": "commission",
            "gross_amount": "0",
            "payment_date": "2025-06-30"
        }
    });

    let (status, error) = post(create_router_for_test(), "/bonuses/calculate", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_BONUS");
    let details = error["details"].as_str().unwrap();
    assert!(details.contains("gross_amount"));
    assert!(details.contains("sales_amount"));
    assert!(details.contains("commission_rate"));
}

#[tokio::test]
async fn test_error_performance_score_out_of_range() {
    let body = json!({
        "employee": employee("80000"),
        "performance": {
            "base_amount": "10000",
            "performance_score": "120",
            "payment_date": "2025-06-30"
        }
    });

    let (status, error) = post(create_router_for_test(), "/bonuses/performance", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_BONUS");
}

#[tokio::test]
async fn test_error_deduction_missing_parameter() {
    let mut broken = fixed_deduction("ded_broken", "post_tax", "10", 1);
    broken["calculation_method"] = json!("percentage");

    let (status, error) = post(
        create_router_for_test(),
        "/deductions/calculate",
        deduction_request(vec![broken], vec![]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "MISSING_PARAMETER");
    assert!(error["message"].as_str().unwrap().contains("ded_broken"));
}

#[tokio::test]
async fn test_error_missing_employee() {
    let body = json!({
        "bonus": {
            "bonus_type": "performance",
            "gross_amount": "1000",
            "payment_date": "2025-06-30"
        }
    });

    let (status, error) = post(create_router_for_test(), "/bonuses/calculate", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_error_unknown_bonus_type() {
    let (status, error) = post(
        create_router_for_test(),
        "/bonuses/calculate",
        bonus_request("lottery", "1000", json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "MALFORMED_JSON");
}

// =============================================================================
// SECTION 5: Response Envelope
// =============================================================================

#[tokio::test]
async fn test_result_contains_envelope_fields() {
    let (status, result) = post(
        create_router_for_test(),
        "/bonuses/calculate",
        bonus_request("sign_on", "2500", json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(result["calculation_id"].is_string());
    assert!(result["timestamp"].is_string());
    assert_eq!(result["engine_version"], env!("CARGO_PKG_VERSION"));
    assert!(result["duration_us"].is_u64());
    assert!(result["result"]["validation_errors"].as_array().unwrap().is_empty());
}
