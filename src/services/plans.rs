use tracing::{info, warn};

use crate::app::AppState;
use crate::database::constraints;
use crate::database::models::{Plan, PLAN_ID_PREFIX};
use crate::error::ApiError;
use crate::schema::PlanPayload;

const CREATE_ATTEMPTS: usize = 5;

/// Next id after the highest numeric suffix; `planId-1` for an empty table.
/// Ids that do not follow the `planId-N` shape are ignored.
pub fn next_plan_id(plans: &[Plan]) -> String {
    let max = plans.iter().filter_map(|p| Plan::number(&p.plan_id)).max().unwrap_or(0);
    format!("{}{}", PLAN_ID_PREFIX, max + 1)
}

/// All plans in `Plan::list_order`, which every store returns them in.
pub async fn list(state: &AppState) -> Result<Vec<Plan>, ApiError> {
    Ok(state.store.list_plans().await?)
}

pub async fn get(state: &AppState, plan_id: &str) -> Result<Plan, ApiError> {
    state
        .store
        .get_plan(plan_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Plan '{}' not found", plan_id)))
}

/// Insert under a freshly derived id. Two concurrent creates may derive the
/// same id; the loser re-reads and tries the next one.
pub async fn create(state: &AppState, payload: PlanPayload) -> Result<Plan, ApiError> {
    for attempt in 1..=CREATE_ATTEMPTS {
        let existing = state.store.list_plans().await?;
        let plan = to_plan(next_plan_id(&existing), payload.clone());

        match state.store.insert_plan(&plan).await {
            Ok(plan) => {
                info!("Created plan {}", plan.plan_id);
                return Ok(plan);
            }
            Err(e) if e.is_conflict_on(constraints::PLAN_ID) => {
                warn!("Plan id {} taken on attempt {}", plan.plan_id, attempt);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(ApiError::conflict("Could not allocate a plan id, please retry"))
}

/// Full replace of the row with the given id.
pub async fn update(state: &AppState, plan_id: &str, payload: PlanPayload) -> Result<Plan, ApiError> {
    get(state, plan_id).await?;
    let plan = state.store.update_plan(&to_plan(plan_id.to_string(), payload)).await?;
    info!("Updated plan {}", plan_id);
    Ok(plan)
}

pub async fn delete(state: &AppState, plan_id: &str) -> Result<(), ApiError> {
    get(state, plan_id).await?;
    state.store.delete_plan(plan_id).await?;
    info!("Deleted plan {}", plan_id);
    Ok(())
}

fn to_plan(plan_id: String, payload: PlanPayload) -> Plan {
    Plan {
        plan_id,
        label: payload.label.trim().to_string(),
        price: payload.price,
        currency: payload.currency,
        features: payload.features.into_iter().map(|f| f.trim().to_string()).collect(),
        is_active: payload.is_active,
        is_featured: payload.is_featured,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse;
    use crate::services::testing;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn payload(label: &str) -> PlanPayload {
        parse(json!({ "label": label, "price": "25.00", "currency": "EUR" })).unwrap()
    }

    fn plan(id: &str) -> Plan {
        to_plan(id.to_string(), payload("x"))
    }

    #[test]
    fn next_id_follows_highest_suffix() {
        assert_eq!(next_plan_id(&[]), "planId-1");
        assert_eq!(next_plan_id(&[plan("planId-2"), plan("planId-7")]), "planId-8");
        assert_eq!(next_plan_id(&[plan("planId-10"), plan("planId-9"), plan("legacy")]), "planId-11");
    }

    #[tokio::test]
    async fn create_allocates_sequential_ids() {
        let state = testing::state();
        let first = create(&state, payload("Free")).await.unwrap();
        let second = create(&state, payload("Member")).await.unwrap();
        assert_eq!(first.plan_id, "planId-1");
        assert_eq!(second.plan_id, "planId-2");
        assert_eq!(second.price, Decimal::new(2500, 2));
    }

    #[tokio::test]
    async fn list_orders_numerically() {
        let state = testing::state();
        for id in ["planId-10", "planId-2", "planId-1"] {
            state.store.insert_plan(&plan(id)).await.unwrap();
        }
        let ids: Vec<String> = list(&state).await.unwrap().into_iter().map(|p| p.plan_id).collect();
        assert_eq!(ids, ["planId-1", "planId-2", "planId-10"]);

        let raw: Vec<String> = state.store.list_plans().await.unwrap().into_iter().map(|p| p.plan_id).collect();
        assert_eq!(raw, ids);
    }

    #[tokio::test]
    async fn update_and_delete_unknown_plan_is_404() {
        let state = testing::state();
        assert_eq!(update(&state, "planId-3", payload("x")).await.unwrap_err().status_code(), 404);
        assert_eq!(delete(&state, "planId-3").await.unwrap_err().status_code(), 404);
    }
}
