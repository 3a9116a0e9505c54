use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::views;
use crate::app::AppState;
use crate::cache::keys;
use crate::database::models::{MapInfo, Route, RouteDot};
use crate::error::ApiError;
use crate::schema::RoutePayload;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    pub step: i32,
    pub map_info_id: Uuid,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Route with its dots in step order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteView {
    #[serde(flatten)]
    pub route: Route,
    pub dots: Vec<RouteStop>,
}

pub async fn list(state: &AppState) -> Result<Vec<RouteView>, ApiError> {
    views::cached(state, keys::ROUTES, || async {
        let routes = state.store.list_routes().await?;
        assemble(state, routes).await
    })
    .await
}

pub async fn get(state: &AppState, id: Uuid) -> Result<RouteView, ApiError> {
    let route = state
        .store
        .get_route(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Route not found"))?;
    let mut views = assemble(state, vec![route]).await?;
    views.pop().ok_or_else(|| ApiError::not_found("Route not found"))
}

pub async fn create(state: &AppState, payload: RoutePayload) -> Result<RouteView, ApiError> {
    let route = to_route(Uuid::new_v4(), &payload);
    let saved = state.store.insert_route(&route, &to_dots(route.id, &payload)).await?;
    info!("Created route {} with {} dots", saved.id, payload.dots.len());
    state.cache.invalidate(&[keys::ROUTES]).await;
    get(state, saved.id).await
}

pub async fn update(state: &AppState, id: Uuid, payload: RoutePayload) -> Result<RouteView, ApiError> {
    let route = to_route(id, &payload);
    state.store.update_route(&route, &to_dots(id, &payload)).await?;
    info!("Updated route {}", id);
    state.cache.invalidate(&[keys::ROUTES]).await;
    get(state, id).await
}

pub async fn delete(state: &AppState, id: Uuid) -> Result<(), ApiError> {
    state.store.delete_route(id).await?;
    info!("Deleted route {}", id);
    state.cache.invalidate(&[keys::ROUTES]).await;
    Ok(())
}

fn to_route(id: Uuid, payload: &RoutePayload) -> Route {
    Route {
        id,
        name: payload.name.trim().to_string(),
        description: payload.description.clone(),
        zone: payload.zone,
        created_at: Utc::now(),
    }
}

fn to_dots(route_id: Uuid, payload: &RoutePayload) -> Vec<RouteDot> {
    payload
        .dots
        .iter()
        .map(|d| RouteDot {
            route_id,
            map_info_id: d.map_info_id,
            step: d.step,
        })
        .collect()
}

async fn assemble(state: &AppState, routes: Vec<Route>) -> Result<Vec<RouteView>, ApiError> {
    let route_ids: Vec<Uuid> = routes.iter().map(|r| r.id).collect();
    let mut dots = state.store.route_dots(&route_ids).await?;
    dots.sort_by_key(|d| d.step);

    let mut point_ids: Vec<Uuid> = dots.iter().map(|d| d.map_info_id).collect();
    point_ids.sort();
    point_ids.dedup();
    let points: HashMap<Uuid, MapInfo> = state
        .store
        .map_infos_by_ids(&point_ids)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    Ok(routes
        .into_iter()
        .map(|route| {
            let dots = dots
                .iter()
                .filter(|d| d.route_id == route.id)
                .map(|d| {
                    let point = points.get(&d.map_info_id);
                    RouteStop {
                        step: d.step,
                        map_info_id: d.map_info_id,
                        address: point.and_then(|p| p.address.clone()),
                        latitude: point.and_then(|p| p.latitude),
                        longitude: point.and_then(|p| p.longitude),
                    }
                })
                .collect();
            RouteView { route, dots }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse;
    use crate::services::testing;
    use serde_json::json;

    async fn point(state: &AppState, lat: f64) -> Uuid {
        let m = MapInfo {
            id: Uuid::new_v4(),
            user_id: None,
            address: Some(format!("Stop {}", lat)),
            latitude: Some(lat),
            longitude: Some(4.9),
            no_address: false,
        };
        state.store.upsert_map_info(&m).await.unwrap().id
    }

    #[tokio::test]
    async fn dots_come_back_in_step_order() {
        let state = testing::state();
        let a = point(&state, 52.1).await;
        let b = point(&state, 52.2).await;
        let payload: RoutePayload = parse(json!({
            "name": "Canal walk",
            "zone": "central",
            "dots": [{ "map_info_id": b, "step": 2 }, { "map_info_id": a, "step": 1 }]
        }))
        .unwrap();

        let route = create(&state, payload).await.unwrap();
        let order: Vec<Uuid> = route.dots.iter().map(|d| d.map_info_id).collect();
        assert_eq!(order, [a, b]);
        assert_eq!(list(&state).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_point_rejects_the_route() {
        let state = testing::state();
        let payload: RoutePayload = parse(json!({
            "name": "Ghost walk",
            "zone": "north",
            "dots": [{ "map_info_id": Uuid::new_v4(), "step": 0 }]
        }))
        .unwrap();
        assert_eq!(create(&state, payload).await.unwrap_err().status_code(), 400);
        assert!(state.store.list_routes().await.unwrap().is_empty());
    }
}
