//! Client-level handlers: settings, global throttles, and introspection.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde_json::{Map, Value};

use crate::http::errors::ApiError;
use crate::models::{MethodCallRequest, SettingsQuery, SpeedLimitRequest};
use crate::state::ApiState;

pub(crate) async fn get_settings(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<SettingsQuery>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    let ids: Vec<String> = query
        .property
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    Ok(Json(state.client.get_settings(&ids).await?))
}

pub(crate) async fn patch_settings(
    State(state): State<Arc<ApiState>>,
    Json(changes): Json<Map<String, Value>>,
) -> Result<StatusCode, ApiError> {
    let changes: Vec<(String, Value)> = changes.into_iter().collect();
    state.client.set_settings(&changes).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn set_speed_limits(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SpeedLimitRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .client
        .set_speed_limits(request.direction, request.bytes_per_sec)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn call_method(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<MethodCallRequest>,
) -> Result<Json<Value>, ApiError> {
    let value = state
        .client
        .list_methods(&request.method, request.args)
        .await?;
    Ok(Json(value.to_json()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_api;
    use floodgate_rpc::RpcValue;
    use serde_json::json;

    #[tokio::test]
    async fn settings_read_translates_engine_units() -> anyhow::Result<()> {
        let api = test_api()?;
        api.transport
            .respond("throttle.global_up.max_rate", RpcValue::Int(204_800));
        let Json(settings) = get_settings(
            State(api.state),
            Query(SettingsQuery {
                property: Some("uploadRateLimit".into()),
            }),
        )
        .await
        .map_err(|err| anyhow::anyhow!("{err:?}"))?;
        assert_eq!(settings.get("uploadRateLimit"), Some(&json!(200)));
        Ok(())
    }

    #[tokio::test]
    async fn empty_patch_does_not_reach_the_engine() -> anyhow::Result<()> {
        let api = test_api()?;
        let status = patch_settings(State(api.state), Json(Map::new()))
            .await
            .map_err(|err| anyhow::anyhow!("{err:?}"))?;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(api.transport.round_trips().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn untranslatable_settings_are_bad_requests() -> anyhow::Result<()> {
        let api = test_api()?;
        let mut changes = Map::new();
        changes.insert("downloadRateLimit".into(), json!("fast"));
        let result = patch_settings(State(api.state), Json(changes)).await;
        assert_eq!(result.err().map(|err| err.status), Some(StatusCode::BAD_REQUEST));
        assert!(api.transport.round_trips().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn non_introspection_methods_are_refused() -> anyhow::Result<()> {
        let api = test_api()?;
        let result = call_method(
            State(api.state),
            Json(MethodCallRequest {
                method: "execute.throw".into(),
                args: vec!["rm".into()],
            }),
        )
        .await;
        assert_eq!(result.err().map(|err| err.status), Some(StatusCode::BAD_REQUEST));
        assert!(api.transport.round_trips().is_empty());
        Ok(())
    }
}
