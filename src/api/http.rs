use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::api::admission_dto::{AdmissionResponseDto, FlowDto, Registration, RegistrationDto, RemovalDto, RemovalResponseDto};
use crate::domain::admission::controller_handle::ControllerHandle;
use crate::domain::topology::routing_engine::BucketWeight;
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// Error as seen by HTTP clients.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidRequest(_) | Error::DeserializationError(_) => StatusCode::BAD_REQUEST,
            Error::ControllerUnavailable | Error::TopologyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            log::error!("Request failed: {}", self.0);
        } else {
            log::warn!("Bad request: {}", self.0);
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

pub fn router(handle: ControllerHandle) -> Router {
    Router::new()
        .route("/rt_mqtt/register", post(register))
        .route("/rt_mqtt/remove", post(remove))
        .route("/rt_mqtt/flows", get(flows))
        .route("/rt_mqtt/paths/:src/:dst", get(paths))
        .with_state(handle)
}

/// Serves the API on `listen_addr` until the process stops.
pub async fn serve(listen_addr: &str, handle: ControllerHandle) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    log::info!("Admission API listening on {}", listen_addr);

    axum::serve(listener, router(handle)).await?;
    Ok(())
}

async fn register(State(handle): State<ControllerHandle>, Json(dto): Json<RegistrationDto>) -> ApiResult<AdmissionResponseDto> {
    let outcome = match Registration::try_from(dto)? {
        Registration::Admission(request) => handle.admit(request).await?,
        Registration::MulticastJoin(join) => handle.join_multicast(join).await?,
    };

    Ok(Json(outcome.into()))
}

async fn remove(State(handle): State<ControllerHandle>, Json(dto): Json<RemovalDto>) -> ApiResult<RemovalResponseDto> {
    let outcome = handle.remove(dto.into()).await?;
    Ok(Json(outcome.into()))
}

async fn flows(State(handle): State<ControllerHandle>) -> ApiResult<Vec<FlowDto>> {
    let flows = handle.flows().await?;
    Ok(Json(flows.into_iter().map(FlowDto::from).collect()))
}

async fn paths(State(handle): State<ControllerHandle>, UrlPath((src, dst)): UrlPath<(String, String)>) -> ApiResult<Vec<BucketWeight>> {
    let weights = handle.paths(NodeId::new(src), NodeId::new(dst)).await?;
    Ok(Json(weights))
}
