use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::entities::supplier::{
    HubMetadata, HubMetadataInput, ImdsProfile, ImdsProfileInput, NewContact, NewSupplier,
    PcfProfile, PcfProfileInput, Supplier, SupplierContact, SupplierFilter, SupplierPatch,
    SupplierProfile, SupplierStats,
};
use crate::entities::user::Permission;
use crate::server::auth::require;
use crate::server::error::ApiResult;
use crate::server::AppState;

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<SupplierFilter>,
) -> ApiResult<Json<Vec<Supplier>>> {
    Ok(Json(state.db()?.list_suppliers(&filter)?))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<SupplierStats>> {
    Ok(Json(state.db()?.supplier_stats()?))
}

pub async fn profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SupplierProfile>> {
    Ok(Json(state.db()?.supplier_profile(id)?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(new): Json<NewSupplier>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    require(&state, &headers, Permission::SuppliersWrite)?;
    let supplier = state.db()?.create_supplier(new)?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(patch): Json<SupplierPatch>,
) -> ApiResult<Json<Supplier>> {
    require(&state, &headers, Permission::SuppliersWrite)?;
    Ok(Json(state.db()?.update_supplier(id, patch)?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<Supplier>> {
    require(&state, &headers, Permission::SuppliersDelete)?;
    let removed = state.db()?.delete_supplier(id)?;
    tracing::info!(supplier = id, name = %removed.name, "supplier deleted");
    Ok(Json(removed))
}

pub async fn contacts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<SupplierContact>>> {
    Ok(Json(state.db()?.list_contacts(id)?))
}

pub async fn add_contact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(contact): Json<NewContact>,
) -> ApiResult<(StatusCode, Json<SupplierContact>)> {
    require(&state, &headers, Permission::SuppliersWrite)?;
    let contact = state.db()?.add_contact(id, contact)?;
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn imds_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ImdsProfile>> {
    Ok(Json(state.db()?.imds_profile(id)?))
}

pub async fn put_imds_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<ImdsProfileInput>,
) -> ApiResult<Json<ImdsProfile>> {
    require(&state, &headers, Permission::SuppliersWrite)?;
    Ok(Json(state.db()?.upsert_imds_profile(id, input)?))
}

pub async fn pcf_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<PcfProfile>> {
    Ok(Json(state.db()?.pcf_profile(id)?))
}

pub async fn put_pcf_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<PcfProfileInput>,
) -> ApiResult<Json<PcfProfile>> {
    require(&state, &headers, Permission::SuppliersWrite)?;
    Ok(Json(state.db()?.upsert_pcf_profile(id, input)?))
}

pub async fn put_hub_metadata(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<HubMetadataInput>,
) -> ApiResult<Json<HubMetadata>> {
    require(&state, &headers, Permission::SuppliersWrite)?;
    Ok(Json(state.db()?.upsert_hub_metadata(id, input)?))
}
