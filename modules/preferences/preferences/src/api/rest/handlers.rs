use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Extension, Path, Query};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use prefkit_auth::axum_ext::Authz;
use prefkit_errors::Problem;
use preferences_sdk::{NamedPreference, PreferenceId};

use super::codec::{self, Document};
use super::dto::{
    DeleteByNameDto, DeletedCountDto, FormByNameQuery, FormPreferenceDto, GridByNameQuery,
    GridPreferenceDto, NamedPreferenceDto, OtherOwnerQuery, PreferenceFormDto, PreferenceGridDto,
    UsuarioQuery,
};
use super::error::MALFORMED;
use crate::domain::error::DomainError;
use crate::domain::service::Service;

pub type ApiResult<T = Response> = Result<T, Problem>;

fn query<T>(q: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    q.map(|Query(q)| q)
        .map_err(|e| MALFORMED.as_problem(e.body_text()))
}

fn path<T>(p: Result<Path<T>, PathRejection>) -> ApiResult<T> {
    p.map(|Path(p)| p)
        .map_err(|e| MALFORMED.as_problem(e.body_text()))
}

fn document<D: Document>(aggregate: D::Aggregate) -> ApiResult {
    let body = codec::serialize::<D>(aggregate).map_err(DomainError::from)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Own and public "any" preferences of a user.
#[utoipa::path(
    get,
    path = "/preference/preferencia/any/by/usuario",
    tag = "Preferences",
    params(UsuarioQuery),
    responses(
        (status = 200, description = "Preferences by ascending id", body = [NamedPreferenceDto]),
        (status = 401, description = "Missing or rejected token"),
        (status = 403, description = "Missing read scope", body = Problem, content_type = "application/problem+json"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_any_by_usuario(
    Extension(svc): Extension<Arc<Service>>,
    Authz(principal): Authz,
    q: Result<Query<UsuarioQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<NamedPreferenceDto>>> {
    let q = query(q)?;
    let found = svc.get_any_by_usuario(&principal, &q.usuario).await?;
    Ok(Json(found.into_iter().map(Into::into).collect()))
}

/// Create or overwrite an "any" preference.
#[utoipa::path(
    post,
    path = "/preference/preferencia/any/add",
    tag = "Preferences",
    request_body = NamedPreferenceDto,
    responses(
        (status = 200, description = "Stored preference with its id", body = NamedPreferenceDto),
        (status = 400, description = "Invalid document", body = Problem, content_type = "application/problem+json"),
        (status = 403, description = "Not the owner", body = Problem, content_type = "application/problem+json"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_any(
    Extension(svc): Extension<Arc<Service>>,
    Authz(principal): Authz,
    body: Bytes,
) -> ApiResult {
    let mut preference = codec::deserialize::<NamedPreferenceDto>(&body).map_err(DomainError::from)?;
    preference.id = svc.save(&principal, preference.clone().into()).await?;
    document::<NamedPreferenceDto>(preference)
}

/// Delete preferences of one view by name.
#[utoipa::path(
    post,
    path = "/preference/preferencia/any/delete/by/nombre",
    tag = "Preferences",
    request_body = DeleteByNameDto,
    responses(
        (status = 200, description = "The request with the removed preferences", body = DeleteByNameDto),
        (status = 403, description = "A matching preference belongs to someone else", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Unknown view", body = Problem, content_type = "application/problem+json"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_any_by_name(
    Extension(svc): Extension<Arc<Service>>,
    Authz(principal): Authz,
    body: Bytes,
) -> ApiResult<Json<DeleteByNameDto>> {
    let request: DeleteByNameDto = codec::read(&body).map_err(DomainError::from)?;
    let names: Vec<String> = request
        .preferencias
        .iter()
        .map(|p| p.pref_name.clone())
        .collect();

    let removed: Vec<NamedPreference> = svc
        .delete_any_by_name(&principal, &request.name, &names)
        .await?;
    Ok(Json(DeleteByNameDto {
        preferencias: removed.into_iter().map(Into::into).collect(),
        ..request
    }))
}

#[utoipa::path(
    delete,
    path = "/preference/preferencia/{id}",
    tag = "Preferences",
    params(("id" = u64, Path, description = "Preference id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Unknown id", body = Problem, content_type = "application/problem+json"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_preference(
    Extension(svc): Extension<Arc<Service>>,
    Authz(principal): Authz,
    id: Result<Path<PreferenceId>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = path(id)?;
    svc.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Save the single preference carried by a grid.
#[utoipa::path(
    post,
    path = "/preference/preferencia/grid/add",
    tag = "Grids",
    request_body = PreferenceGridDto,
    responses(
        (status = 200, description = "The grid as its owner sees it", body = PreferenceGridDto),
        (status = 400, description = "Invalid document", body = Problem, content_type = "application/problem+json"),
        (status = 403, description = "Not the owner", body = Problem, content_type = "application/problem+json"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_grid(
    Extension(svc): Extension<Arc<Service>>,
    Authz(principal): Authz,
    body: Bytes,
) -> ApiResult {
    let grid = codec::deserialize::<PreferenceGridDto>(&body).map_err(DomainError::from)?;
    let saved = svc.save_grid(&principal, grid).await?;
    document::<PreferenceGridDto>(saved)
}

#[utoipa::path(
    get,
    path = "/preference/preferencia/grid/by/nombre",
    tag = "Grids",
    params(GridByNameQuery),
    responses(
        (status = 200, description = "Visible preferences of the grid", body = PreferenceGridDto),
        (status = 404, description = "Unknown grid or nothing visible", body = Problem, content_type = "application/problem+json"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_grid_by_name(
    Extension(svc): Extension<Arc<Service>>,
    Authz(principal): Authz,
    q: Result<Query<GridByNameQuery>, QueryRejection>,
) -> ApiResult {
    let q = query(q)?;
    let grid = svc
        .get_grid_by_name(&principal, &q.usuario, &q.grid_name, q.owner.as_deref())
        .await?;
    document::<PreferenceGridDto>(grid)
}

#[utoipa::path(
    get,
    path = "/preference/preferencia/grid/by/usuario",
    tag = "Grids",
    params(UsuarioQuery),
    responses((status = 200, description = "Own and public grid preferences", body = [GridPreferenceDto])),
    security(("bearer_auth" = []))
)]
pub async fn get_grids_by_usuario(
    Extension(svc): Extension<Arc<Service>>,
    Authz(principal): Authz,
    q: Result<Query<UsuarioQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<GridPreferenceDto>>> {
    let q = query(q)?;
    let found = svc.get_grids_by_usuario(&principal, &q.usuario).await?;
    Ok(Json(found.into_iter().map(Into::into).collect()))
}

/// Whether the grid holds a preference of that name owned by someone else.
#[utoipa::path(
    get,
    path = "/preference/preferencia/grid/by/nombre/exists",
    tag = "Grids",
    params(OtherOwnerQuery),
    responses((status = 200, description = "true when another owner uses the name", body = bool)),
    security(("bearer_auth" = []))
)]
pub async fn grid_has_other_owner(
    Extension(svc): Extension<Arc<Service>>,
    Authz(principal): Authz,
    q: Result<Query<OtherOwnerQuery>, QueryRejection>,
) -> ApiResult<Json<bool>> {
    let q = query(q)?;
    let exists = svc
        .has_preference_with_other_owner(&principal, &q.nombre, &q.pref_nombre, &q.usuario)
        .await?;
    Ok(Json(exists))
}

/// Delete a grid with all of its preferences.
#[utoipa::path(
    delete,
    path = "/preference/preferencia/grid/{gridName}",
    tag = "Grids",
    params(("gridName" = String, Path, description = "Grid name")),
    responses(
        (status = 200, description = "Number of removed preferences", body = DeletedCountDto),
        (status = 403, description = "Not elevated and not the owner of every entry", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Unknown grid", body = Problem, content_type = "application/problem+json"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_grid(
    Extension(svc): Extension<Arc<Service>>,
    Authz(principal): Authz,
    grid_name: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<DeletedCountDto>> {
    let grid_name = path(grid_name)?;
    let deleted = svc.delete_grid(&principal, &grid_name).await?;
    Ok(Json(DeletedCountDto { deleted }))
}

/// Save the single preference carried by a form.
#[utoipa::path(
    post,
    path = "/preference/preferencia/form/add",
    tag = "Forms",
    request_body = PreferenceFormDto,
    responses(
        (status = 200, description = "The form as its owner sees it", body = PreferenceFormDto),
        (status = 400, description = "Invalid document", body = Problem, content_type = "application/problem+json"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_form(
    Extension(svc): Extension<Arc<Service>>,
    Authz(principal): Authz,
    body: Bytes,
) -> ApiResult {
    let form = codec::deserialize::<PreferenceFormDto>(&body).map_err(DomainError::from)?;
    let saved = svc.save_form(&principal, form).await?;
    document::<PreferenceFormDto>(saved)
}

#[utoipa::path(
    get,
    path = "/preference/preferencia/form/by/nombre",
    tag = "Forms",
    params(FormByNameQuery),
    responses(
        (status = 200, description = "Visible preferences of the form", body = PreferenceFormDto),
        (status = 404, description = "Unknown form or nothing visible", body = Problem, content_type = "application/problem+json"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_form_by_name(
    Extension(svc): Extension<Arc<Service>>,
    Authz(principal): Authz,
    q: Result<Query<FormByNameQuery>, QueryRejection>,
) -> ApiResult {
    let q = query(q)?;
    let form = svc
        .get_form_by_name(&principal, &q.usuario, &q.form_name, q.owner.as_deref())
        .await?;
    document::<PreferenceFormDto>(form)
}

#[utoipa::path(
    get,
    path = "/preference/preferencia/form/by/usuario",
    tag = "Forms",
    params(UsuarioQuery),
    responses((status = 200, description = "Own and public form preferences", body = [FormPreferenceDto])),
    security(("bearer_auth" = []))
)]
pub async fn get_forms_by_usuario(
    Extension(svc): Extension<Arc<Service>>,
    Authz(principal): Authz,
    q: Result<Query<UsuarioQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<FormPreferenceDto>>> {
    let q = query(q)?;
    let found = svc.get_forms_by_usuario(&principal, &q.usuario).await?;
    Ok(Json(found.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/preference/preferencia/form/by/nombre/exists",
    tag = "Forms",
    params(OtherOwnerQuery),
    responses((status = 200, description = "true when another owner uses the name", body = bool)),
    security(("bearer_auth" = []))
)]
pub async fn form_has_other_owner(
    Extension(svc): Extension<Arc<Service>>,
    Authz(principal): Authz,
    q: Result<Query<OtherOwnerQuery>, QueryRejection>,
) -> ApiResult<Json<bool>> {
    let q = query(q)?;
    let exists = svc
        .has_preference_with_other_owner(&principal, &q.nombre, &q.pref_nombre, &q.usuario)
        .await?;
    Ok(Json(exists))
}
