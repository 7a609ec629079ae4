use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use prefkit_errors::{Problem, ValidationViolation};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{
    DeleteByNameDto, DeletedCountDto, FilterDto, FormPreferenceDto, GridPreferenceDto,
    NamedPreferenceDto, PreferenceFormDto, PreferenceGridDto,
};
use super::handlers;
use crate::domain::service::Service;

pub const OPENAPI_PATH: &str = "/preference/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Preference Service",
        description = "Per-user grid, form and free-form UI preferences"
    ),
    tags(
        (name = "Preferences", description = "Free-form preferences and deletion by id or name"),
        (name = "Grids", description = "Grid layout preferences"),
        (name = "Forms", description = "Form field preferences")
    ),
    paths(
        handlers::get_any_by_usuario,
        handlers::add_any,
        handlers::delete_any_by_name,
        handlers::delete_preference,
        handlers::add_grid,
        handlers::get_grid_by_name,
        handlers::get_grids_by_usuario,
        handlers::grid_has_other_owner,
        handlers::delete_grid,
        handlers::add_form,
        handlers::get_form_by_name,
        handlers::get_forms_by_usuario,
        handlers::form_has_other_owner,
    ),
    components(schemas(
        NamedPreferenceDto,
        GridPreferenceDto,
        PreferenceGridDto,
        FilterDto,
        FormPreferenceDto,
        PreferenceFormDto,
        DeleteByNameDto,
        DeletedCountDto,
        Problem,
        ValidationViolation,
    )),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Preference routes with the service attached. Authentication is layered on
/// by the caller.
pub fn router(service: Arc<Service>) -> Router {
    Router::new()
        .route(
            "/preference/preferencia/any/by/usuario",
            get(handlers::get_any_by_usuario),
        )
        .route("/preference/preferencia/any/add", post(handlers::add_any))
        .route(
            "/preference/preferencia/any/delete/by/nombre",
            post(handlers::delete_any_by_name),
        )
        .route(
            "/preference/preferencia/{id}",
            delete(handlers::delete_preference),
        )
        .route("/preference/preferencia/grid/add", post(handlers::add_grid))
        .route(
            "/preference/preferencia/grid/by/nombre",
            get(handlers::get_grid_by_name),
        )
        .route(
            "/preference/preferencia/grid/by/usuario",
            get(handlers::get_grids_by_usuario),
        )
        .route(
            "/preference/preferencia/grid/by/nombre/exists",
            get(handlers::grid_has_other_owner),
        )
        .route(
            "/preference/preferencia/grid/{grid_name}",
            delete(handlers::delete_grid),
        )
        .route("/preference/preferencia/form/add", post(handlers::add_form))
        .route(
            "/preference/preferencia/form/by/nombre",
            get(handlers::get_form_by_name),
        )
        .route(
            "/preference/preferencia/form/by/usuario",
            get(handlers::get_forms_by_usuario),
        )
        .route(
            "/preference/preferencia/form/by/nombre/exists",
            get(handlers::form_has_other_owner),
        )
        .route(OPENAPI_PATH, get(openapi_json))
        .layer(Extension(service))
}
