// src/handlers/dashboard.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::dashboard::{
        DashboardData, DateRange, FilterOptions, FilterState, LocationFilter, SpeciesFilter,
    },
    services::dashboard_service::{Collection, CollectionStatus},
};

// ---
// Query: filtros do painel (?from=2024-01-01&to=2024-01-31&especie=Bovino&ubicacion=3)
// ---
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// Início do período (YYYY-MM-DD). Só filtra junto com `to`.
    pub from: Option<NaiveDate>,
    /// Fim do período (YYYY-MM-DD), inclusivo.
    pub to: Option<NaiveDate>,
    /// Nome comum da espécie, ou "todas".
    #[validate(length(min = 1, max = 100, message = "A espécie deve ter entre 1 e 100 caracteres."))]
    pub especie: Option<String>,
    /// ID da localização, ou "todas".
    #[validate(length(min = 1, max = 20, message = "A localização deve ter entre 1 e 20 caracteres."))]
    pub ubicacion: Option<String>,
}

impl DashboardQuery {
    pub fn into_filter(self) -> FilterState {
        FilterState {
            date_range: DateRange {
                from: self.from,
                to: self.to,
            },
            species: SpeciesFilter::from_param(self.especie.as_deref()),
            location: LocationFilter::from_param(self.ubicacion.as_deref()),
        }
    }
}

// GET /api/dashboard/summary
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "Dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "KPIs, agrupamentos e séries do painel de inventário", body = DashboardData),
        (status = 400, description = "Filtros inválidos"),
        (status = 503, description = "Coleções carregando ou com erro")
    )
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, AppError> {
    query.validate()?;

    let today = Local::now().date_naive();
    let data = app_state
        .dashboard_service
        .summary(query.into_filter(), today)
        .await?;

    Ok((StatusCode::OK, Json(data.as_ref())).into_response())
}

// GET /api/dashboard/filters
#[utoipa::path(
    get,
    path = "/api/dashboard/filters",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Espécies e localizações disponíveis para os filtros", body = FilterOptions),
        (status = 503, description = "Coleções carregando ou com erro")
    )
)]
pub async fn get_filter_options(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let options = app_state.dashboard_service.filter_options().await?;
    Ok((StatusCode::OK, Json(options)))
}

// GET /api/dashboard/status
#[utoipa::path(
    get,
    path = "/api/dashboard/status",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Estado de carga de cada coleção", body = Vec<CollectionStatus>)
    )
)]
pub async fn get_status(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let statuses = app_state.dashboard_service.statuses()?;
    Ok((StatusCode::OK, Json(statuses)))
}

// POST /api/dashboard/refresh
#[utoipa::path(
    post,
    path = "/api/dashboard/refresh",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Todas as coleções recarregadas", body = Vec<CollectionStatus>)
    )
)]
pub async fn refresh_all(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let statuses = app_state.dashboard_service.refresh_all().await?;
    Ok((StatusCode::OK, Json(statuses)))
}

// POST /api/dashboard/refresh/{coleccion}
#[utoipa::path(
    post,
    path = "/api/dashboard/refresh/{coleccion}",
    tag = "Dashboard",
    params(
        ("coleccion" = String, Path, description = "inventario | animales | controles | vacunaciones | alimentaciones | ventas")
    ),
    responses(
        (status = 200, description = "Coleção recarregada", body = Vec<CollectionStatus>),
        (status = 404, description = "Coleção desconhecida")
    )
)]
pub async fn refresh_collection(
    State(app_state): State<AppState>,
    Path(coleccion): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let collection = Collection::from_name(&coleccion)?;
    let statuses = app_state.dashboard_service.refresh(collection).await?;
    Ok((StatusCode::OK, Json(statuses)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_converts_sentinels_to_tagged_filters() {
        let query = DashboardQuery {
            from: NaiveDate::from_ymd_opt(2024, 1, 1),
            to: NaiveDate::from_ymd_opt(2024, 1, 31),
            especie: Some("todas".into()),
            ubicacion: Some("3".into()),
        };
        let filter = query.into_filter();
        assert_eq!(filter.species, SpeciesFilter::All);
        assert_eq!(filter.location, LocationFilter::Specific("3".into()));
        assert!(filter.date_range.bounds().is_some());
    }

    #[test]
    fn empty_query_means_no_filters() {
        assert_eq!(DashboardQuery::default().into_filter(), FilterState::default());
    }

    #[test]
    fn overlong_species_name_is_rejected() {
        let query = DashboardQuery {
            especie: Some("x".repeat(101)),
            ..DashboardQuery::default()
        };
        let errors = query.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("especie"));
    }

    #[test]
    fn query_parses_iso_dates() {
        let query: DashboardQuery =
            serde_json::from_str(r#"{"from":"2024-02-01","to":"2024-02-29","especie":"Ovino"}"#)
                .unwrap();
        assert_eq!(query.from, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(query.ubicacion, None);
    }
}
