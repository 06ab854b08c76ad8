// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::get_filter_options,
        handlers::dashboard::get_status,
        handlers::dashboard::refresh_all,
        handlers::dashboard::refresh_collection,
    ),
    components(
        schemas(
            // --- DASHBOARD ---
            models::dashboard::DashboardData,
            models::dashboard::FilterOptions,
            models::dashboard::NameValue,
            models::dashboard::NameAmount,
            models::dashboard::DatedCount,
            models::dashboard::SpeciesBreeds,
            models::dashboard::SalesPoint,
            models::dashboard::UpcomingVaccination,

            // --- Coleções ---
            services::dashboard_service::Collection,
            services::dashboard_service::CollectionStatus,

            // --- Registros da fazenda ---
            models::livestock::EntryReason,
            models::livestock::ExitReason,
            models::livestock::InventoryRecord,
            models::livestock::Animal,
            models::livestock::SpeciesRef,
            models::livestock::BreedRef,
            models::livestock::HealthCheckRecord,
            models::livestock::VaccinationRecord,
            models::livestock::FeedingRecord,
            models::livestock::SaleRecord,
        )
    ),
    tags(
        (name = "Dashboard", description = "Indicadores e Gráficos do Inventário Animal")
    )
)]
pub struct ApiDoc;
