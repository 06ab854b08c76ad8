pub mod aggregation;
pub mod dashboard_service;
pub use dashboard_service::DashboardService;
