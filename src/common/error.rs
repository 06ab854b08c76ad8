// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Alguma coleção ainda está carregando: o painel não é calculado.
    #[error("Coleções ainda carregando: {0}")]
    SourcesLoading(String),

    // Falha ao buscar uma ou mais coleções (sem resultado parcial).
    #[error("Falha ao carregar coleções: {0}")]
    SourcesUnavailable(String),

    #[error("Coleção desconhecida: {0}")]
    UnknownCollection(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::SourcesLoading(ref pending) => {
                tracing::debug!("Painel solicitado durante carga de: {}", pending);
                (StatusCode::SERVICE_UNAVAILABLE, "Os dados ainda estão carregando.")
            }
            AppError::SourcesUnavailable(ref failed) => {
                tracing::warn!("Painel indisponível, coleções com falha: {}", failed);
                (StatusCode::SERVICE_UNAVAILABLE, "Erro ao carregar os dados.")
            }
            AppError::UnknownCollection(_) => (StatusCode::NOT_FOUND, "Coleção não encontrada."),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
