// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

// Taxonomia de erros do núcleo de produção/estoque.
// Qualquer erro que escape de uma operação transacional faz o `StoreTx` ser
// descartado sem commit, ou seja, rollback completo.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    // Kit sem receita (nenhum componente definido)
    #[error("{0}")]
    Configuration(String),

    #[error(
        "Estoque insuficiente para '{product_name}': necessários {required}, disponíveis {available}"
    )]
    InsufficientStock {
        product_id: Uuid,
        product_name: String,
        required: i64,
        available: i64,
    },

    #[error("{0}")]
    InvalidState(String),

    // Exclusão bloqueada por referências existentes
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// Erro de regra de negócio atribuído a um campo do payload,
    /// no mesmo formato dos erros do `validator`.
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        let mut err = ValidationError::new("invalid");
        err.message = Some(message.into().into());
        let mut errors = ValidationErrors::new();
        errors.add(field, err);
        AppError::ValidationError(errors)
    }

    pub fn not_found(entity: &str, id: Uuid) -> Self {
        AppError::NotFound(format!("{} {} não encontrado.", entity, id))
    }
}

fn field_details(errors: &ValidationErrors) -> HashMap<String, Vec<String>> {
    let mut details = HashMap::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| match &e.message {
                Some(m) => m.to_string(),
                None => e.code.to_string(),
            })
            .collect();
        details.insert(field.to_string(), messages);
    }
    details
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": field_details(&errors),
                }),
            ),
            AppError::InsufficientStock {
                product_id,
                ref product_name,
                required,
                available,
            } => {
                let message = self.to_string();
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({
                        "error": message,
                        "details": { "quantity": [message] },
                        "component": {
                            "product_id": product_id,
                            "name": product_name,
                            "required": required,
                            "available": available,
                        },
                    }),
                )
            }
            AppError::Configuration(ref message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "details": { "product_id": [message] } }),
            ),
            AppError::InvalidState(ref message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "details": { "status": [message] } }),
            ),
            AppError::Duplicate(ref message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message }),
            ),
            AppError::Conflict(ref message) => (StatusCode::CONFLICT, json!({ "error": message })),
            AppError::NotFound(ref message) => (StatusCode::NOT_FOUND, json!({ "error": message })),

            // Banco e erros inesperados viram 500 sem detalhes para o cliente.
            ref e => {
                tracing::error!(error = ?e, "Erro interno do servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Ocorreu um erro inesperado." }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
