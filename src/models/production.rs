// src/models/production.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

use super::catalog::ProductCategory;

// --- Estados da ordem de produção ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "production_status")]
pub enum OrderStatus {
    #[sqlx(rename = "Pendiente")]
    #[serde(rename = "Pendiente", alias = "Pending")]
    Pending,
    #[sqlx(rename = "En Progreso")]
    #[serde(rename = "En Progreso", alias = "InProgress")]
    InProgress,
    #[sqlx(rename = "Completado")]
    #[serde(rename = "Completado", alias = "Completed")]
    Completed,
    #[sqlx(rename = "Cancelado")]
    #[serde(rename = "Cancelado", alias = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub const ACTIVE: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::InProgress];

    /// Tabela única de transições permitidas.
    pub fn allowed_transitions(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::InProgress, OrderStatus::Cancelled],
            OrderStatus::InProgress => &[OrderStatus::Completed, OrderStatus::Cancelled],
            OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Alvos aceitos na troca manual de status.
    pub fn is_manual_target(self) -> bool {
        matches!(self, OrderStatus::InProgress | OrderStatus::Cancelled)
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pendiente",
            OrderStatus::InProgress => "En Progreso",
            OrderStatus::Completed => "Completado",
            OrderStatus::Cancelled => "Cancelado",
        }
    }

    /// Falha com `InvalidState` se a ordem já estiver encerrada.
    pub fn ensure_open(self) -> Result<(), AppError> {
        if self.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "A ordem está '{}' e não pode mais ser alterada.",
                self.label()
            )));
        }
        Ok(())
    }

    /// Valida `self -> target` contra a tabela. Permanecer em "En Progreso"
    /// é aceito (progresso parcial e troca manual redundante).
    pub fn transition_to(self, target: OrderStatus) -> Result<OrderStatus, AppError> {
        self.ensure_open()?;
        if self == target && self == OrderStatus::InProgress {
            return Ok(target);
        }
        if !self.allowed_transitions().contains(&target) {
            return Err(AppError::InvalidState(format!(
                "Transição de '{}' para '{}' não permitida.",
                self.label(),
                target.label()
            )));
        }
        Ok(target)
    }

    /// Status resultante de um lançamento de progresso.
    pub fn after_progress(self) -> Result<OrderStatus, AppError> {
        self.transition_to(OrderStatus::InProgress)
    }
}

// --- Ordem de produção ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProductionOrder {
    pub id: Uuid,
    pub product_id: Uuid,
    #[schema(example = "OP-0001")]
    pub order_number: String,
    #[schema(example = 3)]
    pub quantity_requested: i32,
    #[schema(example = 0)]
    pub quantity_produced: i32,
    pub status: OrderStatus,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductionOrder {
    pub fn remaining(&self) -> i32 {
        self.quantity_requested - self.quantity_produced
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub product_id: Uuid,
    pub quantity_requested: i32,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub statuses: Vec<OrderStatus>,
    pub product_id: Option<Uuid>,
}

impl OrderFilter {
    pub fn matches(&self, order: &ProductionOrder) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&order.status))
            && self.product_id.is_none_or(|p| order.product_id == p)
    }
}

// Ordem + nome do produto (listagem)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProductionOrderDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub order: ProductionOrder,
    pub product_name: String,
}

// --- Inventário público ---
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActiveOrderSummary {
    pub id: Uuid,
    pub quantity_requested: i32,
    pub quantity_produced: i32,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicInventoryEntry {
    pub id: Uuid,
    pub name: String,
    pub stock: i32,
    pub category: ProductCategory,
    pub active_orders: Vec<ActiveOrderSummary>,
}

/// Número legível da ordem: `<PREFIXO>-0001`, a partir do contador monotônico.
pub fn format_order_number(prefix: &str, sequence: i64) -> String {
    format!("{}-{:04}", prefix, sequence)
}

fn rounded_total(quantity_required: Decimal, units: i32) -> Result<i64, AppError> {
    (quantity_required * Decimal::from(units))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| AppError::field("quantity", "Quantidade de consumo fora do intervalo suportado."))
}

/// Consumo de um componente ao produzir mais `quantity` unidades numa ordem
/// que já produziu `already_produced`.
///
/// O arredondamento (meio-para-cima) é aplicado sobre o total acumulado da
/// ordem: `round(q * (produzido + quantity)) - round(q * produzido)`. Assim a
/// soma dos consumos de uma ordem é a mesma, qualquer que seja a divisão dos
/// lançamentos de progresso.
pub fn component_requirement(
    quantity_required: Decimal,
    already_produced: i32,
    quantity: i32,
) -> Result<i32, AppError> {
    let produced_after = already_produced
        .checked_add(quantity)
        .ok_or_else(|| AppError::field("quantity", "Quantidade fora do intervalo suportado."))?;
    let delta = rounded_total(quantity_required, produced_after)?
        - rounded_total(quantity_required, already_produced)?;
    i32::try_from(delta)
        .map_err(|_| AppError::field("quantity", "Quantidade de consumo fora do intervalo suportado."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    #[test]
    fn terminal_states_reject_every_transition() {
        for from in [OrderStatus::Completed, OrderStatus::Cancelled] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(matches!(from.transition_to(to), Err(AppError::InvalidState(_))));
            }
        }
    }

    #[test]
    fn transition_table_matches_lifecycle() {
        use OrderStatus::*;
        assert_eq!(Pending.transition_to(InProgress).unwrap(), InProgress);
        assert_eq!(Pending.transition_to(Cancelled).unwrap(), Cancelled);
        assert!(Pending.transition_to(Completed).is_err());
        assert!(Pending.transition_to(Pending).is_err());
        assert_eq!(InProgress.transition_to(Completed).unwrap(), Completed);
        assert_eq!(InProgress.transition_to(Cancelled).unwrap(), Cancelled);
        assert_eq!(InProgress.transition_to(InProgress).unwrap(), InProgress);
        assert!(InProgress.transition_to(Pending).is_err());
    }

    #[test]
    fn progress_moves_pending_to_in_progress() {
        assert_eq!(OrderStatus::Pending.after_progress().unwrap(), OrderStatus::InProgress);
        assert_eq!(OrderStatus::InProgress.after_progress().unwrap(), OrderStatus::InProgress);
        assert!(OrderStatus::Cancelled.after_progress().is_err());
    }

    #[test]
    fn status_accepts_english_aliases() {
        let s: OrderStatus = serde_json::from_str("\"InProgress\"").unwrap();
        assert_eq!(s, OrderStatus::InProgress);
        let s: OrderStatus = serde_json::from_str("\"Cancelado\"").unwrap();
        assert_eq!(s, OrderStatus::Cancelled);
        assert_eq!(serde_json::to_string(&OrderStatus::InProgress).unwrap(), "\"En Progreso\"");
    }

    #[test]
    fn order_number_is_zero_padded() {
        assert_eq!(format_order_number("OP", 1), "OP-0001");
        assert_eq!(format_order_number("TPSP", 12345), "TPSP-12345");
    }

    #[test]
    fn requirement_rounds_half_up() {
        let d = |s: &str| Decimal::from_str(s).unwrap();
        assert_eq!(component_requirement(d("2"), 0, 3).unwrap(), 6);
        assert_eq!(component_requirement(d("0.5"), 0, 1).unwrap(), 1);
        assert_eq!(component_requirement(d("0.25"), 0, 1).unwrap(), 0);
        assert_eq!(component_requirement(d("1.25"), 0, 2).unwrap(), 3);
        assert_eq!(component_requirement(d("0.33"), 0, 3).unwrap(), 1);
    }

    #[test]
    fn requirement_rounds_on_the_order_running_total() {
        let d = |s: &str| Decimal::from_str(s).unwrap();
        // 0.4 por kit: 0.4 -> 0, 0.8 -> 1, 1.2 -> 1, 1.6 -> 2
        assert_eq!(component_requirement(d("0.4"), 0, 1).unwrap(), 0);
        assert_eq!(component_requirement(d("0.4"), 1, 1).unwrap(), 1);
        assert_eq!(component_requirement(d("0.4"), 2, 1).unwrap(), 0);
        assert_eq!(component_requirement(d("0.4"), 3, 1).unwrap(), 1);
    }

    #[test]
    fn split_progress_consumes_the_same_as_one_batch() {
        let d = |s: &str| Decimal::from_str(s).unwrap();
        for q in ["0.4", "0.25", "0.33", "1.5", "2"] {
            let batch = component_requirement(d(q), 0, 10).unwrap();
            let singles: i32 = (0..10)
                .map(|produced| component_requirement(d(q), produced, 1).unwrap())
                .sum();
            let mixed = component_requirement(d(q), 0, 3).unwrap()
                + component_requirement(d(q), 3, 4).unwrap()
                + component_requirement(d(q), 7, 3).unwrap();
            assert_eq!(batch, singles, "q = {}", q);
            assert_eq!(batch, mixed, "q = {}", q);
        }
    }
}
