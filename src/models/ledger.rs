// src/models/ledger.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use utoipa::ToSchema;
use uuid::Uuid;

// --- Tipos de movimentação (livro-razão) ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "movement_type")]
pub enum MovementType {
    #[sqlx(rename = "Compra")]
    #[serde(rename = "Compra")]
    Purchase,
    #[sqlx(rename = "Consumo_Produccion")]
    #[serde(rename = "Consumo_Produccion")]
    ProductionConsumption,
    #[sqlx(rename = "Entrada_Produccion")]
    #[serde(rename = "Entrada_Produccion")]
    ProductionEntry,
    #[sqlx(rename = "Venta")]
    #[serde(rename = "Venta")]
    Sale,
    #[sqlx(rename = "Ajuste")]
    #[serde(rename = "Ajuste")]
    Adjustment,
}

impl MovementType {
    /// Tipos que só a máquina de estados de produção pode lançar.
    pub fn is_production(self) -> bool {
        matches!(self, MovementType::ProductionConsumption | MovementType::ProductionEntry)
    }
}

// --- Referência polimórfica ---
// Colunas `reference_type` / `reference_id`. Novos tipos de origem entram como
// novas variantes de `ReferenceKind`, sem mudar o schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    ProductionOrder,
}

impl ReferenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceKind::ProductionOrder => "production_order",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "production_order" => Some(ReferenceKind::ProductionOrder),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct MovementReference {
    pub kind: ReferenceKind,
    pub id: Uuid,
}

impl MovementReference {
    pub fn production_order(id: Uuid) -> Self {
        Self { kind: ReferenceKind::ProductionOrder, id }
    }

    /// Reconstrói a referência a partir das duas colunas; ambas nulas = sem referência.
    pub fn from_columns(kind: Option<&str>, id: Option<Uuid>) -> Result<Option<Self>, String> {
        match (kind, id) {
            (None, None) => Ok(None),
            (Some(kind), Some(id)) => ReferenceKind::parse(kind)
                .map(|kind| Some(Self { kind, id }))
                .ok_or_else(|| format!("reference_type desconhecido: {}", kind)),
            _ => Err("reference_type e reference_id devem vir juntos".to_string()),
        }
    }
}

// --- Linha do livro-razão (imutável) ---
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Positivo = entrada, negativo = saída.
    pub quantity: i32,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub unit_price: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub reference: Option<MovementReference>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for InventoryMovement {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let reference_type: Option<String> = row.try_get("reference_type")?;
        let reference_id: Option<Uuid> = row.try_get("reference_id")?;
        let reference = MovementReference::from_columns(reference_type.as_deref(), reference_id)
            .map_err(|e| sqlx::Error::Decode(e.into()))?;

        Ok(Self {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
            movement_type: row.try_get("type")?,
            unit_price: row.try_get("unit_price")?,
            total_price: row.try_get("total_price")?,
            reference,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Lançamento a ser gravado. `occurred_at` permite retroagir a data (entregas).
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub product_id: Uuid,
    pub quantity: i32,
    pub movement_type: MovementType,
    pub unit_price: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub reference: Option<MovementReference>,
    pub notes: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl NewMovement {
    pub fn new(product_id: Uuid, quantity: i32, movement_type: MovementType) -> Self {
        Self {
            product_id,
            quantity,
            movement_type,
            unit_price: None,
            total_price: None,
            reference: None,
            notes: None,
            occurred_at: None,
        }
    }

    pub fn referencing(mut self, reference: MovementReference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn priced(mut self, unit_price: Decimal, total_price: Decimal) -> Self {
        self.unit_price = Some(unit_price);
        self.total_price = Some(total_price);
        self
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }
}

// Movimentação + nome do produto (listagem do histórico)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MovementDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub movement: InventoryMovement,
    pub product_name: String,
}

/// Intervalo de dias inteiros (UTC), ambos inclusivos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Início do primeiro dia (00:00:00 UTC).
    pub fn from_instant(&self) -> Option<DateTime<Utc>> {
        self.start.map(start_of_day)
    }

    /// Limite exclusivo: 00:00 do dia seguinte ao último dia.
    pub fn until_instant(&self) -> Option<DateTime<Utc>> {
        self.end.and_then(|d| d.succ_opt()).map(start_of_day)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from_instant().is_none_or(|from| instant >= from)
            && self.until_instant().is_none_or(|until| instant < until)
    }

    pub fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if e < s)
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub movement_type: Option<MovementType>,
    pub product_id: Option<Uuid>,
    pub range: DateRange,
}

impl MovementFilter {
    pub fn matches(&self, movement: &InventoryMovement) -> bool {
        self.movement_type.is_none_or(|t| movement.movement_type == t)
            && self.product_id.is_none_or(|p| movement.product_id == p)
            && self.range.contains(movement.created_at)
    }
}

// Total de vendas por dia (gráfico financeiro)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DailySales {
    pub date: NaiveDate,
    #[schema(example = "150.00")]
    pub total: Decimal,
}

// Histórico público: sem preços
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicSaleEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<MovementDetail> for PublicSaleEntry {
    fn from(detail: MovementDetail) -> Self {
        Self {
            id: detail.movement.id,
            product_id: detail.movement.product_id,
            product_name: detail.product_name,
            quantity: detail.movement.quantity,
            created_at: detail.movement.created_at,
        }
    }
}

/// Lançamento manual (compras, ajustes e vendas avulsas).
#[derive(Debug, Clone)]
pub struct ManualMovement {
    pub product_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub notes: Option<String>,
}
