use crate::domain::common::{AggregateId, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id type for the per-area context extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextoId(pub Uuid);

impl ContextoId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for ContextoId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }
    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(ContextoId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Expense area the context row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextoArea {
    Implementacion,
    Programacion,
    Experiencia,
    Produccion,
    Tecnica,
}

impl ContextoArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextoArea::Implementacion => "implementacion",
            ContextoArea::Programacion => "programacion",
            ContextoArea::Experiencia => "experiencia",
            ContextoArea::Produccion => "produccion",
            ContextoArea::Tecnica => "tecnica",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "implementacion" => Some(ContextoArea::Implementacion),
            "programacion" => Some(ContextoArea::Programacion),
            "experiencia" => Some(ContextoArea::Experiencia),
            "produccion" => Some(ContextoArea::Produccion),
            "tecnica" => Some(ContextoArea::Tecnica),
            _ => None,
        }
    }
}

/// One-to-one extension of a gasto row holding the area-specific fields and
/// the links back to both the core row and the grouping header. A gasto row
/// without its contexto row is an invalid partial state; readers never see
/// one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contexto {
    pub id: ContextoId,
    pub gasto_ref: Uuid,
    pub formulario_ref: Uuid,
    pub area: ContextoArea,
    /// Optional advertising order the expense is billed against. Checked in
    /// application code before insert; not a declared store constraint.
    pub orden_ref: Option<Uuid>,
    pub centro_coste: Option<String>,
    /// Accounting month override, `YYYY-MM`
    pub mes_imputacion: Option<String>,
    pub detalle: Option<String>,
    /// Area-specific payload serialized as JSON
    pub extra_json: Option<String>,
    pub metadata: EntityMetadata,
}

impl Contexto {
    /// Deserialize the area-specific payload
    pub fn parse_extra(&self) -> serde_json::Map<String, serde_json::Value> {
        self.extra_json
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default()
    }
}

/// Fields accepted when creating a contexto row; the two references are
/// supplied by the coordinator, not the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextoDraft {
    pub area: ContextoArea,
    pub orden_ref: Option<Uuid>,
    pub centro_coste: Option<String>,
    pub mes_imputacion: Option<String>,
    pub detalle: Option<String>,
    pub extra_json: Option<String>,
}

/// Per-column contexto update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextoPatch {
    pub orden_ref: Option<Uuid>,
    pub centro_coste: Option<String>,
    pub mes_imputacion: Option<String>,
    pub detalle: Option<String>,
    pub extra_json: Option<String>,
}

impl ContextoPatch {
    pub fn is_empty(&self) -> bool {
        self.orden_ref.is_none()
            && self.centro_coste.is_none()
            && self.mes_imputacion.is_none()
            && self.detalle.is_none()
            && self.extra_json.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(mes) = &self.mes_imputacion {
            crate::domain::a001_formulario::aggregate::validate_mes(mes)?;
        }
        Ok(())
    }
}
