use crate::domain::common::{AggregateId, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id type for the advertising order header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrdenId(pub Uuid);

impl OrdenId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for OrdenId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }
    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(OrdenId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Id type for a program allocation row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrdenItemId(pub Uuid);

impl OrdenItemId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for OrdenItemId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }
    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(OrdenItemId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrdenEstado {
    Abierta,
    Cerrada,
    Anulada,
}

impl OrdenEstado {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrdenEstado::Abierta => "abierta",
            OrdenEstado::Cerrada => "cerrada",
            OrdenEstado::Anulada => "anulada",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "abierta" => Some(OrdenEstado::Abierta),
            "cerrada" => Some(OrdenEstado::Cerrada),
            "anulada" => Some(OrdenEstado::Anulada),
            _ => None,
        }
    }
}

/// Advertising order header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Orden {
    pub id: OrdenId,
    /// Order number (e.g. "ORD-2026-0140")
    pub numero: String,
    pub anunciante: String,
    pub agencia: Option<String>,
    /// Broadcast month, `YYYY-MM`
    pub mes: String,
    pub estado: OrdenEstado,
    pub metadata: EntityMetadata,
}

impl Orden {
    pub fn new_for_insert(dto: &OrdenDto) -> Self {
        Self {
            id: OrdenId::new(Uuid::new_v4()),
            numero: dto.numero.clone(),
            anunciante: dto.anunciante.clone(),
            agencia: dto.agencia.clone(),
            mes: dto.mes.clone(),
            estado: dto.estado.unwrap_or(OrdenEstado::Abierta),
            metadata: EntityMetadata::new(),
        }
    }

    pub fn update(&mut self, dto: &OrdenDto) {
        self.numero = dto.numero.clone();
        self.anunciante = dto.anunciante.clone();
        self.agencia = dto.agencia.clone();
        self.mes = dto.mes.clone();
        if let Some(estado) = dto.estado {
            self.estado = estado;
        }
        self.metadata.touch();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.numero.trim().is_empty() {
            return Err("numero must not be empty".into());
        }
        if self.anunciante.trim().is_empty() {
            return Err("anunciante must not be empty".into());
        }
        crate::domain::a001_formulario::aggregate::validate_mes(&self.mes)
    }
}

/// Upsert DTO for the order header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdenDto {
    pub id: Option<String>,
    pub numero: String,
    pub anunciante: String,
    pub agencia: Option<String>,
    pub mes: String,
    pub estado: Option<OrdenEstado>,
}

/// Program budget allocation under an order. `programa` is the natural key:
/// unique within one order, and the match key when the caller resubmits
/// items without surrogate ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdenItem {
    pub id: OrdenItemId,
    pub orden_ref: Uuid,
    pub programa: String,
    pub cadena: Option<String>,
    pub neto: f64,
    pub emisiones: Option<i32>,
    pub metadata: EntityMetadata,
}

/// Desired state of one allocation as submitted by the caller. `id` is
/// optional: the reconciler falls back to the natural key when it is
/// missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdenItemInput {
    pub id: Option<Uuid>,
    pub programa: String,
    pub cadena: Option<String>,
    pub neto: f64,
    pub emisiones: Option<i32>,
}

impl OrdenItemInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.programa.trim().is_empty() {
            return Err("programa must not be empty".into());
        }
        if !self.neto.is_finite() || self.neto < 0.0 {
            return Err(format!("neto must be a non-negative amount, got {}", self.neto));
        }
        Ok(())
    }
}

/// Order detail view: header, current allocations, and the total recomputed
/// from the rows (never stored denormalized).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdenConItems {
    pub orden: Orden,
    pub items: Vec<OrdenItem>,
    pub total_neto: f64,
}

/// Body of `PUT /api/orden/:id/items`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveOrdenItemsRequest {
    pub items: Vec<OrdenItemInput>,
}
