use crate::domain::a001_formulario::aggregate::{Formulario, FormularioDraft, FormularioPatch};
use crate::domain::a004_contexto::aggregate::{Contexto, ContextoDraft, ContextoPatch};
use crate::domain::common::{AggregateId, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id type for the core financial row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GastoId(pub Uuid);

impl GastoId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for GastoId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }
    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(GastoId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Expense lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GastoEstado {
    Pendiente,
    Activo,
    Cerrado,
    Anulado,
}

impl GastoEstado {
    pub fn as_str(&self) -> &'static str {
        match self {
            GastoEstado::Pendiente => "pendiente",
            GastoEstado::Activo => "activo",
            GastoEstado::Cerrado => "cerrado",
            GastoEstado::Anulado => "anulado",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pendiente" => Some(GastoEstado::Pendiente),
            "activo" => Some(GastoEstado::Activo),
            "cerrado" => Some(GastoEstado::Cerrado),
            "anulado" => Some(GastoEstado::Anulado),
            _ => None,
        }
    }
}

/// Payment approval state, tracked independently of the lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstadoPago {
    Creado,
    Aprobado,
    RequiereInfo,
    Rechazado,
    Pagado,
}

impl EstadoPago {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoPago::Creado => "creado",
            EstadoPago::Aprobado => "aprobado",
            EstadoPago::RequiereInfo => "requiere_info",
            EstadoPago::Rechazado => "rechazado",
            EstadoPago::Pagado => "pagado",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "creado" => Some(EstadoPago::Creado),
            "aprobado" => Some(EstadoPago::Aprobado),
            "requiere_info" => Some(EstadoPago::RequiereInfo),
            "rechazado" => Some(EstadoPago::Rechazado),
            "pagado" => Some(EstadoPago::Pagado),
            _ => None,
        }
    }
}

/// Core financial row of one logical expense record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gasto {
    pub id: GastoId,
    /// Counterparty the expense is owed to
    pub proveedor: String,
    /// Net amount
    pub neto: f64,
    /// VAT rate in percent (e.g. 21.0)
    pub iva_pct: f64,
    /// Gross amount; always recomputed from neto and iva_pct on write,
    /// never accepted from the caller
    pub importe_total: f64,
    pub estado: GastoEstado,
    pub estado_pago: EstadoPago,
    /// User reference of the creator
    pub creado_por: String,
    pub metadata: EntityMetadata,
}

/// Fields accepted when creating a gasto row. New rows always start as
/// `pendiente` / `creado`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GastoDraft {
    pub proveedor: String,
    pub neto: f64,
    pub iva_pct: f64,
    pub creado_por: String,
}

impl GastoDraft {
    pub fn validate(&self) -> Result<(), String> {
        if self.proveedor.trim().is_empty() {
            return Err("proveedor must not be empty".into());
        }
        if self.creado_por.trim().is_empty() {
            return Err("creado_por must not be empty".into());
        }
        if !self.neto.is_finite() || self.neto < 0.0 {
            return Err(format!("neto must be a non-negative amount, got {}", self.neto));
        }
        if !self.iva_pct.is_finite() || !(0.0..=100.0).contains(&self.iva_pct) {
            return Err(format!("iva_pct must be between 0 and 100, got {}", self.iva_pct));
        }
        Ok(())
    }
}

/// Per-column gasto update; `None` leaves the column untouched.
/// `importe_total` is not patchable, it is derived.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GastoPatch {
    pub proveedor: Option<String>,
    pub neto: Option<f64>,
    pub iva_pct: Option<f64>,
    pub estado: Option<GastoEstado>,
    pub estado_pago: Option<EstadoPago>,
}

impl GastoPatch {
    pub fn is_empty(&self) -> bool {
        self.proveedor.is_none()
            && self.neto.is_none()
            && self.iva_pct.is_none()
            && self.estado.is_none()
            && self.estado_pago.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(p) = &self.proveedor {
            if p.trim().is_empty() {
                return Err("proveedor must not be empty".into());
            }
        }
        if let Some(neto) = self.neto {
            if !neto.is_finite() || neto < 0.0 {
                return Err(format!("neto must be a non-negative amount, got {}", neto));
            }
        }
        if let Some(iva) = self.iva_pct {
            if !iva.is_finite() || !(0.0..=100.0).contains(&iva) {
                return Err(format!("iva_pct must be between 0 and 100, got {}", iva));
            }
        }
        Ok(())
    }
}

/// Header selector for a create call: attach to an existing header, or
/// create a new one first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormularioRef {
    Existente(Uuid),
    Nuevo(FormularioDraft),
}

/// One (core + context) pair of a multi-item create
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GastoConContexto {
    pub gasto: GastoDraft,
    pub contexto: ContextoDraft,
}

/// Split update covering the three physical tables. Each present patch is
/// applied to its own table independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GastoUpdate {
    pub gasto: Option<GastoPatch>,
    pub formulario: Option<FormularioPatch>,
    pub contexto: Option<ContextoPatch>,
}

impl GastoUpdate {
    pub fn is_empty(&self) -> bool {
        self.gasto.as_ref().map_or(true, |p| p.is_empty())
            && self.formulario.as_ref().map_or(true, |p| p.is_empty())
            && self.contexto.as_ref().map_or(true, |p| p.is_empty())
    }
}

/// The externally visible expense record, composed from the three physical
/// tables by the aggregate reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GastoCompleto {
    pub gasto: Gasto,
    pub formulario: Formulario,
    pub contexto: Contexto,
}

/// Body of `POST /api/gasto`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGastoRequest {
    pub formulario: FormularioRef,
    pub gasto: GastoDraft,
    pub contexto: ContextoDraft,
}

/// Body of `POST /api/gasto/multiple`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGastoMultipleRequest {
    pub formulario: FormularioRef,
    pub items: Vec<GastoConContexto>,
}
