use crate::domain::common::{AggregateId, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id type for the formulario grouping header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormularioId(pub Uuid);

impl FormularioId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for FormularioId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }
    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(FormularioId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Header lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormularioEstado {
    Abierto,
    Cerrado,
}

impl FormularioEstado {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormularioEstado::Abierto => "abierto",
            FormularioEstado::Cerrado => "cerrado",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "abierto" => Some(FormularioEstado::Abierto),
            "cerrado" => Some(FormularioEstado::Cerrado),
            _ => None,
        }
    }
}

/// Grouping header shared by the gasto rows captured together in one form
/// submission. A header with zero children is valid only transiently,
/// mid-creation or mid-deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formulario {
    pub id: FormularioId,
    /// Campaign the expenses belong to
    pub campania: String,
    /// Accounting month, `YYYY-MM`
    pub mes: String,
    /// Business unit the form was captured for
    pub unidad_negocio: String,
    pub descripcion: Option<String>,
    pub estado: FormularioEstado,
    pub metadata: EntityMetadata,
}

impl Formulario {
    pub fn new_for_insert(draft: FormularioDraft) -> Self {
        Self {
            id: FormularioId::new(Uuid::new_v4()),
            campania: draft.campania,
            mes: draft.mes,
            unidad_negocio: draft.unidad_negocio,
            descripcion: draft.descripcion,
            estado: FormularioEstado::Abierto,
            metadata: EntityMetadata::new(),
        }
    }
}

/// Fields accepted when creating a new header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormularioDraft {
    pub campania: String,
    pub mes: String,
    pub unidad_negocio: String,
    pub descripcion: Option<String>,
}

impl FormularioDraft {
    pub fn validate(&self) -> Result<(), String> {
        if self.campania.trim().is_empty() {
            return Err("campania must not be empty".into());
        }
        if self.unidad_negocio.trim().is_empty() {
            return Err("unidad_negocio must not be empty".into());
        }
        validate_mes(&self.mes)
    }
}

/// Per-column header update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormularioPatch {
    pub campania: Option<String>,
    pub mes: Option<String>,
    pub unidad_negocio: Option<String>,
    pub descripcion: Option<String>,
    pub estado: Option<FormularioEstado>,
}

impl FormularioPatch {
    pub fn is_empty(&self) -> bool {
        self.campania.is_none()
            && self.mes.is_none()
            && self.unidad_negocio.is_none()
            && self.descripcion.is_none()
            && self.estado.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(c) = &self.campania {
            if c.trim().is_empty() {
                return Err("campania must not be empty".into());
            }
        }
        if let Some(u) = &self.unidad_negocio {
            if u.trim().is_empty() {
                return Err("unidad_negocio must not be empty".into());
            }
        }
        if let Some(mes) = &self.mes {
            validate_mes(mes)?;
        }
        Ok(())
    }
}

/// Header detail view: the header plus its composed children
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormularioDetalle {
    pub formulario: Formulario,
    pub gastos: Vec<crate::domain::a002_gasto::aggregate::GastoCompleto>,
}

/// `YYYY-MM`, month 01..=12
pub fn validate_mes(mes: &str) -> Result<(), String> {
    let ok = mes.len() == 7
        && mes.as_bytes()[4] == b'-'
        && mes[..4].chars().all(|c| c.is_ascii_digit())
        && mes[5..].parse::<u8>().map_or(false, |m| (1..=12).contains(&m));
    if ok {
        Ok(())
    } else {
        Err(format!("mes must be YYYY-MM, got '{}'", mes))
    }
}
