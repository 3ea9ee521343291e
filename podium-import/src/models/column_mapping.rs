//! Semantic fields and column mappings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic field of a results table
///
/// Serialized with the canonical (Spanish) field names used by the
/// review UI and stored mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Finishing position
    Posicion,
    /// Bib number
    Dorsal,
    /// Athlete full name
    Nombre,
    /// Age or skill division
    Categoria,
    Club,
    /// Race time
    Tiempo,
    /// Points scored
    Puntos,
}

impl Field {
    /// All fields, in canonical column order
    pub const ALL: [Field; 7] = [
        Field::Posicion,
        Field::Dorsal,
        Field::Nombre,
        Field::Categoria,
        Field::Club,
        Field::Tiempo,
        Field::Puntos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Posicion => "posicion",
            Field::Dorsal => "dorsal",
            Field::Nombre => "nombre",
            Field::Categoria => "categoria",
            Field::Club => "club",
            Field::Tiempo => "tiempo",
            Field::Puntos => "puntos",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("Unknown field '{}'", s))
    }
}

/// Field → zero-based column index
///
/// Produced by the header mapper and overridable by the reviewer before
/// confirmation. Fields without a column are simply absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posicion: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dorsal: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categoria: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiempo: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub puntos: Option<usize>,
}

impl ColumnMapping {
    pub fn get(&self, field: Field) -> Option<usize> {
        *self.slot(field)
    }

    pub fn set(&mut self, field: Field, index: usize) {
        *self.slot_mut(field) = Some(index);
    }

    /// Builder-style [`ColumnMapping::set`]
    pub fn with(mut self, field: Field, index: usize) -> Self {
        self.set(field, index);
        self
    }

    /// Mapped (field, column) pairs in canonical field order
    pub fn iter(&self) -> impl Iterator<Item = (Field, usize)> + '_ {
        Field::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|index| (field, index)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    fn slot(&self, field: Field) -> &Option<usize> {
        match field {
            Field::Posicion => &self.posicion,
            Field::Dorsal => &self.dorsal,
            Field::Nombre => &self.nombre,
            Field::Categoria => &self.categoria,
            Field::Club => &self.club,
            Field::Tiempo => &self.tiempo,
            Field::Puntos => &self.puntos,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<usize> {
        match field {
            Field::Posicion => &mut self.posicion,
            Field::Dorsal => &mut self.dorsal,
            Field::Nombre => &mut self.nombre,
            Field::Categoria => &mut self.categoria,
            Field::Club => &mut self.club,
            Field::Tiempo => &mut self.tiempo,
            Field::Puntos => &mut self.puntos,
        }
    }
}
