//! Text normalization for results cells
//!
//! Converts the free-form text found in results tables into canonical values:
//! - Times (`H:MM:SS.fff`, `MM:SS,fff`, bare seconds) → milliseconds
//! - Numbers with a decimal comma (`10,5`) → `f64`
//! - Names in `"Apellido, Nombre"` order → `"Nombre Apellido"`, title-cased
//!
//! Time and number parsing return [`Parsed`], so malformed input is an
//! explicit value the caller has to handle instead of a silent NaN.

use tracing::debug;

use crate::models::{ColumnMapping, Field, NormalizedRow, RawRow};

/// Outcome of parsing an optional cell
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    /// No input (absent or blank cell)
    Missing,
    /// Input present but not understood; carries the original text
    Unparseable(String),
    Value(T),
}

impl<T> Parsed<T> {
    /// The parsed value, treating missing and unparseable alike
    pub fn value(self) -> Option<T> {
        match self {
            Parsed::Value(v) => Some(v),
            Parsed::Missing | Parsed::Unparseable(_) => None,
        }
    }

    pub fn is_unparseable(&self) -> bool {
        matches!(self, Parsed::Unparseable(_))
    }
}

const MS_PER_SECOND: f64 = 1000.0;
const MS_PER_MINUTE: f64 = 60.0 * MS_PER_SECOND;
const MS_PER_HOUR: f64 = 60.0 * MS_PER_MINUTE;

/// Parse a race time into whole milliseconds
///
/// Component count selects the units: three parts are hours, minutes,
/// seconds; two are minutes, seconds; one is seconds. Every component may be
/// fractional. The first comma is read as the decimal separator.
///
/// ```
/// use podium_import::services::text_normalizer::{normalize_time, Parsed};
///
/// assert_eq!(normalize_time(Some("00:47.32")), Parsed::Value(47_320));
/// assert_eq!(normalize_time(Some("1:02")), Parsed::Value(62_000));
/// assert_eq!(normalize_time(Some("1:02:03,5")), Parsed::Value(3_723_500));
/// assert_eq!(normalize_time(None), Parsed::Missing);
/// ```
pub fn normalize_time(text: Option<&str>) -> Parsed<i64> {
    let Some(raw) = non_blank(text) else {
        return Parsed::Missing;
    };

    let cleaned = raw.replacen(',', ".", 1);
    let parts: Vec<&str> = cleaned.split(':').collect();
    let factors: &[f64] = match parts.len() {
        1 => &[MS_PER_SECOND],
        2 => &[MS_PER_MINUTE, MS_PER_SECOND],
        3 => &[MS_PER_HOUR, MS_PER_MINUTE, MS_PER_SECOND],
        _ => return Parsed::Unparseable(raw.to_string()),
    };

    let mut total = 0.0;
    for (part, factor) in parts.iter().zip(factors) {
        match parse_finite(part) {
            Some(value) => total += value * factor,
            None => return Parsed::Unparseable(raw.to_string()),
        }
    }

    Parsed::Value(total.round() as i64)
}

/// Parse a number, accepting a decimal comma
///
/// ```
/// use podium_import::services::text_normalizer::{normalize_number, Parsed};
///
/// assert_eq!(normalize_number(Some("10,5")), Parsed::Value(10.5));
/// assert_eq!(normalize_number(Some("8")), Parsed::Value(8.0));
/// ```
pub fn normalize_number(text: Option<&str>) -> Parsed<f64> {
    let Some(raw) = non_blank(text) else {
        return Parsed::Missing;
    };

    match parse_finite(&raw.replacen(',', ".", 1)) {
        Some(value) => Parsed::Value(value),
        None => Parsed::Unparseable(raw.to_string()),
    }
}

/// Canonicalize an athlete name
///
/// `"PEREZ, juan ignacio"` becomes `"Juan Ignacio Perez"`. Names without
/// exactly one comma keep their word order. Missing input yields `""`.
pub fn normalize_name(text: Option<&str>) -> String {
    let Some(raw) = non_blank(text) else {
        return String::new();
    };

    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if let [apellido, nombre] = parts.as_slice() {
        return format!("{} {}", title_case(nombre), title_case(apellido))
            .trim()
            .to_string();
    }

    title_case(raw)
}

/// Apply `mapping` to `row` and normalize every mapped cell
pub fn normalize_row(row: &RawRow, mapping: &ColumnMapping) -> NormalizedRow {
    let posicion = log_unparseable(
        Field::Posicion,
        normalize_number(row.field(mapping, Field::Posicion)),
    )
    .and_then(|v| {
        if v.fract() == 0.0 {
            Some(v as i64)
        } else {
            debug!(value = v, "Non-integer position ignored");
            None
        }
    });
    let tiempo_ms = log_unparseable(
        Field::Tiempo,
        normalize_time(row.field(mapping, Field::Tiempo)),
    );
    let puntos = log_unparseable(
        Field::Puntos,
        normalize_number(row.field(mapping, Field::Puntos)),
    );

    NormalizedRow {
        posicion,
        dorsal: row.field(mapping, Field::Dorsal).map(str::to_string),
        nombre: normalize_name(row.field(mapping, Field::Nombre)),
        categoria: row.field(mapping, Field::Categoria).map(str::to_string),
        club: row.field(mapping, Field::Club).map(str::to_string),
        tiempo_ms,
        puntos,
    }
}

fn log_unparseable<T>(field: Field, parsed: Parsed<T>) -> Option<T> {
    if let Parsed::Unparseable(text) = &parsed {
        debug!(field = %field, text = %text, "Unparseable cell treated as absent");
    }
    parsed.value()
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

fn parse_finite(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn title_case(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
