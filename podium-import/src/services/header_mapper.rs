//! Header Mapper
//!
//! Maps the header cells of an extracted table to semantic [`Field`]s using a
//! [`SynonymTable`]. Matching is exact on normalized text:
//! - Unicode NFD, combining marks stripped (`Categoría` → `categoria`)
//! - Lower-cased, internal whitespace collapsed, trimmed
//!
//! **Tie-break:** cells are scanned left to right and the first match for a
//! field wins, unless a later matching header has more words than the one
//! already accepted (`PTOS` followed by `PTOS TOTAL` maps `puntos` to the
//! latter).

use std::collections::HashMap;

use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::{ColumnMapping, Field};

/// Field synonyms used by [`HeaderMapper`]
///
/// Entries are stored normalized; the canonical field name always matches
/// even when it is not listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymTable {
    entries: HashMap<Field, Vec<String>>,
}

impl SynonymTable {
    /// Table with no synonyms (only canonical field names match)
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Minimal table: the synonyms every results sheet is expected to use
    pub fn glossary() -> Self {
        Self::empty()
            .with(Field::Posicion, &["puesto", "posicion", "rank"])
            .with(Field::Dorsal, &["nº", "numero", "n°", "bib"])
            .with(Field::Nombre, &["apellido y nombre", "nombre"])
            .with(Field::Categoria, &["categoria", "cat", "division", "div"])
            .with(Field::Club, &["club", "equipo", "institucion"])
            .with(Field::Tiempo, &["tiempo", "tiempo oficial"])
            .with(Field::Puntos, &["puntos", "pts", "score"])
    }

    /// Add synonyms for `field`
    pub fn with(mut self, field: Field, synonyms: &[&str]) -> Self {
        let entry = self.entries.entry(field).or_default();
        for synonym in synonyms {
            let normalized = normalize_header(synonym);
            if !normalized.is_empty() && !entry.contains(&normalized) {
                entry.push(normalized);
            }
        }
        self
    }

    /// Field whose canonical name or synonym equals `normalized`
    ///
    /// Fields are tried in canonical order, so a synonym listed under two
    /// fields resolves to the earlier one.
    pub fn lookup(&self, normalized: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| {
            field.as_str() == normalized
                || self
                    .entries
                    .get(field)
                    .is_some_and(|synonyms| synonyms.iter().any(|s| s == normalized))
        })
    }

    pub fn synonyms(&self, field: Field) -> &[String] {
        self.entries.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for SynonymTable {
    /// Production table, extending the glossary with the abbreviations and
    /// misspellings found in federation result sheets
    fn default() -> Self {
        Self::glossary()
            .with(Field::Posicion, &["pos", "orden"])
            .with(Field::Dorsal, &["nro", "nro atleta"])
            .with(
                Field::Nombre,
                &[
                    "apellido y nombres",
                    "apellidos y nombres",
                    "apellido y nobres",
                    "apellidos y nobres",
                ],
            )
            .with(Field::Puntos, &["ptos", "ptos total", "puntos total", "pts total"])
    }
}

/// Normalize a header cell for synonym matching
///
/// ```
/// use podium_import::services::header_mapper::normalize_header;
///
/// assert_eq!(normalize_header("  Categoría "), "categoria");
/// assert_eq!(normalize_header("Apellido   y\tNombre"), "apellido y nombre");
/// ```
pub fn normalize_header(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Detects which column holds which field
#[derive(Debug, Clone, Default)]
pub struct HeaderMapper {
    synonyms: SynonymTable,
}

impl HeaderMapper {
    pub fn new(synonyms: SynonymTable) -> Self {
        Self { synonyms }
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    /// Map header cells to fields; unrecognized headers are left out
    pub fn map_headers(&self, headers: &[String]) -> ColumnMapping {
        let mut mapping = ColumnMapping::default();
        // Word count of the header currently accepted for each field
        let mut accepted: HashMap<Field, usize> = HashMap::new();

        for (index, header) in headers.iter().enumerate() {
            let normalized = normalize_header(header);
            if normalized.is_empty() {
                continue;
            }
            let Some(field) = self.synonyms.lookup(&normalized) else {
                debug!(header = %header, index, "Unrecognized header");
                continue;
            };

            let words = normalized.split(' ').count();
            match accepted.get(&field) {
                Some(&current) if words <= current => {
                    debug!(header = %header, index, field = %field, "Duplicate header ignored");
                }
                _ => {
                    mapping.set(field, index);
                    accepted.insert(field, words);
                }
            }
        }

        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::table_extractor::extract_table_from_text;

    fn headers(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_glossary_headers_map_in_order() {
        let mapper = HeaderMapper::default();
        let mapping = mapper.map_headers(&headers(&[
            "Puesto",
            "N°",
            "Apellido y Nombre",
            "Categoría",
            "Club",
            "Tiempo",
            "Pts",
        ]));

        assert_eq!(
            mapping,
            ColumnMapping {
                posicion: Some(0),
                dorsal: Some(1),
                nombre: Some(2),
                categoria: Some(3),
                club: Some(4),
                tiempo: Some(5),
                puntos: Some(6),
            }
        );
    }

    #[test]
    fn test_glossary_table_is_enough_for_glossary_headers() {
        let mapper = HeaderMapper::new(SynonymTable::glossary());
        let mapping = mapper.map_headers(&headers(&["RANK", "Bib", "Nombre", "Division", "Score"]));

        assert_eq!(mapping.posicion, Some(0));
        assert_eq!(mapping.dorsal, Some(1));
        assert_eq!(mapping.nombre, Some(2));
        assert_eq!(mapping.categoria, Some(3));
        assert_eq!(mapping.puntos, Some(4));
    }

    #[test]
    fn test_more_specific_header_overrides() {
        let mapper = HeaderMapper::default();
        let mapping = mapper.map_headers(&headers(&["Nombre", "PTOS", "PTOS TOTAL"]));
        assert_eq!(mapping.puntos, Some(2));
    }

    #[test]
    fn test_identical_headers_first_wins() {
        let mapper = HeaderMapper::default();
        let mapping = mapper.map_headers(&headers(&["Nro Atleta", "Nombre", "Nro Atleta"]));
        assert_eq!(mapping.dorsal, Some(0));
    }

    #[test]
    fn test_same_length_synonym_does_not_override() {
        let mapper = HeaderMapper::default();
        let mapping = mapper.map_headers(&headers(&[
            "Orden",
            "Nro atleta",
            "Apellido y nombres",
            "categoria",
            "club",
            "pos",
            "ptos",
        ]));

        assert_eq!(mapping.posicion, Some(0));
        assert_eq!(mapping.dorsal, Some(1));
        assert_eq!(mapping.nombre, Some(2));
        assert_eq!(mapping.categoria, Some(3));
        assert_eq!(mapping.club, Some(4));
        assert_eq!(mapping.tiempo, None);
        assert_eq!(mapping.puntos, Some(6));
    }

    #[test]
    fn test_space_aligned_sheet_maps_from_extracted_headers() {
        let text = "Orden  Nro atleta  Apellido y nombres  categoria  club  pos  ptos\n\
                    1  117  PEREZ, Juan  Mayores  Club Atlético  1  10\n";
        let table = extract_table_from_text(text);
        let mapping = HeaderMapper::default().map_headers(&table.headers);

        assert_eq!(
            mapping,
            ColumnMapping {
                posicion: Some(0),
                dorsal: Some(1),
                nombre: Some(2),
                categoria: Some(3),
                club: Some(4),
                tiempo: None,
                puntos: Some(6),
            }
        );
        assert_eq!(table.rows[0].field(&mapping, Field::Nombre), Some("PEREZ, Juan"));
        assert_eq!(table.rows[0].field(&mapping, Field::Puntos), Some("10"));
    }

    #[test]
    fn test_unknown_and_blank_headers_are_skipped() {
        let mapper = HeaderMapper::default();
        let mapping = mapper.map_headers(&headers(&["", "Observaciones", "Club"]));
        assert_eq!(mapping, ColumnMapping::default().with(Field::Club, 2));
    }

    #[test]
    fn test_no_fuzzy_matching() {
        let mapper = HeaderMapper::default();
        let mapping = mapper.map_headers(&headers(&["Tiempos", "Clubes", "Puesto final"]));
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_custom_table() {
        let table = SynonymTable::empty().with(Field::Nombre, &["Atleta"]);
        let mapper = HeaderMapper::new(table);

        let mapping = mapper.map_headers(&headers(&["ATLETA", "Puesto", "club"]));
        assert_eq!(mapping.nombre, Some(0));
        // Canonical names match without synonyms; "puesto" is not canonical
        assert_eq!(mapping.posicion, None);
        assert_eq!(mapping.club, Some(2));
    }

    #[test]
    fn test_synonyms_stored_normalized() {
        let table = SynonymTable::empty().with(Field::Club, &["  Institución ", "institucion"]);
        assert_eq!(table.synonyms(Field::Club), ["institucion".to_string()]);
        assert!(table.synonyms(Field::Tiempo).is_empty());
    }

    #[test]
    fn test_default_extends_glossary() {
        let glossary = SynonymTable::glossary();
        let full = SynonymTable::default();
        for field in Field::ALL {
            for synonym in glossary.synonyms(field) {
                assert!(full.synonyms(field).contains(synonym));
            }
        }
        assert_eq!(full.lookup("apellidos y nobres"), Some(Field::Nombre));
        assert_eq!(glossary.lookup("apellidos y nobres"), None);
    }
}
