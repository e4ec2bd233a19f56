use std::collections::BTreeSet;

use crate::segmenter::{EQUIPMENT_SECTION, SegmentedDescription};
use crate::structural::DetailExtraction;
use crate::text::{capitalize, clean_multiline, clean_single_line, infer_construction_year};
use crate::types::{FieldValue, PartialRecord, PropertyRecord};

pub const AMENITIES_FIELD: &str = "amenidades";
pub const DESCRIPTION_FIELD: &str = "descripcion";
pub const FEATURES_FIELD: &str = "caracteristicas_adicionales";
pub const CONSTRUCTION_YEAR_FIELD: &str = "año_de_construcción";

/// Raw keys as they appear on listing pages, mapped to the record's field names.
pub const KEY_SYNONYMS: [(&str, &str); 4] = [
    ("terreno", "m²_terreno"),
    ("construcción", "m²_construcción"),
    ("tipo", "tipo_propiedad"),
    ("edo._conservación", "edo_conservacion"),
];

pub fn canonical_key(key: &str) -> &str {
    KEY_SYNONYMS
        .iter()
        .find(|(raw, _)| *raw == key)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(key)
}

/// Everything extracted from one page, before consolidation.
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    /// `url`, `titulo`, `subtitulo`, `direccion`, `precio` and `moneda`.
    pub identity: PartialRecord,
    pub summary: PartialRecord,
    pub details: DetailExtraction,
    pub segments: Option<SegmentedDescription>,
    /// Description text as extracted, line breaks intact.
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct RecordConsolidator {
    reference_year: i32,
}

impl RecordConsolidator {
    pub fn new(reference_year: i32) -> Self {
        Self { reference_year }
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Merges the stages in order. A stage only fills fields that earlier
    /// stages left unset.
    pub fn consolidate(&self, page: PageExtraction) -> PropertyRecord {
        let PageExtraction {
            identity,
            summary,
            details,
            segments,
            description,
        } = page;

        let mut fields = identity;
        fields.merge(summary);
        fields.merge(details.fields);

        let mut amenities = details.bare_amenities;
        if let Some(segments) = segments {
            if let Some(flags) = segments.features.to_field() {
                fields.insert_if_absent(FEATURES_FIELD, flags);
            }
            amenities.extend(segments.amenities);
            for (section, items) in segments.sections {
                if section == EQUIPMENT_SECTION {
                    amenities.extend(items);
                } else {
                    fields.insert_if_absent(section, items);
                }
            }
        }

        if let Some(raw) = description {
            fields.insert_if_absent(DESCRIPTION_FIELD, clean_multiline(&raw));
        }

        self.finalize(fields, amenities)
    }

    /// Unifies amenities, resolves the construction year, renames synonym keys
    /// and prunes empty values. Running it again on its own output is a no-op.
    pub fn finalize(&self, mut fields: PartialRecord, amenity_sources: Vec<String>) -> PropertyRecord {
        let mut amenities = amenity_sources;
        match fields.remove(AMENITIES_FIELD) {
            Some(FieldValue::List(existing)) => amenities.extend(existing),
            Some(FieldValue::Text(existing)) => amenities.push(existing),
            Some(other) => {
                log::debug!("Treating non-list '{}' value as one amenity: {}", AMENITIES_FIELD, other);
                amenities.push(other.to_string());
            }
            None => {}
        }
        let unified = unify_amenities(amenities);
        if !unified.is_empty() {
            fields.insert(AMENITIES_FIELD, unified);
        }

        if let Some(value) = fields.get(CONSTRUCTION_YEAR_FIELD).and_then(FieldValue::as_number) {
            match infer_construction_year(value, self.reference_year) {
                Some(year) => fields.insert(CONSTRUCTION_YEAR_FIELD, i64::from(year)),
                None => {
                    log::debug!("Discarding implausible construction year/age {}", value);
                    fields.remove(CONSTRUCTION_YEAR_FIELD);
                }
            }
        }

        let mut renamed = PartialRecord::new();
        for (key, value) in fields {
            let canonical = canonical_key(&key).to_string();
            if !renamed.insert_if_absent(canonical.clone(), value) {
                log::debug!("Dropping '{}': '{}' is already set", key, canonical);
            }
        }

        renamed.retain(|_, value| !value.is_empty());
        PropertyRecord::from_pruned(renamed)
    }
}

/// Cleans, capitalizes, deduplicates and sorts amenity names.
pub fn unify_amenities(amenities: impl IntoIterator<Item = String>) -> Vec<String> {
    amenities
        .into_iter()
        .map(|amenity| capitalize(&clean_single_line(&amenity)))
        .filter(|amenity| !amenity.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
