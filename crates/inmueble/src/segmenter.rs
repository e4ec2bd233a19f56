//! Line-oriented segmentation of a listing's free-text description.
//!
//! Agents write descriptions as loosely formatted lists: a header line
//! ("Planta Alta:", "Cercanías") followed by bulleted or bare items. The
//! segmenter walks the lines once, tracking which section is open, and sorts
//! every item into that section's bucket.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::text::{clean_single_line, normalize_key, strip_invisible};
use crate::types::FieldValue;

static RE_HEADER_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w\s]{2,40}?)\s*:?$").expect("invalid regex: header shape")
});

static RE_KNOWN_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(Cercanias|Cercanías|Planta Alta|Planta Baja|Equipamiento|Distribución|Servicios en la zona).*$",
    )
    .expect("invalid regex: known header")
});

static RE_NEARBY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(Cercanias|Cercanías|Servicios en la zona)")
        .expect("invalid regex: nearby header")
});

static RE_EQUIPMENT_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Equipamiento").expect("invalid regex: equipment header"));

static RE_LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-\s*(.+)").expect("invalid regex: list item"));

const BULLET_GLYPHS: [char; 4] = ['\u{2022}', '*', '>', '-'];
const LEADING_BULLETS: [char; 3] = ['\u{2022}', '*', '>'];

const LOOSE_ITEM_MAX_WORDS: usize = 15;
const MIN_AMENITY_CHARS: usize = 3;

pub const NEARBY_SECTION: &str = "cercanias";
pub const GROUND_FLOOR_SECTION: &str = "planta_baja";
pub const UPPER_FLOOR_SECTION: &str = "planta_alta";
pub const EQUIPMENT_SECTION: &str = "equipamiento";

const KNOWN_SECTIONS: [&str; 4] = [
    NEARBY_SECTION,
    GROUND_FLOOR_SECTION,
    UPPER_FLOOR_SECTION,
    EQUIPMENT_SECTION,
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Section {
    /// Lines outside any header; they end up as amenities.
    #[default]
    Amenities,
    Named(String),
}

/// The open section plus every bucket filled so far.
#[derive(Debug, Default)]
struct SegmenterState {
    current: Section,
    amenities: Vec<String>,
    named: IndexMap<String, Vec<String>>,
}

impl SegmenterState {
    fn open(&mut self, name: String) {
        self.named.entry(name.clone()).or_default();
        self.current = Section::Named(name);
    }

    fn emit(&mut self, item: String) {
        match &self.current {
            Section::Named(name) => self.named.entry(name.clone()).or_default().push(item),
            Section::Amenities => self.amenities.push(item),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdditionalFeatures {
    pub negotiable_price: bool,
    pub no_maintenance_fee: bool,
}

impl AdditionalFeatures {
    pub fn any(&self) -> bool {
        self.negotiable_price || self.no_maintenance_fee
    }

    /// Only the flags that are set, or `None` when neither is.
    pub fn to_field(&self) -> Option<FieldValue> {
        if !self.any() {
            return None;
        }
        let mut flags = IndexMap::new();
        if self.negotiable_price {
            flags.insert("precio_negociable".to_string(), true);
        }
        if self.no_maintenance_fee {
            flags.insert("no_paga_mantenimiento".to_string(), true);
        }
        Some(FieldValue::Flags(flags))
    }

    /// Flags a keyword line; returns whether the line carried any keyword.
    fn scan(&mut self, line: &str) -> bool {
        let lowered = line.to_lowercase();
        let mut matched = false;
        if lowered.contains("precio a tratar") || lowered.contains("precio negociable") {
            self.negotiable_price = true;
            matched = true;
        }
        if lowered.contains("no paga mantenimiento") {
            self.no_maintenance_fee = true;
            matched = true;
        }
        matched
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentedDescription {
    pub features: AdditionalFeatures,
    /// Canonical sections (`cercanias`, `planta_baja`, `planta_alta`,
    /// `equipamiento`) that received at least one item.
    pub sections: IndexMap<String, Vec<String>>,
    /// Items outside any recognised section.
    pub amenities: Vec<String>,
}

pub fn segment_description(raw: &str) -> SegmentedDescription {
    let text = split_inline_bullets(&strip_invisible(raw));

    let mut state = SegmenterState::default();
    let mut features = AdditionalFeatures::default();

    for line in text.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let single = clean_single_line(line);
        let keyword_only = features.scan(&single);

        let normalized = match line.strip_prefix(LEADING_BULLETS) {
            Some(rest) => format!("-{rest}"),
            None => line.to_string(),
        };

        if let Some(header) = find_header(&normalized) {
            state.open(section_key(&header));
            continue;
        }

        if let Some(caps) = RE_LIST_ITEM.captures(&normalized) {
            let item = clean_single_line(&caps[1]);
            if !item.is_empty() && !keyword_only {
                state.emit(item);
            }
        } else if single.split_whitespace().count() < LOOSE_ITEM_MAX_WORDS
            && state.current != Section::Amenities
            && !single.is_empty()
            && !keyword_only
        {
            state.emit(single);
        }
    }

    fold_sections(state, features)
}

/// Meta-tag descriptions arrive on a single line; break them before each bullet.
fn split_inline_bullets(text: &str) -> String {
    if text.trim().contains('\n') || !text.contains(BULLET_GLYPHS) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 16);
    for (i, c) in text.char_indices() {
        if i > 0 && BULLET_GLYPHS.contains(&c) {
            out.truncate(out.trim_end().len());
            out.push('\n');
        }
        out.push(c);
    }
    out
}

fn find_header(line: &str) -> Option<String> {
    let cleaned = clean_single_line(line);
    let caps = RE_HEADER_SHAPE
        .captures(&cleaned)
        .or_else(|| RE_KNOWN_HEADER.captures(&cleaned))?;
    Some(caps[1].trim_end_matches(':').trim().to_string())
}

fn section_key(header: &str) -> String {
    if RE_NEARBY_HEADER.is_match(header) {
        NEARBY_SECTION.to_string()
    } else if RE_EQUIPMENT_HEADER.is_match(header) {
        EQUIPMENT_SECTION.to_string()
    } else {
        normalize_key(&clean_single_line(header))
    }
}

fn canonical_section(key: &str) -> &str {
    if key.contains("cercania") {
        NEARBY_SECTION
    } else if key.contains(GROUND_FLOOR_SECTION) {
        GROUND_FLOOR_SECTION
    } else if key.contains(UPPER_FLOOR_SECTION) {
        UPPER_FLOOR_SECTION
    } else {
        key
    }
}

fn fold_sections(state: SegmenterState, features: AdditionalFeatures) -> SegmentedDescription {
    let mut amenities = state.amenities;
    let mut sections: IndexMap<String, Vec<String>> = IndexMap::new();

    for (key, items) in state.named {
        if items.is_empty() {
            continue;
        }
        let canonical = canonical_section(&key);
        if KNOWN_SECTIONS.contains(&canonical) {
            sections
                .entry(canonical.to_string())
                .or_default()
                .extend(items);
        } else {
            amenities.extend(items);
        }
    }

    amenities.retain(|item| item.chars().count() >= MIN_AMENITY_CHARS);

    SegmentedDescription {
        features,
        sections,
        amenities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiable_price_line_is_never_emitted() {
        let segmented = segment_description("Equipamiento:\n- Cisterna\n*Precio a tratar*\n- Boiler");

        assert!(segmented.features.negotiable_price);
        assert!(!segmented.features.no_maintenance_fee);
        assert_eq!(
            segmented.sections.get(EQUIPMENT_SECTION),
            Some(&vec!["Cisterna".to_string(), "Boiler".to_string()])
        );
        assert!(
            segmented
                .sections
                .values()
                .flatten()
                .chain(&segmented.amenities)
                .all(|item| !item.to_lowercase().contains("precio"))
        );

        let Some(FieldValue::Flags(flags)) = segmented.features.to_field() else {
            panic!("Expected flags");
        };
        assert_eq!(flags.get("precio_negociable"), Some(&true));
        assert!(!flags.contains_key("no_paga_mantenimiento"));
    }

    #[test]
    fn test_no_flags_yields_no_field() {
        let segmented = segment_description("- Alberca\n- Jardín");
        assert!(!segmented.features.any());
        assert_eq!(segmented.features.to_field(), None);
    }

    #[test]
    fn test_floor_sections_and_bullet_normalization() {
        let raw = "Hermosa casa, lista para habitar.\n\nPlanta Baja:\n• Sala comedor\n> Cocina integral\nPlanta Alta:\n* Recámara principal con vestidor\n* 2 recámaras secundarias";
        let segmented = segment_description(raw);

        assert_eq!(
            segmented.sections.get(GROUND_FLOOR_SECTION),
            Some(&vec!["Sala comedor".to_string(), "Cocina integral".to_string()])
        );
        assert_eq!(
            segmented.sections.get(UPPER_FLOOR_SECTION),
            Some(&vec![
                "Recámara principal con vestidor".to_string(),
                "2 recámaras secundarias".to_string()
            ])
        );
        assert!(segmented.amenities.is_empty());
    }

    #[test]
    fn test_nearby_synonyms_and_loose_items() {
        let raw = "Servicios en la zona:\nEscuelas a 5 min.\nHospital Ángeles (10 min)\nCercanías\n- Metro Insurgentes";
        let segmented = segment_description(raw);

        assert_eq!(
            segmented.sections.get(NEARBY_SECTION),
            Some(&vec![
                "Escuelas a 5 min.".to_string(),
                "Hospital Ángeles (10 min)".to_string(),
                "Metro Insurgentes".to_string()
            ])
        );
        assert_eq!(segmented.sections.len(), 1);
    }

    #[test]
    fn test_loose_lines_ignored_outside_sections() {
        let segmented = segment_description("Casa amplia, bien ubicada.\nExcelente inversión, no la dejes pasar.");
        assert!(segmented.sections.is_empty());
        assert!(segmented.amenities.is_empty());
    }

    #[test]
    fn test_unknown_sections_fold_into_amenities() {
        let raw = "- Alberca\n- TV\nExtras:\n- Roof garden\n- Gimnasio";
        let segmented = segment_description(raw);

        assert_eq!(
            segmented.amenities,
            vec!["Alberca", "Roof garden", "Gimnasio"]
        );
        assert!(segmented.sections.is_empty());
    }

    #[test]
    fn test_meta_description_split_on_bullets() {
        let raw = "Departamento céntrico • Elevador • Roof garden • Gimnasio";
        let segmented = segment_description(raw);
        assert_eq!(
            segmented.amenities,
            vec!["Elevador", "Roof garden", "Gimnasio"]
        );
    }

    #[test]
    fn test_split_inline_bullets() {
        assert_eq!(
            split_inline_bullets("Casa • Alberca  • Jardín"),
            "Casa\n• Alberca\n• Jardín"
        );
        assert_eq!(split_inline_bullets("- Uno - Dos"), "- Uno\n- Dos");
        assert_eq!(split_inline_bullets("Sin viñetas"), "Sin viñetas");
        assert_eq!(split_inline_bullets("Uno\n- Dos - Tres"), "Uno\n- Dos - Tres");
    }

    #[test]
    fn test_loose_items_longer_than_fourteen_words_are_dropped() {
        let fourteen = "Cocina amplia con barra, alacena y espacio para comedor de seis personas muy cómodas.";
        let fifteen = "Sala con doble altura, ventanales de piso a techo y vista al jardín del fraccionamiento.";
        assert_eq!(fourteen.split_whitespace().count(), 14);
        assert_eq!(fifteen.split_whitespace().count(), 15);

        let segmented = segment_description(&format!("Planta Baja:\n{fourteen}\n{fifteen}"));
        assert_eq!(
            segmented.sections.get(GROUND_FLOOR_SECTION),
            Some(&vec![fourteen.to_string()])
        );
    }

    #[test]
    fn test_known_header_followed_by_other_text() {
        let segmented = segment_description("Distribución, amplia\n- Sala\nCercanías (a pie):\n- Oxxo");
        assert_eq!(segmented.amenities, vec!["Sala"]);
        assert_eq!(
            segmented.sections.get(NEARBY_SECTION),
            Some(&vec!["Oxxo".to_string()])
        );
        assert_eq!(segmented.sections.len(), 1);
    }

    #[test]
    fn test_suffixed_section_keys_fold_into_canonical_ones() {
        let raw = "Planta baja y jardín:\n- Asador\nPrincipales cercanias:\n- Parque\nCercanías del metro:\n- Oxxo";
        let segmented = segment_description(raw);

        assert_eq!(
            segmented.sections.get(GROUND_FLOOR_SECTION),
            Some(&vec!["Asador".to_string()])
        );
        assert_eq!(
            segmented.sections.get(NEARBY_SECTION),
            Some(&vec!["Parque".to_string(), "Oxxo".to_string()])
        );
        assert_eq!(segmented.sections.len(), 2);
        assert!(segmented.amenities.is_empty());
    }

    #[test]
    fn test_no_maintenance_fee_flag() {
        let segmented = segment_description("Casa en condominio.\nNo paga mantenimiento");
        assert!(segmented.features.no_maintenance_fee);
        assert!(!segmented.features.negotiable_price);
    }

    #[test]
    fn test_empty_description() {
        assert_eq!(segment_description(""), SegmentedDescription::default());
        assert_eq!(segment_description("\u{200B}\n \n"), SegmentedDescription::default());
    }
}
