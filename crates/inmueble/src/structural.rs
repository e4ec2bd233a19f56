use std::sync::LazyLock;

use regex::Regex;

use crate::dom::{NodeChild, NodeQuery, QueryableNode, TextMode};
use crate::text::{clean_single_line, extract_number, normalize_key};
use crate::types::{Currency, FieldValue, PartialRecord};

static RE_SUMMARY_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"row fw-bold").expect("invalid regex: summary row"));

static RE_SUMMARY_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"col my-2").expect("invalid regex: summary item"));

static RE_SUBTITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"fs-4").expect("invalid regex: subtitle"));

static RE_PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"fs-3 fw-bold").expect("invalid regex: price"));

static RE_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"text-muted.*white-space").expect("invalid regex: description")
});

const DETAIL_CELL_CLASSES: [&str; 2] = [
    "col-sm-12 col-md-6 my-1",
    "col-sm-12 col-md-6 col-lg-4 my-2",
];

const NARRATIVE_EXCLUDED: [&str; 3] = ["precio", "operacion", "cuota"];

const NARRATIVE_PREFIX: &str = "La propiedad cuenta con ";

/// Ordered, duplicate-free phrases describing what a property has.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Narrative {
    fragments: Vec<String>,
}

impl Narrative {
    pub fn push(&mut self, fragment: String) {
        if !self.fragments.contains(&fragment) {
            self.fragments.push(fragment);
        }
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// `"La propiedad cuenta con a, b y c"`, or `None` with no fragments.
    pub fn sentence(&self) -> Option<String> {
        if self.fragments.is_empty() {
            return None;
        }
        let mut joined = self.fragments.join(", ");
        if let Some(pos) = joined.rfind(", ") {
            joined.replace_range(pos..pos + 2, " y ");
        }
        Some(format!("{NARRATIVE_PREFIX}{joined}"))
    }
}

impl<S: Into<String>> FromIterator<S> for Narrative {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut narrative = Narrative::default();
        for fragment in iter {
            narrative.push(fragment.into());
        }
        narrative
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailExtraction {
    pub fields: PartialRecord,
    /// Labels that appeared without a value, e.g. "Alberca".
    pub bare_amenities: Vec<String>,
    pub narrative: Narrative,
}

/// Main content container of a listing page, falling back to `<body>`.
pub fn content_root<N: QueryableNode>(document: &N) -> N {
    document
        .find(&NodeQuery::tag("div").id("detallePropiedad"))
        .or_else(|| document.find(&NodeQuery::tag("body")))
        .unwrap_or_else(|| document.clone())
}

pub fn extract_identity<N: QueryableNode>(content: &N, url: &str) -> PartialRecord {
    let mut data = PartialRecord::new();
    data.insert("url", url);

    let anchors = [
        ("titulo", NodeQuery::tag("h1")),
        ("subtitulo", NodeQuery::tag("h5").class_pattern(&RE_SUBTITLE)),
        ("direccion", NodeQuery::tag("h6").class_token("small")),
    ];
    for (key, query) in anchors {
        if let Some(node) = content.find(&query) {
            data.insert(key, clean_single_line(&node.extract_text(TextMode::Raw)));
        }
    }
    data
}

pub fn extract_price<N: QueryableNode>(content: &N) -> PartialRecord {
    let mut data = PartialRecord::new();
    let Some(price_tag) = content.find(&NodeQuery::tag("h6").class_pattern(&RE_PRICE)) else {
        return data;
    };

    let price_text = clean_single_line(&price_tag.extract_text(TextMode::Raw));
    if let Some(amount) = extract_number(&price_text) {
        data.insert("precio", amount);
    }
    if let Some(currency) = Currency::detect(&price_text) {
        data.insert("moneda", currency.code());
    }
    data
}

pub fn extract_summary<N: QueryableNode>(content: &N) -> PartialRecord {
    let mut data = PartialRecord::new();
    let Some(block) = content.find(&NodeQuery::tag("div").class_pattern(&RE_SUMMARY_ROW)) else {
        return data;
    };

    for item in block.find_all(&NodeQuery::tag("div").class_pattern(&RE_SUMMARY_ITEM)) {
        let Some(label) = item.find(&NodeQuery::tag("span").class_token("text-muted")) else {
            continue;
        };
        let key = normalize_key(&clean_single_line(&label.extract_text(TextMode::Raw)));

        let mut value_text = String::new();
        for sibling in label.next_sibling_nodes() {
            match sibling {
                NodeChild::Text(text) => {
                    value_text.push_str(text.trim());
                    value_text.push(' ');
                }
                NodeChild::Element(element) if element.tag_name() == "i" => break,
                NodeChild::Element(_) => {}
            }
        }

        if let Some(value) = extract_number(&clean_single_line(&value_text)) {
            data.insert(key, value);
        }
    }
    data
}

pub fn extract_details<N: QueryableNode>(content: &N) -> DetailExtraction {
    let queries = DETAIL_CELL_CLASSES.map(|class| NodeQuery::tag("div").class_contains(class));

    let mut fields = PartialRecord::new();
    let mut bare_amenities = Vec::new();
    let mut narrative = Narrative::default();

    for cell in content.find_any(&queries) {
        let Some((key, value)) = read_detail_cell(&cell) else {
            continue;
        };
        let key_normalized = normalize_key(&key);

        if !NARRATIVE_EXCLUDED
            .iter()
            .any(|word| key_normalized.contains(word))
        {
            narrative.push(match &value {
                Some(value) => format!("{} {}", key.to_lowercase(), value.to_lowercase()),
                None => key.to_lowercase(),
            });
        }

        match value {
            Some(value) => {
                if key_normalized.contains("precio_de_venta") {
                    fields.insert("operacion", "Venta");
                } else if key_normalized.contains("precio_de_renta") {
                    fields.insert("operacion", "Renta");
                } else if !key_normalized.contains("precio") {
                    let parsed = extract_number(&value)
                        .map(FieldValue::Number)
                        .unwrap_or(FieldValue::Text(value));
                    fields.insert(key_normalized, parsed);
                }
            }
            None => bare_amenities.push(key),
        }
    }

    if let Some(sentence) = narrative.sentence() {
        fields.insert("descripcion_amenidades", sentence);
    }
    bare_amenities.retain(|amenity| !fields.contains_key(&normalize_key(amenity)));

    DetailExtraction {
        fields,
        bare_amenities,
        narrative,
    }
}

/// Splits one detail cell into a label and an optional value.
fn read_detail_cell<N: QueryableNode>(cell: &N) -> Option<(String, Option<String>)> {
    let mut key = String::new();
    let mut value = String::new();

    if let Some(bold) = cell.find(&NodeQuery::tag("span").class_token("fw-bold")) {
        value = clean_single_line(&bold.extract_text(TextMode::Raw));
        let mut preceding = String::new();
        for child in cell.child_nodes() {
            match child {
                NodeChild::Element(element) if element == bold => break,
                NodeChild::Text(text) => {
                    preceding.push_str(text.trim());
                    preceding.push(' ');
                }
                NodeChild::Element(_) => {}
            }
        }
        key = clean_single_line(&preceding)
            .trim_end_matches(':')
            .trim()
            .to_string();
    }

    if key.is_empty() {
        let flat = clean_single_line(&cell.extract_text(TextMode::Joined {
            separator: " ",
            strip: true,
        }));
        if value.is_empty()
            && let Some((label, rest)) = flat.split_once(':')
        {
            key = clean_single_line(label);
            value = clean_single_line(rest);
        } else if !flat.is_empty() {
            let label = cell
                .child_nodes()
                .into_iter()
                .filter_map(|child| match child {
                    NodeChild::Text(text) => Some(text),
                    NodeChild::Element(_) => None,
                })
                .collect::<Vec<_>>()
                .join(" ");
            key = clean_single_line(&label);
            value.clear();
        }
    }

    if key.is_empty() {
        None
    } else {
        Some((key, Some(value).filter(|v| !v.is_empty())))
    }
}

/// Raw description text: the pre-formatted paragraph with its line breaks, or
/// the page's `og:description` meta tag when the paragraph is missing.
pub fn extract_description_text<N: QueryableNode>(content: &N, document: &N) -> Option<String> {
    let paragraph = content
        .find(&NodeQuery::tag("p").class_pattern(&RE_DESCRIPTION))
        .map(|p| {
            p.extract_text(TextMode::Joined {
                separator: "\n",
                strip: false,
            })
        })
        .filter(|text| !text.is_empty());

    paragraph.or_else(|| {
        let meta_content = document
            .find(&NodeQuery::tag("meta").attr("property", "og:description"))?
            .attribute("content")
            .filter(|c| !c.is_empty())?
            .to_string();
        log::debug!("Using og:description meta tag as description fallback");
        Some(meta_content)
    })
}
