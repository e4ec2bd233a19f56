use scraper::Html;

use crate::consolidator::{PageExtraction, RecordConsolidator};
use crate::segmenter::segment_description;
use crate::structural::{
    content_root, extract_description_text, extract_details, extract_identity, extract_price,
    extract_summary,
};
use crate::types::{PropertyRecord, RawPage};

pub fn parse_property_html(html: &str, url: &str, reference_year: i32) -> PropertyRecord {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let content = content_root(&root);

    let mut identity = extract_identity(&content, url);
    identity.merge(extract_price(&content));
    if !identity.contains_key("titulo") && !identity.contains_key("precio") {
        log::warn!("No title or price block found for {}", url);
    }

    let description = extract_description_text(&content, &root);
    let segments = description.as_deref().map(segment_description);

    RecordConsolidator::new(reference_year).consolidate(PageExtraction {
        identity,
        summary: extract_summary(&content),
        details: extract_details(&content),
        segments,
        description,
    })
}

pub fn parse_raw_page(page: &RawPage, reference_year: i32) -> PropertyRecord {
    parse_property_html(&page.html, &page.url, reference_year)
}
