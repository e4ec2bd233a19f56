//! Human-readable renderings of amounts, areas and whole listings.

use crate::types::PropertyRecord;

const MAX_LISTED_AMENITIES: usize = 10;
const CONTACT_LINE: &str = "\n📞 ¡Contáctanos para más información!";

/// `"$1,234,567 MXN"`. Decimals are truncated; `None` renders as `$0 MXN`.
pub fn fmt_money(amount: Option<f64>) -> String {
    let whole = amount.filter(|a| a.is_finite()).map_or(0, |a| a.trunc() as i64);
    format!("${} MXN", group_thousands(whole))
}

/// `"150 m²"`, truncated.
pub fn m2(area: Option<f64>) -> String {
    let whole = area.filter(|a| a.is_finite()).map_or(0, |a| a.trunc() as i64);
    format!("{whole} m²")
}

pub fn plural(count: f64, singular: &str, plural_form: Option<&str>) -> String {
    if count == 1.0 {
        return singular.to_string();
    }
    match plural_form {
        Some(form) => form.to_string(),
        None => format!("{singular}s"),
    }
}

/// Lenient conversion of a money or area string; thousands separators are
/// ignored.
pub fn money_amount(text: &str) -> Option<f64> {
    text.trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Plain-text body for republishing a listing on a marketplace.
pub fn listing_body(record: &PropertyRecord) -> String {
    let mut parts = Vec::new();

    let rooms: Vec<String> = [
        ("recámaras", "recámara"),
        ("baños", "baño"),
    ]
    .into_iter()
    .filter_map(|(key, singular)| {
        let count = record.number(key).filter(|n| *n != 0.0)?;
        Some(format!("{} {}", count, plural(count, singular, Some(key))))
    })
    .collect();
    if !rooms.is_empty() {
        parts.push(rooms.join(" • "));
    }

    if let Some(area) = record.number("m²_construcción").filter(|a| *a != 0.0) {
        parts.push(format!("Área: {}", m2(Some(area))));
    }

    if let Some(amenities) = record.list("amenidades")
        && !amenities.is_empty()
    {
        parts.push("\n🏠 Características:".to_string());
        parts.extend(
            amenities
                .iter()
                .take(MAX_LISTED_AMENITIES)
                .map(|amenity| format!("• {amenity}")),
        );
    }

    if let Some(description) = record.text("descripcion") {
        parts.push(format!("\n{description}"));
    }

    parts.push(CONTACT_LINE.to_string());
    parts.join("\n")
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidator::RecordConsolidator;
    use crate::types::PartialRecord;

    #[test]
    fn test_fmt_money() {
        assert_eq!(fmt_money(Some(1234567.0)), "$1,234,567 MXN");
        assert_eq!(fmt_money(Some(1234567.89)), "$1,234,567 MXN");
        assert_eq!(fmt_money(Some(999.0)), "$999 MXN");
        assert_eq!(fmt_money(Some(-1500.0)), "$-1,500 MXN");
        assert_eq!(fmt_money(None), "$0 MXN");
        assert_eq!(fmt_money(Some(f64::NAN)), "$0 MXN");
    }

    #[test]
    fn test_m2() {
        assert_eq!(m2(Some(150.9)), "150 m²");
        assert_eq!(m2(Some(200.0)), "200 m²");
        assert_eq!(m2(None), "0 m²");
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1.0, "recámara", Some("recámaras")), "recámara");
        assert_eq!(plural(2.0, "recámara", Some("recámaras")), "recámaras");
        assert_eq!(plural(0.0, "baño", None), "baños");
        assert_eq!(plural(2.5, "baño", Some("baños")), "baños");
    }

    #[test]
    fn test_money_amount() {
        assert_eq!(money_amount("1,234.50"), Some(1234.5));
        assert_eq!(money_amount(" 200 "), Some(200.0));
        assert_eq!(money_amount("not a number"), None);
        assert_eq!(money_amount(""), None);
    }

    #[test]
    fn test_listing_body() {
        let mut fields = PartialRecord::new();
        fields.insert("recámaras", 3.0);
        fields.insert("baños", 1.0);
        fields.insert("m²_construcción", 180.0);
        fields.insert("descripcion", "Casa amplia.");
        let amenities: Vec<String> = (1..=12).map(|i| format!("Amenidad {i:02}")).collect();
        let record = RecordConsolidator::new(2025).finalize(fields, amenities);

        let body = listing_body(&record);
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines[0], "3 recámaras • 1 baño");
        assert_eq!(lines[1], "Área: 180 m²");
        assert_eq!(lines[3], "🏠 Características:");
        assert_eq!(lines[4], "• Amenidad 01");
        assert_eq!(lines.iter().filter(|l| l.starts_with("• ")).count(), 10);
        assert!(!body.contains("Amenidad 11"));
        assert!(body.contains("\n\nCasa amplia.\n"));
        assert!(body.ends_with("📞 ¡Contáctanos para más información!"));
    }

    #[test]
    fn test_listing_body_without_details() {
        let record = RecordConsolidator::new(2025).finalize(PartialRecord::new(), vec![]);
        assert_eq!(
            listing_body(&record),
            "\n📞 ¡Contáctanos para más información!"
        );
    }
}
