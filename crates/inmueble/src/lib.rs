pub mod config;
pub mod consolidator;
pub mod dom;
pub mod format;
pub mod parser;
pub mod scraper;
pub mod segmenter;
pub mod structural;
pub mod text;
pub mod types;

pub use config::{ConfigError, FetchConfig};
pub use parser::parse_property_html;
pub use scraper::{ScraperError, WebScraper};
pub use types::{FieldValue, PropertyRecord, ScrapeOutcome};
