pub mod parser;
pub mod scraper;
pub mod types;
pub mod utils;

pub use scraper::{ScraperError, WebScraper};

pub const DEFAULT_URL: &str = "https://en.wikipedia.org/wiki/List_of_countries_by_GDP_(nominal)";
