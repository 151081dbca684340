pub mod client;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod pagination;
mod retry;
pub mod types;

pub use client::{CatalogOptions, Document, DocumentFetcher};
pub use error::ScraperError;
pub use extract::{extractor_for, SignalExtractor};
pub use normalize::parse_price;
pub use types::{CatalogProduct, CatalogResponse, CatalogVariant};
