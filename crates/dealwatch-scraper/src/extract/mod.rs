//! Signal extraction: one trait, three document shapes.
//!
//! Every extractor projects into [`SignalOutcome`]. A usable document that
//! carries no price signal is `NoSignal`, never an inactive observation, so
//! a template change or a stripped page cannot fake an Active→Inactive edge.

mod catalog;
mod html;
mod links;
mod structured;

use dealwatch_core::{SignalOutcome, TargetConfig, TargetKind};

use crate::client::Document;
use crate::error::ScraperError;

pub use catalog::CatalogExtractor;
pub use links::LinkDiscoveryExtractor;
pub use structured::StructuredMetadataExtractor;

/// Minimum gap for a reference price to count as a real discount.
pub(crate) const PRICE_TOLERANCE: rust_decimal::Decimal = rust_decimal::Decimal::from_parts(1, 0, 0, false, 2);

pub trait SignalExtractor {
    /// Reads a fetched document into an observation.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] only for documents that cannot be interpreted
    /// at all (e.g. an unparsable base URL). Missing data is `NoSignal`.
    fn extract(&self, document: &Document) -> Result<SignalOutcome, ScraperError>;
}

/// Picks the extractor for a target's kind.
#[must_use]
pub fn extractor_for(target: &TargetConfig) -> Box<dyn SignalExtractor + Send + Sync> {
    match target.kind {
        TargetKind::StructuredMetadata => Box::new(StructuredMetadataExtractor::from_target(target)),
        TargetKind::CatalogJson => Box::new(CatalogExtractor),
        TargetKind::LinkDiscovery => Box::new(LinkDiscoveryExtractor::from_target(target)),
    }
}
