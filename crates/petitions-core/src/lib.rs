//! Core petition types, record extraction, deduplication, and chi-square significance.

pub mod chi;
pub mod contingency;
pub mod dedup;
pub mod extract;
pub mod petition;
pub mod schema;

pub use chi::{ChiAnalysis, ChiSquareSummary, Direction, RegionRow, ResidualRecord, SIGNIFICANCE};
pub use contingency::ContingencyTable;
pub use dedup::{DEFAULT_THRESHOLD, dedup_by_id, qualifying};
pub use extract::{ExtractionError, extract_constituency_signatures, extract_petition};
pub use petition::{ClassificationResult, ClassifiedPetition, ConstituencySignature, Petition};
