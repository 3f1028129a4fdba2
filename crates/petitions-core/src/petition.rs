//! Canonical petition records handed between pipeline stages.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One petition from the list endpoint, flattened.
///
/// `date_responded` and `date_debated` are `None` when the API omits the
/// government response or debate object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Petition {
    pub id: u64,
    pub url: String,
    pub state: String,
    pub action: String,
    pub background: String,
    pub additional_details: String,
    pub signature_count: u64,
    pub date_created: DateTime<Utc>,
    pub date_responded: Option<NaiveDate>,
    pub date_debated: Option<NaiveDate>,
}

impl Petition {
    /// Text sent to the classifier: the action followed by the background.
    pub fn classification_text(&self) -> String {
        format!("{} {}", self.action, self.background)
    }
}

/// Signatures for one petition in one constituency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstituencySignature {
    pub petition_id: u64,
    pub constituency: String,
    /// ONS area code, e.g. `E14000530`.
    pub region_code: String,
    pub signatures: u64,
}

/// Verdict from the text classifier for one piece of text.
///
/// Serialized with the service's own field name (`result`) so cached entries
/// and service responses share a shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(rename = "result")]
    pub is_environmental: bool,
    pub explanation: String,
}

/// Row of the petitions output table.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedPetition {
    pub petition: Petition,
    /// `None` for petitions below the signature threshold.
    pub classification: Option<ClassificationResult>,
}
