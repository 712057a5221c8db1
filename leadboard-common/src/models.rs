//! Lead, stage and stats models
//!
//! These are the API-facing shapes (camelCase on the wire). Storage records
//! and the column mapping live in [`crate::fields`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Questionnaire answers keyed by question id (`q1`..`qN`)
///
/// Partial sets are allowed. Empty strings count as unanswered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Questionnaire(BTreeMap<String, String>);

impl Questionnaire {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether `key` holds a non-blank answer
    pub fn is_answered(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.trim().is_empty())
    }

    /// Number of non-blank answers among `keys`
    pub fn answered_among<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> usize {
        keys.into_iter().filter(|k| self.is_answered(k)).count()
    }

    /// Shallow merge: every key in `update` overwrites the stored answer
    pub fn merge(&mut self, update: &Questionnaire) {
        for (key, answer) in &update.0 {
            self.0.insert(key.clone(), answer.clone());
        }
    }

    /// Merged copy of `self` with `update` applied on top
    pub fn merged_with(&self, update: &Questionnaire) -> Questionnaire {
        let mut merged = self.clone();
        merged.merge(update);
        merged
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Questionnaire {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Overall intent category returned by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Overall {
    #[serde(rename = "High Intent")]
    High,
    #[serde(rename = "Medium Intent")]
    Medium,
    #[serde(rename = "Low Intent")]
    Low,
}

impl Overall {
    pub const ALL: [Overall; 3] = [Overall::High, Overall::Medium, Overall::Low];

    pub fn label(&self) -> &'static str {
        match self {
            Overall::High => "High Intent",
            Overall::Medium => "Medium Intent",
            Overall::Low => "Low Intent",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.label() == label)
    }
}

/// Structured assessment: two 0-10 sub-scores plus a category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub likelihood: f64,
    pub benefits: f64,
    pub overall: Overall,
}

/// Lead qualification status
///
/// Wire form is `"Pending"`, `"Incomplete"` or
/// `{"likelihood": .., "benefits": .., "overall": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "AssessmentRepr", into = "AssessmentRepr")]
pub enum Assessment {
    #[default]
    Pending,
    Incomplete,
    Scored(AssessmentResult),
}

impl Assessment {
    pub fn is_scored(&self) -> bool {
        matches!(self, Assessment::Scored(_))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AssessmentRepr {
    Status(String),
    Scored(AssessmentResult),
}

impl TryFrom<AssessmentRepr> for Assessment {
    type Error = String;

    fn try_from(repr: AssessmentRepr) -> Result<Self, Self::Error> {
        match repr {
            AssessmentRepr::Status(s) => match s.as_str() {
                "Pending" => Ok(Assessment::Pending),
                "Incomplete" => Ok(Assessment::Incomplete),
                other => Err(format!("unknown assessment status '{}'", other)),
            },
            AssessmentRepr::Scored(result) => Ok(Assessment::Scored(result)),
        }
    }
}

impl From<Assessment> for AssessmentRepr {
    fn from(assessment: Assessment) -> Self {
        match assessment {
            Assessment::Pending => AssessmentRepr::Status("Pending".to_string()),
            Assessment::Incomplete => AssessmentRepr::Status("Incomplete".to_string()),
            Assessment::Scored(result) => AssessmentRepr::Scored(result),
        }
    }
}

/// Contact details; keys other than email/phone are preserved as-is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A prospective customer tracked through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub source: String,
    pub avatar: Option<String>,
    pub tags: Vec<String>,
    pub stage_id: String,
    pub questionnaire: Questionnaire,
    pub assessment: Assessment,
    pub contact_info: Option<ContactInfo>,

    pub sms_status: Option<String>,
    pub send_time: Option<DateTime<Utc>>,
    pub verified_time: Option<DateTime<Utc>>,
    pub consult_date: Option<DateTime<Utc>>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub call_scheduled: bool,
    pub call_notes: Option<String>,
    pub score: Option<i64>,
    pub qual_score: Option<i64>,
    pub priority: Option<String>,
    pub financing: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub inbox_link: Option<String>,
    pub summary: Option<String>,

    pub age: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub location: Option<String>,
    pub health_insurance: Option<String>,
    pub service_timeframe: Option<String>,
    pub demographic: Option<Value>,
    pub message_history: Option<Value>,
    pub convo_history: Option<Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named pipeline position (board column)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: String,
    pub title: String,
    #[sqlx(rename = "sort_order")]
    pub order: i64,
    pub description: Option<String>,
    pub color: Option<String>,
    #[sqlx(rename = "stage_group")]
    pub group: Option<String>,
}

/// Dashboard counters, derived from the lead table on each read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_leads: i64,
    pub new_leads_today: i64,
    pub consults_booked: i64,
    pub sms_response_rate: i64,
    pub updated_at: DateTime<Utc>,
}
