//! Field normalization between storage columns and API field names
//!
//! Every writable lead field is a [`LeadField`] variant; its storage column,
//! camelCase API name and value kind are fixed by exhaustive matches, so an
//! unknown request key never reaches SQL. [`LeadRecord`] is the raw
//! `leads` row (snake_case columns, JSON sub-objects as text) and decodes
//! into the API-facing [`Lead`].

use crate::models::{Assessment, ContactInfo, Lead, Questionnaire};
use crate::time::parse_timestamp;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// How a field's value is parsed and stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Text stored in a non-null column; null reads as "not supplied"
    RequiredText,
    /// Nullable text (numbers are accepted and stringified)
    Text,
    Integer,
    Bool,
    /// Nullable timestamp; unparseable input rejects only this field
    Timestamp,
    Tags,
    Stage,
    Questionnaire,
    Assessment,
    ContactInfo,
    /// Free-form JSON stored as text
    Json,
}

/// Allow-listed lead fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LeadField {
    Name,
    Username,
    Source,
    Avatar,
    Tags,
    StageId,
    Questionnaire,
    Assessment,
    ContactInfo,
    SmsStatus,
    SendTime,
    VerifiedTime,
    ConsultDate,
    FollowUpDate,
    CallScheduled,
    CallNotes,
    Score,
    QualScore,
    Priority,
    Financing,
    Reason,
    Notes,
    InboxLink,
    Summary,
    Age,
    Height,
    Weight,
    Location,
    HealthInsurance,
    ServiceTimeframe,
    Demographic,
    MessageHistory,
    ConvoHistory,
}

impl LeadField {
    pub const ALL: [LeadField; 33] = [
        LeadField::Name,
        LeadField::Username,
        LeadField::Source,
        LeadField::Avatar,
        LeadField::Tags,
        LeadField::StageId,
        LeadField::Questionnaire,
        LeadField::Assessment,
        LeadField::ContactInfo,
        LeadField::SmsStatus,
        LeadField::SendTime,
        LeadField::VerifiedTime,
        LeadField::ConsultDate,
        LeadField::FollowUpDate,
        LeadField::CallScheduled,
        LeadField::CallNotes,
        LeadField::Score,
        LeadField::QualScore,
        LeadField::Priority,
        LeadField::Financing,
        LeadField::Reason,
        LeadField::Notes,
        LeadField::InboxLink,
        LeadField::Summary,
        LeadField::Age,
        LeadField::Height,
        LeadField::Weight,
        LeadField::Location,
        LeadField::HealthInsurance,
        LeadField::ServiceTimeframe,
        LeadField::Demographic,
        LeadField::MessageHistory,
        LeadField::ConvoHistory,
    ];

    /// Storage column in the `leads` table
    pub fn column(self) -> &'static str {
        match self {
            LeadField::Name => "name",
            LeadField::Username => "username",
            LeadField::Source => "source",
            LeadField::Avatar => "avatar",
            LeadField::Tags => "tags",
            LeadField::StageId => "stage_id",
            LeadField::Questionnaire => "questionnaire",
            LeadField::Assessment => "assessment",
            LeadField::ContactInfo => "contact_info",
            LeadField::SmsStatus => "sms_status",
            LeadField::SendTime => "send_time",
            LeadField::VerifiedTime => "verified_time",
            LeadField::ConsultDate => "consult_date",
            LeadField::FollowUpDate => "follow_up_date",
            LeadField::CallScheduled => "call_scheduled",
            LeadField::CallNotes => "call_notes",
            LeadField::Score => "score",
            LeadField::QualScore => "qual_score",
            LeadField::Priority => "priority",
            LeadField::Financing => "financing",
            LeadField::Reason => "reason",
            LeadField::Notes => "notes",
            LeadField::InboxLink => "inbox_link",
            LeadField::Summary => "summary",
            LeadField::Age => "age",
            LeadField::Height => "height",
            LeadField::Weight => "weight",
            LeadField::Location => "location",
            LeadField::HealthInsurance => "health_insurance",
            LeadField::ServiceTimeframe => "service_timeframe",
            LeadField::Demographic => "demographic",
            LeadField::MessageHistory => "message_history",
            LeadField::ConvoHistory => "convo_history",
        }
    }

    /// camelCase name used in requests and responses
    pub fn api_name(self) -> &'static str {
        match self {
            LeadField::Name => "name",
            LeadField::Username => "username",
            LeadField::Source => "source",
            LeadField::Avatar => "avatar",
            LeadField::Tags => "tags",
            LeadField::StageId => "stageId",
            LeadField::Questionnaire => "questionnaire",
            LeadField::Assessment => "assessment",
            LeadField::ContactInfo => "contactInfo",
            LeadField::SmsStatus => "smsStatus",
            LeadField::SendTime => "sendTime",
            LeadField::VerifiedTime => "verifiedTime",
            LeadField::ConsultDate => "consultDate",
            LeadField::FollowUpDate => "followUpDate",
            LeadField::CallScheduled => "callScheduled",
            LeadField::CallNotes => "callNotes",
            LeadField::Score => "score",
            LeadField::QualScore => "qualScore",
            LeadField::Priority => "priority",
            LeadField::Financing => "financing",
            LeadField::Reason => "reason",
            LeadField::Notes => "notes",
            LeadField::InboxLink => "inboxLink",
            LeadField::Summary => "summary",
            LeadField::Age => "age",
            LeadField::Height => "height",
            LeadField::Weight => "weight",
            LeadField::Location => "location",
            LeadField::HealthInsurance => "healthInsurance",
            LeadField::ServiceTimeframe => "serviceTimeframe",
            LeadField::Demographic => "demographic",
            LeadField::MessageHistory => "messageHistory",
            LeadField::ConvoHistory => "convoHistory",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            LeadField::Name | LeadField::Username | LeadField::Source => FieldKind::RequiredText,
            LeadField::Tags => FieldKind::Tags,
            LeadField::StageId => FieldKind::Stage,
            LeadField::Questionnaire => FieldKind::Questionnaire,
            LeadField::Assessment => FieldKind::Assessment,
            LeadField::ContactInfo => FieldKind::ContactInfo,
            LeadField::SendTime
            | LeadField::VerifiedTime
            | LeadField::ConsultDate
            | LeadField::FollowUpDate => FieldKind::Timestamp,
            LeadField::CallScheduled => FieldKind::Bool,
            LeadField::Score | LeadField::QualScore => FieldKind::Integer,
            LeadField::Demographic | LeadField::MessageHistory | LeadField::ConvoHistory => {
                FieldKind::Json
            }
            LeadField::Avatar
            | LeadField::SmsStatus
            | LeadField::CallNotes
            | LeadField::Priority
            | LeadField::Financing
            | LeadField::Reason
            | LeadField::Notes
            | LeadField::InboxLink
            | LeadField::Summary
            | LeadField::Age
            | LeadField::Height
            | LeadField::Weight
            | LeadField::Location
            | LeadField::HealthInsurance
            | LeadField::ServiceTimeframe => FieldKind::Text,
        }
    }

    /// Resolve a request key
    ///
    /// Accepts the camelCase API name, the snake_case column name, and the
    /// legacy `columnId` / `column_id` spelling of `stageId`. The flag is
    /// true when the key was the canonical API name.
    pub fn from_key(key: &str) -> Option<(LeadField, bool)> {
        if let Some(field) = Self::ALL.into_iter().find(|f| f.api_name() == key) {
            return Some((field, true));
        }
        if matches!(key, "columnId" | "column_id") {
            return Some((LeadField::StageId, false));
        }
        Self::ALL
            .into_iter()
            .find(|f| f.column() == key)
            .map(|f| (f, false))
    }
}

/// Split comma-joined tag input into trimmed, non-empty tags
///
/// Accepts an array of strings, a single string, or a one-element array
/// whose element is itself comma-joined.
pub fn split_tags(value: &Value) -> std::result::Result<Vec<String>, String> {
    let raw: Vec<&str> = match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().ok_or("tags must be strings"))
            .collect::<std::result::Result<_, _>>()?,
        _ => return Err("expected an array of strings or a comma-separated string".to_string()),
    };

    Ok(raw
        .into_iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect())
}

/// Parsed value for one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    Integer(Option<i64>),
    Bool(bool),
    Timestamp(Option<DateTime<Utc>>),
    Tags(Vec<String>),
    Stage(String),
    Questionnaire(Questionnaire),
    Assessment(Assessment),
    ContactInfo(Option<ContactInfo>),
    Json(Option<Value>),
}

/// Value encoded for a storage column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(Option<String>),
    Integer(Option<i64>),
    Bool(bool),
    Timestamp(Option<DateTime<Utc>>),
}

impl FieldValue {
    /// Encode for storage; JSON sub-objects become JSON text
    pub fn encode(&self) -> Result<ColumnValue> {
        Ok(match self {
            FieldValue::Text(v) => ColumnValue::Text(v.clone()),
            FieldValue::Stage(v) => ColumnValue::Text(Some(v.clone())),
            FieldValue::Integer(v) => ColumnValue::Integer(*v),
            FieldValue::Bool(v) => ColumnValue::Bool(*v),
            FieldValue::Timestamp(v) => ColumnValue::Timestamp(*v),
            FieldValue::Tags(v) => ColumnValue::Text(Some(serde_json::to_string(v)?)),
            FieldValue::Questionnaire(v) => ColumnValue::Text(Some(serde_json::to_string(v)?)),
            FieldValue::Assessment(v) => ColumnValue::Text(Some(serde_json::to_string(v)?)),
            FieldValue::ContactInfo(v) => ColumnValue::Text(
                v.as_ref().map(serde_json::to_string).transpose()?,
            ),
            FieldValue::Json(v) => {
                ColumnValue::Text(v.as_ref().map(serde_json::to_string).transpose()?)
            }
        })
    }
}

/// Why a single field could not be taken from a request
#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    /// Whole request is malformed
    Invalid(String),
    /// Only this field is dropped; the rest of the update proceeds
    Rejected(String),
}

/// Parse one JSON value as `field`
pub fn parse_field(field: LeadField, value: &Value) -> std::result::Result<FieldValue, FieldError> {
    let invalid = |msg: &str| FieldError::Invalid(msg.to_string());

    match field.kind() {
        FieldKind::RequiredText => match value {
            Value::Null => Ok(FieldValue::Text(None)),
            Value::String(s) => Ok(FieldValue::Text(Some(s.trim().to_string()))),
            Value::Number(n) => Ok(FieldValue::Text(Some(n.to_string()))),
            _ => Err(invalid("expected a string")),
        },
        FieldKind::Text => match value {
            Value::Null => Ok(FieldValue::Text(None)),
            Value::String(s) => Ok(FieldValue::Text(Some(s.clone()))),
            Value::Number(n) => Ok(FieldValue::Text(Some(n.to_string()))),
            _ => Err(invalid("expected a string")),
        },
        FieldKind::Integer => match value {
            Value::Null => Ok(FieldValue::Integer(None)),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| {
                    // Outside this range `as` would saturate
                    let range = i64::MIN as f64..i64::MAX as f64;
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && range.contains(f))
                        .map(|f| f as i64)
                })
                .map(|i| FieldValue::Integer(Some(i)))
                .ok_or_else(|| invalid("expected an integer")),
            Value::String(s) if s.trim().is_empty() => Ok(FieldValue::Integer(None)),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(|i| FieldValue::Integer(Some(i)))
                .map_err(|_| invalid("expected an integer")),
            _ => Err(invalid("expected an integer")),
        },
        FieldKind::Bool => match value {
            Value::Bool(b) => Ok(FieldValue::Bool(*b)),
            Value::Null => Ok(FieldValue::Bool(false)),
            Value::String(s) if s == "true" => Ok(FieldValue::Bool(true)),
            Value::String(s) if s == "false" => Ok(FieldValue::Bool(false)),
            _ => Err(invalid("expected a boolean")),
        },
        FieldKind::Timestamp => match value {
            Value::Null => Ok(FieldValue::Timestamp(None)),
            Value::String(s) if s.trim().is_empty() => Ok(FieldValue::Timestamp(None)),
            Value::String(s) => parse_timestamp(s)
                .map(|t| FieldValue::Timestamp(Some(t)))
                .ok_or_else(|| FieldError::Rejected(format!("unparseable date/time '{}'", s))),
            _ => Err(FieldError::Rejected("expected a date/time string".to_string())),
        },
        FieldKind::Tags => split_tags(value)
            .map(FieldValue::Tags)
            .map_err(FieldError::Invalid),
        FieldKind::Stage => match value {
            Value::String(s) if !s.trim().is_empty() => Ok(FieldValue::Stage(s.trim().to_string())),
            _ => Err(invalid("expected a stage id")),
        },
        FieldKind::Questionnaire => parse_questionnaire(value).map(FieldValue::Questionnaire),
        FieldKind::Assessment => serde_json::from_value::<Assessment>(value.clone())
            .map(FieldValue::Assessment)
            .map_err(|e| FieldError::Invalid(e.to_string())),
        FieldKind::ContactInfo => match value {
            Value::Null => Ok(FieldValue::ContactInfo(None)),
            Value::Object(_) => serde_json::from_value::<ContactInfo>(value.clone())
                .map(|c| FieldValue::ContactInfo(Some(c)))
                .map_err(|e| FieldError::Invalid(e.to_string())),
            // Some senders double-encode the object
            Value::String(s) => serde_json::from_str::<ContactInfo>(s)
                .map(|c| FieldValue::ContactInfo(Some(c)))
                .map_err(|_| invalid("expected an object with email/phone")),
            _ => Err(invalid("expected an object with email/phone")),
        },
        FieldKind::Json => Ok(FieldValue::Json(match value {
            Value::Null => None,
            other => Some(other.clone()),
        })),
    }
}

/// Questionnaire answers may arrive as strings or numbers; null clears
fn parse_questionnaire(value: &Value) -> std::result::Result<Questionnaire, FieldError> {
    let Value::Object(map) = value else {
        return Err(FieldError::Invalid("expected an object of answers".to_string()));
    };

    map.iter()
        .map(|(key, answer)| {
            let answer = match answer {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Null => String::new(),
                _ => {
                    return Err(FieldError::Invalid(format!(
                        "answer for '{}' must be a string or number",
                        key
                    )))
                }
            };
            Ok((key.clone(), answer))
        })
        .collect()
}

/// A field dropped from an otherwise-accepted update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedField {
    pub field: String,
    pub reason: String,
}

/// Set of typed field values to write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadPatch {
    values: BTreeMap<LeadField, FieldValue>,
}

impl LeadPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: LeadField, value: FieldValue) {
        self.values.insert(field, value);
    }

    pub fn get(&self, field: LeadField) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    pub fn remove(&mut self, field: LeadField) -> Option<FieldValue> {
        self.values.remove(&field)
    }

    pub fn contains(&self, field: LeadField) -> bool {
        self.values.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LeadField, &FieldValue)> {
        self.values.iter().map(|(f, v)| (*f, v))
    }

    pub fn stage_id(&self) -> Option<&str> {
        match self.get(LeadField::StageId) {
            Some(FieldValue::Stage(id)) => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn questionnaire(&self) -> Option<&Questionnaire> {
        match self.get(LeadField::Questionnaire) {
            Some(FieldValue::Questionnaire(q)) => Some(q),
            _ => None,
        }
    }

    pub fn text(&self, field: LeadField) -> Option<&str> {
        match self.get(field) {
            Some(FieldValue::Text(Some(s))) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Result of filtering a request body through the allow-list
#[derive(Debug, Clone, Default)]
pub struct ParsedPatch {
    pub patch: LeadPatch,
    pub rejected: Vec<RejectedField>,
    /// Keys that matched no allow-listed field
    pub ignored: Vec<String>,
}

/// Filter and parse a request body into a [`LeadPatch`]
///
/// Unknown keys are ignored. A canonical camelCase key wins over an alias
/// for the same field, and a losing alias is never parsed.
pub fn parse_patch(body: &Map<String, Value>) -> Result<ParsedPatch> {
    let mut parsed = ParsedPatch::default();
    let mut winners: BTreeMap<LeadField, (&Value, bool)> = BTreeMap::new();

    for (key, value) in body {
        let Some((field, canonical)) = LeadField::from_key(key) else {
            debug!(key = %key, "Dropping field not in allow-list");
            parsed.ignored.push(key.clone());
            continue;
        };

        match winners.get(&field) {
            Some((_, true)) => {}
            Some((_, false)) if !canonical => {}
            _ => {
                winners.insert(field, (value, canonical));
            }
        }
    }

    for (field, (value, _)) in winners {
        match parse_field(field, value) {
            Ok(v) => parsed.patch.set(field, v),
            Err(FieldError::Rejected(reason)) => {
                warn!(field = field.api_name(), reason = %reason, "Rejecting field value");
                parsed.rejected.push(RejectedField {
                    field: field.api_name().to_string(),
                    reason,
                });
            }
            Err(FieldError::Invalid(message)) => {
                return Err(Error::validation(field.api_name(), message));
            }
        }
    }

    Ok(parsed)
}

/// Raw `leads` row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeadRecord {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub source: String,
    pub avatar: Option<String>,
    pub tags: Option<String>,
    pub stage_id: String,
    pub questionnaire: Option<String>,
    pub assessment: Option<String>,
    pub contact_info: Option<String>,
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
    pub demographic: Option<String>,
    pub message_history: Option<String>,
    pub convo_history: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LeadRecord> for Lead {
    fn from(r: LeadRecord) -> Self {
        let id = r.id;
        Lead {
            id,
            name: r.name,
            username: r.username,
            source: r.source,
            avatar: r.avatar,
            tags: r.tags.as_deref().map(decode_tags).unwrap_or_default(),
            stage_id: r.stage_id,
            questionnaire: decode_json(id, "questionnaire", r.questionnaire.as_deref())
                .unwrap_or_default(),
            assessment: r
                .assessment
                .as_deref()
                .map(|s| decode_assessment(id, s))
                .unwrap_or_default(),
            contact_info: decode_json(id, "contact_info", r.contact_info.as_deref()),
            sms_status: r.sms_status,
            send_time: r.send_time,
            verified_time: r.verified_time,
            consult_date: r.consult_date,
            follow_up_date: r.follow_up_date,
            call_scheduled: r.call_scheduled,
            call_notes: r.call_notes,
            score: r.score,
            qual_score: r.qual_score,
            priority: r.priority,
            financing: r.financing,
            reason: r.reason,
            notes: r.notes,
            inbox_link: r.inbox_link,
            summary: r.summary,
            age: r.age,
            height: r.height,
            weight: r.weight,
            location: r.location,
            health_insurance: r.health_insurance,
            service_timeframe: r.service_timeframe,
            demographic: decode_json(id, "demographic", r.demographic.as_deref()),
            message_history: decode_json(id, "message_history", r.message_history.as_deref()),
            convo_history: decode_json(id, "convo_history", r.convo_history.as_deref()),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Stored tags are a JSON array; older rows may hold a plain comma list
fn decode_tags(raw: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(raw)
        .unwrap_or_else(|_| split_tags(&Value::String(raw.to_string())).unwrap_or_default())
}

/// Stored assessment is JSON; a bare status word is also tolerated
fn decode_assessment(lead_id: i64, raw: &str) -> Assessment {
    serde_json::from_str::<Assessment>(raw)
        .or_else(|_| serde_json::from_value::<Assessment>(Value::String(raw.trim().to_string())))
        .unwrap_or_else(|e| {
            warn!(lead_id, error = %e, "Unreadable stored assessment, treating as Pending");
            Assessment::Pending
        })
}

fn decode_json<T: serde::de::DeserializeOwned>(
    lead_id: i64,
    column: &str,
    raw: Option<&str>,
) -> Option<T> {
    let raw = raw.filter(|s| !s.trim().is_empty())?;
    match serde_json::from_str(raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(lead_id, column, error = %e, "Unreadable stored JSON column");
            None
        }
    }
}
