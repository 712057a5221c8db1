//! Lead Update Orchestrator
//!
//! Entry point for every lead mutation. A request body is filtered through
//! the field allow-list, questionnaire answers are merged over the stored
//! ones, the assessment is recomputed when the questionnaire changes, the
//! target stage is checked against the registry, and the result is written
//! in a single statement.

use crate::assessment::AssessmentEngine;
use crate::db::leads;
use crate::registry;
use chrono::Utc;
use leadboard_common::fields::{parse_patch, FieldValue, LeadField, LeadPatch, RejectedField};
use leadboard_common::{Assessment, Error, Lead, Result};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

/// Where a new lead came from; decides the defaults for missing identity fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadOrigin {
    /// Dashboard or API client; `name` is required
    Api,
    /// Inbound automation; every field is optional
    Webhook,
}

/// Result of a partial update
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub lead: Lead,
    /// Fields skipped because their value could not be parsed
    pub rejected_fields: Vec<RejectedField>,
}

#[derive(Clone)]
pub struct Orchestrator {
    db: SqlitePool,
    engine: Arc<AssessmentEngine>,
}

impl Orchestrator {
    pub fn new(db: SqlitePool, engine: Arc<AssessmentEngine>) -> Self {
        Self { db, engine }
    }

    pub async fn get_lead(&self, id: i64) -> Result<Lead> {
        leads::get_lead(&self.db, id)
            .await?
            .ok_or_else(|| lead_not_found(id))
    }

    /// All leads newest first, or only those in `stage_id`
    pub async fn list_leads(&self, stage_id: Option<&str>) -> Result<Vec<Lead>> {
        match stage_id {
            Some(stage_id) => leads::list_leads_by_stage(&self.db, stage_id).await,
            None => leads::list_leads(&self.db).await,
        }
    }

    /// Apply a partial update to lead `id`
    pub async fn apply_update(&self, id: i64, body: &Value) -> Result<UpdateOutcome> {
        let body = body
            .as_object()
            .ok_or_else(|| Error::validation("body", "expected a JSON object"))?;

        let existing = self.get_lead(id).await?;

        let parsed = parse_patch(body)?;
        let mut patch = parsed.patch;
        reject_client_scores(&patch)?;
        reject_cleared_identity(&patch)?;

        if let Some(stage_id) = patch.stage_id() {
            registry::require(&self.db, stage_id).await?;
        }

        if let Some(update) = patch.questionnaire() {
            let merged = existing.questionnaire.merged_with(update);
            let assessment = self.engine.assess(&merged).await;
            debug!(
                lead_id = id,
                answered = self.engine.instrument().answered(&merged),
                scored = assessment.is_scored(),
                "Questionnaire merged"
            );
            patch.set(LeadField::Questionnaire, FieldValue::Questionnaire(merged));
            patch.set(LeadField::Assessment, FieldValue::Assessment(assessment));
        }

        if patch.is_empty() {
            debug!(lead_id = id, "No writable fields in update");
            return Ok(UpdateOutcome {
                lead: existing,
                rejected_fields: parsed.rejected,
            });
        }

        if !leads::update_lead(&self.db, id, &patch, Utc::now()).await? {
            return Err(lead_not_found(id));
        }
        info!(lead_id = id, fields = patch.len(), "Lead updated");

        Ok(UpdateOutcome {
            lead: self.get_lead(id).await?,
            rejected_fields: parsed.rejected,
        })
    }

    /// Create a lead from a request body
    pub async fn create_lead(&self, body: &Value, origin: LeadOrigin) -> Result<Lead> {
        let body = body
            .as_object()
            .ok_or_else(|| Error::validation("body", "expected a JSON object"))?;
        let body = fold_contact_fields(body);

        let parsed = parse_patch(&body)?;
        let mut patch = parsed.patch;
        reject_client_scores(&patch)?;

        // A null source falls back to the column default
        if matches!(patch.get(LeadField::Source), Some(FieldValue::Text(None))) {
            patch.remove(LeadField::Source);
        }

        let name = match patch.text(LeadField::Name).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None if origin == LeadOrigin::Webhook => "Unknown".to_string(),
            None => return Err(Error::validation("name", "name is required")),
        };
        patch.set(LeadField::Name, FieldValue::Text(Some(name.clone())));

        if patch.text(LeadField::Username).map_or(true, str::is_empty) {
            let username = match origin {
                LeadOrigin::Api => default_username(&name),
                LeadOrigin::Webhook => format!("@unknown_{}", Utc::now().timestamp_millis()),
            };
            patch.set(LeadField::Username, FieldValue::Text(Some(username)));
        }

        let stage_id = match patch.stage_id() {
            Some(stage_id) => {
                registry::require(&self.db, stage_id).await?;
                stage_id.to_string()
            }
            None => registry::entry_stage(&self.db).await?.id,
        };
        patch.set(LeadField::StageId, FieldValue::Stage(stage_id.clone()));

        if let Some(questionnaire) = patch.questionnaire() {
            if self.engine.is_complete(questionnaire) {
                let assessment = self.engine.assess(questionnaire).await;
                patch.set(LeadField::Assessment, FieldValue::Assessment(assessment));
            }
        }
        if !patch.contains(LeadField::Assessment) {
            patch.set(LeadField::Assessment, FieldValue::Assessment(Assessment::Pending));
        }

        let id = leads::insert_lead(&self.db, &patch, Utc::now()).await?;
        info!(lead_id = id, stage_id = %stage_id, origin = ?origin, "Lead created");

        self.get_lead(id).await
    }

    /// Move a lead to another stage
    pub async fn move_to_stage(&self, id: i64, stage_id: &str) -> Result<Lead> {
        let existing = self.get_lead(id).await?;
        registry::require(&self.db, stage_id).await?;

        if existing.stage_id == stage_id {
            return Ok(existing);
        }

        let mut patch = LeadPatch::new();
        patch.set(LeadField::StageId, FieldValue::Stage(stage_id.to_string()));
        if !leads::update_lead(&self.db, id, &patch, Utc::now()).await? {
            return Err(lead_not_found(id));
        }
        info!(lead_id = id, from = %existing.stage_id, to = %stage_id, "Lead moved");

        self.get_lead(id).await
    }

    pub async fn delete_lead(&self, id: i64) -> Result<()> {
        if !leads::delete_lead(&self.db, id).await? {
            return Err(lead_not_found(id));
        }
        info!(lead_id = id, "Lead deleted");
        Ok(())
    }
}

fn lead_not_found(id: i64) -> Error {
    Error::NotFound(format!("Lead {} not found", id))
}

/// Clients may reset the status but never supply a score
fn reject_client_scores(patch: &LeadPatch) -> Result<()> {
    match patch.get(LeadField::Assessment) {
        Some(FieldValue::Assessment(a)) if a.is_scored() => Err(Error::validation(
            "assessment",
            "scored assessments are computed by the server; only \"Pending\" or \"Incomplete\" may be set",
        )),
        _ => Ok(()),
    }
}

/// Identity columns are never null; an update may change them but not clear them
fn reject_cleared_identity(patch: &LeadPatch) -> Result<()> {
    for field in [LeadField::Name, LeadField::Username, LeadField::Source] {
        if matches!(patch.get(field), Some(FieldValue::Text(None))) {
            return Err(Error::validation(field.api_name(), "cannot be cleared"));
        }
    }
    Ok(())
}

/// `@` + lower-cased name with whitespace runs replaced by `_`
pub fn default_username(name: &str) -> String {
    let joined = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();
    format!("@{}", joined)
}

/// Move top-level `email`/`phone` into `contactInfo`
///
/// Values already inside `contactInfo` win.
fn fold_contact_fields(body: &Map<String, Value>) -> Map<String, Value> {
    let mut body = body.clone();
    let mut folded = Map::new();
    for key in ["email", "phone"] {
        if let Some(value) = body.remove(key) {
            if !value.is_null() {
                folded.insert(key.to_string(), value);
            }
        }
    }
    if folded.is_empty() {
        return body;
    }

    let contact_key = if body.contains_key("contactInfo") {
        "contactInfo"
    } else if body.contains_key("contact_info") {
        "contact_info"
    } else {
        "contactInfo"
    };
    let contact = body
        .entry(contact_key)
        .or_insert_with(|| Value::Object(Map::new()));
    if contact.is_null() {
        *contact = Value::Object(Map::new());
    }
    if let Value::Object(contact) = contact {
        for (key, value) in folded {
            contact.entry(key).or_insert(value);
        }
    }
    body
}
