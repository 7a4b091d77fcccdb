//! Raw search records to [`TicketSummary`].

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{DigestError, Result};
use crate::responses::{NamedValue, RawRecord};
use crate::types::{TicketSummary, NO_SPRINT, UNASSIGNED};

/// Jira Server renders sprints as `...Sprint@1f[id=3,rapidViewId=1,state=ACTIVE,name=Sprint 5,...]`.
static LEGACY_SPRINT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"name=([^,\]]+)").expect("sprint pattern is valid"));

const UNKNOWN_KEY: &str = "<unknown>";

/// Normalize one record. Missing required fields fail with the field name
/// and the record key instead of producing a partial ticket.
pub fn normalize(record: &RawRecord, sprint_field: &str) -> Result<TicketSummary> {
    let key = record
        .key
        .clone()
        .ok_or_else(|| malformed(UNKNOWN_KEY, "key"))?;
    let fields = record
        .fields
        .as_ref()
        .ok_or_else(|| malformed(&key, "fields"))?;

    let summary = fields
        .summary
        .clone()
        .ok_or_else(|| malformed(&key, "fields.summary"))?;
    let status = named(&fields.status).ok_or_else(|| malformed(&key, "fields.status"))?;
    let created = fields
        .created
        .clone()
        .ok_or_else(|| malformed(&key, "fields.created"))?;
    let updated = fields
        .updated
        .clone()
        .ok_or_else(|| malformed(&key, "fields.updated"))?;
    let issue_type = named(&fields.issuetype).ok_or_else(|| malformed(&key, "fields.issuetype"))?;
    let priority = named(&fields.priority).ok_or_else(|| malformed(&key, "fields.priority"))?;

    let assignee = fields
        .assignee
        .as_ref()
        .and_then(|a| a.display_name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNASSIGNED.to_string());

    let sprint = fields
        .custom
        .get(sprint_field)
        .and_then(first_sprint_name)
        .unwrap_or_else(|| NO_SPRINT.to_string());

    Ok(TicketSummary {
        key,
        summary,
        status,
        assignee,
        created,
        updated,
        issue_type,
        priority,
        sprint,
    })
}

/// Normalize a whole page; the first malformed record fails the batch.
pub fn normalize_all(records: &[RawRecord], sprint_field: &str) -> Result<Vec<TicketSummary>> {
    records.iter().map(|r| normalize(r, sprint_field)).collect()
}

fn named(value: &Option<NamedValue>) -> Option<String> {
    value.as_ref().and_then(|v| v.name.clone())
}

fn malformed(key: &str, field: &'static str) -> DigestError {
    DigestError::MalformedRecord {
        key: key.to_string(),
        field,
    }
}

/// Name of the first sprint entry, if there is a non-empty one.
fn first_sprint_name(value: &Value) -> Option<String> {
    let first = value.as_array()?.first()?;

    let name = match first {
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(String::from),
        Value::String(raw) => LEGACY_SPRINT_NAME
            .captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        _ => None,
    };

    name.filter(|n| !n.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SPRINT_FIELD: &str = "customfield_10020";

    fn record(value: Value) -> RawRecord {
        serde_json::from_value(value).unwrap()
    }

    fn complete() -> Value {
        json!({
            "key": "PROJ-1",
            "fields": {
                "summary": "Crash on load",
                "status": { "name": "Open" },
                "assignee": { "displayName": "Asha Rao" },
                "created": "2026-10-17T09:00:00.000+0530",
                "updated": "2026-10-17T10:00:00.000+0530",
                "issuetype": { "name": "Bug" },
                "priority": { "name": "High" },
                "customfield_10020": [{ "id": 12, "name": "Stability Sprint 4" }]
            }
        })
    }

    #[test]
    fn complete_record_maps_every_field() {
        let ticket = normalize(&record(complete()), SPRINT_FIELD).unwrap();

        assert_eq!(
            ticket,
            TicketSummary {
                key: "PROJ-1".into(),
                summary: "Crash on load".into(),
                status: "Open".into(),
                assignee: "Asha Rao".into(),
                created: "2026-10-17T09:00:00.000+0530".into(),
                updated: "2026-10-17T10:00:00.000+0530".into(),
                issue_type: "Bug".into(),
                priority: "High".into(),
                sprint: "Stability Sprint 4".into(),
            }
        );
    }

    #[test]
    fn normalize_is_deterministic() {
        let raw = record(complete());
        assert_eq!(
            normalize(&raw, SPRINT_FIELD).unwrap(),
            normalize(&raw, SPRINT_FIELD).unwrap()
        );
    }

    #[test]
    fn absent_assignee_and_sprint_use_fallbacks() {
        let mut value = complete();
        value["fields"]["assignee"] = Value::Null;
        value["fields"]["customfield_10020"] = Value::Null;

        let ticket = normalize(&record(value), SPRINT_FIELD).unwrap();
        assert_eq!(ticket.assignee, "Unassigned");
        assert_eq!(ticket.sprint, "No Sprint");
    }

    #[test]
    fn empty_sprint_list_is_no_sprint() {
        let mut value = complete();
        value["fields"]["customfield_10020"] = json!([]);
        let ticket = normalize(&record(value), SPRINT_FIELD).unwrap();
        assert_eq!(ticket.sprint, "No Sprint");
    }

    #[test]
    fn sprint_read_from_configured_field() {
        let mut value = complete();
        value["fields"]["customfield_99999"] = json!([{ "name": "Roadmap Q4" }]);
        let ticket = normalize(&record(value), "customfield_99999").unwrap();
        assert_eq!(ticket.sprint, "Roadmap Q4");
    }

    #[test]
    fn legacy_server_sprint_string() {
        let mut value = complete();
        value["fields"]["customfield_10020"] = json!([
            "com.atlassian.greenhopper.service.sprint.Sprint@1f[id=3,rapidViewId=1,state=ACTIVE,name=Sprint 5,startDate=2026-10-01]"
        ]);
        let ticket = normalize(&record(value), SPRINT_FIELD).unwrap();
        assert_eq!(ticket.sprint, "Sprint 5");
    }

    #[test]
    fn missing_status_names_field_and_key() {
        let mut value = complete();
        value["fields"]
            .as_object_mut()
            .unwrap()
            .remove("status");

        let err = normalize(&record(value), SPRINT_FIELD).unwrap_err();
        match err {
            DigestError::MalformedRecord { key, field } => {
                assert_eq!(key, "PROJ-1");
                assert_eq!(field, "fields.status");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn one_bad_record_fails_the_batch() {
        let records = vec![record(complete()), record(json!({ "key": "PROJ-2" }))];
        let err = normalize_all(&records, SPRINT_FIELD).unwrap_err();
        assert!(matches!(
            err,
            DigestError::MalformedRecord { ref key, field: "fields" } if key == "PROJ-2"
        ));
    }
}
