use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::models::record::{contains_ci, Record};
use crate::models::user::Actor;
use crate::utils::permissions::Module;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Archive,
    Deactivate,
    Activate,
    Publish,
    Unpublish,
    Download,
}

impl From<crate::models::record::LifecycleAction> for AuditAction {
    fn from(action: crate::models::record::LifecycleAction) -> Self {
        use crate::models::record::LifecycleAction as L;
        match action {
            L::Activate => AuditAction::Activate,
            L::Deactivate => AuditAction::Deactivate,
            L::Archive => AuditAction::Archive,
            L::Publish => AuditAction::Publish,
            L::Unpublish => AuditAction::Unpublish,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub from: JsonValue,
    pub to: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub actor: Actor,
    pub action: AuditAction,
    pub module: Module,
    pub resource_id: String,
    pub resource_name: String,
    #[serde(default)]
    pub changes: Vec<FieldChange>,
}

impl Record for AuditLogEntry {
    type Key = Uuid;

    const MODULE: Module = Module::AuditLog;

    fn key(&self) -> Uuid {
        self.id
    }

    fn label(&self) -> String {
        format!("{:?} {} {}", self.action, self.module, self.resource_id)
    }

    fn matches_search(&self, needle: &str) -> bool {
        contains_ci(&self.resource_name, needle)
            || contains_ci(&self.actor.name, needle)
            || contains_ci(&self.actor.email, needle)
            || contains_ci(self.module.as_str(), needle)
    }

    fn sort_date(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Field-level differences between two serialized snapshots of the same record.
pub fn diff_fields(before: &JsonValue, after: &JsonValue) -> Vec<FieldChange> {
    const IGNORED: &[&str] = &["updated_at"];

    let (Some(before), Some(after)) = (before.as_object(), after.as_object()) else {
        return Vec::new();
    };

    let mut changes: Vec<FieldChange> = after
        .iter()
        .filter(|(field, _)| !IGNORED.contains(&field.as_str()))
        .filter_map(|(field, new_value)| {
            let old_value = before.get(field).cloned().unwrap_or(JsonValue::Null);
            (old_value != *new_value).then(|| FieldChange {
                field: field.clone(),
                from: old_value,
                to: new_value.clone(),
            })
        })
        .collect();
    changes.sort_by(|a, b| a.field.cmp(&b.field));
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn diff_reports_changed_fields_only() {
        let before = json!({"title": "Auditor", "is_active": true, "updated_at": "x"});
        let after = json!({"title": "Senior Auditor", "is_active": true, "updated_at": "y"});
        let changes = diff_fields(&before, &after);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "title");
        assert_eq!(changes[0].from, json!("Auditor"));
        assert_eq!(changes[0].to, json!("Senior Auditor"));
    }

    #[test]
    fn diff_of_non_objects_is_empty() {
        assert!(diff_fields(&json!(1), &json!(2)).is_empty());
    }
}
