use uuid::Uuid;

use crate::config::ApiMode;
use crate::models::audit_log::{diff_fields, AuditAction, AuditLogEntry, FieldChange};
use crate::models::record::Record;
use crate::models::user::Actor;
use crate::store::DemoStore;
use crate::utils::permissions::Module;
use crate::utils::time::now;

/// Appends audit entries for admin mutations. In live mode the backend keeps its own
/// trail, so nothing is recorded here.
#[derive(Clone)]
pub struct AuditService {
    store: DemoStore,
    enabled: bool,
}

impl AuditService {
    pub fn new(store: DemoStore, mode: ApiMode) -> Self {
        Self {
            store,
            enabled: mode == ApiMode::Demo,
        }
    }

    pub async fn log(
        &self,
        actor: &Actor,
        action: AuditAction,
        module: Module,
        resource_id: String,
        resource_name: String,
        changes: Vec<FieldChange>,
    ) -> Option<AuditLogEntry> {
        if !self.enabled {
            return None;
        }
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            timestamp: now(),
            actor: actor.clone(),
            action,
            module,
            resource_id,
            resource_name,
            changes,
        };
        match self.store.append_audit(entry.clone()).await {
            Ok(()) => Some(entry),
            Err(e) => {
                tracing::error!(error = %e, module = %module, "Failed to append audit entry");
                None
            }
        }
    }

    pub async fn created<T: Record>(&self, actor: &Actor, item: &T) -> Option<AuditLogEntry> {
        self.log(
            actor,
            AuditAction::Create,
            T::MODULE,
            item.key().to_string(),
            item.label(),
            Vec::new(),
        )
        .await
    }

    /// `before` is only known for local edits; without it the entry carries no diff.
    pub async fn changed<T: Record>(
        &self,
        actor: &Actor,
        action: AuditAction,
        before: Option<&T>,
        after: &T,
    ) -> Option<AuditLogEntry> {
        let changes = match (before.map(serde_json::to_value), serde_json::to_value(after)) {
            (Some(Ok(before)), Ok(after)) => diff_fields(&before, &after),
            _ => Vec::new(),
        };
        self.log(
            actor,
            action,
            T::MODULE,
            after.key().to_string(),
            after.label(),
            changes,
        )
        .await
    }

    pub async fn deleted<T: Record>(
        &self,
        actor: &Actor,
        key: &T::Key,
        removed: Option<&T>,
    ) -> Option<AuditLogEntry> {
        let name = removed.map(Record::label).unwrap_or_else(|| key.to_string());
        self.log(
            actor,
            AuditAction::Delete,
            T::MODULE,
            key.to_string(),
            name,
            Vec::new(),
        )
        .await
    }

    pub async fn downloaded(&self, actor: &Actor, module: Module, count: usize, format: &str) -> Option<AuditLogEntry> {
        self.log(
            actor,
            AuditAction::Download,
            module,
            format.to_string(),
            format!("{} records exported as {}", count, format),
            Vec::new(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobPosting;
    use crate::store::fixtures;

    fn actor() -> Actor {
        Actor::from(&fixtures::users()[1])
    }

    #[tokio::test]
    async fn update_records_field_diff() {
        let store = DemoStore::seeded();
        let audit = AuditService::new(store.clone(), ApiMode::Demo);

        let before = fixtures::jobs().remove(0);
        let mut after = before.clone();
        after.title = "Chief Accountant".into();
        after.updated_at = Some(now());

        let entry = audit
            .changed(&actor(), AuditAction::Update, Some(&before), &after)
            .await
            .unwrap();
        assert_eq!(entry.module, Module::Jobs);
        assert_eq!(entry.resource_id, "1");
        assert_eq!(entry.changes.len(), 1);
        assert_eq!(entry.changes[0].field, "title");
        assert_eq!(store.count::<AuditLogEntry>(), 1);
    }

    #[tokio::test]
    async fn live_mode_records_nothing() {
        let store = DemoStore::seeded();
        let audit = AuditService::new(store.clone(), ApiMode::Live);
        let job: JobPosting = fixtures::jobs().remove(0);
        assert!(audit.created(&actor(), &job).await.is_none());
        assert_eq!(store.count::<AuditLogEntry>(), 0);
    }

    #[tokio::test]
    async fn delete_without_record_uses_key_as_name() {
        let audit = AuditService::new(DemoStore::seeded(), ApiMode::Demo);
        let entry = audit
            .deleted::<JobPosting>(&actor(), &42, None)
            .await
            .unwrap();
        assert_eq!(entry.action, AuditAction::Delete);
        assert_eq!(entry.resource_name, "42");
    }
}
