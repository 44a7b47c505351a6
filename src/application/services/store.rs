use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::{
    DocumentError, Education, EntryId, FieldPath, ListEntry, ListName, ResumeDocument,
    SkillCategory, WorkExperience,
};

/// Owner of the live document.
///
/// Mutations are applied synchronously and published to subscribers as a
/// new snapshot. A mutation that leaves the document unchanged publishes
/// nothing.
pub struct ResumeStore {
    state: watch::Sender<Arc<ResumeDocument>>,
}

impl ResumeStore {
    pub fn new() -> Self {
        Self::with_document(ResumeDocument::default())
    }

    pub fn with_document(doc: ResumeDocument) -> Self {
        let (state, _) = watch::channel(Arc::new(doc));
        Self { state }
    }

    pub fn snapshot(&self) -> Arc<ResumeDocument> {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published snapshot after this call.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ResumeDocument>> {
        self.state.subscribe()
    }

    /// Hydrates `raw` (default-filling anything missing) and replaces the
    /// live document with it.
    pub fn load(&self, raw: &str) -> Arc<ResumeDocument> {
        let doc = Arc::new(ResumeDocument::hydrate(raw));
        self.state.send_replace(doc.clone());
        doc
    }

    pub fn replace(&self, doc: ResumeDocument) {
        self.state.send_replace(Arc::new(doc));
        tracing::debug!("document replaced");
    }

    pub fn patch(&self, path: &FieldPath, value: impl Into<String>) -> Result<(), DocumentError> {
        let value = value.into();
        let mut outcome = Ok(());

        self.state.send_if_modified(|doc| {
            let doc = Arc::make_mut(doc);
            match doc.field_mut(path) {
                Ok(slot) if *slot == value => false,
                Ok(slot) => {
                    *slot = value;
                    true
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });

        outcome
    }

    /// Appends a default entry to `list` and returns its fresh id.
    pub fn add_entry(&self, list: ListName) -> EntryId {
        match list {
            ListName::WorkExperience => self.add_entry_with(WorkExperience::default),
            ListName::Education => self.add_entry_with(Education::default),
            ListName::Skills => self.add_entry_with(SkillCategory::default),
        }
    }

    /// Appends the entry built by `make_default`, overriding its id.
    pub fn add_entry_with<E: ListEntry>(&self, make_default: impl FnOnce() -> E) -> EntryId {
        let mut id = EntryId::generate();
        while self.state.borrow().contains_id(&id) {
            id = EntryId::generate();
        }

        let mut entry = make_default();
        entry.set_id(id.clone());
        self.state
            .send_modify(|doc| E::entries_mut(Arc::make_mut(doc)).push(entry));

        tracing::debug!(list = %E::LIST, id = %id, "entry added");
        id
    }

    /// Removes the entry if present. Returns whether anything was removed.
    pub fn remove_entry(&self, list: ListName, id: &EntryId) -> bool {
        let removed = self.state.send_if_modified(|doc| {
            if !doc.contains_id(id) {
                return false;
            }
            Arc::make_mut(doc).remove_entry(list, id)
        });

        if removed {
            tracing::debug!(list = %list, id = %id, "entry removed");
        }
        removed
    }
}

impl Default for ResumeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EducationField, PersonalField};

    #[test]
    fn test_patch_personal_field_notifies() {
        let store = ResumeStore::new();
        let mut rx = store.subscribe();

        store
            .patch(&FieldPath::PersonalInfo(PersonalField::Name), "Ada")
            .unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().personal_info.name, "Ada");
    }

    #[test]
    fn test_patch_same_value_does_not_notify() {
        let store = ResumeStore::new();
        let path = FieldPath::PersonalInfo(PersonalField::Email);
        store.patch(&path, "ada@example.com").unwrap();

        let rx = store.subscribe();
        store.patch(&path, "ada@example.com").unwrap();

        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_patch_entry_by_id() {
        let store = ResumeStore::new();
        let first = store.add_entry(ListName::Education);
        let second = store.add_entry(ListName::Education);

        store
            .patch(
                &FieldPath::Education(second.clone(), EducationField::Degree),
                "MSc",
            )
            .unwrap();

        let doc = store.snapshot();
        assert_eq!(doc.education[0].id, first);
        assert_eq!(doc.education[0].degree, "");
        assert_eq!(doc.education[1].degree, "MSc");
    }

    #[test]
    fn test_patch_unknown_id_is_error_without_notification() {
        let store = ResumeStore::new();
        let rx = store.subscribe();

        let err = store
            .patch(
                &FieldPath::Education("ghost".into(), EducationField::Details),
                "x",
            )
            .unwrap_err();

        assert!(matches!(err, DocumentError::UnknownEntry { .. }));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_add_entry_assigns_unique_ids() {
        let store = ResumeStore::new();
        let a = store.add_entry(ListName::Skills);
        let b = store.add_entry(ListName::Skills);
        let c = store.add_entry_with(|| WorkExperience {
            id: a.clone(),
            company: "Acme".to_string(),
            ..Default::default()
        });

        assert_ne!(a, b);
        assert_ne!(a, c);
        let doc = store.snapshot();
        assert_eq!(doc.work_experience[0].company, "Acme");
        assert_eq!(doc.work_experience[0].id, c);
    }

    #[test]
    fn test_remove_absent_entry_is_noop() {
        let store = ResumeStore::new();
        store.add_entry(ListName::WorkExperience);
        let before = store.snapshot();
        let rx = store.subscribe();

        assert!(!store.remove_entry(ListName::WorkExperience, &"ghost".into()));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn test_remove_entry_is_idempotent() {
        let store = ResumeStore::new();
        let id = store.add_entry(ListName::Skills);
        let mut rx = store.subscribe();

        assert!(store.remove_entry(ListName::Skills, &id));
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        assert!(!store.remove_entry(ListName::Skills, &id));
        assert!(!rx.has_changed().unwrap());
        assert!(store.snapshot().skills.is_empty());
    }

    #[test]
    fn test_load_hydrates_and_notifies() {
        let store = ResumeStore::new();
        let rx = store.subscribe();

        let doc = store.load(r#"{"personalInfo": {"name": "Grace"}}"#);

        assert!(rx.has_changed().unwrap());
        assert_eq!(doc.personal_info.name, "Grace");
        assert!(doc.skills.is_empty());
    }
}
