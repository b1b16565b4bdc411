#![allow(dead_code)]

//! The editor session: one open resume plus its undo/redo history.
//!
//! Every mutation funnels through `set_value`-style snapshot replacement:
//! the document is serialized to a value tree, the edit is applied there,
//! and the result is deserialized back into the typed schema. Edits that
//! fail the round trip or the layout invariants leave the current snapshot
//! untouched. Each accepted edit is exactly one history step.

use serde_json::Value;
use uuid::Uuid;

use crate::document::defaults::default_custom_section;
use crate::document::layout;
use crate::document::path::{get_at, set_at};
use crate::document::schema::FixedSectionKey;
use crate::document::{
    DocumentError, DotPath, Locator, Resume, ResumeData, SectionRef, SetOutcome, Visibility,
};
use crate::editor::history::History;

pub struct EditorSession {
    resume: Resume,
    history: History,
}

impl EditorSession {
    pub fn new(resume: Resume) -> Self {
        EditorSession {
            resume,
            history: History::new(),
        }
    }

    pub fn resume(&self) -> &Resume {
        &self.resume
    }

    pub fn data(&self) -> &ResumeData {
        &self.resume.data
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Replaces the open document. History never crosses documents.
    pub fn switch_document(&mut self, resume: Resume) {
        self.resume = resume;
        self.history.clear();
    }

    // ────────────────────────────────────────────────────────────────────────
    // Path mutation
    // ────────────────────────────────────────────────────────────────────────

    /// Sets `value` at `path` within the document.
    ///
    /// The path `visibility` addresses the envelope; every other path
    /// addresses the document data. Unmaterialized paths are a silent no-op.
    /// Edits that break the typed schema or the layout invariants are
    /// rejected with `Validation` and change nothing.
    pub fn set_value(&mut self, path: &str, value: Value) -> Result<SetOutcome, DocumentError> {
        let path: DotPath = path.parse()?;

        if path.head() == Some("visibility") && path.len() == 1 {
            let visibility: Visibility = serde_json::from_value(value)
                .map_err(|e| DocumentError::Validation(e.to_string()))?;
            self.history.record(self.resume.clone());
            self.resume.visibility = visibility;
            return Ok(SetOutcome::Applied);
        }

        self.apply(&path, value)
    }

    /// Structural paths replace the layout grid or section table wholesale;
    /// a failed round trip there is a caller error, not a missing branch.
    fn is_structural(path: &DotPath) -> bool {
        match path.head() {
            Some("sections") => true,
            Some("metadata") => path.key_at(1) == Some("layout"),
            _ => false,
        }
    }

    fn apply(&mut self, path: &DotPath, value: Value) -> Result<SetOutcome, DocumentError> {
        let mut tree = serde_json::to_value(&self.resume.data)
            .map_err(|e| DocumentError::Validation(e.to_string()))?;

        if set_at(&mut tree, path, value) == SetOutcome::NotMaterialized {
            return Ok(SetOutcome::NotMaterialized);
        }

        let next: ResumeData = match serde_json::from_value(tree) {
            Ok(next) => next,
            Err(e) if Self::is_structural(path) => {
                return Err(DocumentError::Validation(e.to_string()));
            }
            // A shape the schema cannot hold behaves like a path that does
            // not exist: nothing changes.
            Err(_) => return Ok(SetOutcome::NotMaterialized),
        };
        next.validate()?;

        self.commit_data(next);
        Ok(SetOutcome::Applied)
    }

    /// Replaces the whole document body (template switch, import). Validated
    /// like any structural edit; one history step.
    pub fn set_resume_data(&mut self, data: ResumeData) -> Result<(), DocumentError> {
        data.validate()?;
        self.commit_data(data);
        Ok(())
    }

    fn commit_data(&mut self, next: ResumeData) {
        self.history.record(self.resume.clone());
        self.resume.data = next;
    }

    // ────────────────────────────────────────────────────────────────────────
    // History
    // ────────────────────────────────────────────────────────────────────────

    /// Steps back one snapshot. Returns false (and changes nothing) at the
    /// bottom of the stack.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.resume.clone()) {
            Some(prior) => {
                self.resume = prior;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.resume.clone()) {
            Some(next) => {
                self.resume = next;
                true
            }
            None => false,
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Layout operations
    // ────────────────────────────────────────────────────────────────────────

    pub fn move_section(&mut self, current: Locator, target: Locator) -> Result<(), DocumentError> {
        let next = layout::move_section(current, target, &self.resume.data.metadata.layout)?;
        self.replace_layout(next)
    }

    pub fn add_page(&mut self) -> Result<(), DocumentError> {
        let next = layout::add_page(&self.resume.data.metadata.layout);
        self.replace_layout(next)
    }

    pub fn remove_page(&mut self, page: usize) -> Result<(), DocumentError> {
        let next = layout::remove_page(page, &self.resume.data.metadata.layout)?;
        self.replace_layout(next)
    }

    pub fn reset_layout(&mut self) -> Result<(), DocumentError> {
        let next = layout::reset_layout(&self.resume.data.metadata.layout);
        self.replace_layout(next)
    }

    fn replace_layout(&mut self, next_layout: Vec<crate::document::schema::Page>) -> Result<(), DocumentError> {
        let mut next = self.resume.data.clone();
        next.metadata.layout = next_layout;
        next.validate()?;
        self.commit_data(next);
        Ok(())
    }

    /// Creates a custom section and places it at the bottom of the last
    /// page's main column. Section entry and layout reference land in one
    /// history step so the placed-exactly-once invariant holds at every
    /// snapshot.
    pub fn add_custom_section(&mut self) -> Result<String, DocumentError> {
        let id = Uuid::new_v4().to_string();
        let mut next = self.resume.data.clone();
        next.sections
            .custom
            .insert(id.clone(), default_custom_section(&id));
        match next.metadata.layout.last_mut() {
            Some(page) => page.0[0].push(SectionRef::custom(&id)),
            None => return Err(DocumentError::Validation("layout has no pages".to_string())),
        }
        next.validate()?;
        self.commit_data(next);
        Ok(id)
    }

    /// Removes a custom section and every layout reference to it, as one
    /// history step.
    pub fn remove_custom_section(&mut self, id: &str) -> Result<(), DocumentError> {
        let mut next = self.resume.data.clone();
        if next.sections.custom.remove(id).is_none() {
            return Err(DocumentError::SectionNotFound(format!("custom.{id}")));
        }
        next.metadata.layout =
            layout::remove_reference(&SectionRef::custom(id), &next.metadata.layout);
        next.validate()?;
        self.commit_data(next);
        Ok(())
    }

    // ────────────────────────────────────────────────────────────────────────
    // Item protocol
    // ────────────────────────────────────────────────────────────────────────

    fn items_path(section: &SectionRef) -> Result<DotPath, DocumentError> {
        let raw = match section {
            SectionRef::Fixed(FixedSectionKey::Summary) => {
                return Err(DocumentError::SectionNotFound("summary".to_string()));
            }
            SectionRef::Fixed(key) => format!("sections.{}.items", key.as_str()),
            SectionRef::Custom(id) => format!("sections.custom.{id}.items"),
        };
        raw.parse()
    }

    fn items_of(&self, section: &SectionRef) -> Result<(DotPath, Vec<Value>), DocumentError> {
        let path = Self::items_path(section)?;
        let tree = serde_json::to_value(&self.resume.data)
            .map_err(|e| DocumentError::Validation(e.to_string()))?;
        let items = get_at(&tree, &path)
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| DocumentError::SectionNotFound(section.to_string()))?;
        Ok((path, items))
    }

    fn replace_items(
        &mut self,
        path: DotPath,
        items: Vec<Value>,
    ) -> Result<(), DocumentError> {
        match self.apply(&path, Value::Array(items))? {
            SetOutcome::Applied => Ok(()),
            SetOutcome::NotMaterialized => Err(DocumentError::Validation(
                "item does not fit the section's schema".to_string(),
            )),
        }
    }

    fn item_id(item: &Value) -> Option<&str> {
        item.get("id").and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    /// Appends a new item. A missing or empty `id` gets a fresh one; the
    /// section's item defaults fill any absent fields.
    pub fn create_item(
        &mut self,
        section: &SectionRef,
        mut item: Value,
    ) -> Result<String, DocumentError> {
        let obj = item
            .as_object_mut()
            .ok_or_else(|| DocumentError::Validation("item must be an object".to_string()))?;
        let id = match obj.get("id").and_then(Value::as_str).filter(|s| !s.is_empty()) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                obj.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };

        let (path, mut items) = self.items_of(section)?;
        if items.iter().any(|i| Self::item_id(i) == Some(id.as_str())) {
            return Err(DocumentError::Validation(format!(
                "duplicate item id `{id}`"
            )));
        }
        items.push(item);
        self.replace_items(path, items)?;
        Ok(id)
    }

    /// Replaces the item carrying `item.id`. The id itself is immutable.
    pub fn update_item(&mut self, section: &SectionRef, item: Value) -> Result<(), DocumentError> {
        let id = Self::item_id(&item)
            .ok_or_else(|| DocumentError::Validation("item update requires an id".to_string()))?
            .to_string();

        let (path, mut items) = self.items_of(section)?;
        let slot = items
            .iter_mut()
            .find(|i| Self::item_id(i) == Some(id.as_str()))
            .ok_or_else(|| DocumentError::ItemNotFound(id.clone()))?;
        *slot = item;
        self.replace_items(path, items)
    }

    /// Clones the item under a fresh id and appends the clone.
    pub fn duplicate_item(
        &mut self,
        section: &SectionRef,
        id: &str,
    ) -> Result<String, DocumentError> {
        let (path, mut items) = self.items_of(section)?;
        let mut clone = items
            .iter()
            .find(|i| Self::item_id(i) == Some(id))
            .cloned()
            .ok_or_else(|| DocumentError::ItemNotFound(id.to_string()))?;

        let fresh = Uuid::new_v4().to_string();
        if let Some(obj) = clone.as_object_mut() {
            obj.insert("id".to_string(), Value::String(fresh.clone()));
        }
        items.push(clone);
        self.replace_items(path, items)?;
        Ok(fresh)
    }

    pub fn delete_item(&mut self, section: &SectionRef, id: &str) -> Result<(), DocumentError> {
        let (path, mut items) = self.items_of(section)?;
        let before = items.len();
        items.retain(|i| Self::item_id(i) != Some(id));
        if items.len() == before {
            return Err(DocumentError::ItemNotFound(id.to_string()));
        }
        self.replace_items(path, items)
    }

    /// Reorders the section's items to `order`, which must be a permutation
    /// of the current item ids.
    pub fn reorder_items(
        &mut self,
        section: &SectionRef,
        order: &[String],
    ) -> Result<(), DocumentError> {
        let (path, items) = self.items_of(section)?;
        if order.len() != items.len() {
            return Err(DocumentError::Validation(
                "reorder must include every item exactly once".to_string(),
            ));
        }

        let mut reordered = Vec::with_capacity(items.len());
        for id in order {
            let item = items
                .iter()
                .find(|i| Self::item_id(i) == Some(id.as_str()))
                .cloned()
                .ok_or_else(|| DocumentError::ItemNotFound(id.clone()))?;
            reordered.push(item);
        }
        self.replace_items(path, reordered)
    }

    pub fn toggle_item_visibility(
        &mut self,
        section: &SectionRef,
        id: &str,
    ) -> Result<bool, DocumentError> {
        let (path, mut items) = self.items_of(section)?;
        let item = items
            .iter_mut()
            .find(|i| Self::item_id(i) == Some(id))
            .ok_or_else(|| DocumentError::ItemNotFound(id.to_string()))?;
        let next = !item.get("visible").and_then(Value::as_bool).unwrap_or(true);
        item["visible"] = Value::Bool(next);
        self.replace_items(path, items)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::defaults::default_resume_data;
    use chrono::Utc;
    use serde_json::json;

    fn session() -> EditorSession {
        let data = default_resume_data("Ada Lovelace", "ada@example.com", "");
        EditorSession::new(Resume {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Main resume".to_string(),
            slug: "main-resume".to_string(),
            data,
            visibility: Visibility::Private,
            locked: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    fn skills() -> SectionRef {
        SectionRef::Fixed(FixedSectionKey::Skills)
    }

    #[test]
    fn test_set_value_replaces_leaf_and_records_history() {
        let mut s = session();
        let outcome = s.set_value("basics.headline", json!("Engineer")).unwrap();
        assert_eq!(outcome, SetOutcome::Applied);
        assert_eq!(s.data().basics.headline, "Engineer");
        assert!(s.can_undo());

        assert!(s.undo());
        assert_eq!(s.data().basics.headline, "");
        assert!(s.redo());
        assert_eq!(s.data().basics.headline, "Engineer");
    }

    #[test]
    fn test_set_value_unmaterialized_is_silent_noop() {
        let mut s = session();
        let outcome = s
            .set_value("basics.nowhere.deep", json!("x"))
            .unwrap();
        assert_eq!(outcome, SetOutcome::NotMaterialized);
        assert!(!s.can_undo());
    }

    #[test]
    fn test_set_value_schema_mismatch_is_noop_for_plain_paths() {
        let mut s = session();
        let before = s.data().clone();
        let outcome = s.set_value("basics.picture.size", json!("huge")).unwrap();
        assert_eq!(outcome, SetOutcome::NotMaterialized);
        assert_eq!(s.data(), &before);
    }

    #[test]
    fn test_set_value_rejects_invalid_layout() {
        let mut s = session();
        let before = s.data().clone();
        let err = s.set_value("metadata.layout", json!([])).unwrap_err();
        assert!(matches!(err, DocumentError::Validation(_)));
        assert_eq!(s.data(), &before);
        assert!(!s.can_undo());
    }

    #[test]
    fn test_set_value_accepts_valid_layout_replacement() {
        let mut s = session();
        let layout = json!([[["experience"], ["skills"]]]);
        assert_eq!(
            s.set_value("metadata.layout", layout).unwrap(),
            SetOutcome::Applied
        );
        assert_eq!(s.data().metadata.layout.len(), 1);
        assert_eq!(s.data().metadata.layout[0].main().len(), 1);
    }

    #[test]
    fn test_visibility_path_addresses_envelope() {
        let mut s = session();
        s.set_value("visibility", json!("public")).unwrap();
        assert_eq!(s.resume().visibility, Visibility::Public);

        assert!(s.undo());
        assert_eq!(s.resume().visibility, Visibility::Private);
    }

    #[test]
    fn test_set_resume_data_validates_wholesale() {
        let mut s = session();
        let mut replacement = s.data().clone();
        replacement.basics.name = "Grace Hopper".to_string();
        s.set_resume_data(replacement).unwrap();
        assert_eq!(s.data().basics.name, "Grace Hopper");

        let mut broken = s.data().clone();
        broken.metadata.layout.clear();
        assert!(s.set_resume_data(broken).is_err());
        assert_eq!(s.data().basics.name, "Grace Hopper");
    }

    #[test]
    fn test_undo_beyond_bottom_is_noop() {
        let mut s = session();
        s.set_value("basics.headline", json!("a")).unwrap();
        assert!(s.undo());
        assert!(!s.undo());
        assert!(!s.can_undo());
    }

    #[test]
    fn test_switch_document_clears_history() {
        let mut s = session();
        s.set_value("basics.headline", json!("a")).unwrap();
        assert!(s.can_undo());

        let other = session();
        s.switch_document(other.resume().clone());
        assert!(!s.can_undo());
        assert!(!s.can_redo());
    }

    #[test]
    fn test_create_update_delete_item() {
        let mut s = session();
        let id = s
            .create_item(&skills(), json!({"name": "Rust", "level": 5}))
            .unwrap();
        assert_eq!(s.data().sections.skills.items.len(), 1);
        assert_eq!(s.data().sections.skills.items[0].name, "Rust");

        s.update_item(&skills(), json!({"id": id, "name": "Rust", "level": 4}))
            .unwrap();
        assert_eq!(s.data().sections.skills.items[0].level, 4);

        s.delete_item(&skills(), &id).unwrap();
        assert!(s.data().sections.skills.items.is_empty());

        // Each step was one history entry.
        assert!(s.undo());
        assert_eq!(s.data().sections.skills.items.len(), 1);
    }

    #[test]
    fn test_duplicate_item_gets_fresh_id() {
        let mut s = session();
        let id = s.create_item(&skills(), json!({"name": "Rust"})).unwrap();
        let copy = s.duplicate_item(&skills(), &id).unwrap();
        assert_ne!(id, copy);

        let items = &s.data().sections.skills.items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, items[1].name);
    }

    #[test]
    fn test_reorder_is_a_permutation_or_error() {
        let mut s = session();
        let a = s.create_item(&skills(), json!({"name": "a"})).unwrap();
        let b = s.create_item(&skills(), json!({"name": "b"})).unwrap();

        s.reorder_items(&skills(), &[b.clone(), a.clone()]).unwrap();
        assert_eq!(s.data().sections.skills.items[0].name, "b");

        let err = s.reorder_items(&skills(), &[a]).unwrap_err();
        assert!(matches!(err, DocumentError::Validation(_)));
    }

    #[test]
    fn test_toggle_item_visibility() {
        let mut s = session();
        let id = s.create_item(&skills(), json!({"name": "Rust"})).unwrap();
        assert!(s.data().sections.skills.items[0].visible);

        assert!(!s.toggle_item_visibility(&skills(), &id).unwrap());
        assert!(!s.data().sections.skills.items[0].visible);
        assert!(s.toggle_item_visibility(&skills(), &id).unwrap());
    }

    #[test]
    fn test_item_ops_reject_summary_and_missing_sections() {
        let mut s = session();
        let summary = SectionRef::Fixed(FixedSectionKey::Summary);
        assert!(matches!(
            s.create_item(&summary, json!({})),
            Err(DocumentError::SectionNotFound(_))
        ));
        assert!(matches!(
            s.create_item(&SectionRef::custom("ghost"), json!({})),
            Err(DocumentError::SectionNotFound(_))
        ));
    }

    #[test]
    fn test_custom_section_add_remove_atomic() {
        let mut s = session();
        let id = s.add_custom_section().unwrap();
        assert!(s.data().sections.custom.contains_key(&id));
        let placed = s
            .data()
            .metadata
            .layout
            .last()
            .unwrap()
            .main()
            .contains(&SectionRef::custom(&id));
        assert!(placed);
        s.data().validate().unwrap();

        // One undo removes both the entry and the reference.
        assert!(s.undo());
        assert!(s.data().sections.custom.is_empty());
        s.data().validate().unwrap();

        assert!(s.redo());
        s.remove_custom_section(&id).unwrap();
        assert!(s.data().sections.custom.is_empty());
        s.data().validate().unwrap();
    }

    #[test]
    fn test_move_section_through_session() {
        let mut s = session();
        s.move_section(Locator::new(0, 0, 1), Locator::new(0, 1, 0))
            .unwrap();
        assert_eq!(
            s.data().metadata.layout[0].sidebar()[0].to_string(),
            "summary"
        );
        assert!(s.undo());
        assert_eq!(
            s.data().metadata.layout[0].main()[1].to_string(),
            "summary"
        );
    }

    #[test]
    fn test_page_ops_through_session() {
        let mut s = session();
        s.add_page().unwrap();
        assert_eq!(s.data().metadata.layout.len(), 2);
        s.remove_page(1).unwrap();
        assert_eq!(s.data().metadata.layout.len(), 1);
        assert!(s.remove_page(0).is_err());
    }
}
