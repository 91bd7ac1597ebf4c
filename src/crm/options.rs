//! Named, ordered option lists.
//!
//! Pipeline stages, task types and contact fields share one contract: a list
//! of uniquely named entries with stable ids and a dense `order` (1..N) that is
//! re-derived from array position after every mutation. [`OptionSet`]
//! implements that contract once for anything that is [`OrderedOption`].

use serde::{Deserialize, Serialize};

use crate::errors::{CrmError, Result};

use super::models::{ContactField, PipelineStage, TaskType};

pub trait OrderedOption: Clone {
    /// Entity label used in error messages.
    const KIND: &'static str;

    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
    fn order(&self) -> u32;
    fn set_order(&mut self, order: u32);
}

macro_rules! ordered_option {
    ($ty:ty, $kind:expr) => {
        impl OrderedOption for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> i64 {
                self.id
            }
            fn set_id(&mut self, id: i64) {
                self.id = id;
            }
            fn name(&self) -> &str {
                &self.name
            }
            fn set_name(&mut self, name: String) {
                self.name = name;
            }
            fn order(&self) -> u32 {
                self.order
            }
            fn set_order(&mut self, order: u32) {
                self.order = order;
            }
        }
    };
}

ordered_option!(PipelineStage, "Pipeline stage");
ordered_option!(TaskType, "Task type");
ordered_option!(ContactField, "Contact field");

/// Ordered list with a monotonic id allocator.
///
/// `next_id` is a high-water mark: ids handed out by [`OptionSet::append`] are
/// never reused, even after the entry holding the largest id is removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSet<T> {
    items: Vec<T>,
    #[serde(default)]
    next_id: i64,
}

impl<T: OrderedOption> OptionSet<T> {
    /// Build a set from entries, keeping their relative `order`.
    pub fn from_items(mut items: Vec<T>) -> Self {
        items.sort_by_key(|item| item.order());
        let mut set = Self { items, next_id: 0 };
        set.renumber();
        set.next_id = set.max_id() + 1;
        set
    }

    /// Entries sorted by `order` ascending. Ties keep storage order.
    pub fn ordered(&self) -> Vec<T> {
        let mut items = self.items.clone();
        items.sort_by_key(|item| item.order());
        items
    }

    pub fn names(&self) -> Vec<String> {
        self.ordered()
            .into_iter()
            .map(|item| item.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, id: i64) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&T> {
        self.items.iter().find(|item| item.name() == name)
    }

    /// Replace the whole list. Array position becomes `order`; entries with a
    /// non-positive id are treated as new and get one allocated.
    pub fn replace(&mut self, items: Vec<T>) -> Result<Vec<T>> {
        let mut items: Vec<T> = items.into_iter().map(trim_name).collect();
        validate_names(&items)?;

        let mut seen = std::collections::HashSet::new();
        for item in items.iter().filter(|item| item.id() > 0) {
            if !seen.insert(item.id()) {
                return Err(CrmError::validation(format!(
                    "Duplicate {} id {}",
                    T::KIND.to_lowercase(),
                    item.id()
                )));
            }
        }

        let highest = items.iter().map(|item| item.id()).max().unwrap_or(0);
        self.next_id = self.next_id.max(highest + 1);
        for item in items.iter_mut().filter(|item| item.id() <= 0) {
            let id = self.allocate_id();
            item.set_id(id);
        }

        self.items = items;
        self.renumber();
        Ok(self.items.clone())
    }

    /// Append a new entry at the end of the list.
    pub fn append(&mut self, item: T) -> Result<T> {
        let mut item = trim_name(item);
        if item.name().is_empty() {
            return Err(CrmError::validation(format!("{} name is required", T::KIND)));
        }
        if self.find_by_name(item.name()).is_some() {
            return Err(CrmError::validation(format!(
                "{} '{}' already exists",
                T::KIND,
                item.name()
            )));
        }
        let id = self.allocate_id();
        item.set_id(id);
        self.items.push(item);
        self.renumber();
        Ok(self.items[self.items.len() - 1].clone())
    }

    /// Edit an entry in place. Returns the entry before and after the edit.
    pub fn update(&mut self, id: i64, edit: impl FnOnce(&mut T)) -> Result<(T, T)> {
        let index = self
            .items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| CrmError::not_found(T::KIND, id))?;

        let before = self.items[index].clone();
        let mut after = before.clone();
        edit(&mut after);
        after.set_id(before.id());
        after.set_order(before.order());
        let after = trim_name(after);

        let mut candidate = self.items.clone();
        candidate[index] = after.clone();
        validate_names(&candidate)?;

        self.items = candidate;
        Ok((before, after))
    }

    pub fn remove(&mut self, id: i64) -> Result<T> {
        let index = self
            .items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| CrmError::not_found(T::KIND, id))?;
        let removed = self.items.remove(index);
        self.renumber();
        Ok(removed)
    }

    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id.max(self.max_id() + 1).max(1);
        self.next_id = id + 1;
        id
    }

    fn max_id(&self) -> i64 {
        self.items.iter().map(|item| item.id()).max().unwrap_or(0)
    }

    fn renumber(&mut self) {
        for (index, item) in self.items.iter_mut().enumerate() {
            item.set_order(index as u32 + 1);
        }
    }
}

fn trim_name<T: OrderedOption>(mut item: T) -> T {
    let trimmed = item.name().trim().to_string();
    item.set_name(trimmed);
    item
}

fn validate_names<T: OrderedOption>(items: &[T]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for item in items {
        if item.name().is_empty() {
            return Err(CrmError::validation(format!("{} name is required", T::KIND)));
        }
        if !seen.insert(item.name()) {
            return Err(CrmError::validation(format!(
                "{} '{}' appears more than once",
                T::KIND,
                item.name()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(id: i64, name: &str, order: u32) -> PipelineStage {
        PipelineStage {
            id,
            name: name.to_string(),
            win_probability: 10,
            order,
            color: "#64748b".to_string(),
        }
    }

    fn three_stages() -> OptionSet<PipelineStage> {
        OptionSet::from_items(vec![
            stage(1, "Lead", 1),
            stage(2, "Qualified", 2),
            stage(3, "Proposal", 3),
        ])
    }

    #[test]
    fn test_replace_rewrites_order_from_position() {
        let mut set = three_stages();
        let submitted = vec![stage(3, "Proposal", 9), stage(1, "Lead", 0), stage(2, "Qualified", 4)];
        let result = set.replace(submitted).unwrap();
        let orders: Vec<u32> = result.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(set.names(), vec!["Proposal", "Lead", "Qualified"]);
    }

    #[test]
    fn test_reorder_moves_qualified_first() {
        let mut set = three_stages();
        let mut stages = set.ordered();
        let moved = stages.remove(1);
        stages.insert(0, moved);
        set.replace(stages).unwrap();

        let ordered = set.ordered();
        assert_eq!(ordered[0].name, "Qualified");
        assert_eq!(ordered[0].order, 1);
        assert_eq!(ordered[1].name, "Lead");
        assert_eq!(ordered[1].order, 2);
        assert_eq!(ordered[2].name, "Proposal");
        assert_eq!(ordered[2].order, 3);
    }

    #[test]
    fn test_replace_is_idempotent() {
        let mut set = three_stages();
        let input = vec![stage(2, "Qualified", 1), stage(1, "Lead", 2), stage(3, "Proposal", 3)];
        set.replace(input.clone()).unwrap();
        let first = set.clone();
        set.replace(input).unwrap();
        assert_eq!(set, first);
    }

    #[test]
    fn test_replace_rejects_duplicate_names() {
        let mut set = three_stages();
        let err = set
            .replace(vec![stage(1, "Lead", 1), stage(2, "Lead", 2)])
            .unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_replace_allocates_ids_for_new_entries() {
        let mut set = three_stages();
        let mut stages = set.ordered();
        stages.push(stage(0, "Negotiation", 0));
        let result = set.replace(stages).unwrap();
        assert_eq!(result[3].id, 4);
        assert_eq!(result[3].order, 4);
    }

    #[test]
    fn test_append_assigns_next_id_and_order() {
        let mut set = three_stages();
        let added = set.append(stage(0, "Negotiation", 0)).unwrap();
        assert_eq!(added.id, 4);
        assert_eq!(added.order, 4);
    }

    #[test]
    fn test_append_never_reuses_deleted_ids() {
        let mut set = three_stages();
        set.remove(3).unwrap();
        let added = set.append(stage(0, "Closed Won", 0)).unwrap();
        assert_eq!(added.id, 4);
        set.remove(4).unwrap();
        let again = set.append(stage(0, "Closed Lost", 0)).unwrap();
        assert!(again.id > 4);
    }

    #[test]
    fn test_append_to_empty_set_starts_at_one() {
        let mut set: OptionSet<PipelineStage> = OptionSet::from_items(vec![]);
        let added = set.append(stage(0, "Lead", 0)).unwrap();
        assert_eq!(added.id, 1);
        assert_eq!(added.order, 1);
    }

    #[test]
    fn test_append_rejects_blank_and_duplicate_names() {
        let mut set = three_stages();
        assert!(set.append(stage(0, "   ", 0)).is_err());
        assert!(set.append(stage(0, " Lead ", 0)).is_err());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_remove_renumbers_and_reports_missing() {
        let mut set = three_stages();
        let removed = set.remove(1).unwrap();
        assert_eq!(removed.name, "Lead");
        let orders: Vec<u32> = set.ordered().iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2]);

        let err = set.remove(99).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_update_keeps_order_and_returns_previous() {
        let mut set = three_stages();
        let (before, after) = set
            .update(2, |s| {
                s.name = "Discovery".to_string();
                s.order = 42;
            })
            .unwrap();
        assert_eq!(before.name, "Qualified");
        assert_eq!(after.name, "Discovery");
        assert_eq!(after.order, 2);
        assert_eq!(set.names(), vec!["Lead", "Discovery", "Proposal"]);
    }

    #[test]
    fn test_update_rejects_name_collision() {
        let mut set = three_stages();
        let err = set.update(2, |s| s.name = "Lead".to_string()).unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
        assert_eq!(set.names(), vec!["Lead", "Qualified", "Proposal"]);
    }

    #[test]
    fn test_ordered_sorts_loaded_documents() {
        let json = r##"{"items": [
            {"id": 1, "name": "B", "win_probability": 0, "order": 2, "color": "#fff"},
            {"id": 2, "name": "A", "win_probability": 0, "order": 1, "color": "#fff"}
        ]}"##;
        let set: OptionSet<PipelineStage> = serde_json::from_str(json).unwrap();
        assert_eq!(set.names(), vec!["A", "B"]);
        assert_eq!(set.find_by_name("A").map(|s| s.id), Some(2));
    }
}
