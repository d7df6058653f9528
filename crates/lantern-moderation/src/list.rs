use std::collections::HashSet;

use tracing::debug;
use uuid::Uuid;

use lantern_types::api::ConvertRequest;
use lantern_types::models::{ModerationStats, Submission, SubmissionStatus, SubmissionType};

use crate::store::{ConvertError, ListFilter, ListScope, StoreError, SubmissionStore};

pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// One moderation tab. The first five map to a status over non-deleted
/// rows; `Trash` is the soft-deleted partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Pending,
    Approved,
    Rejected,
    Added,
    Spam,
    Trash,
}

impl Tab {
    pub fn scope(self) -> ListScope {
        match self {
            Tab::Pending => ListScope::Status(SubmissionStatus::Pending),
            Tab::Approved => ListScope::Status(SubmissionStatus::Approved),
            Tab::Rejected => ListScope::Status(SubmissionStatus::Rejected),
            Tab::Added => ListScope::Status(SubmissionStatus::Added),
            Tab::Spam => ListScope::Status(SubmissionStatus::Spam),
            Tab::Trash => ListScope::Trash,
        }
    }

    /// The badge count for this tab, always read from the aggregator —
    /// never from the length of a partially loaded page.
    pub fn badge(self, stats: &ModerationStats) -> u64 {
        match self {
            Tab::Pending => stats.pending,
            Tab::Approved => stats.approved,
            Tab::Rejected => stats.rejected,
            Tab::Added => stats.added,
            Tab::Spam => stats.spam,
            Tab::Trash => stats.trash,
        }
    }
}

/// Per-row (and bulk) moderator actions. Conversion is separate: it goes
/// through the destination resolver, not through a plain action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Approve,
    Reject,
    MarkSpam,
    Trash,
    Restore,
    DeleteForever,
}

impl RowAction {
    fn status(self) -> Option<SubmissionStatus> {
        match self {
            RowAction::Approve => Some(SubmissionStatus::Approved),
            RowAction::Reject => Some(SubmissionStatus::Rejected),
            RowAction::MarkSpam => Some(SubmissionStatus::Spam),
            _ => None,
        }
    }

    /// Restore and permanent delete exist only in the trash; trashing only
    /// outside it.
    fn allowed_in(self, tab: Tab) -> bool {
        match self {
            RowAction::Restore | RowAction::DeleteForever => tab == Tab::Trash,
            RowAction::Trash => tab != Tab::Trash,
            RowAction::Approve | RowAction::Reject | RowAction::MarkSpam => tab != Tab::Trash,
        }
    }
}

/// The paginated view over one `(type, tab)` partition: loaded rows,
/// multi-select set, the id of the row currently being acted on, and the
/// cached stats that drive the tab badges.
///
/// Rows are pruned optimistically: a successful action removes the row from
/// the page it no longer belongs to, and the next reload reconciles.
pub struct SubmissionList<'a, S: SubmissionStore> {
    store: &'a S,
    kind: SubmissionType,
    tab: Tab,
    page_size: u32,
    rows: Vec<Submission>,
    has_more: bool,
    selection: HashSet<Uuid>,
    in_flight: Option<Uuid>,
    stats: ModerationStats,
}

impl<'a, S: SubmissionStore> SubmissionList<'a, S> {
    pub fn open(store: &'a S, kind: SubmissionType) -> Result<Self, StoreError> {
        Self::with_page_size(store, kind, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(
        store: &'a S,
        kind: SubmissionType,
        page_size: u32,
    ) -> Result<Self, StoreError> {
        let mut list = Self {
            store,
            kind,
            tab: Tab::Pending,
            page_size: page_size.max(1),
            rows: Vec::new(),
            has_more: false,
            selection: HashSet::new(),
            in_flight: None,
            stats: store.stats()?,
        };
        list.reload()?;
        Ok(list)
    }

    pub fn kind(&self) -> SubmissionType {
        self.kind
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn rows(&self) -> &[Submission] {
        &self.rows
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn stats(&self) -> &ModerationStats {
        &self.stats
    }

    pub fn badge(&self, tab: Tab) -> u64 {
        tab.badge(&self.stats)
    }

    pub fn selection(&self) -> &HashSet<Uuid> {
        &self.selection
    }

    pub fn busy_row(&self) -> Option<Uuid> {
        self.in_flight
    }

    /// Switch partition: drops the loaded page and the selection, re-fetches
    /// from the start.
    pub fn switch_to(&mut self, kind: SubmissionType, tab: Tab) -> Result<(), StoreError> {
        self.kind = kind;
        self.tab = tab;
        self.reload()
    }

    fn reload(&mut self) -> Result<(), StoreError> {
        self.rows.clear();
        self.selection.clear();
        self.has_more = false;
        self.load_more_inner(None)?;
        Ok(())
    }

    /// Fetch the next page, keyed by the creation timestamp of the last
    /// loaded row. Returns how many rows were appended.
    pub fn load_more(&mut self) -> Result<usize, StoreError> {
        if !self.rows.is_empty() && !self.has_more {
            return Ok(0);
        }
        let cursor = self.rows.last().map(|row| row.created_at);
        self.load_more_inner(cursor)
    }

    fn load_more_inner(
        &mut self,
        before: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<usize, StoreError> {
        let filter = ListFilter {
            kind: self.kind,
            scope: self.tab.scope(),
            before,
            limit: self.page_size,
        };
        let page = self.store.list(&filter)?;
        let fetched = page.len();
        self.has_more = fetched == self.page_size as usize;
        self.rows.extend(page);
        Ok(fetched)
    }

    pub fn toggle_select(&mut self, id: Uuid) {
        if !self.rows.iter().any(|row| row.id == id) {
            return;
        }
        if !self.selection.remove(&id) {
            self.selection.insert(id);
        }
    }

    pub fn select_all(&mut self) {
        self.selection = self.rows.iter().map(|row| row.id).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Apply one action to one row. On success the row is pruned from the
    /// page (unless it still belongs to the active tab) and the stats are
    /// refreshed; on failure the page and selection are left untouched.
    pub fn apply(&mut self, id: Uuid, action: RowAction) -> Result<(), StoreError> {
        self.check_action(&[id], action)?;
        self.in_flight = Some(id);
        let result = self.dispatch(&[id], action);
        self.in_flight = None;
        result?;
        self.settle(&[id], action)?;
        Ok(())
    }

    /// Apply one action to the whole selection as a single batch. Clears
    /// the selection and prunes all affected rows on success; any failure
    /// leaves both intact.
    pub fn apply_bulk(&mut self, action: RowAction) -> Result<usize, StoreError> {
        if self.selection.is_empty() {
            return Ok(0);
        }
        let ids: Vec<Uuid> = self.selection.iter().copied().collect();
        self.check_action(&ids, action)?;
        self.dispatch(&ids, action)?;
        let count = ids.len();
        self.settle(&ids, action)?;
        Ok(count)
    }

    /// Update moderator notes on a row in place. Independent of status, so
    /// the row is never pruned and the stats never move.
    pub fn edit_notes(&mut self, id: Uuid, notes: &str) -> Result<(), StoreError> {
        self.store.update_notes(id, notes)?;
        if let Some(row) = self.rows.iter_mut().find(|row| row.id == id) {
            row.admin_notes = Some(notes.to_string());
        }
        Ok(())
    }

    /// Run the conversion primitive for a resource row. On success the row
    /// is now `added` and is pruned from whatever tab it was viewed from.
    pub fn convert(&mut self, req: &ConvertRequest) -> Result<(), ConvertError> {
        let id = req.submission_id;
        self.in_flight = Some(id);
        let result = self.store.convert(req);
        self.in_flight = None;
        result?;
        debug!(submission = %id, "submission converted");
        self.prune(&[id]);
        self.refresh_stats().map_err(|e| ConvertError::Storage(e.into()))?;
        Ok(())
    }

    fn check_action(&self, ids: &[Uuid], action: RowAction) -> Result<(), StoreError> {
        if !action.allowed_in(self.tab) {
            return Err(StoreError::Invalid("action not available in this tab"));
        }
        if action.status().is_some() {
            // `added` is terminal; the store would skip these rows anyway,
            // but refusing up front keeps the page honest.
            let frozen = ids.iter().any(|id| {
                self.rows
                    .iter()
                    .any(|row| row.id == *id && row.status == SubmissionStatus::Added)
            });
            if frozen {
                return Err(StoreError::Invalid("added submissions cannot change status"));
            }
        }
        Ok(())
    }

    fn dispatch(&self, ids: &[Uuid], action: RowAction) -> Result<(), StoreError> {
        match action {
            RowAction::Approve => self.store.bulk_update_status(ids, SubmissionStatus::Approved),
            RowAction::Reject => self.store.bulk_update_status(ids, SubmissionStatus::Rejected),
            RowAction::MarkSpam => self.store.bulk_update_status(ids, SubmissionStatus::Spam),
            RowAction::Trash => self.store.set_deleted(ids, true),
            RowAction::Restore => self.store.set_deleted(ids, false),
            RowAction::DeleteForever => self.store.permanently_delete(ids),
        }
    }

    fn settle(&mut self, ids: &[Uuid], action: RowAction) -> Result<(), StoreError> {
        match action.status() {
            // A status change keeps the row only when the new status is the
            // one this tab shows.
            Some(status) if self.tab.scope() == ListScope::Status(status) => {
                for row in self.rows.iter_mut().filter(|row| ids.contains(&row.id)) {
                    row.status = status;
                }
            }
            _ => self.prune(ids),
        }
        for id in ids {
            self.selection.remove(id);
        }
        self.refresh_stats()
    }

    fn prune(&mut self, ids: &[Uuid]) {
        self.rows.retain(|row| !ids.contains(&row.id));
        for id in ids {
            self.selection.remove(id);
        }
    }

    fn refresh_stats(&mut self) -> Result<(), StoreError> {
        self.stats = self.store.stats()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MemStore, sub};
    use lantern_types::models::SubmissionType::{Feedback, Resource};

    #[test]
    fn open_loads_first_page_and_stats() {
        let store = MemStore::default();
        for i in 0..30 {
            store.push(sub(Feedback, SubmissionStatus::Pending, i));
        }
        let list = SubmissionList::with_page_size(&store, Feedback, 10).unwrap();
        assert_eq!(list.rows().len(), 10);
        assert!(list.has_more());
        // Badge reflects the aggregator, not the partial page.
        assert_eq!(list.badge(Tab::Pending), 30);
    }

    #[test]
    fn paging_covers_the_whole_partition_without_duplicates() {
        let store = MemStore::default();
        for i in 0..23 {
            store.push(sub(Feedback, SubmissionStatus::Pending, i));
        }
        let mut list = SubmissionList::with_page_size(&store, Feedback, 7).unwrap();
        while list.has_more() {
            list.load_more().unwrap();
        }
        assert_eq!(list.rows().len(), 23);
        let unique: HashSet<Uuid> = list.rows().iter().map(|row| row.id).collect();
        assert_eq!(unique.len(), 23);
        // A further call is a no-op.
        assert_eq!(list.load_more().unwrap(), 0);
    }

    #[test]
    fn switching_tabs_clears_page_and_selection() {
        let store = MemStore::default();
        let pending = sub(Feedback, SubmissionStatus::Pending, 0);
        store.push(pending.clone());
        store.push(sub(Feedback, SubmissionStatus::Approved, 1));

        let mut list = SubmissionList::open(&store, Feedback).unwrap();
        list.toggle_select(pending.id);
        assert_eq!(list.selection().len(), 1);

        list.switch_to(Feedback, Tab::Approved).unwrap();
        assert!(list.selection().is_empty());
        assert_eq!(list.rows().len(), 1);
        assert_eq!(list.rows()[0].status, SubmissionStatus::Approved);
    }

    #[test]
    fn approving_prunes_the_row_and_moves_the_stats() {
        let store = MemStore::default();
        let row = sub(Feedback, SubmissionStatus::Pending, 0);
        store.push(row.clone());

        let mut list = SubmissionList::open(&store, Feedback).unwrap();
        assert_eq!(list.badge(Tab::Pending), 1);

        list.apply(row.id, RowAction::Approve).unwrap();
        assert!(list.rows().is_empty());
        assert_eq!(list.badge(Tab::Pending), 0);
        assert_eq!(list.badge(Tab::Approved), 1);
        assert_eq!(list.busy_row(), None);
    }

    #[test]
    fn re_applying_the_tabs_own_status_keeps_the_row() {
        let store = MemStore::default();
        let row = sub(Feedback, SubmissionStatus::Approved, 0);
        store.push(row.clone());

        let mut list = SubmissionList::open(&store, Feedback).unwrap();
        list.switch_to(Feedback, Tab::Approved).unwrap();
        list.apply(row.id, RowAction::Approve).unwrap();
        assert_eq!(list.rows().len(), 1);
    }

    #[test]
    fn added_rows_refuse_plain_status_changes() {
        let store = MemStore::default();
        let row = sub(Resource, SubmissionStatus::Added, 0);
        store.push(row.clone());

        let mut list = SubmissionList::open(&store, Resource).unwrap();
        list.switch_to(Resource, Tab::Added).unwrap();
        let err = list.apply(row.id, RowAction::Reject).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert_eq!(list.rows().len(), 1);
    }

    #[test]
    fn bulk_reject_clears_selection_and_prunes() {
        let store = MemStore::default();
        let rows: Vec<_> = (0..3)
            .map(|i| {
                let row = sub(Feedback, SubmissionStatus::Pending, i);
                store.push(row.clone());
                row
            })
            .collect();

        let mut list = SubmissionList::open(&store, Feedback).unwrap();
        for row in &rows {
            list.toggle_select(row.id);
        }
        assert_eq!(list.apply_bulk(RowAction::Reject).unwrap(), 3);
        assert!(list.rows().is_empty());
        assert!(list.selection().is_empty());
        assert_eq!(list.badge(Tab::Pending), 0);
        assert_eq!(list.badge(Tab::Rejected), 3);
    }

    #[test]
    fn failed_bulk_leaves_page_and_selection_intact() {
        let store = MemStore::default();
        let row = sub(Feedback, SubmissionStatus::Pending, 0);
        store.push(row.clone());

        let mut list = SubmissionList::open(&store, Feedback).unwrap();
        list.toggle_select(row.id);
        store.fail_mutations.set(true);

        assert!(list.apply_bulk(RowAction::Approve).is_err());
        assert_eq!(list.rows().len(), 1);
        assert_eq!(list.selection().len(), 1);
    }

    #[test]
    fn trash_and_restore_preserve_status() {
        let store = MemStore::default();
        let row = sub(Feedback, SubmissionStatus::Approved, 0);
        store.push(row.clone());

        let mut list = SubmissionList::open(&store, Feedback).unwrap();
        list.switch_to(Feedback, Tab::Approved).unwrap();
        list.apply(row.id, RowAction::Trash).unwrap();
        assert!(list.rows().is_empty());
        assert_eq!(list.badge(Tab::Trash), 1);
        assert_eq!(list.badge(Tab::Approved), 0);

        list.switch_to(Feedback, Tab::Trash).unwrap();
        assert_eq!(list.rows().len(), 1);
        list.apply(row.id, RowAction::Restore).unwrap();
        assert!(list.rows().is_empty());

        list.switch_to(Feedback, Tab::Approved).unwrap();
        assert_eq!(list.rows().len(), 1);
        assert_eq!(list.rows()[0].status, SubmissionStatus::Approved);
        assert!(!list.rows()[0].is_deleted);
    }

    #[test]
    fn permanent_delete_is_trash_only() {
        let store = MemStore::default();
        let row = sub(Feedback, SubmissionStatus::Pending, 0);
        store.push(row.clone());

        let mut list = SubmissionList::open(&store, Feedback).unwrap();
        let err = list.apply(row.id, RowAction::DeleteForever).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert_eq!(list.rows().len(), 1);
    }

    #[test]
    fn notes_edit_does_not_prune() {
        let store = MemStore::default();
        let row = sub(Feedback, SubmissionStatus::Pending, 0);
        store.push(row.clone());

        let mut list = SubmissionList::open(&store, Feedback).unwrap();
        list.edit_notes(row.id, "needs follow-up").unwrap();
        assert_eq!(list.rows().len(), 1);
        assert_eq!(list.rows()[0].admin_notes.as_deref(), Some("needs follow-up"));
    }
}
