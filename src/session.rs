use crate::editor::{BookEditor, EditorView};
use crate::models::SaveStatus;
use crate::store::RecordStore;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("editor session lock poisoned")]
    Poisoned,
    #[error("no book is open")]
    NoBookOpen,
}

#[derive(Default)]
struct Slot {
    /// Bumped whenever the open editor is replaced or dropped.
    generation: u64,
    editor: Option<BookEditor>,
}

/// The single open editor shared between commands and the autosave ticker.
///
/// Store writes run outside the editor lock so edits are never blocked by a
/// write; they are serialized among themselves by a separate write lock.
#[derive(Default)]
pub struct EditorSession {
    slot: Mutex<Slot>,
    writes: Mutex<()>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> Result<MutexGuard<'_, Slot>, SessionError> {
        self.slot.lock().map_err(|_| SessionError::Poisoned)
    }

    pub fn with_editor<T>(
        &self,
        now: Instant,
        apply: impl FnOnce(&mut BookEditor, Instant) -> T,
    ) -> Result<T, SessionError> {
        let mut slot = self.slot()?;
        let editor = slot.editor.as_mut().ok_or(SessionError::NoBookOpen)?;
        Ok(apply(editor, now))
    }

    pub fn view(&self) -> Result<Option<EditorView>, SessionError> {
        Ok(self.slot()?.editor.as_ref().map(BookEditor::view))
    }

    /// Installs `editor` (or nothing) and hands back the previous editor,
    /// already closed.
    pub fn replace(&self, editor: Option<BookEditor>) -> Result<Option<BookEditor>, SessionError> {
        let mut slot = self.slot()?;
        slot.generation = slot.generation.wrapping_add(1);
        let mut previous = std::mem::replace(&mut slot.editor, editor);
        if let Some(previous) = previous.as_mut() {
            previous.close();
        }
        Ok(previous)
    }

    /// Drops the open editor if it is editing the record `id`.
    pub fn close_record(&self, id: &str) -> Result<bool, SessionError> {
        let editing_it = self
            .slot()?
            .editor
            .as_ref()
            .is_some_and(|editor| editor.record().id.as_deref() == Some(id));
        if editing_it {
            self.replace(None)?;
        }
        Ok(editing_it)
    }

    /// Runs a store mutation under the write lock.
    pub fn write<T>(&self, mutate: impl FnOnce() -> T) -> Result<T, SessionError> {
        let _writing = self.writes.lock().map_err(|_| SessionError::Poisoned)?;
        Ok(mutate())
    }

    /// One autosave step: snapshot under the editor lock, write without it,
    /// then report back only if the same editor is still open. Returns the
    /// current status, or `None` when no book is open.
    pub fn tick(
        &self,
        store: &dyn RecordStore,
        now: Instant,
    ) -> Result<Option<SaveStatus>, SessionError> {
        let (generation, snapshot) = {
            let mut slot = self.slot()?;
            let generation = slot.generation;
            let Some(editor) = slot.editor.as_mut() else {
                return Ok(None);
            };
            match editor.take_due_snapshot(now) {
                Some(snapshot) => (generation, snapshot),
                None => return Ok(Some(editor.status())),
            }
        };

        let result = {
            let _writing = self.writes.lock().map_err(|_| SessionError::Poisoned)?;
            if self.slot()?.generation != generation {
                log::debug!("editor replaced before its autosave ran, dropping it");
                return Ok(self.slot()?.editor.as_ref().map(BookEditor::status));
            }
            store.upsert(&snapshot)
        };

        let mut slot = self.slot()?;
        if slot.generation != generation {
            log::debug!("editor replaced during autosave, result not applied");
            return Ok(slot.editor.as_ref().map(BookEditor::status));
        }
        Ok(slot.editor.as_mut().map(|editor| {
            editor.finish_save(result, now);
            editor.status()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::models::{BookRecord, Category, TextField};
    use crate::store::testing::RecordingStore;
    use crate::store::StoreError;
    use std::time::Duration;

    const QUIET: Duration = Duration::from_millis(900);

    /// Runs a hook against the session in the middle of every upsert.
    struct MidWriteStore<F: Fn()> {
        inner: RecordingStore,
        during_write: F,
    }

    impl<F: Fn()> MidWriteStore<F> {
        fn new(during_write: F) -> Self {
            Self {
                inner: RecordingStore::default(),
                during_write,
            }
        }
    }

    impl<F: Fn()> RecordStore for MidWriteStore<F> {
        fn load_all(&self) -> Result<Vec<BookRecord>, StoreError> {
            self.inner.load_all()
        }

        fn upsert(&self, record: &BookRecord) -> Result<String, StoreError> {
            (self.during_write)();
            self.inner.upsert(record)
        }

        fn delete(&self, id: &str) -> Result<bool, StoreError> {
            self.inner.delete(id)
        }
    }

    fn editor() -> BookEditor {
        BookEditor::new_record(Category::Novels, &EditorConfig::default())
    }

    #[test]
    fn edits_land_while_a_write_is_in_flight() {
        let session = EditorSession::new();
        session.replace(Some(editor())).expect("open");
        let t0 = Instant::now();
        session
            .with_editor(t0, |editor, now| editor.set_text(TextField::Title, "Dune", now))
            .expect("edit");

        let store = MidWriteStore::new(|| {
            session
                .with_editor(t0 + QUIET, |editor, now| {
                    editor.set_text(TextField::Author, "Frank Herbert", now)
                })
                .expect("edit during write");
        });
        let status = session.tick(&store, t0 + QUIET).expect("tick");

        assert_eq!(status, Some(SaveStatus::Saving));
        let saved = store.inner.last_upsert().expect("upsert");
        assert_eq!(saved.content.title, "Dune");
        assert_eq!(saved.content.author, "");

        let view = session.view().expect("view").expect("open editor");
        assert!(view.record.id.is_some());
        assert_eq!(view.record.content.author, "Frank Herbert");
    }

    #[test]
    fn result_is_not_applied_to_a_replacement_editor() {
        let session = EditorSession::new();
        session.replace(Some(editor())).expect("open");
        let t0 = Instant::now();
        session
            .with_editor(t0, |editor, now| editor.set_text(TextField::Title, "Dune", now))
            .expect("edit");

        let store = MidWriteStore::new(|| {
            session.replace(Some(editor())).expect("open another");
        });
        let status = session.tick(&store, t0 + QUIET).expect("tick");

        assert_eq!(store.inner.upsert_count(), 1);
        assert_eq!(status, Some(SaveStatus::Idle));
        let view = session.view().expect("view").expect("open editor");
        assert_eq!(view.record.id, None);
        assert_eq!(view.record.content.title, "");
    }

    #[test]
    fn closing_the_record_drops_its_due_write() {
        let session = EditorSession::new();
        let store = RecordingStore::default();
        let mut record = BookRecord::new(Category::Novels);
        record.id = Some("1700000000000-abc1234".to_string());
        record.content.title = "Dune".to_string();
        session
            .replace(Some(BookEditor::open(record, &EditorConfig::default())))
            .expect("open");
        let t0 = Instant::now();
        session
            .with_editor(t0, |editor, now| editor.set_text(TextField::Title, "Dune!", now))
            .expect("edit");

        assert!(!session.close_record("someone-else").expect("close"));
        assert!(session.close_record("1700000000000-abc1234").expect("close"));
        assert_eq!(session.tick(&store, t0 + QUIET).expect("tick"), None);
        assert_eq!(store.upsert_count(), 0);
        assert!(matches!(
            session.with_editor(t0, |_, _| ()),
            Err(SessionError::NoBookOpen)
        ));
    }
}
