use crate::config::JournalConfig;
use crate::editor::{BookEditor, EditorView};
use crate::geometry::Point;
use crate::imaging;
use crate::library::{Library, LibraryPage, LibraryQuery};
use crate::models::{
  BookFormat, BookRecord, Category, LongField, RatingKind, SaveStatus, TextField,
};
use crate::session::EditorSession;
use crate::stickers::{BoardAction, Handle, PointerId};
use crate::store::{JsonFileStore, RecordStore};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tauri::plugin::{Builder, TauriPlugin};
use tauri::{AppHandle, Emitter, Manager, Runtime, State};

const TICK_INTERVAL: Duration = Duration::from_millis(100);
const SAVE_STATUS_EVENT: &str = "journal://save-status";

pub struct JournalState {
  config: JournalConfig,
  library: Library<JsonFileStore>,
  session: EditorSession,
}

impl JournalState {
  pub fn new(config: JournalConfig) -> Self {
    let library = Library::new(JsonFileStore::from_config(&config));
    Self {
      config,
      library,
      session: EditorSession::new(),
    }
  }

  fn with_editor<T>(
    &self,
    apply: impl FnOnce(&mut BookEditor, Instant) -> T,
  ) -> Result<T, String> {
    self
      .session
      .with_editor(Instant::now(), apply)
      .map_err(|err| err.to_string())
  }

  fn replace_editor(&self, editor: BookEditor) -> Result<EditorView, String> {
    let view = editor.view();
    self
      .session
      .replace(Some(editor))
      .map_err(|err| err.to_string())?;
    Ok(view)
  }

  /// One autosave step. Returns the status when it differs from `last`.
  fn tick(&self, last: SaveStatus) -> Option<SaveStatus> {
    match self.session.tick(self.library.store(), Instant::now()) {
      Ok(status) => status.filter(|status| *status != last),
      Err(err) => {
        log::error!("autosave tick failed: {}", err);
        None
      }
    }
  }
}

/// Edits that have no dedicated command.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EditorChange {
  Category { category: Category },
  Format { format: Option<BookFormat> },
  Color { field: TextField, color: String },
  #[serde(rename_all = "camelCase")]
  Cover { cover_url: Option<String> },
  #[serde(rename_all = "camelCase")]
  AreaHeight { field: LongField, height: f64 },
  Rating { rating: RatingKind, value: f64 },
  #[serde(rename_all = "camelCase")]
  DraggingCover { dragging: bool },
  BeginClose,
  #[serde(rename_all = "camelCase")]
  RequestStickerRemoval { sticker_id: String },
  ClearStickers,
  ConfirmStickerRemoval,
  CancelStickerRemoval,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum StickerPointerEvent {
  #[serde(rename_all = "camelCase")]
  Down {
    pointer_id: PointerId,
    sticker_id: String,
    handle: Handle,
    x: f64,
    y: f64,
  },
  #[serde(rename_all = "camelCase")]
  Move { pointer_id: PointerId, x: f64, y: f64 },
  #[serde(rename_all = "camelCase")]
  Up { pointer_id: PointerId },
}

#[tauri::command]
fn load_books(state: State<'_, JournalState>) -> Result<Vec<BookRecord>, String> {
  state.library.store().load_all().map_err(|err| err.to_string())
}

#[tauri::command]
fn browse_library(
  state: State<'_, JournalState>,
  query: Option<LibraryQuery>,
) -> Result<LibraryPage, String> {
  let query = query.unwrap_or_else(|| LibraryQuery {
    page_size: state.config.page_size,
    ..LibraryQuery::default()
  });
  state.library.page(&query).map_err(|err| err.to_string())
}

#[tauri::command]
fn save_book(state: State<'_, JournalState>, record: BookRecord) -> Result<String, String> {
  state
    .session
    .write(|| state.library.store().upsert(&record))
    .map_err(|err| err.to_string())?
    .map_err(|err| err.to_string())
}

#[tauri::command]
fn delete_book(state: State<'_, JournalState>, id: String) -> Result<bool, String> {
  state.session.close_record(&id).map_err(|err| err.to_string())?;
  state
    .session
    .write(|| state.library.delete(&id))
    .map_err(|err| err.to_string())?
    .map_err(|err| err.to_string())
}

#[tauri::command]
fn encode_cover(state: State<'_, JournalState>, bytes: Vec<u8>) -> Result<String, String> {
  imaging::encode_cover(&bytes, state.config.cover).map_err(|err| err.to_string())
}

#[tauri::command]
fn encode_sticker(state: State<'_, JournalState>, bytes: Vec<u8>) -> Result<String, String> {
  imaging::encode_sticker(&bytes, state.config.sticker_image).map_err(|err| err.to_string())
}

#[tauri::command]
fn editor_open(state: State<'_, JournalState>, id: String) -> Result<EditorView, String> {
  let record = state
    .library
    .record(&id)
    .map_err(|err| err.to_string())?
    .ok_or_else(|| format!("book {} not found", id))?;
  state.replace_editor(BookEditor::open(record, &state.config.editor))
}

#[tauri::command]
fn editor_new(
  state: State<'_, JournalState>,
  category: Option<Category>,
) -> Result<EditorView, String> {
  let editor = BookEditor::new_record(category.unwrap_or_default(), &state.config.editor);
  state.replace_editor(editor)
}

#[tauri::command]
fn editor_set_text(
  state: State<'_, JournalState>,
  field: TextField,
  value: String,
) -> Result<EditorView, String> {
  state.with_editor(|editor, now| {
    editor.set_text(field, &value, now);
    editor.view()
  })
}

#[tauri::command]
fn editor_edit_rating(
  state: State<'_, JournalState>,
  rating: RatingKind,
  text: String,
) -> Result<EditorView, String> {
  state.with_editor(|editor, now| {
    editor.edit_rating(rating, &text, now);
    editor.view()
  })
}

#[tauri::command]
fn editor_blur_rating(
  state: State<'_, JournalState>,
  rating: RatingKind,
) -> Result<EditorView, String> {
  state.with_editor(|editor, now| {
    editor.blur_rating(rating, now);
    editor.view()
  })
}

#[tauri::command]
fn editor_update(
  state: State<'_, JournalState>,
  change: EditorChange,
) -> Result<EditorView, String> {
  state.with_editor(|editor, now| {
    match change {
      EditorChange::Category { category } => {
        editor.set_category(category, now);
      }
      EditorChange::Format { format } => {
        editor.set_format(format, now);
      }
      EditorChange::Color { field, color } => {
        editor.set_color(field, &color, now);
      }
      EditorChange::Cover { cover_url } => {
        editor.set_cover(cover_url, now);
      }
      EditorChange::AreaHeight { field, height } => {
        editor.set_area_height(field, height, now);
      }
      EditorChange::Rating { rating, value } => {
        editor.set_rating(rating, value, now);
      }
      EditorChange::DraggingCover { dragging } => editor.set_dragging_cover(dragging),
      EditorChange::BeginClose => editor.begin_close(),
      EditorChange::RequestStickerRemoval { sticker_id } => {
        editor.request_sticker_removal(&sticker_id);
      }
      EditorChange::ClearStickers => {
        editor.request_clear_stickers();
      }
      EditorChange::ConfirmStickerRemoval => {
        editor.confirm_sticker_removal(now);
      }
      EditorChange::CancelStickerRemoval => editor.cancel_sticker_removal(),
    }
    editor.view()
  })
}

#[tauri::command]
fn editor_sticker_pointer(
  state: State<'_, JournalState>,
  event: StickerPointerEvent,
) -> Result<Vec<BoardAction>, String> {
  state.with_editor(|editor, now| match event {
    StickerPointerEvent::Down {
      pointer_id,
      sticker_id,
      handle,
      x,
      y,
    } => editor.sticker_pointer_down(pointer_id, &sticker_id, handle, Point::new(x, y)),
    StickerPointerEvent::Move { pointer_id, x, y } => {
      editor.sticker_pointer_move(pointer_id, Point::new(x, y))
    }
    StickerPointerEvent::Up { pointer_id } => editor.sticker_pointer_up(pointer_id, now),
  })
}

#[tauri::command]
fn editor_add_stickers(
  state: State<'_, JournalState>,
  urls: Vec<String>,
) -> Result<Vec<BoardAction>, String> {
  state.with_editor(|editor, now| editor.add_stickers(urls, now))
}

#[tauri::command]
fn editor_close(state: State<'_, JournalState>) -> Result<Option<BookRecord>, String> {
  let closed = state.session.replace(None).map_err(|err| err.to_string())?;
  Ok(closed.map(BookEditor::into_record))
}

#[tauri::command]
fn editor_state(state: State<'_, JournalState>) -> Result<Option<EditorView>, String> {
  state.session.view().map_err(|err| err.to_string())
}

fn spawn_ticker<R: Runtime>(app: AppHandle<R>) {
  std::thread::spawn(move || {
    let mut last = SaveStatus::Idle;
    loop {
      std::thread::sleep(TICK_INTERVAL);
      let state = app.state::<JournalState>();
      if let Some(status) = state.tick(last) {
        last = status;
        if let Err(err) = app.emit(SAVE_STATUS_EVENT, status) {
          log::warn!("failed to emit save status: {}", err);
        }
      }
    }
  });
}

/// Journal commands and their shared state, ticking autosave in the
/// background.
pub fn plugin<R: Runtime>(config: JournalConfig) -> TauriPlugin<R> {
  Builder::new("journal")
    .invoke_handler(tauri::generate_handler![
      load_books,
      browse_library,
      save_book,
      delete_book,
      encode_cover,
      encode_sticker,
      editor_open,
      editor_new,
      editor_set_text,
      editor_edit_rating,
      editor_blur_rating,
      editor_update,
      editor_sticker_pointer,
      editor_add_stickers,
      editor_close,
      editor_state
    ])
    .setup(move |app, _api| {
      log::info!("book journal data file: {}", config.data_file.display());
      app.manage(JournalState::new(config));
      spawn_ticker(app.clone());
      Ok(())
    })
    .build()
}

pub fn log_plugin<R: Runtime>() -> TauriPlugin<R> {
  let level = if cfg!(debug_assertions) {
    log::LevelFilter::Debug
  } else {
    log::LevelFilter::Info
  };
  tauri_plugin_log::Builder::default().level(level).build()
}
