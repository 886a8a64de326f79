//! The document pane: a rope-backed buffer with a cursor and an optional
//! selection. This is the "active document" the extension edits.

use chatbot_core::{ChatbotError, DocumentEditor, Selection};
use ropey::Rope;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
pub struct Document {
    rope: Rope,
    /// Char index.
    cursor: usize,
    /// Where the selection started; the cursor is the other end.
    anchor: Option<usize>,
    path: Option<PathBuf>,
    modified: bool,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            ..Self::default()
        }
    }

    /// Load `path`, or start an empty buffer bound to it if it doesn't exist yet.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let rope = match File::open(&path) {
            Ok(file) => Rope::from_reader(BufReader::new(file))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Rope::new(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            rope,
            path: Some(path),
            ..Self::default()
        })
    }

    /// Write the buffer back to its file.
    pub fn save(&mut self) -> io::Result<PathBuf> {
        let path = self.path.clone().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "document has no file; start with --file")
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&path)?);
        self.rope.write_to(&mut writer)?;
        writer.flush()?;
        self.modified = false;
        Ok(path)
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn title(&self) -> String {
        let name = self
            .path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "untitled".to_string());
        if self.modified {
            format!("{name} *")
        } else {
            name
        }
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Line `idx` without its line break.
    pub fn line(&self, idx: usize) -> String {
        if idx >= self.rope.len_lines() {
            return String::new();
        }
        let line = self.rope.line(idx).to_string();
        line.trim_end_matches(['\n', '\r']).to_string()
    }

    /// Char index where line `idx` starts.
    pub fn line_start(&self, idx: usize) -> usize {
        self.rope.line_to_char(idx.min(self.rope.len_lines().saturating_sub(1)))
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Zero-based (line, column) of the cursor, in chars.
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let line = self.rope.char_to_line(self.cursor);
        (line, self.cursor - self.rope.line_to_char(line))
    }

    /// Selected char range, if any.
    pub fn selection_range(&self) -> Option<(usize, usize)> {
        let anchor = self.anchor?;
        if anchor == self.cursor {
            return None;
        }
        Some((anchor.min(self.cursor), anchor.max(self.cursor)))
    }

    pub fn selection(&self) -> Option<Selection> {
        let (start, end) = self.selection_range()?;
        // A whole-line selection stops at column 0 of the following line.
        let last = if self.rope.line_to_char(self.rope.char_to_line(end)) == end {
            end - 1
        } else {
            end
        };
        Some(Selection {
            text: self.rope.slice(start..end).to_string(),
            end_line: self.rope.char_to_line(last),
        })
    }

    /// Select whole lines, 1-based and inclusive. Out-of-range lines are clamped.
    pub fn select_lines(&mut self, from: usize, to: usize) {
        let last = self.rope.len_lines().saturating_sub(1);
        let from = from.saturating_sub(1).min(last);
        let to = to.saturating_sub(1).clamp(from, last);
        self.anchor = Some(self.rope.line_to_char(from));
        self.cursor = self.rope.line_to_char(to) + self.line_len(to);
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
    }

    /// Insert at the cursor and move past the text. The selection is dropped,
    /// not replaced.
    pub fn insert(&mut self, text: &str) {
        self.anchor = None;
        self.rope.insert(self.cursor, text);
        self.cursor += text.chars().count();
        self.modified = true;
    }

    /// Keyboard input: replaces the selection.
    pub fn type_char(&mut self, ch: char) {
        self.delete_selection();
        let mut buf = [0u8; 4];
        self.insert(ch.encode_utf8(&mut buf));
    }

    /// Insert at the start of `line`. Past the end, the text goes on a new
    /// last line.
    pub fn insert_at_line(&mut self, line: usize, text: &str) {
        let (at, text) = if line < self.rope.len_lines() {
            (self.rope.line_to_char(line), text.to_string())
        } else {
            let end = self.rope.len_chars();
            let needs_break = end > 0 && self.rope.char(end - 1) != '\n';
            let text = if needs_break {
                format!("\n{text}")
            } else {
                text.to_string()
            };
            (end, text)
        };

        let inserted = text.chars().count();
        self.rope.insert(at, &text);
        if self.cursor >= at {
            self.cursor += inserted;
        }
        if let Some(anchor) = self.anchor.as_mut() {
            if *anchor >= at {
                *anchor += inserted;
            }
        }
        self.modified = true;
    }

    pub fn backspace(&mut self) {
        if self.delete_selection() || self.cursor == 0 {
            return;
        }
        self.rope.remove(self.cursor - 1..self.cursor);
        self.cursor -= 1;
        self.modified = true;
    }

    pub fn delete(&mut self) {
        if self.delete_selection() || self.cursor >= self.rope.len_chars() {
            return;
        }
        self.rope.remove(self.cursor..self.cursor + 1);
        self.modified = true;
    }

    fn delete_selection(&mut self) -> bool {
        let Some((start, end)) = self.selection_range() else {
            self.anchor = None;
            return false;
        };
        self.rope.remove(start..end);
        self.cursor = start;
        self.anchor = None;
        self.modified = true;
        true
    }

    // ── Cursor movement ─────────────────────────────────────────────────

    pub fn move_left(&mut self, extend: bool) {
        self.begin_move(extend);
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self, extend: bool) {
        self.begin_move(extend);
        self.cursor = (self.cursor + 1).min(self.rope.len_chars());
    }

    pub fn move_up(&mut self, extend: bool) {
        self.begin_move(extend);
        let (line, col) = self.cursor_line_col();
        if line > 0 {
            self.cursor = self.rope.line_to_char(line - 1) + col.min(self.line_len(line - 1));
        } else {
            self.cursor = 0;
        }
    }

    pub fn move_down(&mut self, extend: bool) {
        self.begin_move(extend);
        let (line, col) = self.cursor_line_col();
        if line + 1 < self.rope.len_lines() {
            self.cursor = self.rope.line_to_char(line + 1) + col.min(self.line_len(line + 1));
        } else {
            self.cursor = self.rope.len_chars();
        }
    }

    pub fn move_home(&mut self, extend: bool) {
        self.begin_move(extend);
        let (line, _) = self.cursor_line_col();
        self.cursor = self.rope.line_to_char(line);
    }

    pub fn move_end(&mut self, extend: bool) {
        self.begin_move(extend);
        let (line, _) = self.cursor_line_col();
        self.cursor = self.rope.line_to_char(line) + self.line_len(line);
    }

    fn begin_move(&mut self, extend: bool) {
        if !extend {
            self.anchor = None;
        } else if self.anchor.is_none() {
            self.anchor = Some(self.cursor);
        }
    }

    /// Length of `line` in chars, without its line break.
    fn line_len(&self, line: usize) -> usize {
        let slice = self.rope.line(line);
        let mut len = slice.len_chars();
        while len > 0 && matches!(slice.char(len - 1), '\n' | '\r') {
            len -= 1;
        }
        len
    }
}

/// A [`Document`] shared between the UI and the extension's background tasks.
#[derive(Clone, Default)]
pub struct SharedDocument(Arc<Mutex<Document>>);

impl SharedDocument {
    pub fn new(document: Document) -> Self {
        Self(Arc::new(Mutex::new(document)))
    }

    pub fn lock(&self) -> MutexGuard<'_, Document> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DocumentEditor for SharedDocument {
    fn insert_at_cursor(&self, text: &str) -> Result<(), ChatbotError> {
        self.lock().insert(text);
        Ok(())
    }

    fn insert_at_line(&self, line: usize, text: &str) -> Result<(), ChatbotError> {
        self.lock().insert_at_line(line, text);
        Ok(())
    }

    fn selection(&self) -> Result<Option<Selection>, ChatbotError> {
        Ok(self.lock().selection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_moves_cursor() {
        let mut doc = Document::new();
        doc.insert("héllo");
        doc.insert(" world");
        assert_eq!(doc.text(), "héllo world");
        assert_eq!(doc.cursor(), 11);
        assert!(doc.is_modified());
    }

    #[test]
    fn test_shift_selection_reports_end_line() {
        let mut doc = Document::from_text("a = 1\nb = 2\nc = 3");
        doc.move_down(true);
        doc.move_end(true);

        let selection = doc.selection().unwrap();
        assert_eq!(selection.text, "a = 1\nb = 2");
        assert_eq!(selection.end_line, 1);

        doc.move_left(false);
        assert!(doc.selection().is_none());
    }

    #[test]
    fn test_whole_line_selection_ends_on_last_selected_line() {
        let mut doc = Document::from_text("a = 1\nb = 2\nc = 3");
        doc.move_down(true);

        let selection = doc.selection().unwrap();
        assert_eq!(selection.text, "a = 1\n");
        assert_eq!(selection.end_line, 0);

        doc.move_down(true);
        assert_eq!(doc.selection().unwrap().end_line, 1);
    }

    #[test]
    fn test_select_lines_is_clamped() {
        let mut doc = Document::from_text("one\ntwo\nthree");
        doc.select_lines(2, 9);
        let selection = doc.selection().unwrap();
        assert_eq!(selection.text, "two\nthree");
        assert_eq!(selection.end_line, 2);
    }

    #[test]
    fn test_insert_at_line_shifts_cursor() {
        let mut doc = Document::from_text("a\nb");
        doc.move_down(false);
        doc.insert_at_line(1, "x\n");
        assert_eq!(doc.text(), "a\nx\nb");
        assert_eq!(doc.cursor_line_col(), (2, 0));
    }

    #[test]
    fn test_insert_past_end_starts_new_line() {
        let mut doc = Document::from_text("x = 1");
        doc.insert_at_line(1, "y = 2\n");
        assert_eq!(doc.text(), "x = 1\ny = 2\n");

        let mut doc = Document::from_text("x = 1\n");
        doc.insert_at_line(5, "y = 2\n");
        assert_eq!(doc.text(), "x = 1\ny = 2\n");
    }

    #[test]
    fn test_typing_replaces_selection() {
        let mut doc = Document::from_text("abc");
        doc.move_right(false);
        doc.move_right(true);
        doc.type_char('X');
        assert_eq!(doc.text(), "aXc");

        doc.backspace();
        doc.backspace();
        assert_eq!(doc.text(), "c");
        doc.backspace();
        assert_eq!(doc.text(), "c");
    }

    #[test]
    fn test_save_and_open_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("main.py");

        let mut doc = Document::open(&path).unwrap();
        assert_eq!(doc.text(), "");
        doc.insert("print('hi')\n");
        assert_eq!(doc.title(), "main.py *");
        assert_eq!(doc.save().unwrap(), path);
        assert!(!doc.is_modified());

        let reopened = Document::open(&path).unwrap();
        assert_eq!(reopened.text(), "print('hi')\n");
        assert_eq!(reopened.line(0), "print('hi')");
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut doc = Document::from_text("x");
        assert!(doc.save().is_err());
    }

    #[test]
    fn test_shared_document_as_editor() {
        let shared = SharedDocument::new(Document::from_text("a"));
        let editor: &dyn DocumentEditor = &shared;

        assert_eq!(editor.selection().unwrap(), None);
        editor.insert_at_line(1, "b\n").unwrap();
        editor.insert_at_cursor(">").unwrap();
        assert_eq!(shared.lock().text(), ">a\nb\n");
    }
}
