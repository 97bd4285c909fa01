//! Per-file editing state.

use rws_types::path;
use serde::Serialize;

/// Editing state of one open file.
///
/// `live_content` follows every keystroke; `baseline_content` only moves on
/// a local save, which is also the only point where the buffer reaches the
/// overlay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OpenBuffer {
    pub path: String,
    pub live_content: String,
    pub baseline_content: String,
}

impl OpenBuffer {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            path: path.into(),
            live_content: content.clone(),
            baseline_content: content,
        }
    }

    /// Unsaved typing.
    pub fn is_dirty(&self) -> bool {
        self.live_content != self.baseline_content
    }

    /// Advance the baseline to the live text.
    pub(crate) fn mark_saved(&mut self) {
        self.baseline_content = self.live_content.clone();
    }

    /// Replace both texts, as when discarding.
    pub(crate) fn reset(&mut self, content: String) {
        self.live_content = content.clone();
        self.baseline_content = content;
    }
}

/// Open buffers in the order they were opened.
#[derive(Clone, Debug, Default)]
pub struct BufferSet {
    buffers: Vec<OpenBuffer>,
}

impl BufferSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&OpenBuffer> {
        self.buffers.iter().find(|b| b.path == path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut OpenBuffer> {
        self.buffers.iter_mut().find(|b| b.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpenBuffer> {
        self.buffers.iter()
    }

    pub fn as_slice(&self) -> &[OpenBuffer] {
        &self.buffers
    }

    /// Add `buffer`, replacing any buffer already open at its path.
    pub fn open(&mut self, buffer: OpenBuffer) -> &OpenBuffer {
        let idx = match self.buffers.iter().position(|b| b.path == buffer.path) {
            Some(idx) => {
                self.buffers[idx] = buffer;
                idx
            }
            None => {
                self.buffers.push(buffer);
                self.buffers.len() - 1
            }
        };
        &self.buffers[idx]
    }

    pub fn close(&mut self, path: &str) -> Option<OpenBuffer> {
        let idx = self.buffers.iter().position(|b| b.path == path)?;
        Some(self.buffers.remove(idx))
    }

    /// Close the buffer at `target` and every buffer below it.
    pub fn close_under(&mut self, target: &str) -> usize {
        let before = self.buffers.len();
        self.buffers
            .retain(|b| b.path != target && !path::is_within(&b.path, target));
        before - self.buffers.len()
    }

    /// Move buffers at or below `old` to `new`.
    pub fn retarget(&mut self, old: &str, new: &str) -> usize {
        let mut moved = 0;
        for buffer in &mut self.buffers {
            if let Some(path) = path::rebase(&buffer.path, old, new) {
                buffer.path = path;
                moved += 1;
            }
        }
        moved
    }

    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}
