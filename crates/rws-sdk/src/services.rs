//! Capabilities the workspace needs from its host.
//!
//! The workspace never talks to a widget or a dialog directly. A host
//! supplies an [`EditorService`] for the text surface and a [`UserPrompt`]
//! for confirmations and names; tests and headless hosts use the stock
//! implementations below.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::buffer::OpenBuffer;

/// Called with `(path, live_content)` whenever the user types.
pub type ChangeCallback = Box<dyn Fn(&str, &str) + Send + Sync>;

/// The editing surface showing open buffers.
pub trait EditorService: Send + Sync {
    /// Show `buffer`, making it the active one.
    fn open(&self, buffer: &OpenBuffer);

    /// Register the callback receiving keystroke-level changes.
    fn on_change(&self, callback: ChangeCallback);

    /// Release the surface. No calls follow.
    fn dispose(&self);
}

/// Blocking questions put to the user.
#[async_trait]
pub trait UserPrompt: Send + Sync {
    /// Yes/no question.
    async fn confirm(&self, question: &str) -> bool;

    /// Free-text question; `None` if cancelled.
    async fn ask(&self, question: &str) -> Option<String>;
}

/// Editor for hosts without a text surface.
#[derive(Debug, Default)]
pub struct NoopEditor;

impl EditorService for NoopEditor {
    fn open(&self, _buffer: &OpenBuffer) {}

    fn on_change(&self, _callback: ChangeCallback) {}

    fn dispose(&self) {}
}

/// Prompt that confirms everything and answers nothing.
#[derive(Debug, Default)]
pub struct AutoConfirm;

#[async_trait]
impl UserPrompt for AutoConfirm {
    async fn confirm(&self, _question: &str) -> bool {
        true
    }

    async fn ask(&self, _question: &str) -> Option<String> {
        None
    }
}

/// Editor driven from code: records what was opened and replays typing
/// through the registered callbacks.
#[derive(Default)]
pub struct ScriptedEditor {
    callbacks: Mutex<Vec<ChangeCallback>>,
    opened: Mutex<Vec<String>>,
    disposed: Mutex<bool>,
}

impl ScriptedEditor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Simulate the user replacing the text of `path`.
    pub fn type_text(&self, path: &str, content: &str) {
        if let Ok(callbacks) = self.callbacks.lock() {
            for callback in callbacks.iter() {
                callback(path, content);
            }
        }
    }

    /// Paths passed to [`EditorService::open`], in order.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().map(|o| o.clone()).unwrap_or_default()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.lock().map(|d| *d).unwrap_or(false)
    }
}

impl EditorService for ScriptedEditor {
    fn open(&self, buffer: &OpenBuffer) {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(buffer.path.clone());
        }
    }

    fn on_change(&self, callback: ChangeCallback) {
        if let Ok(mut callbacks) = self.callbacks.lock() {
            callbacks.push(callback);
        }
    }

    fn dispose(&self) {
        if let Ok(mut callbacks) = self.callbacks.lock() {
            callbacks.clear();
        }
        if let Ok(mut disposed) = self.disposed.lock() {
            *disposed = true;
        }
    }
}

/// Prompt answering from queued replies.
///
/// An exhausted queue declines confirmations and cancels questions. Every
/// question asked is recorded.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    confirms: Mutex<VecDeque<bool>>,
    answers: Mutex<VecDeque<Option<String>>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_confirm(&self, reply: bool) -> &Self {
        if let Ok(mut q) = self.confirms.lock() {
            q.push_back(reply);
        }
        self
    }

    pub fn push_answer(&self, reply: Option<&str>) -> &Self {
        if let Ok(mut q) = self.answers.lock() {
            q.push_back(reply.map(str::to_string));
        }
        self
    }

    /// Questions asked so far, confirmations included.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn record(&self, question: &str) {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(question.to_string());
        }
    }
}

#[async_trait]
impl UserPrompt for ScriptedPrompt {
    async fn confirm(&self, question: &str) -> bool {
        self.record(question);
        self.confirms
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or(false)
    }

    async fn ask(&self, question: &str) -> Option<String> {
        self.record(question);
        self.answers
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .flatten()
    }
}
