use std::sync::{Arc, Mutex};

use projwatch::tree::Node;
use projwatch::uri::Uri;
use projwatch::watch::{FileChangedHandler, FileSignal, TreeChangedHandler};

/// Records every tree delivered to its handler.
#[derive(Clone, Default)]
pub struct TreeRecorder {
    trees: Arc<Mutex<Vec<Arc<Node>>>>,
}

impl TreeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh handler feeding this recorder. Keep it to unsubscribe later.
    pub fn handler(&self) -> TreeChangedHandler {
        let trees = Arc::clone(&self.trees);
        Arc::new(move |tree| trees.lock().unwrap().push(Arc::clone(tree)))
    }

    pub fn count(&self) -> usize {
        self.trees.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Arc<Node>> {
        self.trees.lock().unwrap().last().cloned()
    }
}

/// Records `(tag, signal, uri)` for every file callback, across handlers, in
/// call order.
#[derive(Clone, Default)]
pub struct SignalRecorder {
    calls: Arc<Mutex<Vec<(String, FileSignal, Uri)>>>,
}

impl SignalRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(&self, tag: &str) -> FileChangedHandler {
        let calls = Arc::clone(&self.calls);
        let tag = tag.to_string();
        Arc::new(move |signal, uri| {
            calls.lock().unwrap().push((tag.clone(), signal, uri.clone()))
        })
    }

    pub fn calls(&self) -> Vec<(String, FileSignal, Uri)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn tagged(&self) -> Vec<(String, FileSignal)> {
        self.calls()
            .into_iter()
            .map(|(tag, signal, _)| (tag, signal))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}
