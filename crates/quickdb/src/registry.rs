//! Deferred model registration queue

use quickdb_codec::ModelMeta;
use std::collections::VecDeque;

/// Models waiting for their database to be configured
///
/// FIFO. [`pop`](Self::pop) removes the model it hands out, so each model is
/// submitted at most once.
#[derive(Debug, Default)]
pub struct RegistrationQueue {
    pending: VecDeque<ModelMeta>,
}

impl RegistrationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, meta: ModelMeta) {
        self.pending.push_back(meta);
    }

    /// Take the oldest pending model
    pub fn pop(&mut self) -> Option<ModelMeta> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Collection names still waiting, in order
    pub fn pending_names(&self) -> Vec<&str> {
        self.pending
            .iter()
            .map(|meta| meta.collection_name.as_str())
            .collect()
    }
}
