//! In-process FIFO transport.

use super::{Message, MessageSink, MessageSource, MessagingError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Queue {
    pending: VecDeque<Message>,
    committed: Vec<Message>,
}

/// A cloneable handle to a shared in-memory queue.
///
/// Every clone sees the same messages: publish through one handle and
/// consume through another. Messages are delivered once in send order;
/// uncommitted messages are not redelivered.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueue {
    inner: Arc<Mutex<Queue>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages waiting to be fetched.
    pub fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Messages committed so far, in commit order.
    pub fn committed(&self) -> Vec<Message> {
        self.inner.lock().committed.clone()
    }
}

impl MessageSink for MemoryQueue {
    fn send(&self, message: Message) -> Result<(), MessagingError> {
        self.inner.lock().pending.push_back(message);
        Ok(())
    }
}

impl MessageSource for MemoryQueue {
    fn fetch(&mut self) -> Result<Option<Message>, MessagingError> {
        Ok(self.inner.lock().pending.pop_front())
    }

    fn commit(&mut self, message: &Message) -> Result<(), MessagingError> {
        self.inner.lock().committed.push(message.clone());
        Ok(())
    }
}
