//! Bounded `txId → page requestId` map.

use std::collections::{HashMap, VecDeque};

use allowguard_core::RequestId;

/// Insertion-ordered map with a fixed capacity.
///
/// Inserting into a full map evicts the oldest entry and hands it back to
/// the caller, who must answer the evicted page request.
#[derive(Debug)]
pub(crate) struct CorrelationMap {
    entries: HashMap<RequestId, RequestId>,
    order: VecDeque<RequestId>,
    capacity: usize,
}

impl CorrelationMap {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Insert `tx_id → page_request_id`, returning the evicted entry if the
    /// map was full.
    pub(crate) fn insert(
        &mut self,
        tx_id: RequestId,
        page_request_id: RequestId,
    ) -> Option<(RequestId, RequestId)> {
        if self.entries.contains_key(&tx_id) {
            self.order.retain(|id| id != &tx_id);
        }
        let evicted = if self.entries.len() >= self.capacity && !self.entries.contains_key(&tx_id)
        {
            self.pop_oldest()
        } else {
            None
        };
        self.entries.insert(tx_id.clone(), page_request_id);
        self.order.push_back(tx_id);
        evicted
    }

    /// Remove and return the page request id for `tx_id`.
    pub(crate) fn remove(&mut self, tx_id: &RequestId) -> Option<RequestId> {
        let page_request_id = self.entries.remove(tx_id)?;
        self.order.retain(|id| id != tx_id);
        Some(page_request_id)
    }

    pub(crate) fn contains(&self, tx_id: &RequestId) -> bool {
        self.entries.contains_key(tx_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn pop_oldest(&mut self) -> Option<(RequestId, RequestId)> {
        while let Some(oldest) = self.order.pop_front() {
            if let Some(page_request_id) = self.entries.remove(&oldest) {
                return Some((oldest, page_request_id));
            }
        }
        None
    }
}
