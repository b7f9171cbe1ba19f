// ABOUTME: Reassembly of concatenated messages from fragments arriving in any order
// ABOUTME: Groups fragments by (originator, reference), drops duplicates, emits complete wholes

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::message::{IncomingMessage, Payload};

/// Pending fragments of one concatenated message.
struct PendingGroup {
    parts: Vec<IncomingMessage>,
    seen_sequences: HashSet<u8>,
    total: u8,
}

/// Collects multipart fragments and hands back whole messages once every
/// part has arrived.
///
/// A fragment set either stays pending in here or is emitted exactly once as
/// a reassembled message, never both.
#[derive(Default)]
pub(crate) struct Reassembler {
    groups: HashMap<(String, u16), PendingGroup>,
}

impl Reassembler {
    pub(crate) fn new() -> Self {
        Reassembler::default()
    }

    /// Files a fragment under its (originator, reference) group. A fragment
    /// repeating an already-seen sequence number is dropped silently.
    pub(crate) fn add(&mut self, part: IncomingMessage) {
        let Some(concat) = part.concat else {
            return;
        };
        debug!(
            mem_index = part.mem_index,
            reference = concat.reference,
            total = concat.total,
            sequence = concat.sequence,
            "filing multipart fragment"
        );
        let key = (part.originator.clone(), concat.reference);
        let group = self.groups.entry(key).or_insert_with(|| PendingGroup {
            parts: Vec::new(),
            seen_sequences: HashSet::new(),
            total: concat.total,
        });
        if !group.seen_sequences.insert(concat.sequence) {
            info!(
                reference = concat.reference,
                sequence = concat.sequence,
                "duplicate message part; ignoring"
            );
            return;
        }
        group.parts.push(part);
    }

    /// Removes every complete group and returns it assembled in sequence
    /// order. Text fragments concatenate as strings, binary fragments append
    /// as bytes. The assembled message gets a memory index of -1 and carries
    /// the indices of all its fragments.
    pub(crate) fn drain_complete(&mut self) -> Vec<IncomingMessage> {
        let complete: Vec<(String, u16)> = self
            .groups
            .iter()
            .filter(|(_, group)| group.parts.len() == group.total as usize)
            .map(|(key, _)| key.clone())
            .collect();

        let mut assembled = Vec::with_capacity(complete.len());
        for key in complete {
            let mut group = self.groups.remove(&key).expect("group disappeared");
            group
                .parts
                .sort_by_key(|p| p.concat.map(|c| c.sequence).unwrap_or(0));

            let mut parts = group.parts.into_iter();
            let mut whole = parts.next().expect("complete group has parts");
            let mut indices = vec![whole.mem_index as u16];
            for part in parts {
                indices.push(part.mem_index as u16);
                match (&mut whole.payload, part.payload) {
                    (Payload::Text(text), Payload::Text(next)) => text.push_str(&next),
                    (Payload::Binary(data), Payload::Binary(next)) => data.extend(next),
                    // Mixed encodings within one reference cannot be merged
                    // meaningfully; keep what we have.
                    _ => {}
                }
            }
            whole.mem_index = -1;
            whole.mp_mem_indices = indices;
            assembled.push(whole);
        }
        assembled
    }

    #[cfg(test)]
    fn pending_groups(&self) -> usize {
        self.groups.len()
    }
}
