//! The garbage-collected heap.
//!
//! A slot arena backs every runtime value: freed slots go on a free list and
//! are reused by later allocations, so long-running loops that allocate and
//! discard intermediates keep the arena size stable.
//!
//! Reclamation is mark-and-sweep. The runtime gathers roots (scope frames,
//! pinned singletons, the evaluator's temp-root scan list, and the Function
//! values installed in type method tables) and hands them to
//! [`Heap::collect`]; marking walks payload edges (array elements, record
//! fields) to a fixpoint and sweeping finalizes everything unmarked.
//!
//! A cycle is never run mid-expression: allocation only *schedules* one, and
//! the evaluator performs it at the next safe point between statements.

use std::collections::BTreeMap;

use crate::value::{ObjKind, ObjRef, Payload};
use crate::types::TypeId;

/// Minimum number of allocations between scheduled cycles.
pub const GC_THRESHOLD_MIN: usize = 4096;
/// A cycle is scheduled once allocations since the last cycle exceed this
/// multiple of the surviving object count.
pub const GC_GROWTH_FACTOR: usize = 2;

/// One heap slot: a live runtime value.
#[derive(Debug)]
pub struct Slot {
    pub kind: ObjKind,
    pub type_id: TypeId,
    pub payload: Payload,
    /// True while the value is a transient expression intermediate that has
    /// never been bound to any name. Cleared (recursively) when the value is
    /// stored. Purely an eagerness hint; reachability alone decides
    /// collection.
    pub single_use: bool,
    marked: bool,
}

impl Slot {
    #[must_use]
    pub fn new(kind: ObjKind, type_id: TypeId, payload: Payload) -> Self {
        Self {
            kind,
            type_id,
            payload,
            single_use: true,
            marked: false,
        }
    }
}

/// Snapshot of heap state at a point in time.
///
/// The `objects_by_kind` map uses `BTreeMap` for deterministic iteration
/// order, making snapshots suitable for display and comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapStats {
    /// Total number of live objects on the heap.
    pub live_objects: usize,
    /// Number of free (recycled) slots available for reuse.
    pub free_slots: usize,
    /// Total arena capacity (live + free).
    pub total_slots: usize,
    /// Breakdown of live objects by payload variant name.
    pub objects_by_kind: BTreeMap<&'static str, usize>,
    /// Estimated bytes held by live payloads.
    pub estimated_bytes: usize,
    /// Number of collection cycles run so far.
    pub collections: usize,
}

/// Reference arena plus collection bookkeeping.
#[derive(Debug, Default)]
pub struct Heap {
    entries: Vec<Option<Slot>>,
    /// Slots freed by the last sweep, reused by `allocate`.
    free_list: Vec<ObjRef>,
    /// Whether scheduled cycles may run. `force_ping` ignores this.
    enabled: bool,
    /// Set when the trigger policy wants a cycle at the next safe point.
    cycle_pending: bool,
    alloc_since_last_cycle: usize,
    live_after_last_cycle: usize,
    collections: usize,
}

impl Heap {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            enabled: true,
            cycle_pending: false,
            alloc_since_last_cycle: 0,
            live_after_last_cycle: 0,
            collections: 0,
        }
    }

    /// Allocates a slot for `slot`, reusing a free slot when one exists.
    ///
    /// Updates the trigger counters and schedules a cycle once the number of
    /// allocations since the last cycle exceeds
    /// `max(GC_THRESHOLD_MIN, GC_GROWTH_FACTOR * live_after_last_cycle)`.
    pub fn allocate(&mut self, slot: Slot) -> ObjRef {
        self.alloc_since_last_cycle += 1;
        if self.alloc_since_last_cycle > GC_THRESHOLD_MIN.max(GC_GROWTH_FACTOR * self.live_after_last_cycle) {
            self.cycle_pending = true;
        }
        if let Some(reused) = self.free_list.pop() {
            self.entries[reused.index()] = Some(slot);
            reused
        } else {
            let obj = ObjRef::new(self.entries.len());
            self.entries.push(Some(slot));
            obj
        }
    }

    /// Borrows a live slot.
    ///
    /// # Panics
    /// Panics if the slot was already reclaimed; holding an `ObjRef` across
    /// a collection without rooting it is an interpreter bug.
    #[must_use]
    pub fn get(&self, obj: ObjRef) -> &Slot {
        self.entries[obj.index()].as_ref().expect("access to reclaimed heap slot")
    }

    #[must_use]
    pub fn get_mut(&mut self, obj: ObjRef) -> &mut Slot {
        self.entries[obj.index()].as_mut().expect("access to reclaimed heap slot")
    }

    /// Whether a scheduled cycle should run at the next safe point.
    #[must_use]
    pub fn wants_cycle(&self) -> bool {
        self.enabled && self.cycle_pending
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Runs one mark-and-sweep cycle over the given roots.
    ///
    /// Returns the number of reclaimed objects.
    pub fn collect(&mut self, roots: &[ObjRef]) -> usize {
        for entry in self.entries.iter_mut().flatten() {
            entry.marked = false;
        }

        let mut worklist: Vec<ObjRef> = roots.to_vec();
        let mut edges: Vec<ObjRef> = Vec::new();
        while let Some(obj) = worklist.pop() {
            let slot = self.entries[obj.index()]
                .as_mut()
                .expect("collection root or edge points at a reclaimed slot");
            if slot.marked {
                continue;
            }
            slot.marked = true;
            edges.clear();
            slot.payload.push_edges(&mut edges);
            worklist.extend_from_slice(&edges);
        }

        let mut freed = 0;
        let mut live = 0;
        for (index, entry) in self.entries.iter_mut().enumerate() {
            match entry {
                Some(slot) if !slot.marked => {
                    // Finalization order within a sweep is unspecified;
                    // payload drop releases external resources (File).
                    *entry = None;
                    self.free_list.push(ObjRef::new(index));
                    freed += 1;
                }
                Some(_) => live += 1,
                None => {}
            }
        }

        self.live_after_last_cycle = live;
        self.alloc_since_last_cycle = 0;
        self.cycle_pending = false;
        self.collections += 1;
        freed
    }

    /// Current heap statistics.
    ///
    /// `instance_size` supplies the per-type base footprint (the type
    /// descriptor's accounting figure); buffer capacities are added from
    /// the payloads themselves.
    #[must_use]
    pub fn stats(&self, instance_size: impl Fn(TypeId) -> usize) -> HeapStats {
        let mut objects_by_kind: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut live_objects = 0;
        let mut estimated_bytes = 0;
        for slot in self.entries.iter().flatten() {
            live_objects += 1;
            estimated_bytes += instance_size(slot.type_id) + slot.payload.extra_size();
            *objects_by_kind.entry(slot.payload.variant_name()).or_insert(0) += 1;
        }
        HeapStats {
            live_objects,
            free_slots: self.free_list.len(),
            total_slots: self.entries.len(),
            objects_by_kind,
            estimated_bytes,
            collections: self.collections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integer_slot(value: i64) -> Slot {
        Slot::new(ObjKind::Instance, TypeId::new(0), Payload::Integer(value))
    }

    #[test]
    fn collect_reclaims_unrooted_slots() {
        let mut heap = Heap::new();
        let kept = heap.allocate(integer_slot(1));
        let dropped = heap.allocate(integer_slot(2));
        assert_ne!(kept, dropped);

        let freed = heap.collect(&[kept]);
        assert_eq!(freed, 1);
        assert!(matches!(heap.get(kept).payload, Payload::Integer(1)));
        assert_eq!(heap.stats(|_| 16).live_objects, 1);
        assert_eq!(heap.stats(|_| 16).free_slots, 1);
    }

    #[test]
    fn marking_follows_array_edges() {
        let mut heap = Heap::new();
        let element = heap.allocate(integer_slot(7));
        let array = heap.allocate(Slot::new(ObjKind::Instance, TypeId::new(1), Payload::Array(vec![element])));

        let freed = heap.collect(&[array]);
        assert_eq!(freed, 0);
        assert!(matches!(heap.get(element).payload, Payload::Integer(7)));
    }

    #[test]
    fn marking_handles_cycles() {
        let mut heap = Heap::new();
        let a = heap.allocate(Slot::new(ObjKind::Instance, TypeId::new(1), Payload::Array(vec![])));
        let b = heap.allocate(Slot::new(ObjKind::Instance, TypeId::new(1), Payload::Array(vec![a])));
        if let Payload::Array(items) = &mut heap.get_mut(a).payload {
            items.push(b);
        }

        // The cycle is reachable: nothing is freed.
        assert_eq!(heap.collect(&[a]), 0);
        // The cycle is unreachable: both nodes are freed despite referring
        // to each other.
        assert_eq!(heap.collect(&[]), 2);
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut heap = Heap::new();
        let first = heap.allocate(integer_slot(1));
        heap.collect(&[]);
        let second = heap.allocate(integer_slot(2));
        assert_eq!(first, second);
        assert_eq!(heap.stats(|_| 16).total_slots, 1);
    }

    #[test]
    fn trigger_policy_schedules_cycles() {
        let mut heap = Heap::new();
        for _ in 0..GC_THRESHOLD_MIN {
            heap.allocate(integer_slot(0));
        }
        assert!(!heap.wants_cycle());
        heap.allocate(integer_slot(0));
        assert!(heap.wants_cycle());

        heap.disable();
        assert!(!heap.wants_cycle());
        heap.enable();
        assert!(heap.wants_cycle());

        heap.collect(&[]);
        assert!(!heap.wants_cycle());
    }
}
