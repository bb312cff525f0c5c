//! Presence synchronization: maps the remote participant roster onto a
//! fixed-capacity pool of rendered instances.
//!
//! The pool is owned exclusively by the synchronizer and mutated once per
//! roster update; the frame loop only reads it. Two application modes:
//! positional (array index = slot, the wire default) and keyed (explicit
//! id → slot table, so a reordered roster does not flicker instance
//! identity).

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use serde::Deserialize;

use crate::params::MAX_INSTANCES;

/// One remote participant as carried on the wire. Missing fields default to
/// zero rather than failing the whole roster: bad input must never stall
/// the visualization.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Participant {
    /// Stable identity. Absent on the legacy wire format, where array
    /// position is the identity.
    pub id: Option<u64>,

    /// Normalized horizontal position, 0..1 left to right
    pub x: f32,

    /// Normalized vertical position, 0..1 top to bottom
    pub y: f32,

    /// Normalized hue, 0..1 around the color wheel
    pub hue: f32,
}

/// Per-instance GPU data: world offset and display color, padded to 16-byte
/// boundaries for the vertex buffer layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Instance {
    pub position: [f32; 3],
    pub _pad0: f32,
    pub color: [f32; 3],
    pub _pad1: f32,
}

/// Fixed-capacity pool of render instances.
///
/// Invariant: `active <= capacity`; slots at index >= active hold stale data
/// and are not drawn.
pub struct InstancePool {
    instances: Vec<Instance>,
    active: usize,
    dirty: bool,
}

impl InstancePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            instances: vec![Instance::zeroed(); capacity],
            active: 0,
            dirty: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.instances.len()
    }

    pub fn active(&self) -> usize {
        self.active
    }

    /// Full backing slice (length = capacity). The renderer uploads this
    /// wholesale and draws only `active` instances.
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Whether the transform buffer needs re-uploading before the next draw
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Acknowledge the upload
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

/// Owner of the instance pool; applies roster updates.
pub struct PresenceSynchronizer {
    pool: InstancePool,
    /// Participant id → pool slot, used only for keyed rosters
    slots: HashMap<u64, usize>,
    /// Slot → participant id, kept in lockstep with `slots` for compaction
    slot_ids: Vec<u64>,
}

impl PresenceSynchronizer {
    pub fn new() -> Self {
        Self::with_capacity(MAX_INSTANCES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pool: InstancePool::new(capacity),
            slots: HashMap::new(),
            slot_ids: Vec::new(),
        }
    }

    pub fn pool(&self) -> &InstancePool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut InstancePool {
        &mut self.pool
    }

    /// Apply a roster update.
    ///
    /// If every participant carries an id, identities are preserved through
    /// the allocation table; otherwise slots follow array position and the
    /// active count is exactly `min(len, capacity)`.
    pub fn apply_roster(&mut self, roster: &[Participant]) {
        if !roster.is_empty() && roster.iter().all(|p| p.id.is_some()) {
            self.apply_keyed(roster);
        } else {
            self.apply_positional(roster);
        }
    }

    /// Positional application: participant i drives slot i. Slots beyond the
    /// roster keep their stale contents but fall outside the active count.
    fn apply_positional(&mut self, roster: &[Participant]) {
        let n = roster.len().min(self.pool.capacity());
        for (slot, participant) in roster.iter().take(n).enumerate() {
            self.pool.instances[slot] = instance_for(participant);
        }
        self.pool.active = n;
        self.pool.dirty = true;

        // Positional identity invalidates any previous keyed allocation
        self.slots.clear();
        self.slot_ids.clear();
    }

    /// Keyed application: participants keep their slot across updates;
    /// departed ids free their slot (last slot swaps into the hole so the
    /// active range stays contiguous for instanced drawing).
    fn apply_keyed(&mut self, roster: &[Participant]) {
        // Release slots whose id no longer appears
        let present: HashMap<u64, &Participant> = roster
            .iter()
            .filter_map(|p| p.id.map(|id| (id, p)))
            .collect();

        let mut slot = 0;
        while slot < self.pool.active {
            let id = self.slot_ids[slot];
            if present.contains_key(&id) {
                slot += 1;
                continue;
            }
            self.release_slot(slot, id);
        }

        // Upsert every present participant, capacity permitting
        for (&id, participant) in &present {
            match self.slots.get(&id) {
                Some(&slot) => {
                    self.pool.instances[slot] = instance_for(participant);
                }
                None if self.pool.active < self.pool.capacity() => {
                    let slot = self.pool.active;
                    self.pool.instances[slot] = instance_for(participant);
                    self.slots.insert(id, slot);
                    self.slot_ids.push(id);
                    self.pool.active += 1;
                }
                // Pool full: excess participants are simply not drawn
                None => {}
            }
        }

        self.pool.dirty = true;
    }

    fn release_slot(&mut self, slot: usize, id: u64) {
        self.slots.remove(&id);
        let last = self.pool.active - 1;
        if slot != last {
            self.pool.instances[slot] = self.pool.instances[last];
            let moved_id = self.slot_ids[last];
            self.slot_ids[slot] = moved_id;
            self.slots.insert(moved_id, slot);
        }
        self.slot_ids.pop();
        self.pool.active = last;
    }
}

impl Default for PresenceSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Map normalized roster coordinates into the centered world-space plane:
/// x spans -1..1 left to right, y spans 3..-1 top to bottom (a 2x scale
/// around a 1.5 m height offset), z fixed at 0.
pub fn world_position(participant: &Participant) -> [f32; 3] {
    [
        (participant.x - 0.5) * 2.0,
        (1.5 - participant.y) * 2.0,
        0.0,
    ]
}

/// Display color for a participant. The hue is doubled around the wheel
/// (wrapping past 1.0), an intentional frequency doubling, full saturation,
/// half lightness.
pub fn participant_color(participant: &Participant) -> [f32; 3] {
    hsl_to_rgb((participant.hue * 2.0).rem_euclid(1.0), 1.0, 0.5)
}

fn instance_for(participant: &Participant) -> Instance {
    Instance {
        position: world_position(participant),
        _pad0: 0.0,
        color: participant_color(participant),
        _pad1: 0.0,
    }
}

/// HSL → linear RGB, all components 0..1.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    if s == 0.0 {
        return [l, l, l];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    [
        hue_component(p, q, h + 1.0 / 3.0),
        hue_component(p, q, h),
        hue_component(p, q, h - 1.0 / 3.0),
    ]
}

fn hue_component(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
