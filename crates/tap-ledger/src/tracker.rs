//! Double-buffered day-change tracking with bounded, resumable draining.
//!
//! Each tracked dimension keeps two [`ChangeBuffer`]s. One is *active* and
//! collects the addresses touched today; the other holds yesterday's
//! addresses and is only drained and cleared. [`ChangeTracker::flip_day`]
//! swaps the roles.
//!
//! A consumer pages through changes with [`ChangeTracker::drain_page`],
//! which never returns more than the requested number of entries and is
//! safe to call again after it has run dry. The [`DrainCursor`] remembers
//! how far delivery got and, for a retired buffer, the length the buffer
//! had at the flip so that anything appended later is never delivered.
//!
//! Recording suppresses an address only while an earlier entry for it is
//! still waiting for delivery. Once that entry has been delivered, or was
//! left behind by an incomplete clear, a new change appends it again.
//!
//! [`ChangeTracker::clear_previous`] reclaims the retired buffer a bounded
//! number of entries at a time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tap_types::Address;
use tracing::{debug, warn};

/// One of the two buffers of a dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferSlot {
    Even,
    Odd,
}

impl BufferSlot {
    pub fn other(self) -> Self {
        match self {
            Self::Even => Self::Odd,
            Self::Odd => Self::Even,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Even => 0,
            Self::Odd => 1,
        }
    }
}

/// Append-only sequence of addresses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Address>", into = "Vec<Address>")]
pub struct ChangeBuffer {
    entries: Vec<Address>,
    /// Index of the latest entry of each address.
    latest: HashMap<Address, usize>,
}

impl ChangeBuffer {
    /// Append `address` unless its latest entry sits at or after `floor`.
    /// Returns `true` if it was appended.
    pub fn record(&mut self, address: Address, floor: usize) -> bool {
        if self.latest.get(&address).is_some_and(|&at| at >= floor) {
            return false;
        }
        self.latest.insert(address, self.entries.len());
        self.entries.push(address);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Address] {
        &self.entries
    }

    /// Remove up to `count` entries from the tail. Returns how many were
    /// removed.
    fn pop_tail(&mut self, count: usize) -> usize {
        let keep = self.entries.len().saturating_sub(count);
        let removed = self.entries.len() - keep;
        for (at, address) in self.entries.drain(keep..).enumerate() {
            if self.latest.get(&address) == Some(&(keep + at)) {
                self.latest.remove(&address);
            }
        }
        removed
    }
}

impl From<Vec<Address>> for ChangeBuffer {
    fn from(entries: Vec<Address>) -> Self {
        let latest = entries
            .iter()
            .enumerate()
            .map(|(at, address)| (*address, at))
            .collect();
        Self { entries, latest }
    }
}

impl From<ChangeBuffer> for Vec<Address> {
    fn from(buffer: ChangeBuffer) -> Self {
        buffer.entries
    }
}

/// Delivery position of a dimension's drain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainCursor {
    /// Buffer currently being delivered.
    pub buffer: BufferSlot,
    /// Number of entries of `buffer` already delivered.
    pub offset: usize,
    /// Delivery stops here. Frozen to the buffer's length when it is
    /// retired; `None` while the cursor follows the active buffer live.
    pub end: Option<usize>,
}

/// What happens once the retired buffer has been fully delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrainMode {
    /// Move on to the active buffer and keep delivering today's changes as
    /// they arrive.
    Rolling,
    /// Stay put until the next flip re-points the cursor at the buffer it
    /// retires.
    PerDay,
}

/// Change log for one tracked dimension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeTracker {
    buffers: [ChangeBuffer; 2],
    active: BufferSlot,
    /// Offset from which delivery of each buffer begins, captured when the
    /// buffer became active. Entries left over from an incomplete clear are
    /// skipped.
    starts: [usize; 2],
    cursor: DrainCursor,
    mode: DrainMode,
}

impl ChangeTracker {
    /// A rolling tracker delivers the first day live; a per-day tracker
    /// delivers nothing until the first flip.
    pub fn new(mode: DrainMode) -> Self {
        let end = match mode {
            DrainMode::Rolling => None,
            DrainMode::PerDay => Some(0),
        };
        Self {
            buffers: [ChangeBuffer::default(), ChangeBuffer::default()],
            active: BufferSlot::Even,
            starts: [0, 0],
            cursor: DrainCursor {
                buffer: BufferSlot::Even,
                offset: 0,
                end,
            },
            mode,
        }
    }

    pub fn mode(&self) -> DrainMode {
        self.mode
    }

    pub fn active_slot(&self) -> BufferSlot {
        self.active
    }

    pub fn cursor(&self) -> DrainCursor {
        self.cursor
    }

    /// Addresses recorded since the last flip.
    pub fn active_entries(&self) -> &[Address] {
        self.buffer(self.active).entries()
    }

    /// Addresses still held by the retired buffer.
    pub fn previous_entries(&self) -> &[Address] {
        self.buffer(self.active.other()).entries()
    }

    /// Record `address` in the active buffer. Returns `false` when an
    /// undelivered entry for it is already queued.
    pub fn record(&mut self, address: Address) -> bool {
        let slot = self.active;
        let mut floor = self.starts[slot.index()];
        if self.cursor.buffer == slot {
            floor = floor.max(self.cursor.offset);
        }
        self.buffer_mut(slot).record(address, floor)
    }

    /// Day boundary: retire the active buffer and start writing to the
    /// other one.
    pub fn flip_day(&mut self) {
        let retiring = self.active;
        let activated = retiring.other();
        let retired_len = self.buffer(retiring).len();

        self.active = activated;
        self.starts[activated.index()] = self.buffer(activated).len();

        if self.cursor.buffer == retiring {
            self.cursor.end = Some(retired_len);
        } else {
            let skipped = self.remaining(self.cursor);
            if skipped > 0 {
                warn!(
                    skipped,
                    "day flipped before the previous day was fully drained"
                );
            }
            self.cursor = DrainCursor {
                buffer: retiring,
                offset: self.starts[retiring.index()],
                end: Some(retired_len),
            };
        }

        debug!(
            active = ?self.active,
            retired_len,
            offset = self.cursor.offset,
            "change tracker flipped day"
        );
    }

    /// Deliver up to `max_items` addresses starting at the cursor.
    ///
    /// An empty page means the cursor's buffer is exhausted. In
    /// [`DrainMode::Rolling`], an exhausted retired buffer hands the cursor
    /// over to the active buffer so the next call continues with today's
    /// changes.
    pub fn drain_page(&mut self, max_items: usize) -> Vec<Address> {
        let limit = self.limit(self.cursor);
        if self.cursor.offset >= limit {
            if self.mode == DrainMode::Rolling && self.cursor.buffer != self.active {
                self.cursor = DrainCursor {
                    buffer: self.active,
                    offset: self.starts[self.active.index()],
                    end: None,
                };
                debug!(buffer = ?self.active, offset = self.cursor.offset, "drain rolled over");
            }
            return Vec::new();
        }

        let start = self.cursor.offset;
        let stop = start + max_items.min(limit - start);
        let page = self.buffer(self.cursor.buffer).entries()[start..stop].to_vec();
        self.cursor.offset = stop;
        page
    }

    /// Pop up to `max_items` entries from the tail of the retired buffer.
    /// Returns `true` once it is empty.
    pub fn clear_previous(&mut self, max_items: usize) -> bool {
        let slot = self.active.other();
        let removed = self.buffer_mut(slot).pop_tail(max_items);
        let remaining = self.buffer(slot).len();
        debug!(removed, remaining, "cleared previous day changes");
        remaining == 0
    }

    fn limit(&self, cursor: DrainCursor) -> usize {
        let len = self.buffer(cursor.buffer).len();
        cursor.end.map_or(len, |end| end.min(len))
    }

    fn remaining(&self, cursor: DrainCursor) -> usize {
        self.limit(cursor).saturating_sub(cursor.offset)
    }

    fn buffer(&self, slot: BufferSlot) -> &ChangeBuffer {
        &self.buffers[slot.index()]
    }

    fn buffer_mut(&mut self, slot: BufferSlot) -> &mut ChangeBuffer {
        &mut self.buffers[slot.index()]
    }
}
