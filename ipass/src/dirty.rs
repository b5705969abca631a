//! Invalidation of the cached pipeline stages.
//!
//! The cached stages form a chain: envelopes feed world boxes, world boxes
//! feed the debug tile geometry. A change to the subdivision parameters
//! restarts the chain at the envelopes; each stage that completes hands the
//! dirtiness down to the next one.
//!
//! ```text
//! Clean ─▶ SlefesDirty ─▶ BoxesDirty ─▶ TilesDirty ─▶ Clean
//!   ▲           ▲              │             │
//!   │           └──────────────┴─────────────┘  invalidate_slefes()
//! ```
//!
//! Screen-space boxes are not tracked: the camera is expected to move every
//! frame, so they are always recomputed.

use log::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DirtyState {
    /// Nothing needs recomputing.
    Clean,
    /// Envelopes are stale (initial state).
    #[default]
    SlefesDirty,
    /// Envelopes are current, world boxes are stale.
    BoxesDirty,
    /// World boxes are current, debug tile outlines are stale.
    TilesDirty,
}

impl DirtyState {
    pub fn needs_slefes(&self) -> bool {
        matches!(self, DirtyState::SlefesDirty)
    }

    pub fn needs_boxes(&self) -> bool {
        matches!(self, DirtyState::SlefesDirty | DirtyState::BoxesDirty)
    }

    pub fn needs_tiles(&self) -> bool {
        !matches!(self, DirtyState::Clean)
    }

    /// Restart the chain. Returns `false` if the envelopes were already
    /// marked stale.
    pub fn invalidate_slefes(&mut self) -> bool {
        self.transition(DirtyState::SlefesDirty, |_| true)
    }

    /// The envelopes were recomputed.
    pub fn slefes_computed(&mut self) -> bool {
        self.transition(DirtyState::BoxesDirty, |s| s == DirtyState::SlefesDirty)
    }

    /// The world boxes were rebuilt.
    pub fn boxes_built(&mut self) -> bool {
        self.transition(DirtyState::TilesDirty, |s| s == DirtyState::BoxesDirty)
    }

    /// The tile geometry was rebuilt (or has no consumer).
    pub fn tiles_consumed(&mut self) -> bool {
        self.transition(DirtyState::Clean, |s| s == DirtyState::TilesDirty)
    }

    fn transition(&mut self, to: DirtyState, allowed: impl Fn(DirtyState) -> bool) -> bool {
        if *self == to || !allowed(*self) {
            return false;
        }
        debug!("Dirty state {:?} -> {:?}", self, to);
        *self = to;
        true
    }
}
