//! Patch recorder.
//!
//! A recorder observes every mutation made through the tree while it is
//! armed and keeps, per mutation, the forward patches together with the
//! inverse patches derived from the pre-mutation values. Mutations made while
//! it is disarmed still happen; they are simply not recorded.

use std::cell::RefCell;
use std::rc::Rc;

use super::apply::apply_patch;
use super::types::Patch;
use crate::error::TreeResult;
use crate::node::NodeId;
use crate::tree::Tree;

/// One atomic mutation as seen by a recorder.
///
/// `target` is the root of the mutated node at mutation time and all patch
/// paths start there. `inverse_patches[i]` undoes `patches[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchRecorderEvent {
    pub target: NodeId,
    pub patches: Vec<Patch>,
    pub inverse_patches: Vec<Patch>,
}

#[derive(Debug, Default)]
pub(crate) struct RecorderState {
    pub recording: bool,
    pub disposed: bool,
    pub events: Vec<PatchRecorderEvent>,
}

/// Handle to a live recorder. Clones share the same event list.
#[derive(Debug, Clone)]
pub struct PatchRecorder {
    state: Rc<RefCell<RecorderState>>,
}

impl PatchRecorder {
    pub fn recording(&self) -> bool {
        self.state.borrow().recording
    }

    /// Arms or disarms the recorder. A disposed recorder stays disarmed.
    pub fn set_recording(&self, recording: bool) {
        let mut state = self.state.borrow_mut();
        state.recording = recording && !state.disposed;
    }

    pub fn events(&self) -> Vec<PatchRecorderEvent> {
        self.state.borrow().events.clone()
    }

    pub fn event_count(&self) -> usize {
        self.state.borrow().events.len()
    }

    pub fn take_events(&self) -> Vec<PatchRecorderEvent> {
        std::mem::take(&mut self.state.borrow_mut().events)
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    /// Stops recording for good and drops the collected events.
    pub fn dispose(&self) {
        let mut state = self.state.borrow_mut();
        state.disposed = true;
        state.recording = false;
        state.events.clear();
        tracing::debug!("patch recorder disposed");
    }

    /// Reverts every recorded event, newest first.
    pub fn undo(&self, tree: &mut Tree) -> TreeResult<()> {
        let events = self.events();
        undo_events(tree, &events)
    }
}

/// Applies the inverse patches of `events` in reverse chronological order,
/// and within each event in reverse patch order.
pub fn undo_events(tree: &mut Tree, events: &[PatchRecorderEvent]) -> TreeResult<()> {
    for event in events.iter().rev() {
        for patch in event.inverse_patches.iter().rev() {
            apply_patch(tree, event.target, patch)?;
        }
    }
    Ok(())
}

impl Tree {
    /// Starts a new recorder on this tree.
    pub fn patch_recorder(&mut self, recording: bool) -> PatchRecorder {
        let state = Rc::new(RefCell::new(RecorderState {
            recording,
            ..RecorderState::default()
        }));
        self.recorders.retain(|w| w.strong_count() > 0);
        self.recorders.push(Rc::downgrade(&state));
        tracing::debug!(recording, live = self.recorders.len(), "patch recorder created");
        PatchRecorder { state }
    }

    /// Whether any live recorder is armed. Mutations skip computing
    /// pre-images when nobody listens.
    pub(crate) fn is_recording(&self) -> bool {
        self.recorders
            .iter()
            .filter_map(|w| w.upgrade())
            .any(|s| s.borrow().recording)
    }

    pub(crate) fn record(&mut self, event: PatchRecorderEvent) {
        tracing::trace!(target_node = %event.target, patches = event.patches.len(), "mutation recorded");
        self.recorders.retain(|w| w.strong_count() > 0);
        for state in self.recorders.iter().filter_map(|w| w.upgrade()) {
            let mut state = state.borrow_mut();
            if state.recording {
                state.events.push(event.clone());
            }
        }
    }
}
