//! Undo/redo for region edits.
//!
//! Every reversible session mutation is recorded as an [`EditCommand`] holding
//! both the before and after state, so undo and redo replay against the store
//! without recomputing anything.

use crate::geometry::Point;
use crate::mask::{FillMode, MaskRegion, MaskStore, RegionId};

/// Maximum number of commands to keep in history
pub const MAX_HISTORY_SIZE: usize = 100;

/// A reversible edit to the region store.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// A region was created at this paint-order index
    Add { index: usize, region: MaskRegion },
    /// A region was deleted from this paint-order index
    Remove { index: usize, region: MaskRegion },
    Move { id: RegionId, from: Point, to: Point },
    Resize { id: RegionId, from: f32, to: f32 },
    /// Fill changes, optionally with a change of the session's default fill
    Refill {
        changes: Vec<(RegionId, FillMode, FillMode)>,
        default: Option<(FillMode, FillMode)>,
    },
}

impl EditCommand {
    /// Region the command acts on, if it targets exactly one
    pub fn region_id(&self) -> Option<&RegionId> {
        match self {
            EditCommand::Add { region, .. } | EditCommand::Remove { region, .. } => Some(region.id()),
            EditCommand::Move { id, .. } | EditCommand::Resize { id, .. } => Some(id),
            EditCommand::Refill { .. } => None,
        }
    }

    /// Re-apply the command's effect.
    pub(crate) fn apply(&self, store: &mut MaskStore, default_fill: &mut FillMode) {
        match self {
            EditCommand::Add { index, region } => {
                store.restore(*index, region.clone());
            }
            EditCommand::Remove { region, .. } => {
                store.take(region.id());
            }
            EditCommand::Move { id, to, .. } => {
                store.update(id, |r| r.center = *to);
            }
            EditCommand::Resize { id, to, .. } => {
                store.update(id, |r| r.restore_radius(*to));
            }
            EditCommand::Refill { changes, default } => {
                for (id, _, after) in changes {
                    store.update(id, |r| r.fill = after.clone());
                }
                if let Some((_, after)) = default {
                    *default_fill = after.clone();
                }
            }
        }
    }

    /// Undo the command's effect.
    pub(crate) fn revert(&self, store: &mut MaskStore, default_fill: &mut FillMode) {
        match self {
            EditCommand::Add { region, .. } => {
                store.take(region.id());
            }
            EditCommand::Remove { index, region } => {
                store.restore(*index, region.clone());
            }
            EditCommand::Move { id, from, .. } => {
                store.update(id, |r| r.center = *from);
            }
            EditCommand::Resize { id, from, .. } => {
                store.update(id, |r| r.restore_radius(*from));
            }
            EditCommand::Refill { changes, default } => {
                for (id, before, _) in changes {
                    store.update(id, |r| r.fill = before.clone());
                }
                if let Some((before, _)) = default {
                    *default_fill = before.clone();
                }
            }
        }
    }
}

/// Undo and redo stacks for one editing session
#[derive(Debug, Default, Clone)]
pub struct CommandHistory {
    /// Most recent last
    undo_stack: Vec<EditCommand>,
    /// Most recent last
    redo_stack: Vec<EditCommand>,
}

impl CommandHistory {
    /// Record a new edit. Clears the redo stack and drops the oldest entries
    /// past [`MAX_HISTORY_SIZE`].
    pub fn push(&mut self, command: EditCommand) {
        self.redo_stack.clear();
        self.undo_stack.push(command);

        while self.undo_stack.len() > MAX_HISTORY_SIZE {
            self.undo_stack.remove(0);
        }
    }

    pub fn pop_undo(&mut self) -> Option<EditCommand> {
        self.undo_stack.pop()
    }

    pub fn pop_redo(&mut self) -> Option<EditCommand> {
        self.redo_stack.pop()
    }

    /// Used after undo
    pub fn push_redo(&mut self, command: EditCommand) {
        self.redo_stack.push(command);
    }

    /// Used after redo; keeps the redo stack intact
    pub fn push_undo(&mut self, command: EditCommand) {
        self.undo_stack.push(command);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
