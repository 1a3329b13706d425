//! Interactive editing session for face mask regions.
//!
//! [`EditingSession`] is a small state machine over one image's regions:
//!
//! - pointer down on the selected region's handle starts a resize, on a
//!   region body starts a drag, on empty space clears the selection
//! - pointer move drags or resizes, pointer up/leave ends it
//! - wheel over a region scales it, context menu adds a region
//! - Delete/Backspace removes the selection, Escape clears it
//!
//! Handlers take image-space points; [`EditingSession::dispatch`] takes
//! display-space events and maps them through the session's
//! [`CoordinateMapper`]. Every handler runs to completion, so the session
//! needs no locking.
//!
//! ## Module Structure
//!
//! - [`hit_testing`] - handle and body hit detection
//! - [`history`] - undo/redo commands
//! - [`keyboard`] - key event source and subscriptions

pub mod history;
pub mod hit_testing;
pub mod keyboard;

#[cfg(test)]
mod tests;

use tracing::debug;

use crate::geometry::Point;
use crate::mask::{DEFAULT_RADIUS, FillMode, MaskRegion, MaskStore, RegionId};
use crate::viewport::CoordinateMapper;

pub use history::{CommandHistory, EditCommand, MAX_HISTORY_SIZE};
pub use hit_testing::{handle_hit, topmost_region_at, HANDLE_HIT_RADIUS};
pub use keyboard::{KeyPress, KeySubscription, KeyboardHub};

/// Radius scale for one wheel notch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelStep {
    Grow,
    Shrink,
}

impl WheelStep {
    pub fn factor(self) -> f32 {
        match self {
            WheelStep::Grow => 1.1,
            WheelStep::Shrink => 0.9,
        }
    }
}

/// What the primary pointer is currently doing.
///
/// `Dragging` and `Resizing` only exist while a region is selected; the
/// `origin` fields hold the pre-interaction value for undo.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Dragging {
        /// Pointer minus region center at drag start
        anchor: Point,
        origin: Point,
    },
    Resizing {
        origin: f32,
    },
}

/// Host input in display space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp,
    PointerLeave,
    Wheel { at: Point, step: WheelStep },
    ContextMenu(Point),
    Key(KeyPress),
}

pub struct EditingSession {
    store: MaskStore,
    mapper: CoordinateMapper,
    selected: Option<RegionId>,
    mode: InteractionMode,
    default_fill: FillMode,
    history: CommandHistory,
    /// Bumped whenever regions or selection change
    revision: u64,
    keyboard: Option<KeySubscription>,
}

impl EditingSession {
    /// Start a session over `regions` for an image of `width` x `height` pixels.
    pub fn new(regions: Vec<MaskRegion>, width: u32, height: u32) -> Self {
        Self::with_mapper(regions, CoordinateMapper::new(width, height))
    }

    pub fn with_mapper(regions: Vec<MaskRegion>, mapper: CoordinateMapper) -> Self {
        Self {
            store: MaskStore::from_regions(regions),
            mapper,
            selected: None,
            mode: InteractionMode::Idle,
            default_fill: FillMode::default(),
            history: CommandHistory::default(),
            revision: 0,
            keyboard: None,
        }
    }

    // --- Pointer and wheel events (image space) ---

    pub fn pointer_down(&mut self, point: Point) {
        self.finish_interaction();

        if let Some(id) = &self.selected
            && let Some(region) = self.store.get(id)
            && handle_hit(region, point)
        {
            let origin = region.radius();
            self.mode = InteractionMode::Resizing { origin };
            return;
        }

        match topmost_region_at(self.store.list(), point).map(|r| (r.id().clone(), r.center)) {
            Some((id, center)) => {
                self.set_selected(Some(id));
                self.mode = InteractionMode::Dragging {
                    anchor: point - center,
                    origin: center,
                };
            }
            None => self.set_selected(None),
        }
    }

    pub fn pointer_move(&mut self, point: Point) {
        let Some(id) = self.selected.clone() else {
            return;
        };

        let geometry = |store: &MaskStore| store.get(&id).map(|r| (r.center, r.radius()));
        let before = geometry(&self.store);
        match self.mode {
            InteractionMode::Idle => return,
            InteractionMode::Dragging { anchor, .. } => {
                self.store.update(&id, |r| r.center = point - anchor);
            }
            InteractionMode::Resizing { .. } => {
                self.store.update(&id, |r| r.set_radius(point.distance(r.center)));
            }
        }
        // Unchanged geometry keeps the revision
        if geometry(&self.store) != before {
            self.touch();
        }
    }

    pub fn pointer_up(&mut self) {
        self.finish_interaction();
    }

    pub fn pointer_leave(&mut self) {
        self.finish_interaction();
    }

    /// Scale the topmost region under `point` and select it. No-op over empty space.
    pub fn wheel(&mut self, point: Point, step: WheelStep) {
        let Some((id, before)) = topmost_region_at(self.store.list(), point).map(|r| (r.id().clone(), r.radius()))
        else {
            return;
        };
        self.finish_interaction();

        self.store.update(&id, |r| r.set_radius(before * step.factor()));
        if let Some(after) = self.store.get(&id).map(MaskRegion::radius)
            && after != before
        {
            self.history.push(EditCommand::Resize {
                id: id.clone(),
                from: before,
                to: after,
            });
        }
        self.set_selected(Some(id));
        self.touch();
    }

    /// Add a default-sized region at `point` if it lies inside the image.
    pub fn context_menu(&mut self, point: Point) -> Option<RegionId> {
        if !self.mapper.contains_image_point(point) {
            return None;
        }
        self.finish_interaction();

        let id = self.store.insert_new(point, DEFAULT_RADIUS, self.default_fill.clone());
        if let Some(index) = self.store.position(&id)
            && let Some(region) = self.store.get(&id)
        {
            self.history.push(EditCommand::Add {
                index,
                region: region.clone(),
            });
        }
        debug!("Added region {} at ({:.1}, {:.1})", id, point.x, point.y);
        self.set_selected(Some(id.clone()));
        Some(id)
    }

    // --- Deletion and keys ---

    /// Remove the selected region. Returns false if nothing was selected.
    pub fn delete_selected(&mut self) -> bool {
        self.finish_interaction();
        let Some(id) = self.selected.take() else {
            return false;
        };
        self.record_removal(&id);
        self.touch();
        true
    }

    /// Remove any region by id. Selection is only cleared if it pointed at it.
    pub fn remove_region(&mut self, id: &RegionId) -> bool {
        if self.selected.as_ref() == Some(id) {
            return self.delete_selected();
        }
        let removed = self.record_removal(id);
        if removed {
            self.touch();
        }
        removed
    }

    pub fn press_key(&mut self, key: KeyPress) {
        match key {
            KeyPress::Delete | KeyPress::Backspace => {
                self.delete_selected();
            }
            KeyPress::Escape => {
                self.finish_interaction();
                self.set_selected(None);
            }
            KeyPress::Undo => {
                self.undo();
            }
            KeyPress::Redo => {
                self.redo();
            }
        }
    }

    /// Route a display-space event to its handler.
    pub fn dispatch(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerDown(p) => self.pointer_down(self.mapper.to_image_space(p)),
            InputEvent::PointerMove(p) => self.pointer_move(self.mapper.to_image_space(p)),
            InputEvent::PointerUp => self.pointer_up(),
            InputEvent::PointerLeave => self.pointer_leave(),
            InputEvent::Wheel { at, step } => self.wheel(self.mapper.to_image_space(at), step),
            InputEvent::ContextMenu(p) => {
                self.context_menu(self.mapper.to_image_space(p));
            }
            InputEvent::Key(key) => self.press_key(key),
        }
    }

    // --- Fill ---

    /// Change the fill used for new regions, optionally repainting every
    /// existing region too. Recorded as one undoable step.
    pub fn set_default_fill(&mut self, fill: FillMode, apply_to_existing: bool) {
        self.finish_interaction();

        let changes: Vec<_> = if apply_to_existing {
            self.store
                .list()
                .iter()
                .filter(|r| r.fill != fill)
                .map(|r| (r.id().clone(), r.fill.clone(), fill.clone()))
                .collect()
        } else {
            Vec::new()
        };
        let default = (self.default_fill != fill).then(|| (self.default_fill.clone(), fill.clone()));

        if changes.is_empty() && default.is_none() {
            return;
        }
        self.record(EditCommand::Refill { changes, default });
    }

    pub fn set_region_fill(&mut self, id: &RegionId, fill: FillMode) -> bool {
        let Some(before) = self.store.get(id).map(|r| r.fill.clone()) else {
            return false;
        };
        if before != fill {
            self.record(EditCommand::Refill {
                changes: vec![(id.clone(), before, fill)],
                default: None,
            });
        }
        true
    }

    // --- Undo / redo ---

    /// Undo the last edit. Ignored mid-drag or mid-resize.
    pub fn undo(&mut self) -> bool {
        if self.mode != InteractionMode::Idle {
            return false;
        }
        let Some(command) = self.history.pop_undo() else {
            return false;
        };
        command.revert(&mut self.store, &mut self.default_fill);
        self.history.push_redo(command);
        self.after_history_step();
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.mode != InteractionMode::Idle {
            return false;
        }
        let Some(command) = self.history.pop_redo() else {
            return false;
        };
        command.apply(&mut self.store, &mut self.default_fill);
        self.history.push_undo(command);
        self.after_history_step();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Keyboard subscription ---

    /// Start receiving keys from `hub`, replacing any previous subscription.
    pub fn attach_keyboard(&mut self, hub: &KeyboardHub) {
        self.keyboard = Some(hub.subscribe());
    }

    pub fn detach_keyboard(&mut self) {
        self.keyboard = None;
    }

    pub fn is_keyboard_attached(&self) -> bool {
        self.keyboard.as_ref().is_some_and(KeySubscription::is_connected)
    }

    /// Apply every key queued since the last call. Returns how many were handled.
    pub fn process_keyboard(&mut self) -> usize {
        let keys = match &self.keyboard {
            Some(subscription) => subscription.drain(),
            None => return 0,
        };
        for key in &keys {
            self.press_key(*key);
        }
        keys.len()
    }

    // --- Accessors ---

    /// Regions in paint order, for rendering or handing back to the host
    pub fn current_regions(&self) -> &[MaskRegion] {
        self.store.list()
    }

    pub fn into_regions(self) -> Vec<MaskRegion> {
        let Self { store, .. } = self;
        store.into_regions()
    }

    pub fn selected(&self) -> Option<&RegionId> {
        self.selected.as_ref()
    }

    pub fn selected_region(&self) -> Option<&MaskRegion> {
        self.selected.as_ref().and_then(|id| self.store.get(id))
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn default_fill(&self) -> &FillMode {
        &self.default_fill
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn mapper_mut(&mut self) -> &mut CoordinateMapper {
        &mut self.mapper
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // --- Internals ---

    /// End any drag or resize, recording it if the region actually changed.
    fn finish_interaction(&mut self) {
        let mode = std::mem::take(&mut self.mode);
        let Some(region) = self.selected.as_ref().and_then(|id| self.store.get(id)) else {
            return;
        };

        let command = match mode {
            InteractionMode::Dragging { origin, .. } if region.center != origin => Some(EditCommand::Move {
                id: region.id().clone(),
                from: origin,
                to: region.center,
            }),
            InteractionMode::Resizing { origin } if region.radius() != origin => Some(EditCommand::Resize {
                id: region.id().clone(),
                from: origin,
                to: region.radius(),
            }),
            _ => None,
        };
        if let Some(command) = command {
            self.history.push(command);
        }
    }

    fn record_removal(&mut self, id: &RegionId) -> bool {
        match self.store.take(id) {
            Some((index, region)) => {
                debug!("Removed region {}", id);
                self.history.push(EditCommand::Remove { index, region });
                true
            }
            None => false,
        }
    }

    /// Apply a new command and push it onto the history
    fn record(&mut self, command: EditCommand) {
        command.apply(&mut self.store, &mut self.default_fill);
        self.history.push(command);
        self.touch();
    }

    fn after_history_step(&mut self) {
        if let Some(id) = &self.selected
            && !self.store.contains(id)
        {
            self.selected = None;
        }
        self.touch();
    }

    fn set_selected(&mut self, id: Option<RegionId>) {
        if self.selected != id {
            self.selected = id;
            self.touch();
        }
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
