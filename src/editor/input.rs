//! Keyboard forwarding from bevy input into the editing session.

use bevy::prelude::*;
use bevy_egui::EguiContexts;
use masquerade::session::KeyPress;

use crate::ui::DialogState;

use super::document::{Document, EditorKeyboard};

/// Translate this frame's key presses into session keys.
pub fn collect_key_presses(keyboard: &ButtonInput<KeyCode>) -> Vec<KeyPress> {
    let ctrl = keyboard.pressed(KeyCode::ControlLeft) || keyboard.pressed(KeyCode::ControlRight);
    let shift = keyboard.pressed(KeyCode::ShiftLeft) || keyboard.pressed(KeyCode::ShiftRight);

    let mut keys = Vec::new();
    if keyboard.just_pressed(KeyCode::Delete) {
        keys.push(KeyPress::Delete);
    }
    if keyboard.just_pressed(KeyCode::Backspace) {
        keys.push(KeyPress::Backspace);
    }
    if keyboard.just_pressed(KeyCode::Escape) {
        keys.push(KeyPress::Escape);
    }
    if ctrl && !shift && keyboard.just_pressed(KeyCode::KeyZ) {
        keys.push(KeyPress::Undo);
    }
    if (ctrl && keyboard.just_pressed(KeyCode::KeyY)) || (ctrl && shift && keyboard.just_pressed(KeyCode::KeyZ)) {
        keys.push(KeyPress::Redo);
    }
    keys
}

/// Publish key presses to the hub, then let the session drain its queue
pub fn forward_keyboard(
    keyboard: Res<ButtonInput<KeyCode>>,
    hub: Res<EditorKeyboard>,
    mut document: ResMut<Document>,
    mut contexts: EguiContexts,
    dialog_state: Res<DialogState>,
) {
    if dialog_state.any_modal_open {
        return;
    }
    if let Ok(ctx) = contexts.ctx_mut()
        && ctx.wants_keyboard_input()
    {
        return;
    }

    for key in collect_key_presses(&keyboard) {
        hub.0.publish(key);
    }

    if let Some(session) = document.session.as_mut() {
        let handled = session.process_keyboard();
        if handled > 0 {
            debug!("Session handled {} key presses", handled);
        }
    }
}
