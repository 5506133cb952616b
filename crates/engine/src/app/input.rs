use crate::grid::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    ToggleOutlines,
    ToggleCenterLine,
    TogglePaletteOutlines,
    Quit,
}

const ACTION_COUNT: usize = 4;

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::ToggleOutlines => 0,
            InputAction::ToggleCenterLine => 1,
            InputAction::TogglePaletteOutlines => 2,
            InputAction::Quit => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    /// Returns true on the first press after a release.
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) -> bool {
        let index = action.index();
        let pressed = is_down && !self.down[index];
        self.down[index] = is_down;
        pressed
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

/// Pointer state read by a frame. Presses are not part of it; they are handled as they
/// arrive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    cursor_position_px: Option<Vec2>,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    /// Cursor in canvas pixels, if it is over the canvas.
    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }
}

#[derive(Debug, Default)]
pub(crate) struct InputCollector {
    actions: ActionStates,
    cursor_position_px: Option<Vec2>,
    left_mouse_is_down: bool,
}

impl InputCollector {
    /// Records a key state. Returns true when this event is a fresh press.
    pub(crate) fn set_action(&mut self, action: InputAction, is_down: bool) -> bool {
        self.actions.set(action, is_down)
    }

    pub(crate) fn quit_requested(&self) -> bool {
        self.actions.is_down(InputAction::Quit)
    }

    pub(crate) fn set_cursor_position_px(&mut self, position: Option<Vec2>) {
        self.cursor_position_px = position;
    }

    /// Records the left button state. A fresh press returns the cursor position it landed
    /// on, or `None` when the cursor is off the canvas.
    pub(crate) fn set_left_mouse(&mut self, is_down: bool) -> Option<Vec2> {
        let pressed = is_down && !self.left_mouse_is_down;
        self.left_mouse_is_down = is_down;
        pressed.then_some(self.cursor_position_px).flatten()
    }

    pub(crate) fn snapshot_for_frame(&self) -> InputSnapshot {
        InputSnapshot {
            cursor_position_px: self.cursor_position_px,
        }
    }
}
