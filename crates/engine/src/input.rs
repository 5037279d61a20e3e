#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    Left,
    Right,
    Up,
    Down,
    Jump,
    Grab,
    Grapple,
}

const ACTION_COUNT: usize = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::Left => 0,
            InputAction::Right => 1,
            InputAction::Up => 2,
            InputAction::Down => 3,
            InputAction::Jump => 4,
            InputAction::Grab => 5,
            InputAction::Grapple => 6,
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "jump" => Some(Self::Jump),
            "grab" => Some(Self::Grab),
            "grapple" => Some(Self::Grapple),
            _ => None,
        }
    }
}

/// Input as seen by exactly one simulation tick.
///
/// Press edges (`jump_pressed`, `grapple_pressed`) are true for the single
/// tick that follows the press and never repeat while the action stays held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    actions: ActionStates,
    jump_pressed: bool,
    grapple_pressed: bool,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// Digital axis in `{-1, 0, 1}` per component, +y pointing down.
    /// Opposite directions held together cancel out.
    pub fn axis(&self) -> (i8, i8) {
        let x = self.is_down(InputAction::Right) as i8 - self.is_down(InputAction::Left) as i8;
        let y = self.is_down(InputAction::Down) as i8 - self.is_down(InputAction::Up) as i8;
        (x, y)
    }

    pub fn jump_pressed(&self) -> bool {
        self.jump_pressed
    }

    pub fn jump_held(&self) -> bool {
        self.is_down(InputAction::Jump)
    }

    pub fn grapple_pressed(&self) -> bool {
        self.grapple_pressed
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    /// Marks a fresh jump press; the jump action is also held.
    pub fn with_jump_pressed(mut self, jump_pressed: bool) -> Self {
        self.jump_pressed = jump_pressed;
        if jump_pressed {
            self.actions.set(InputAction::Jump, true);
        }
        self
    }

    pub fn with_grapple_pressed(mut self, grapple_pressed: bool) -> Self {
        self.grapple_pressed = grapple_pressed;
        if grapple_pressed {
            self.actions.set(InputAction::Grapple, true);
        }
        self
    }
}

/// Collects press/release events between ticks and hands out one
/// [`InputSnapshot`] per tick.
#[derive(Debug, Default)]
pub struct InputState {
    actions: ActionStates,
    jump_pressed_edge: bool,
    grapple_pressed_edge: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, action: InputAction) {
        if !self.actions.is_down(action) {
            match action {
                InputAction::Jump => self.jump_pressed_edge = true,
                InputAction::Grapple => self.grapple_pressed_edge = true,
                _ => {}
            }
        }
        self.actions.set(action, true);
    }

    pub fn release(&mut self, action: InputAction) {
        self.actions.set(action, false);
    }

    pub fn release_all(&mut self) {
        self.actions = ActionStates::default();
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot {
            actions: self.actions,
            jump_pressed: self.jump_pressed_edge,
            grapple_pressed: self.grapple_pressed_edge,
        };
        self.jump_pressed_edge = false;
        self.grapple_pressed_edge = false;
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_press_is_edge_triggered_for_single_tick() {
        let mut input = InputState::new();
        input.press(InputAction::Jump);

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();

        assert!(first.jump_pressed());
        assert!(!second.jump_pressed());
        assert!(second.jump_held());
    }

    #[test]
    fn held_jump_does_not_spam_press_edges() {
        let mut input = InputState::new();

        input.press(InputAction::Jump);
        let first = input.snapshot_for_tick();

        input.press(InputAction::Jump);
        let second = input.snapshot_for_tick();

        input.release(InputAction::Jump);
        input.press(InputAction::Jump);
        let third = input.snapshot_for_tick();

        assert!(first.jump_pressed());
        assert!(!second.jump_pressed());
        assert!(third.jump_pressed());
    }

    #[test]
    fn press_and_release_between_ticks_still_registers_edge() {
        let mut input = InputState::new();
        input.press(InputAction::Jump);
        input.release(InputAction::Jump);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.jump_pressed());
        assert!(!snapshot.jump_held());
    }

    #[test]
    fn opposite_directions_cancel_on_axis() {
        let snapshot = InputSnapshot::empty()
            .with_action_down(InputAction::Left, true)
            .with_action_down(InputAction::Right, true)
            .with_action_down(InputAction::Up, true);

        assert_eq!(snapshot.axis(), (0, -1));
    }

    #[test]
    fn grapple_edge_clears_after_snapshot() {
        let mut input = InputState::new();
        input.press(InputAction::Grapple);
        assert!(input.snapshot_for_tick().grapple_pressed());
        assert!(!input.snapshot_for_tick().grapple_pressed());
        assert!(input.is_down(InputAction::Grapple));
    }

    #[test]
    fn action_tokens_map_to_actions() {
        assert_eq!(InputAction::from_token("left"), Some(InputAction::Left));
        assert_eq!(InputAction::from_token("grab"), Some(InputAction::Grab));
        assert_eq!(InputAction::from_token("dash"), None);
    }
}
