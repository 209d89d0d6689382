//! Keyboard state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` returns true every frame the key
//!   is physically down. Movement reads this.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only during the
//!   frame the transition happened. The runner clears them with `end_frame()`
//!   once the program's update for that frame has run.

/// Keys the programs react to. Anything else is dropped at the window layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Escape,
    Space,
    F3,
    W,
    A,
    S,
    D,
    R,
}

impl Key {
    /// Keys exposed to gameplay scripts, with their script-side names.
    pub const SCRIPTABLE: &'static [(Key, &'static str)] = &[
        (Key::Left, "left"),
        (Key::Right, "right"),
        (Key::Up, "up"),
        (Key::Down, "down"),
        (Key::Space, "space"),
        (Key::W, "w"),
        (Key::A, "a"),
        (Key::S, "s"),
        (Key::D, "d"),
    ];

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// Fixed-size set of [`Key`]s, one bit each.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct KeySet(u16);

impl KeySet {
    fn contains(self, key: Key) -> bool {
        self.0 & key.bit() != 0
    }

    /// Returns true when `key` was not already present.
    fn insert(&mut self, key: Key) -> bool {
        let added = !self.contains(key);
        self.0 |= key.bit();
        added
    }

    /// Returns true when `key` was present.
    fn remove(&mut self, key: Key) -> bool {
        let removed = self.contains(key);
        self.0 &= !key.bit();
        removed
    }
}

#[derive(Debug, Default, Clone)]
pub struct InputState {
    held: KeySet,
    just_pressed: KeySet,
    just_released: KeySet,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// OS key repeat calls this again while held; only the first call counts
    /// as a press.
    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(key) {
            self.just_released.insert(key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(key)
    }

    /// -1 for left (arrow or A), +1 for right (arrow or D), 0 when neither or both.
    pub fn horizontal_axis(&self) -> f32 {
        axis(
            self.is_held(Key::Left) || self.is_held(Key::A),
            self.is_held(Key::Right) || self.is_held(Key::D),
        )
    }

    /// -1 for up (arrow or W), +1 for down (arrow or S). Screen space is y-down.
    pub fn vertical_axis(&self) -> f32 {
        axis(
            self.is_held(Key::Up) || self.is_held(Key::W),
            self.is_held(Key::Down) || self.is_held(Key::S),
        )
    }

    pub fn end_frame(&mut self) {
        self.just_pressed = KeySet::default();
        self.just_released = KeySet::default();
    }
}

fn axis(negative: bool, positive: bool) -> f32 {
    match (negative, positive) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}
