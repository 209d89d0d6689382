//! Time-driven sprite animation state machine.
//!
//! Maps a discrete actor state (plus an optional facing direction) and a
//! monotonic millisecond clock onto a rectangle of a fixed sprite sheet and a
//! horizontal mirror flag.
//!
//! The only persistent state is an [`AnimationClock`], a small `Copy` value
//! that the frame loop threads through [`select_frame`]. The clock remembers
//! when the actor last changed state; every frame index is derived from the
//! time elapsed since that edge, never from absolute time, so the walk cycle
//! always restarts at its first frame when a state is entered.
//!
//! Walking alternates between exactly two sheet columns. Idle and Jumping
//! show one fixed column each.

use serde::Deserialize;

/// Discrete behavioural mode of the actor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorState {
    #[default]
    Idle,
    Walking,
    Jumping,
}

impl ActorState {
    pub const ALL: &'static [ActorState] =
        &[ActorState::Idle, ActorState::Walking, ActorState::Jumping];

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Walking => "walking",
            Self::Jumping => "jumping",
        }
    }
}

impl std::fmt::Display for ActorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Cardinal facing. The discriminant is the sheet row for that facing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up = 0,
    Left = 1,
    Right = 2,
    #[default]
    Down = 3,
}

impl Direction {
    pub const ALL: &'static [Direction] = &[
        Direction::Up,
        Direction::Left,
        Direction::Right,
        Direction::Down,
    ];

    /// Row of the direction-indexed sheet holding this facing.
    pub fn row(self) -> u32 {
        self as u32
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Left => "left",
            Self::Right => "right",
            Self::Down => "down",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.label() == label)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Horizontal movement input observed on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizontal {
    Left,
    Right,
}

impl Horizontal {
    /// Sign of a movement axis value; `None` for zero.
    pub fn from_axis(axis: f32) -> Option<Self> {
        if axis < 0.0 {
            Some(Self::Left)
        } else if axis > 0.0 {
            Some(Self::Right)
        } else {
            None
        }
    }
}

/// Whether the region is drawn as authored or mirrored left-to-right.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    #[default]
    Normal,
    Mirrored,
}

impl Orientation {
    pub fn is_mirrored(self) -> bool {
        matches!(self, Self::Mirrored)
    }
}

/// Rectangle into the sprite sheet, in texels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Everything the renderer needs to draw the current pose.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSpec {
    pub rect: FrameRect,
    pub orientation: Orientation,
}

/// Fixed geometry of a sprite sheet, supplied by configuration.
///
/// Columns are frame indices along a row. `row` is used when the caller does
/// not pass a [`Direction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub frame_width: u32,
    pub frame_height: u32,
    pub idle_frame: u32,
    pub walk_frames: [u32; 2],
    pub jump_frame: u32,
    pub animation_fps: u32,
    pub row: u32,
}

impl SheetLayout {
    /// Integer milliseconds each walk frame stays on screen. Never zero.
    pub fn ms_per_frame(&self) -> u64 {
        (1000 / u64::from(self.animation_fps.max(1))).max(1)
    }

    /// Sheet column for `state` after `elapsed_ms` in that state.
    pub fn column_for(&self, state: ActorState, elapsed_ms: u64) -> u32 {
        match state {
            ActorState::Idle => self.idle_frame,
            ActorState::Walking => {
                let frames_passed = elapsed_ms / self.ms_per_frame();
                self.walk_frames[(frames_passed & 1) as usize]
            }
            ActorState::Jumping => self.jump_frame,
        }
    }

    /// Saturates instead of wrapping; [`SheetLayout::extent`] tells callers
    /// whether the sheet fits in `u32` pixels at all.
    pub fn rect(&self, column: u32, row: u32) -> FrameRect {
        FrameRect {
            x: column.saturating_mul(self.frame_width),
            y: row.saturating_mul(self.frame_height),
            width: self.frame_width,
            height: self.frame_height,
        }
    }

    /// Largest column index any state can select.
    pub fn max_column(&self) -> u32 {
        self.idle_frame
            .max(self.walk_frames[0])
            .max(self.walk_frames[1])
            .max(self.jump_frame)
    }

    /// Pixel size covering every column and `rows` rows, or `None` when that
    /// does not fit in `u32`.
    pub fn extent(&self, rows: u32) -> Option<(u32, u32)> {
        let width = self
            .max_column()
            .checked_add(1)?
            .checked_mul(self.frame_width)?;
        let height = rows.checked_mul(self.frame_height)?;
        Some((width, height))
    }
}

/// Per-frame input to [`select_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInput {
    pub state: ActorState,
    pub now_ms: u64,
    pub direction: Option<Direction>,
    pub horizontal: Option<Horizontal>,
}

/// Timing memory of the state machine, threaded through the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationClock {
    state: ActorState,
    last_transition_ms: u64,
    orientation: Orientation,
}

impl AnimationClock {
    pub fn new(state: ActorState, now_ms: u64) -> Self {
        Self {
            state,
            last_transition_ms: now_ms,
            orientation: Orientation::Normal,
        }
    }

    pub fn state(&self) -> ActorState {
        self.state
    }

    pub fn last_transition_ms(&self) -> u64 {
        self.last_transition_ms
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Record `state` as observed at `now_ms`. The transition timestamp moves
    /// only when the state differs from the previously observed one.
    pub fn observe(self, state: ActorState, now_ms: u64) -> Self {
        if state == self.state {
            return self;
        }
        log::debug!(
            "Animation transition {} -> {} at {}ms",
            self.state,
            state,
            now_ms
        );
        Self {
            state,
            last_transition_ms: now_ms,
            ..self
        }
    }

    /// Left keeps the sheet as authored, right mirrors it, no input keeps
    /// whatever the last horizontal input chose.
    pub fn face(self, horizontal: Option<Horizontal>) -> Self {
        let orientation = match horizontal {
            Some(Horizontal::Left) => Orientation::Normal,
            Some(Horizontal::Right) => Orientation::Mirrored,
            None => self.orientation,
        };
        Self {
            orientation,
            ..self
        }
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_transition_ms)
    }

    /// Frame for the current state without touching the clock.
    pub fn frame(
        &self,
        sheet: &SheetLayout,
        now_ms: u64,
        direction: Option<Direction>,
    ) -> FrameSpec {
        let column = sheet.column_for(self.state, self.elapsed_ms(now_ms));
        let row = direction.map_or(sheet.row, Direction::row);
        FrameSpec {
            rect: sheet.rect(column, row),
            orientation: self.orientation,
        }
    }
}

/// The per-frame "compute frame" operation: apply the transition rule and the
/// facing rule, then pick the region to draw.
pub fn select_frame(
    clock: AnimationClock,
    input: &FrameInput,
    sheet: &SheetLayout,
) -> (AnimationClock, FrameSpec) {
    let clock = clock
        .observe(input.state, input.now_ms)
        .face(input.horizontal);
    let frame = clock.frame(sheet, input.now_ms, input.direction);
    (clock, frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> SheetLayout {
        SheetLayout {
            frame_width: 16,
            frame_height: 16,
            idle_frame: 0,
            walk_frames: [1, 2],
            jump_frame: 3,
            animation_fps: 12,
            row: 0,
        }
    }

    fn input(state: ActorState, now_ms: u64) -> FrameInput {
        FrameInput {
            state,
            now_ms,
            direction: None,
            horizontal: None,
        }
    }

    #[test]
    fn ms_per_frame_truncates() {
        assert_eq!(sheet().ms_per_frame(), 83);
        let six = SheetLayout {
            animation_fps: 6,
            ..sheet()
        };
        assert_eq!(six.ms_per_frame(), 166);
    }

    #[test]
    fn ms_per_frame_never_zero() {
        let zero = SheetLayout {
            animation_fps: 0,
            ..sheet()
        };
        assert_eq!(zero.ms_per_frame(), 1000);
        let huge = SheetLayout {
            animation_fps: 5000,
            ..sheet()
        };
        assert_eq!(huge.ms_per_frame(), 1);
    }

    #[test]
    fn walking_alternates_every_frame_period() {
        let sheet = sheet();
        let clock = AnimationClock::new(ActorState::Walking, 1_000);
        let frame_a = sheet.rect(1, 0);
        let frame_b = sheet.rect(2, 0);

        assert_eq!(clock.frame(&sheet, 1_000, None).rect, frame_a);
        assert_eq!(clock.frame(&sheet, 1_083, None).rect, frame_b);
        assert_eq!(clock.frame(&sheet, 1_166, None).rect, frame_a);
        assert_eq!(clock.frame(&sheet, 1_249, None).rect, frame_b);
    }

    #[test]
    fn frame_is_stable_within_a_parity_window() {
        let sheet = sheet();
        let clock = AnimationClock::new(ActorState::Walking, 0);
        for t in 0..83 {
            assert_eq!(clock.frame(&sheet, t, None), clock.frame(&sheet, 0, None));
        }
        for t in 83..166 {
            assert_eq!(clock.frame(&sheet, t, None), clock.frame(&sheet, 83, None));
        }
    }

    #[test]
    fn idle_and_jumping_ignore_time() {
        let sheet = sheet();
        for &state in &[ActorState::Idle, ActorState::Jumping] {
            let clock = AnimationClock::new(state, 500);
            let first = clock.frame(&sheet, 500, None);
            for t in [501, 583, 666, 10_000, 1_000_000] {
                assert_eq!(clock.frame(&sheet, t, None), first, "{state} at {t}");
            }
        }
        assert_eq!(
            AnimationClock::new(ActorState::Idle, 0).frame(&sheet, 0, None).rect.x,
            0
        );
        assert_eq!(
            AnimationClock::new(ActorState::Jumping, 0)
                .frame(&sheet, 0, None)
                .rect
                .x,
            48
        );
    }

    #[test]
    fn transition_resets_phase() {
        let sheet = sheet();
        // Idle for a while, then start walking at t = 1_083: an odd phase
        // relative to when the clock was created, but walking must begin on frame A.
        let clock = AnimationClock::new(ActorState::Idle, 1_000);
        let (clock, frame) = select_frame(clock, &input(ActorState::Walking, 1_083), &sheet);
        assert_eq!(clock.last_transition_ms(), 1_083);

        let fresh = AnimationClock::new(ActorState::Walking, 1_083);
        assert_eq!(frame, fresh.frame(&sheet, 1_083, None));
        assert_eq!(frame.rect, sheet.rect(1, 0));
    }

    #[test]
    fn same_state_leaves_transition_time_untouched() {
        let sheet = sheet();
        let mut clock = AnimationClock::new(ActorState::Walking, 0);
        for t in [16, 33, 50, 66, 83, 100] {
            let (next, _) = select_frame(clock, &input(ActorState::Walking, t), &sheet);
            clock = next;
            assert_eq!(clock.last_transition_ms(), 0);
        }
    }

    #[test]
    fn repeated_calls_with_fixed_clock_are_identical() {
        let sheet = sheet();
        let clock = AnimationClock::new(ActorState::Walking, 0);
        let frame_input = input(ActorState::Walking, 200);
        let (clock_a, frame_a) = select_frame(clock, &frame_input, &sheet);
        let (clock_b, frame_b) = select_frame(clock_a, &frame_input, &sheet);
        assert_eq!(clock_a, clock_b);
        assert_eq!(frame_a, frame_b);
    }

    #[test]
    fn horizontal_input_sets_mirror() {
        let sheet = sheet();
        let clock = AnimationClock::new(ActorState::Walking, 0);

        let left = FrameInput {
            horizontal: Some(Horizontal::Left),
            ..input(ActorState::Walking, 10)
        };
        let (clock, frame) = select_frame(clock, &left, &sheet);
        assert_eq!(frame.orientation, Orientation::Normal);

        let right = FrameInput {
            horizontal: Some(Horizontal::Right),
            ..input(ActorState::Walking, 20)
        };
        let (clock, frame) = select_frame(clock, &right, &sheet);
        assert_eq!(frame.orientation, Orientation::Mirrored);

        // No input, and a transition to Idle: the mirror stays.
        let (clock, frame) = select_frame(clock, &input(ActorState::Idle, 30), &sheet);
        assert!(frame.orientation.is_mirrored());
        assert_eq!(clock.orientation(), Orientation::Mirrored);
    }

    #[test]
    fn direction_selects_row() {
        let sheet = sheet();
        let clock = AnimationClock::new(ActorState::Idle, 0);
        let frame = clock.frame(&sheet, 0, Some(Direction::Down));
        assert_eq!(Direction::Down.row(), 3);
        assert_eq!(frame.rect.y, 48);
        assert_eq!(frame.rect.height, 16);

        for &direction in Direction::ALL {
            let frame = clock.frame(&sheet, 0, Some(direction));
            assert_eq!(frame.rect.y, direction.row() * 16);
        }
    }

    #[test]
    fn missing_direction_uses_sheet_row() {
        let sheet = SheetLayout { row: 2, ..sheet() };
        let frame = AnimationClock::new(ActorState::Idle, 0).frame(&sheet, 0, None);
        assert_eq!(frame.rect.y, 32);
    }

    #[test]
    fn clock_reading_before_transition_counts_as_zero() {
        let clock = AnimationClock::new(ActorState::Walking, 1_000);
        assert_eq!(clock.elapsed_ms(900), 0);
        assert_eq!(clock.frame(&sheet(), 900, None).rect, sheet().rect(1, 0));
    }

    #[test]
    fn max_column_covers_all_states() {
        assert_eq!(sheet().max_column(), 3);
        let sheet = SheetLayout {
            walk_frames: [5, 1],
            ..sheet()
        };
        assert_eq!(sheet.max_column(), 5);
    }

    #[test]
    fn direction_labels_round_trip() {
        for &direction in Direction::ALL {
            assert_eq!(Direction::from_label(direction.label()), Some(direction));
        }
        assert_eq!(Direction::from_label("north"), None);
    }

    #[test]
    fn horizontal_from_axis_sign() {
        assert_eq!(Horizontal::from_axis(-1.0), Some(Horizontal::Left));
        assert_eq!(Horizontal::from_axis(0.5), Some(Horizontal::Right));
        assert_eq!(Horizontal::from_axis(0.0), None);
    }

    #[test]
    fn state_display_matches_label() {
        for &state in ActorState::ALL {
            assert_eq!(format!("{}", state), state.label());
        }
    }

    #[test]
    fn oversized_geometry_saturates_instead_of_overflowing() {
        let huge = SheetLayout {
            frame_width: 100_000,
            idle_frame: 100_000,
            ..sheet()
        };
        let frame = AnimationClock::new(ActorState::Idle, 0).frame(&huge, 0, None);
        assert_eq!(frame.rect.x, u32::MAX);
        assert_eq!(frame.rect.width, 100_000);
        assert_eq!(huge.extent(1), None);
    }

    #[test]
    fn extent_covers_all_columns_and_rows() {
        assert_eq!(sheet().extent(1), Some((64, 16)));
        assert_eq!(sheet().extent(4), Some((64, 64)));
        let tall = SheetLayout {
            frame_height: u32::MAX,
            ..sheet()
        };
        assert_eq!(tall.extent(1), Some((64, u32::MAX)));
        assert_eq!(tall.extent(2), None);
    }
}
