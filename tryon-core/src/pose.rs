//! Pose carousel navigation.
//!
//! The app keeps two ordered lists of pose instructions: the full catalog,
//! where position is the global pose index, and the subset currently
//! available to the user (already generated or unlocked). The carousel shows
//! one pose at a time by global index; stepping left or right should move
//! through the available subset where possible and fall back to the full
//! catalog where it is not.
//!
//! Both directions are pure functions of `(current index, catalog, available)`.
//! `Some(i)` asks the caller to select global index `i`; `None` means leave the
//! selection alone.
//!
//! The two directions are intentionally asymmetric at the edge of the
//! available list: `previous` wraps around within the available poses, while
//! `next` past the last available pose continues into the full catalog so the
//! user can reach poses that have not been generated yet.

use serde::{Deserialize, Serialize};

/// Poses offered by the app out of the box
pub const DEFAULT_POSE_INSTRUCTIONS: [&str; 6] = [
    "Full frontal view, hands on hips",
    "Slightly turned, 3/4 view",
    "Side profile view",
    "Jumping in the air, mid-action shot",
    "Walking towards camera",
    "Leaning against a wall",
];

/// Carousel step direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Previous,
    Next,
}

/// Step back one pose.
///
/// With zero or one available pose there is nothing to cycle through and the
/// current index is returned unchanged.
pub fn previous<S: AsRef<str>>(current: usize, all: &[S], available: &[S]) -> Option<usize> {
    if available.len() <= 1 {
        return Some(current);
    }
    if all.is_empty() {
        return None;
    }

    match position_in_available(current, all, available) {
        None => Some((current % all.len() + all.len() - 1) % all.len()),
        Some(p) => {
            let prev = (p + available.len() - 1) % available.len();
            global_index_of(available[prev].as_ref(), all)
        }
    }
}

/// Step forward one pose.
///
/// Stepping past the last available pose continues with the next pose of the
/// full catalog.
pub fn next<S: AsRef<str>>(current: usize, all: &[S], available: &[S]) -> Option<usize> {
    if all.is_empty() {
        return None;
    }
    let wrap_in_catalog = Some((current % all.len() + 1) % all.len());

    match position_in_available(current, all, available) {
        None => wrap_in_catalog,
        Some(p) if p + 1 < available.len() => global_index_of(available[p + 1].as_ref(), all),
        Some(_) => wrap_in_catalog,
    }
}

/// Step in `direction`.
pub fn step<S: AsRef<str>>(
    current: usize,
    direction: Direction,
    all: &[S],
    available: &[S],
) -> Option<usize> {
    match direction {
        Direction::Previous => previous(current, all, available),
        Direction::Next => next(current, all, available),
    }
}

/// Where the pose at global index `current` sits in the available list, by value.
fn position_in_available<S: AsRef<str>>(current: usize, all: &[S], available: &[S]) -> Option<usize> {
    let instruction = all.get(current)?.as_ref();
    available.iter().position(|a| a.as_ref() == instruction)
}

fn global_index_of<S: AsRef<str>>(instruction: &str, all: &[S]) -> Option<usize> {
    all.iter().position(|p| p.as_ref() == instruction)
}

/// The ordered, immutable pose catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoseCatalog {
    poses: Vec<String>,
}

impl Default for PoseCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_POSE_INSTRUCTIONS.iter().map(|s| s.to_string()))
    }
}

impl PoseCatalog {
    pub fn new(poses: impl IntoIterator<Item = String>) -> Self {
        Self {
            poses: poses.into_iter().collect(),
        }
    }

    pub fn poses(&self) -> &[String] {
        &self.poses
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Caption for the pose at `index`, if it exists.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.poses.get(index).map(String::as_str)
    }

    /// Global index of `instruction`.
    pub fn index_of(&self, instruction: &str) -> Option<usize> {
        global_index_of(instruction, &self.poses)
    }

    /// Navigator over this catalog and the caller's current availability.
    pub fn navigator<'a>(&'a self, available: &'a [String]) -> PoseNavigator<'a> {
        PoseNavigator::new(&self.poses, available)
    }
}

/// Borrowed view over both pose lists, for binding to a carousel's two buttons.
#[derive(Debug, Clone, Copy)]
pub struct PoseNavigator<'a> {
    all: &'a [String],
    available: &'a [String],
}

impl<'a> PoseNavigator<'a> {
    pub fn new(all: &'a [String], available: &'a [String]) -> Self {
        Self { all, available }
    }

    pub fn previous(&self, current: usize) -> Option<usize> {
        previous(current, self.all, self.available)
    }

    pub fn next(&self, current: usize) -> Option<usize> {
        next(current, self.all, self.available)
    }

    pub fn step(&self, current: usize, direction: Direction) -> Option<usize> {
        step(current, direction, self.all, self.available)
    }

    /// Like [`step`](Self::step), but inert while a generation is in flight.
    pub fn step_unless_busy(
        &self,
        current: usize,
        direction: Direction,
        is_loading: bool,
    ) -> Option<usize> {
        if is_loading {
            return None;
        }
        self.step(current, direction)
    }
}
