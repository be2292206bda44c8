//! Analog stick to d-pad translation.
//!
//! The stick's travel on each axis is cut into 9 regions, giving a 9×9
//! grid.  Each cell either presses a set of directions or holds whatever
//! was pressed before ("same"), which gives hysteresis on the borders
//! between directions.  Rows run top to bottom, columns left to right.
//!
//! Directions drive buttons 1..=4 (up, down, left, right) and are
//! always written inside one transaction so that a diagonal change never
//! shows up as two reports.

use crate::error::Error;
use crate::hid::buttons::ButtonBank;

pub const REGIONS: usize = 9;

pub const UP_BUTTON: u16 = 1;
pub const DOWN_BUTTON: u16 = 2;
pub const LEFT_BUTTON: u16 = 3;
pub const RIGHT_BUTTON: u16 = 4;

// Chord buttons, reported like any other button.
pub const B1_BUTTON: u16 = 5;
pub const B2_BUTTON: u16 = 6;
pub const START_BUTTON: u16 = 8;
pub const SELECT_BUTTON: u16 = 9;
pub const PROGRAM_MODE_BUTTON: u16 = 12;

/// A set of pressed directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Directions(u8);

impl Directions {
    pub const NONE: Self = Self(0);
    pub const UP: Self = Self(1 << 0);
    pub const DOWN: Self = Self(1 << 1);
    pub const LEFT: Self = Self(1 << 2);
    pub const RIGHT: Self = Self(1 << 3);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DpadAction {
    /// Keep the previous directions.
    Same,
    Press(Directions),
}

type Grid = [[DpadAction; REGIONS]; REGIONS];

const NO: DpadAction = DpadAction::Press(Directions::NONE);
const UP: DpadAction = DpadAction::Press(Directions::UP);
const DW: DpadAction = DpadAction::Press(Directions::DOWN);
const LT: DpadAction = DpadAction::Press(Directions::LEFT);
const RT: DpadAction = DpadAction::Press(Directions::RIGHT);
const UL: DpadAction = DpadAction::Press(Directions::UP.union(Directions::LEFT));
const UR: DpadAction = DpadAction::Press(Directions::UP.union(Directions::RIGHT));
const DL: DpadAction = DpadAction::Press(Directions::DOWN.union(Directions::LEFT));
const DR: DpadAction = DpadAction::Press(Directions::DOWN.union(Directions::RIGHT));
const SM: DpadAction = DpadAction::Same;

#[rustfmt::skip]
static EIGHT_WAY: Grid = [
    [UL, UL, UL, UP, UP, UP, UR, UR, UR],
    [UL, UL, UL, UP, UP, UP, UR, UR, UR],
    [UL, UL, UL, UP, UP, UP, UR, UR, UR],
    [LT, LT, LT, NO, NO, NO, RT, RT, RT],
    [LT, LT, LT, NO, NO, NO, RT, RT, RT],
    [LT, LT, LT, NO, NO, NO, RT, RT, RT],
    [DL, DL, DL, DW, DW, DW, DR, DR, DR],
    [DL, DL, DL, DW, DW, DW, DR, DR, DR],
    [DL, DL, DL, DW, DW, DW, DR, DR, DR],
];

#[rustfmt::skip]
static FOUR_WAY: Grid = [
    [SM, UP, UP, UP, UP, UP, UP, UP, SM],
    [LT, SM, UP, UP, UP, UP, UP, SM, RT],
    [LT, LT, SM, UP, UP, UP, SM, RT, RT],
    [LT, LT, LT, NO, NO, NO, RT, RT, RT],
    [LT, LT, LT, NO, NO, NO, RT, RT, RT],
    [LT, LT, LT, NO, NO, NO, RT, RT, RT],
    [LT, LT, SM, DW, DW, DW, SM, RT, RT],
    [LT, SM, DW, DW, DW, DW, DW, SM, RT],
    [SM, DW, DW, DW, DW, DW, DW, DW, SM],
];

// Q*bert moves only diagonally; the stick is rotated 45° so each
// quadrant maps to one direction.
#[rustfmt::skip]
static QBERT: Grid = [
    [LT, LT, LT, LT, SM, UP, UP, UP, UP],
    [LT, LT, LT, LT, SM, UP, UP, UP, UP],
    [LT, LT, LT, LT, NO, UP, UP, UP, UP],
    [LT, LT, LT, NO, NO, NO, UP, UP, UP],
    [SM, SM, NO, NO, NO, NO, NO, SM, SM],
    [DW, DW, DW, NO, NO, NO, RT, RT, RT],
    [DW, DW, DW, DW, NO, RT, RT, RT, RT],
    [DW, DW, DW, DW, SM, RT, RT, RT, RT],
    [DW, DW, DW, DW, SM, RT, RT, RT, RT],
];

#[rustfmt::skip]
static PREFER_DIAGONALS: Grid = [
    [UL, UL, SM, UP, UP, UP, SM, UR, UR],
    [UL, UL, UL, UP, UP, UP, UR, UR, UR],
    [SM, UL, UL, SM, UP, SM, UR, UR, SM],
    [LT, LT, SM, UL, NO, UR, SM, RT, RT],
    [LT, LT, LT, NO, NO, NO, RT, RT, RT],
    [LT, LT, SM, DL, NO, DR, SM, RT, RT],
    [SM, DL, DL, SM, DW, SM, DR, DR, SM],
    [DL, DL, DL, DW, DW, DW, DR, DR, DR],
    [DL, DL, SM, DW, DW, DW, SM, DR, DR],
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DpadMap {
    #[default]
    EightWay,
    FourWay,
    Qbert,
    PreferDiagonals,
}

impl DpadMap {
    fn grid(self) -> &'static Grid {
        match self {
            DpadMap::EightWay => &EIGHT_WAY,
            DpadMap::FourWay => &FOUR_WAY,
            DpadMap::Qbert => &QBERT,
            DpadMap::PreferDiagonals => &PREFER_DIAGONALS,
        }
    }

    /// Action for a stick position given as percentages of travel.
    ///
    /// The ADC reads high at the left/top, so percentages are inverted
    /// before picking the region.
    pub fn action(self, x_pct: f32, y_pct: f32) -> DpadAction {
        self.grid()[region(y_pct)][region(x_pct)]
    }
}

/// Grid index for one axis: `clamp(floor((1 - pct) * 9), 0, 8)`.
pub fn region(pct: f32) -> usize {
    let scaled = (1.0 - pct) * REGIONS as f32;
    if scaled.is_nan() || scaled <= 0.0 {
        0
    } else {
        (scaled as usize).min(REGIONS - 1)
    }
}

/// Buttons held while the program-mode switch is on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgramChord {
    pub b1: bool,
    pub b2: bool,
    pub start: bool,
    pub select: bool,
}

impl ProgramChord {
    /// Chord currently committed on `bank`, `None` unless program mode is held.
    pub fn read(bank: &ButtonBank) -> Result<Option<Self>, Error> {
        if !bank.committed(PROGRAM_MODE_BUTTON)? {
            return Ok(None);
        }
        Ok(Some(Self {
            b1: bank.committed(B1_BUTTON)?,
            b2: bank.committed(B2_BUTTON)?,
            start: bank.committed(START_BUTTON)?,
            select: bank.committed(SELECT_BUTTON)?,
        }))
    }

    /// Map chosen by the chord, if any (first held button wins).
    pub fn selected_map(self) -> Option<DpadMap> {
        if self.b1 {
            Some(DpadMap::EightWay)
        } else if self.b2 {
            Some(DpadMap::FourWay)
        } else if self.start {
            Some(DpadMap::Qbert)
        } else if self.select {
            Some(DpadMap::PreferDiagonals)
        } else {
            None
        }
    }
}

/// Write `action` to the direction buttons of `bank`.
///
/// Call inside a transaction; `Same` leaves the buttons untouched.
pub fn apply(action: DpadAction, bank: &ButtonBank) -> Result<(), Error> {
    let DpadAction::Press(dirs) = action else {
        return Ok(());
    };
    bank.set_button(UP_BUTTON, dirs.contains(Directions::UP))?;
    bank.set_button(DOWN_BUTTON, dirs.contains(Directions::DOWN))?;
    bank.set_button(LEFT_BUTTON, dirs.contains(Directions::LEFT))?;
    bank.set_button(RIGHT_BUTTON, dirs.contains(Directions::RIGHT))?;
    Ok(())
}
