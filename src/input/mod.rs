//! Physical input sources feeding the report controller.

pub mod debounce;
pub mod dpad;

pub use debounce::{DebouncePolicy, DebounceState, DebouncedInput, Debouncer};
pub use dpad::{Directions, DpadAction, DpadMap, ProgramChord};
