//! Editor-independent building blocks: key events, bindings, buffer offsets
//! and fuzzy ranking.

pub mod buffer;
pub mod fuzzy;
pub mod input;
pub mod keybindings;
