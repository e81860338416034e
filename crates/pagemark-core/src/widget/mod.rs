//! Selection chrome for the active object.
//!
//! Shapes remain pure data. The active object gets a dashed frame and
//! endpoint handles drawn around it, styled by [`SelectionStyle`].

mod handles;

pub use handles::{Handle, HandleKind, HandleShape, SelectionStyle, line_handles, selection_frame};
