pub mod apply;
pub mod palette;

pub use apply::{RemapOutcome, apply};
pub use palette::{BUILTIN_PALETTE, assign};
