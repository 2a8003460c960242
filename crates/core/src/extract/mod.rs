pub mod freq;
pub mod probe;

pub use probe::extract;
