pub mod color;
pub mod device;
pub mod report;
pub mod style;
pub mod surface;
pub mod types;

pub use color::{ColorMapping, ParseColorError, Rgb};
pub use device::{DeviceKind, DeviceProfile};
pub use report::{
    ColorUsage, FontSizeUsage, FontUsage, LayoutUsage, SpacingUsage, StyleReport, ValueUsage,
};
pub use style::{EffectPreset, LayerKind, StyleLayer, TypographySettings};
pub use surface::{NodeId, RuleId, SurfaceHandle, SurfaceRole};
pub use types::Point;
