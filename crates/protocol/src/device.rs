use serde::{Deserialize, Serialize};

/// Device class a simulated viewport belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Mobile,
    Tablet,
    Laptop,
    Desktop,
    Custom,
}

/// A named width×height pair simulating a device class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub id: String,
    pub kind: DeviceKind,
    /// Viewport width in CSS pixels.
    pub width: u32,
    /// Viewport height in CSS pixels.
    pub height: u32,
}

impl DeviceProfile {
    fn preset(id: &str, kind: DeviceKind, width: u32, height: u32) -> Self {
        Self {
            id: id.to_owned(),
            kind,
            width,
            height,
        }
    }

    pub fn mobile() -> Self {
        Self::preset("mobile", DeviceKind::Mobile, 375, 812)
    }

    pub fn tablet() -> Self {
        Self::preset("tablet", DeviceKind::Tablet, 768, 1024)
    }

    pub fn laptop() -> Self {
        Self::preset("laptop", DeviceKind::Laptop, 1366, 768)
    }

    pub fn desktop() -> Self {
        Self::preset("desktop", DeviceKind::Desktop, 1920, 1080)
    }

    /// A user-defined profile. Zero dimensions are rejected.
    pub fn custom(id: impl Into<String>, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            id: id.into(),
            kind: DeviceKind::Custom,
            width,
            height,
        })
    }

    /// The built-in catalog shown when no user profiles exist.
    pub fn builtin() -> Vec<Self> {
        vec![Self::mobile(), Self::tablet(), Self::laptop(), Self::desktop()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_rejects_zero_dimensions() {
        assert!(DeviceProfile::custom("x", 0, 600).is_none());
        assert!(DeviceProfile::custom("x", 800, 0).is_none());
        let p = DeviceProfile::custom("x", 800, 600).expect("valid profile");
        assert_eq!(p.kind, DeviceKind::Custom);
    }

    #[test]
    fn builtin_catalog_covers_all_classes() {
        let kinds: Vec<_> = DeviceProfile::builtin().into_iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DeviceKind::Mobile,
                DeviceKind::Tablet,
                DeviceKind::Laptop,
                DeviceKind::Desktop
            ]
        );
    }
}
