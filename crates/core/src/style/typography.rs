//! Typography layer generation.

use restyle_protocol::TypographySettings;

/// Compile typography settings to the css layer.
///
/// Empty settings compile to an empty string so the layer drops out of the
/// injected block entirely.
pub fn typography_css(settings: &TypographySettings) -> String {
    if settings.is_empty() {
        return String::new();
    }
    let mut css = String::new();

    let mut body_rules = Vec::new();
    if let Some(family) = &settings.body_family {
        body_rules.push(format!("font-family: {} !important;", quote_family(family)));
    }
    if let Some(weight) = settings.body_weight {
        body_rules.push(format!("font-weight: {weight} !important;"));
    }
    if let Some(line_height) = settings.line_height {
        body_rules.push(format!("line-height: {line_height} !important;"));
    }
    if !body_rules.is_empty() {
        css.push_str(&format!(
            "body, p, li, td, span, div {{ {} }}\n",
            body_rules.join(" ")
        ));
    }

    if let Some(family) = &settings.heading_family {
        css.push_str(&format!(
            "h1, h2, h3, h4, h5, h6 {{ font-family: {} !important; }}\n",
            quote_family(family)
        ));
    }

    if let Some(size) = settings.base_size_px {
        css.push_str(&format!("html {{ font-size: {size}px !important; }}\n"));
    }

    css
}

/// Quote a family name containing spaces, unless already quoted.
fn quote_family(family: &str) -> String {
    let family = family.trim();
    if family.contains(' ') && !family.starts_with(['"', '\'']) {
        format!("\"{family}\"")
    } else {
        family.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_settings_compile_to_nothing() {
        assert_eq!(typography_css(&TypographySettings::default()), "");
    }

    #[test]
    fn body_family_is_quoted_when_needed() {
        let settings = TypographySettings {
            body_family: Some("Source Serif Pro".into()),
            ..TypographySettings::default()
        };
        let css = typography_css(&settings);
        assert!(css.contains("font-family: \"Source Serif Pro\" !important"));
        assert!(css.starts_with("body, p, li"));
    }

    #[test]
    fn headings_and_base_size_get_their_own_rules() {
        let settings = TypographySettings {
            heading_family: Some("Inter".into()),
            base_size_px: Some(18.0),
            line_height: Some(1.6),
            ..TypographySettings::default()
        };
        let css = typography_css(&settings);
        assert!(css.contains("h1, h2, h3, h4, h5, h6 { font-family: Inter !important; }"));
        assert!(css.contains("html { font-size: 18px !important; }"));
        assert!(css.contains("line-height: 1.6 !important;"));
    }
}
