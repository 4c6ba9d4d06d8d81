//! Theme colors: built-in palette with optional overrides from config.toml

use ratatui::style::Color;

use crate::config::ThemeConfig;

/// Theme colors for the UI
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub accent: Color,      // Active borders, selected facet, key hints
    pub success: Color,     // Success messages, paid badges
    pub warning: Color,     // Warning messages, unpaid badges
    pub danger: Color,      // Error messages
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Labels, disabled controls
    pub bg_selected: Color, // Selected menu entry
    pub inactive: Color,    // Inactive borders
    pub header: Color,      // Title and field labels
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Rgb(41, 128, 185),
            success: Color::Rgb(46, 204, 113),
            warning: Color::Rgb(243, 156, 18),
            danger: Color::Rgb(231, 76, 60),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(236, 240, 241),
        }
    }
}

impl Theme {
    /// Defaults with any valid hex overrides applied
    pub fn from_config(config: &ThemeConfig) -> Self {
        let mut theme = Self::default();

        let overrides: [(&Option<String>, &mut Color); 9] = [
            (&config.accent, &mut theme.accent),
            (&config.success, &mut theme.success),
            (&config.warning, &mut theme.warning),
            (&config.danger, &mut theme.danger),
            (&config.text, &mut theme.text),
            (&config.text_dim, &mut theme.text_dim),
            (&config.bg_selected, &mut theme.bg_selected),
            (&config.inactive, &mut theme.inactive),
            (&config.header, &mut theme.header),
        ];

        for (value, slot) in overrides {
            if let Some(raw) = value {
                match Self::parse_hex_color(raw) {
                    Some(color) => *slot = color,
                    None => tracing::warn!("Ignoring invalid theme color: {}", raw),
                }
            }
        }

        theme
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');
        if !s.is_ascii() {
            return None;
        }

        if s.len() == 6 {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        } else if s.len() == 3 {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(Theme::parse_hex_color("#2980b9"), Some(Color::Rgb(41, 128, 185)));
        assert_eq!(Theme::parse_hex_color("fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(Theme::parse_hex_color("#12345"), None);
        assert_eq!(Theme::parse_hex_color("#zzzzzz"), None);
    }

    #[test]
    fn test_overrides_apply_and_bad_values_are_ignored() {
        let config = ThemeConfig {
            accent: Some("#000000".to_string()),
            danger: Some("red-ish".to_string()),
            ..Default::default()
        };

        let theme = Theme::from_config(&config);
        assert_eq!(theme.accent, Color::Rgb(0, 0, 0));
        assert_eq!(theme.danger, Theme::default().danger);
    }
}
