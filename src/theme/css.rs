//! CSS custom-property projection of a theme.
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{COLOR_SLOTS, Colors, Theme};

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^#?([a-f\d]{2})([a-f\d]{2})([a-f\d]{2})$").expect("hex colour pattern")
});

/// `--color-*` variable → colour value. Unset slots map to "".
pub fn map_theme_to_css_variables(theme: &Theme) -> IndexMap<&'static str, String> {
    COLOR_SLOTS
        .iter()
        .map(|slot| (slot.css_var, theme.colors.get(slot.js).unwrap_or_default().to_string()))
        .collect()
}

/// A `:root { ... }` block with one declaration per variable.
pub fn css_root_block(theme: &Theme) -> String {
    let mut out = String::from(":root {\n");
    for (var, value) in map_theme_to_css_variables(theme) {
        out.push_str(&format!("  {var}: {value};\n"));
    }
    out.push('}');
    out
}

/// Colours that point at the CSS variables, for Tailwind's colour config.
pub fn custom_tailwind_color_variables() -> Colors {
    let mut colors = Colors::default();
    for slot in &COLOR_SLOTS {
        colors.set(slot.js, rgba_with_opacity(slot.css_var));
    }
    colors
}

fn rgba_with_opacity(variable: &str) -> String {
    format!("rgba(var({variable}))")
}

/// `"0, 0, 0, 1"` → `"rgba(0, 0, 0, 1)"`
pub fn rgba_value_to_rgba_string(rgba_values: &str) -> String {
    format!("rgba({rgba_values})")
}

/// `"#ff8000"` → `"255, 128, 0"`. Anything else gives "".
pub fn hex_to_rgb(hex: &str) -> String {
    let Some(caps) = HEX_COLOR.captures(hex) else {
        return String::new();
    };
    let channel = |i: usize| u8::from_str_radix(&caps[i], 16).unwrap_or_default();
    format!("{}, {}, {}", channel(1), channel(2), channel(3))
}
