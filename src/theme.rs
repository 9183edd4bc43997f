//! The theme model: the descriptors for `Theme`/`Colors`, the matching Rust
//! structs and the text-level `Convert` helpers.
//!
//! Colour slots are stored in JSON under dotted keys (`sideBar.background`)
//! and in Rust under camelCase names (`sideBarBackground`).
pub mod builtin;
pub mod css;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::descriptor::{Descriptor, Field};
use crate::error::Result;
use crate::registry::Registry;
use crate::typed::{from_typed, to_typed};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub default: bool,
    pub colors: Colors,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Colors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_bar_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_bar_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_bar_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows_close_button_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_controls_linux_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_controls_linux_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_controls_linux_hover_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_controls_linux_active_background: Option<String>,
}

/// One colour slot: JSON key, internal key, CSS custom property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSlot {
    pub json: &'static str,
    pub js: &'static str,
    pub css_var: &'static str,
}

pub const COLOR_SLOTS: [ColorSlot; 10] = [
    ColorSlot { json: "primary", js: "primary", css_var: "--color-primary" },
    ColorSlot { json: "sideBar.background", js: "sideBarBackground", css_var: "--color-sideBar-background" },
    ColorSlot { json: "toolBar.background", js: "toolBarBackground", css_var: "--color-toolBar-background" },
    ColorSlot { json: "page.background", js: "pageBackground", css_var: "--color-page-background" },
    ColorSlot { json: "statusBar.background", js: "statusBarBackground", css_var: "--color-statusBar-background" },
    ColorSlot {
        json: "windowsCloseButton.background",
        js: "windowsCloseButtonBackground",
        css_var: "--color-windows-close-button-background",
    },
    ColorSlot {
        json: "windowControlsLinux.background",
        js: "windowControlsLinuxBackground",
        css_var: "--color-window-controls-linux-background",
    },
    ColorSlot {
        json: "windowControlsLinux.text",
        js: "windowControlsLinuxText",
        css_var: "--color-window-controls-linux-text",
    },
    ColorSlot {
        json: "windowControlsLinux.hoverBackground",
        js: "windowControlsLinuxHoverBackground",
        css_var: "--color-window-controls-linux-hover-background",
    },
    ColorSlot {
        json: "windowControlsLinux.activeBackground",
        js: "windowControlsLinuxActiveBackground",
        css_var: "--color-window-controls-linux-active-background",
    },
];

// ————————————————————————————————————————————————————————————————————————————
// SCHEMA
// ————————————————————————————————————————————————————————————————————————————

/// `Theme` and `Colors`. Neither allows unknown keys.
pub static SCHEMA: Lazy<Registry> = Lazy::new(|| {
    theme_registry().unwrap_or_else(|err| panic!("built-in theme schema is invalid: {err}"))
});

fn theme_registry() -> std::result::Result<Registry, crate::error::SchemaError> {
    let theme = Descriptor::object(
        vec![
            Field::same("name", Descriptor::STRING),
            Field::same("type", Descriptor::STRING),
            Field::same("default", Descriptor::BOOLEAN),
            Field::same("colors", Descriptor::reference("Colors")),
        ],
        Descriptor::Never,
    );
    let colors = Descriptor::object(
        COLOR_SLOTS
            .iter()
            .map(|slot| Field::new(slot.json, slot.js, Descriptor::optional(Descriptor::STRING)))
            .collect(),
        Descriptor::Never,
    );
    Registry::builder().with("Theme", theme).with("Colors", colors).build()
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Colors {
    /// Look a slot up by its internal key.
    pub fn get(&self, js: &str) -> Option<&str> {
        let slot = match js {
            "primary" => &self.primary,
            "sideBarBackground" => &self.side_bar_background,
            "toolBarBackground" => &self.tool_bar_background,
            "pageBackground" => &self.page_background,
            "statusBarBackground" => &self.status_bar_background,
            "windowsCloseButtonBackground" => &self.windows_close_button_background,
            "windowControlsLinuxBackground" => &self.window_controls_linux_background,
            "windowControlsLinuxText" => &self.window_controls_linux_text,
            "windowControlsLinuxHoverBackground" => &self.window_controls_linux_hover_background,
            "windowControlsLinuxActiveBackground" => &self.window_controls_linux_active_background,
            _ => return None,
        };
        slot.as_deref()
    }

    /// Set a slot by its internal key. Returns false for an unknown key.
    pub fn set(&mut self, js: &str, value: impl Into<String>) -> bool {
        let slot = match js {
            "primary" => &mut self.primary,
            "sideBarBackground" => &mut self.side_bar_background,
            "toolBarBackground" => &mut self.tool_bar_background,
            "pageBackground" => &mut self.page_background,
            "statusBarBackground" => &mut self.status_bar_background,
            "windowsCloseButtonBackground" => &mut self.windows_close_button_background,
            "windowControlsLinuxBackground" => &mut self.window_controls_linux_background,
            "windowControlsLinuxText" => &mut self.window_controls_linux_text,
            "windowControlsLinuxHoverBackground" => &mut self.window_controls_linux_hover_background,
            "windowControlsLinuxActiveBackground" => &mut self.window_controls_linux_active_background,
            _ => return false,
        };
        *slot = Some(value.into());
        true
    }

    /// Build from `(internal key, value)` pairs; unknown keys are ignored.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut colors = Colors::default();
        for (k, v) in pairs {
            colors.set(k, v);
        }
        colors
    }
}

pub struct Convert;

impl Convert {
    pub fn to_theme(json: &str) -> Result<Theme> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let typed = SCHEMA.decode(&value, "Theme")?;
        from_typed(typed)
    }

    /// Pretty printed with two-space indentation.
    pub fn theme_to_json(theme: &Theme) -> Result<String> {
        let value = Self::theme_to_value(theme)?;
        Ok(serde_json::to_string_pretty(&value)?)
    }

    pub fn theme_to_value(theme: &Theme) -> Result<serde_json::Value> {
        let typed = to_typed(theme)?;
        Ok(SCHEMA.encode(&typed, "Theme")?)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
