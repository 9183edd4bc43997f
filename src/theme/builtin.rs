//! The themes shipped with the application, and writing them out as files.
use std::path::{Path, PathBuf};

use super::{Colors, Convert, Theme};
use crate::error::Result;

pub struct BuiltinTheme {
    /// File stem of the generated file.
    pub slug: &'static str,
    pub theme: Theme,
}

pub fn builtin_themes() -> Vec<BuiltinTheme> {
    vec![
        BuiltinTheme {
            slug: "moss-dark",
            theme: theme("Moss Dark Default", "dark", false, [
                ("primary", "255, 255, 255, 1"),
                ("sideBarBackground", "39, 39, 42, 1"),
                ("toolBarBackground", "30, 32, 33, 1"),
                ("pageBackground", "22, 24, 25, 1"),
                ("statusBarBackground", "0, 122, 205, 1"),
                ("windowsCloseButtonBackground", "196, 43, 28, 1"),
                ("windowControlsLinuxBackground", "55, 55, 55, 1"),
                ("windowControlsLinuxText", "255, 255, 255, 1"),
                ("windowControlsLinuxHoverBackground", "66, 66, 66, 1"),
                ("windowControlsLinuxActiveBackground", "86, 86, 86, 1"),
            ]),
        },
        BuiltinTheme {
            slug: "moss-light",
            theme: theme("Moss Light Default", "light", true, [
                ("primary", "0, 0, 0, 1"),
                ("sideBarBackground", "244, 244, 245, 1"),
                ("toolBarBackground", "224, 224, 224, 1"),
                ("pageBackground", "255, 255, 255, 1"),
                ("statusBarBackground", "0, 122, 205, 1"),
                ("windowsCloseButtonBackground", "196, 43, 28, 1"),
                ("windowControlsLinuxBackground", "218, 218, 218, 1"),
                ("windowControlsLinuxText", "61, 61, 61, 1"),
                ("windowControlsLinuxHoverBackground", "209, 209, 209, 1"),
                ("windowControlsLinuxActiveBackground", "191, 191, 191, 1"),
            ]),
        },
        BuiltinTheme {
            slug: "moss-pink",
            theme: theme("Moss Pink", "pink", false, [
                ("primary", "0, 0, 0, 1"),
                ("sideBarBackground", "234, 157, 242, 1"),
                ("toolBarBackground", "222, 125, 232, 1"),
                ("pageBackground", "227, 54, 245, 1"),
                ("statusBarBackground", "63, 11, 69, 1"),
                ("windowsCloseButtonBackground", "196, 43, 28, 1"),
                ("windowControlsLinuxBackground", "218, 218, 218, 1"),
                ("windowControlsLinuxText", "61, 61, 61, 1"),
                ("windowControlsLinuxHoverBackground", "209, 209, 209, 1"),
                ("windowControlsLinuxActiveBackground", "191, 191, 191, 1"),
            ]),
        },
    ]
}

fn theme(name: &str, kind: &str, default: bool, colors: [(&str, &str); 10]) -> Theme {
    Theme {
        name: name.to_string(),
        kind: kind.to_string(),
        default,
        colors: Colors::from_pairs(colors),
    }
}

/// `~/.config/moss/themes`, if a home directory can be found.
pub fn default_themes_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("moss").join("themes"))
}

/// Encode every built-in theme and write `<slug>.json` into `dir`, creating
/// it if needed. Returns the written paths.
pub fn write_theme_files(dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for BuiltinTheme { slug, theme } in builtin_themes() {
        let path = dir.join(format!("{slug}.json"));
        let src = Convert::theme_to_json(&theme)?;
        std::fs::write(&path, src)?;
        written.push(path);
    }
    Ok(written)
}
