//! Key types and their one-byte glyph encoding.

use std::fmt;

use serde::Serialize;

use crate::value::ValueKind;

/// The closed set of key types a config comment can declare.
///
/// The glyph is the wire encoding used as the first character of a key's
/// comment; everything inside the crate dispatches on the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KeyType {
    TextLabel,
    Link,
    Separator,
    Frame,
    Expander,
    EmptyWidget,
    EmptyFull,

    BoolButton,
    BoolCtrl,
    IntSpin,
    IntScale,
    IntSize,
    FloatSpin,
    FloatScale,
    ColorRGB,
    ColorRGBA,

    StringEntry,
    PasswordEntry,
    FileSelector,
    ImageSelector,
    FolderSelector,
    SoundSelector,
    ShortkeySelector,
    ClassSelector,
    FontSelector,

    ListSimple,
    ListEntry,
    ListNumbered,
    ListNbCtrlSimple,
    ListNbCtrlSelect,
    TreeViewSortSimple,
    TreeViewSortModify,
    TreeViewMultiChoice,

    LaunchCmdSimple,
    LaunchCmdIf,

    ListViews,
    ListAnimation,
    ListDialogDecorator,
    ListDeskletDecoSimple,
    ListDeskletDecoDefault,
    ListThemeApplet,
    ListThemeDesktopIcon,
    ListDocks,
    ListIconsMainDock,
    ListScreens,

    Handbook,
    JumpToModuleSimple,
    JumpToModuleIfExists,
}

const GLYPHS: &[(KeyType, char, &str)] = &[
    (KeyType::TextLabel, '>', "Text Label"),
    (KeyType::Link, 'W', "Link"),
    (KeyType::Separator, 'v', "Separator"),
    (KeyType::Frame, 'F', "Frame"),
    (KeyType::Expander, 'X', "Expander"),
    (KeyType::EmptyWidget, '_', "Empty Widget"),
    (KeyType::EmptyFull, '<', "Empty Widget (expand)"),
    (KeyType::BoolButton, 'b', "Bool Button"),
    (KeyType::BoolCtrl, 'B', "Bool Ctrl"),
    (KeyType::IntSpin, 'i', "Int Spin"),
    (KeyType::IntScale, 'I', "Int Scale"),
    (KeyType::IntSize, 'j', "Int Size"),
    (KeyType::FloatSpin, 'f', "Float Spin"),
    (KeyType::FloatScale, 'e', "Float Scale"),
    (KeyType::ColorRGB, 'c', "ColorSelector RGB"),
    (KeyType::ColorRGBA, 'C', "ColorSelector RGBA"),
    (KeyType::StringEntry, 's', "String Entry"),
    (KeyType::PasswordEntry, 'p', "Password Entry"),
    (KeyType::FileSelector, 'S', "File Selector"),
    (KeyType::ImageSelector, 'g', "Image Selector"),
    (KeyType::FolderSelector, 'D', "Folder Selector"),
    (KeyType::SoundSelector, 'u', "Sound Selector"),
    (KeyType::ShortkeySelector, 'k', "Shortkey Selector"),
    (KeyType::ClassSelector, 'K', "Class Selector"),
    (KeyType::FontSelector, 'P', "Font Selector"),
    (KeyType::ListSimple, 'L', "List Simple"),
    (KeyType::ListEntry, 'E', "List Entry"),
    (KeyType::ListNumbered, 'l', "List Numbered"),
    (KeyType::ListNbCtrlSimple, 'y', "List Nb Ctrl Simple"),
    (KeyType::ListNbCtrlSelect, 'Y', "List Nb Ctrl Select"),
    (KeyType::TreeViewSortSimple, 'T', "TreeView SortSimple"),
    (KeyType::TreeViewSortModify, 'U', "TreeView SortModify"),
    (KeyType::TreeViewMultiChoice, 'V', "TreeView MultiCheck"),
    (KeyType::LaunchCmdSimple, 'Z', "Launch Command"),
    (KeyType::LaunchCmdIf, 'G', "Launch Command If"),
    (KeyType::ListViews, 'n', "List Views"),
    (KeyType::ListAnimation, 'a', "List Animation"),
    (KeyType::ListDialogDecorator, 't', "List DialogDecorator"),
    (KeyType::ListDeskletDecoSimple, 'O', "List DeskletDeco"),
    (KeyType::ListDeskletDecoDefault, 'o', "List DeskletDeco +Def"),
    (KeyType::ListThemeApplet, 'h', "List Theme Applet"),
    (KeyType::ListThemeDesktopIcon, 'w', "List Theme Icons"),
    (KeyType::ListDocks, 'd', "List Docks"),
    (KeyType::ListIconsMainDock, 'N', "List Icons MainDock"),
    (KeyType::ListScreens, 'r', "List Screens"),
    (KeyType::Handbook, 'A', "Handbook"),
    (KeyType::JumpToModuleSimple, 'm', "Jump To Module Simple"),
    (KeyType::JumpToModuleIfExists, 'M', "Jump To Module If Exists"),
];

impl KeyType {
    /// Every key type, in declaration order.
    pub fn all() -> impl Iterator<Item = KeyType> {
        GLYPHS.iter().map(|(t, _, _)| *t)
    }

    pub fn from_glyph(glyph: char) -> Option<KeyType> {
        GLYPHS.iter().find(|(_, g, _)| *g == glyph).map(|(t, _, _)| *t)
    }

    pub fn glyph(self) -> char {
        self.entry().1
    }

    /// Human readable name, used in reports.
    pub fn name(self) -> &'static str {
        self.entry().2
    }

    fn entry(self) -> &'static (KeyType, char, &'static str) {
        // GLYPHS lists every variant exactly once.
        GLYPHS
            .iter()
            .find(|(t, _, _)| *t == self)
            .unwrap_or(&GLYPHS[0])
    }

    /// Element kind of the values held by keys of this type.
    ///
    /// Types without a meaningful value (labels, frames, buttons) read and
    /// write their raw text as strings.
    pub fn value_kind(self) -> ValueKind {
        use KeyType::*;
        match self {
            BoolButton | BoolCtrl => ValueKind::Bool,
            IntSpin | IntScale | IntSize | ListNumbered | ListNbCtrlSimple | ListNbCtrlSelect => {
                ValueKind::Int
            }
            FloatSpin | FloatScale | ColorRGB | ColorRGBA => ValueKind::Float,
            TreeViewSortSimple | TreeViewSortModify | TreeViewMultiChoice => ValueKind::ListString,
            _ => ValueKind::String,
        }
    }

    /// Types whose value is a list whatever the declared cardinality.
    pub fn is_always_list(self) -> bool {
        self.is_color() || self.is_tree_view()
    }

    pub fn is_color(self) -> bool {
        matches!(self, KeyType::ColorRGB | KeyType::ColorRGBA)
    }

    pub fn is_tree_view(self) -> bool {
        matches!(
            self,
            KeyType::TreeViewSortSimple | KeyType::TreeViewSortModify | KeyType::TreeViewMultiChoice
        )
    }

    /// Combos where the selected line number is the stored value.
    pub fn is_list_numbered(self) -> bool {
        matches!(
            self,
            KeyType::ListNumbered | KeyType::ListNbCtrlSimple | KeyType::ListNbCtrlSelect
        )
    }

    /// Frames and expanders open a section that collects the following keys.
    pub fn is_section(self) -> bool {
        matches!(self, KeyType::Frame | KeyType::Expander)
    }

    /// Types packed using all the available page space.
    pub fn is_full_size(self) -> bool {
        matches!(
            self,
            KeyType::ListThemeApplet | KeyType::ListViews | KeyType::EmptyFull | KeyType::Handbook
        )
    }

    /// Types that never commit a value back to storage.
    pub fn is_display_only(self) -> bool {
        use KeyType::*;
        matches!(
            self,
            TextLabel
                | Link
                | Separator
                | Frame
                | Expander
                | EmptyWidget
                | EmptyFull
                | LaunchCmdSimple
                | LaunchCmdIf
                | Handbook
                | JumpToModuleSimple
                | JumpToModuleIfExists
        )
    }

    /// Types rendered as header rows in change reports.
    pub fn is_report_header(self) -> bool {
        use KeyType::*;
        matches!(
            self,
            Frame | Expander | Separator | TextLabel | LaunchCmdSimple | LaunchCmdIf
        )
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rendering backend a key is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    All,
    Cairo,
    OpenGl,
}

impl DisplayMode {
    /// Whether a key gated to `self` is shown when the host renders with `host`.
    pub fn allows(self, host: DisplayMode) -> bool {
        !matches!(
            (self, host),
            (DisplayMode::Cairo, DisplayMode::OpenGl) | (DisplayMode::OpenGl, DisplayMode::Cairo)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyphs_round_trip() {
        for t in KeyType::all() {
            assert_eq!(KeyType::from_glyph(t.glyph()), Some(t), "{t}");
        }
    }

    #[test]
    fn glyphs_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for t in KeyType::all() {
            assert!(seen.insert(t.glyph()), "duplicate glyph {}", t.glyph());
        }
        assert_eq!(seen.len(), 48);
    }

    #[test]
    fn unknown_glyph() {
        assert_eq!(KeyType::from_glyph('Q'), None);
    }

    #[test]
    fn value_kinds() {
        assert_eq!(KeyType::BoolButton.value_kind(), ValueKind::Bool);
        assert_eq!(KeyType::ListNbCtrlSelect.value_kind(), ValueKind::Int);
        assert_eq!(KeyType::ColorRGBA.value_kind(), ValueKind::Float);
        assert_eq!(
            KeyType::TreeViewSortModify.value_kind(),
            ValueKind::ListString
        );
        assert_eq!(KeyType::ListDocks.value_kind(), ValueKind::String);
    }

    #[test]
    fn display_names() {
        assert_eq!(KeyType::ColorRGBA.to_string(), "ColorSelector RGBA");
        assert_eq!(KeyType::EmptyFull.name(), "Empty Widget (expand)");
    }

    #[test]
    fn display_mode_gating() {
        assert!(DisplayMode::All.allows(DisplayMode::OpenGl));
        assert!(DisplayMode::Cairo.allows(DisplayMode::Cairo));
        assert!(DisplayMode::Cairo.allows(DisplayMode::All));
        assert!(!DisplayMode::Cairo.allows(DisplayMode::OpenGl));
        assert!(!DisplayMode::OpenGl.allows(DisplayMode::Cairo));
    }
}
