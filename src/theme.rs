use serde::{Deserialize, Serialize};

use crate::molecule::{ELEMENTS, atomic_number};

/// Style policy for depiction. Distances are in molecule units
/// (angstroms) and converted to device units with `point_scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPolicy {
    pub name: String,
    /// Device units per angstrom.
    pub point_scale: f32,
    pub font_size: f32,
    pub line_size: f32,
    pub bond_sep: f32,
    pub default_padding: f32,
    pub foreground: String,
    pub background: String,
    pub font_family: String,
    /// Colours indexed by atomic number; slot 0 is used for non-elements.
    pub atom_colors: Vec<String>,
}

impl RenderPolicy {
    pub fn black_on_white() -> Self {
        Self {
            name: "black-on-white".to_string(),
            point_scale: 20.0,
            font_size: 0.65,
            line_size: 0.075,
            bond_sep: 0.2,
            default_padding: 0.2,
            foreground: "#000000".to_string(),
            background: "#FFFFFF".to_string(),
            font_family: "Arial, Helvetica, sans-serif".to_string(),
            atom_colors: uniform_colors("#000000"),
        }
    }

    pub fn white_on_black() -> Self {
        Self {
            name: "white-on-black".to_string(),
            foreground: "#FFFFFF".to_string(),
            background: "#000000".to_string(),
            atom_colors: uniform_colors("#FFFFFF"),
            ..Self::black_on_white()
        }
    }

    pub fn colour_on_white() -> Self {
        Self {
            name: "colour-on-white".to_string(),
            atom_colors: element_colors("#404040", ON_WHITE),
            ..Self::black_on_white()
        }
    }

    pub fn colour_on_black() -> Self {
        Self {
            name: "colour-on-black".to_string(),
            atom_colors: element_colors("#E0E0E0", ON_BLACK),
            ..Self::white_on_black()
        }
    }

    /// Thinner strokes and tighter spacing for print at small sizes.
    pub fn printed_publication() -> Self {
        Self {
            name: "printed-publication".to_string(),
            point_scale: 9.6,
            font_size: 0.80,
            line_size: 0.0945,
            bond_sep: 0.27,
            default_padding: 0.15,
            ..Self::black_on_white()
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "black-on-white" | "default" => Some(Self::black_on_white()),
            "white-on-black" => Some(Self::white_on_black()),
            "colour-on-white" | "color-on-white" => Some(Self::colour_on_white()),
            "colour-on-black" | "color-on-black" => Some(Self::colour_on_black()),
            "printed-publication" | "print" => Some(Self::printed_publication()),
            _ => None,
        }
    }

    /// Colour for an element symbol, falling back to the foreground.
    pub fn atom_color(&self, element: &str) -> &str {
        atomic_number(element)
            .and_then(|num| self.atom_colors.get(num))
            .map(String::as_str)
            .unwrap_or(self.foreground.as_str())
    }
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::black_on_white()
    }
}

fn uniform_colors(color: &str) -> Vec<String> {
    vec![color.to_string(); ELEMENTS.len()]
}

const ON_WHITE: &[(&str, &str)] = &[
    ("H", "#808080"),
    ("C", "#000000"),
    ("N", "#0000FF"),
    ("O", "#FF0000"),
    ("F", "#00A000"),
    ("Na", "#8000C0"),
    ("Mg", "#008000"),
    ("Si", "#A08040"),
    ("P", "#FF8000"),
    ("S", "#C0A000"),
    ("Cl", "#00A000"),
    ("K", "#8000C0"),
    ("Ca", "#008000"),
    ("Fe", "#E06000"),
    ("Cu", "#C08030"),
    ("Zn", "#6070A0"),
    ("Br", "#A52A2A"),
    ("I", "#940094"),
    ("B", "#E08060"),
    ("Li", "#8000C0"),
];

const ON_BLACK: &[(&str, &str)] = &[
    ("H", "#C0C0C0"),
    ("C", "#FFFFFF"),
    ("N", "#6090FF"),
    ("O", "#FF4040"),
    ("F", "#60FF60"),
    ("Na", "#C060FF"),
    ("Mg", "#60FF60"),
    ("Si", "#F0C880"),
    ("P", "#FFA040"),
    ("S", "#FFE040"),
    ("Cl", "#40FF40"),
    ("K", "#C060FF"),
    ("Ca", "#60FF60"),
    ("Fe", "#FF9040"),
    ("Cu", "#FFB060"),
    ("Zn", "#A0B0E0"),
    ("Br", "#E06060"),
    ("I", "#E040E0"),
    ("B", "#FFB090"),
    ("Li", "#C060FF"),
];

fn element_colors(base: &str, table: &[(&str, &str)]) -> Vec<String> {
    let mut colors = uniform_colors(base);
    for (symbol, color) in table {
        if let Some(num) = atomic_number(symbol) {
            colors[num] = color.to_string();
        }
    }
    colors
}
