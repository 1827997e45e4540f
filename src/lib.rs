pub mod config;
pub mod draw;
pub mod geom;
pub mod layout;
pub mod layout_dump;
pub mod molecule;
pub mod primitives;
pub mod render;
pub mod text_metrics;
pub mod theme;

pub use config::{Config, RenderConfig, load_config};
pub use draw::{Drawing, draw_molecule, draw_molecule_with_config};
pub use layout::{Arrangement, arrange};
pub use molecule::{Atom, AtomIndex, Bond, BondIndex, BondType, Molecule, MoleculeError};
pub use primitives::{PathControl, Primitive};
pub use render::{render_svg, write_output_svg};
#[cfg(feature = "png")]
pub use render::write_output_png;
pub use text_metrics::{ApproxMetrics, SystemFontMetrics, TextMeasure};
pub use theme::RenderPolicy;
