// Project-level discovery: tree access, settings, applications, version

mod apps;
mod settings;
mod tree;
mod version;

pub use apps::{locate_applications, normalize_app_label};
pub use settings::{parse_settings, read_settings};
pub use tree::{FsTree, ProjectTree};
pub use version::{detect_framework_version, UNKNOWN_VERSION};
