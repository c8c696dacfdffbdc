mod declaration;
mod feature;
mod file_edit;
mod scaffold;

pub use declaration::{DeclarationBlock, DeclarationKind};
pub use feature::FeatureRequest;
pub use file_edit::{is_contained, normalize_path, FileEdit, FilePlan};
pub use scaffold::{ScaffoldKind, ScaffoldRequirement};
