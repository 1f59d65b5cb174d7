pub mod directive;
pub mod tool;
pub mod workspace;
mod constants;

// Re-export public items
pub use constants::{DEFAULT_STRIP, NAME_DIRECTIVE, PATCH_PROGRAM, WORKSPACE_PREFIX};
pub use directive::scan_name_directive;
pub use tool::{apply_patch, PatchTool};
pub use workspace::TempWorkspace;
