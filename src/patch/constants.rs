/// Name of the external patch executable
pub const PATCH_PROGRAM: &str = "patch";
/// Leading path components stripped from file names in a patch (`-p1`)
pub const DEFAULT_STRIP: u32 = 1;
/// Added-line marker for a chart name change in a patch file
pub const NAME_DIRECTIVE: &str = "+name: ";
/// Prefix for temporary patch workspaces
pub const WORKSPACE_PREFIX: &str = "chartmeta-";
