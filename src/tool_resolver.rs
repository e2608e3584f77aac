//! # Tool Path Resolver
//!
//! This module finds the ImageMagick binary used for probing and resizing:
//! - An explicit path from the configuration
//! - The `MAGICK_PATH` environment variable
//! - `magick` on the system `PATH`

use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the ImageMagick 7 entry point
pub const MAGICK: &str = "magick";

/// Environment variable overriding the binary location
pub const MAGICK_PATH_ENV: &str = "MAGICK_PATH";

/// Tool path resolver for ImageMagick
pub struct ToolPathResolver {
    /// Explicit binary path, takes precedence over everything else
    explicit: Option<PathBuf>,
}

impl ToolPathResolver {
    /// Create a new path resolver
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self { explicit }
    }

    /// Resolve the program to spawn.
    ///
    /// Falls back to the bare tool name when nothing is found, so the spawn
    /// error surfaces from the pre-flight check with install guidance.
    pub fn resolve(&self) -> PathBuf {
        if let Some(ref path) = self.explicit {
            debug!("Using configured ImageMagick: {:?}", path);
            return path.clone();
        }

        if let Some(path) = env::var_os(MAGICK_PATH_ENV).map(PathBuf::from) {
            if path.exists() {
                debug!("Using ImageMagick from {}: {:?}", MAGICK_PATH_ENV, path);
                return path;
            }
            warn!("{} points to a missing file: {:?}", MAGICK_PATH_ENV, path);
        }

        if let Some(path) = find_in_system_path(MAGICK) {
            debug!("Using system ImageMagick: {:?}", path);
            return path;
        }

        warn!("Tool not found in PATH: {}", MAGICK);
        PathBuf::from(MAGICK)
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Find tool in system PATH
pub fn find_in_system_path(tool_name: &str) -> Option<PathBuf> {
    let extension = if cfg!(windows) { ".exe" } else { "" };
    let tool_with_ext = format!("{}{}", tool_name, extension);

    env::split_paths(&env::var_os("PATH")?)
        .map(|dir| dir.join(&tool_with_ext))
        .find(|path| path.is_file())
}

/// Installation guidance shown when the pre-flight check fails
pub fn install_instructions(program: &Path) -> String {
    format!(
        "ImageMagick not found (tried {}). Please install it:\n\
         \x20 macOS: brew install imagemagick\n\
         \x20 Ubuntu/Debian: sudo apt-get install imagemagick\n\
         \x20 Fedora: sudo dnf install ImageMagick\n\
         \x20 Windows: Download from https://imagemagick.org\n\
         Or point --magick / {} at the binary.",
        program.display(),
        MAGICK_PATH_ENV
    )
}
