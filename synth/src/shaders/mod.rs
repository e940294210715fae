//! Shader sources
//!
//! The lit and semantic programs share one vertex stage and uniform
//! interface, kept in `model_common.wgsl` and prepended at load time.

use std::borrow::Cow;
use std::io;
use std::path::Path;
use tracing::info;

/// Background quad shader
pub const BACKGROUND_SHADER: &str = include_str!("background.wgsl");
/// Uniforms and vertex stage shared by the model shaders
pub const MODEL_COMMON_SHADER: &str = include_str!("model_common.wgsl");
/// Fragment stage of the shaded model pass
pub const LIT_SHADER: &str = include_str!("lit.wgsl");
/// Fragment stage of the segmentation pass
pub const SEMANTIC_SHADER: &str = include_str!("semantic.wgsl");

/// Complete WGSL modules for every pipeline
#[derive(Debug, Clone)]
pub struct ShaderSet {
    pub background: Cow<'static, str>,
    pub lit: Cow<'static, str>,
    pub semantic: Cow<'static, str>,
}

impl ShaderSet {
    /// Shaders compiled into the crate
    pub fn embedded() -> Self {
        Self {
            background: Cow::Borrowed(BACKGROUND_SHADER),
            lit: Cow::Owned(format!("{MODEL_COMMON_SHADER}\n{LIT_SHADER}")),
            semantic: Cow::Owned(format!("{MODEL_COMMON_SHADER}\n{SEMANTIC_SHADER}")),
        }
    }

    /// Read shaders from `dir`, using the embedded source for any missing file
    pub fn from_dir(dir: &Path) -> io::Result<Self> {
        let background = read_or(dir, "background.wgsl", BACKGROUND_SHADER)?;
        let common = read_or(dir, "model_common.wgsl", MODEL_COMMON_SHADER)?;
        let lit = read_or(dir, "lit.wgsl", LIT_SHADER)?;
        let semantic = read_or(dir, "semantic.wgsl", SEMANTIC_SHADER)?;

        Ok(Self {
            background,
            lit: Cow::Owned(format!("{common}\n{lit}")),
            semantic: Cow::Owned(format!("{common}\n{semantic}")),
        })
    }

    /// Embedded shaders, or the ones in `dir` when given
    pub fn load(dir: Option<&Path>) -> io::Result<Self> {
        match dir {
            Some(dir) => Self::from_dir(dir),
            None => Ok(Self::embedded()),
        }
    }
}

fn read_or(dir: &Path, file: &str, fallback: &'static str) -> io::Result<Cow<'static, str>> {
    let path = dir.join(file);
    if path.is_file() {
        info!(path = ?path, "Using shader override");
        Ok(Cow::Owned(std::fs::read_to_string(path)?))
    } else {
        Ok(Cow::Borrowed(fallback))
    }
}
