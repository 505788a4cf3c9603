#[cfg(feature = "stl-io")]
mod stl;

#[cfg(feature = "msh-io")]
mod msh;

#[cfg(feature = "stl-io")]
pub use stl::{to_stl_ascii, to_stl_binary};

#[cfg(feature = "msh-io")]
pub use msh::to_msh;

use crate::mesh::Mesh;
use log::info;
use std::path::Path;

/// Generic I/O and format‑conversion errors.
///
/// The exporters are behind cargo feature‑flags. When a feature is disabled
/// the matching file extension reports `UnsupportedFormat`.
#[derive(Debug)]
pub enum IoError {
    StdIo(std::io::Error),

    MalformedPath(String),
    UnsupportedFormat(String),
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use IoError::*;

        match self {
            StdIo(error) => write!(f, "std::io::Error: {error}"),

            MalformedPath(msg) => write!(f, "The path is malformed: {msg}"),
            UnsupportedFormat(ext) => write!(f, "No exporter for {ext:?} files"),
        }
    }
}

impl std::error::Error for IoError {}

impl From<std::io::Error> for IoError {
    fn from(value: std::io::Error) -> Self {
        Self::StdIo(value)
    }
}

impl Mesh {
    /// Write the mesh, choosing the format from the extension of `path`:
    /// `.msh` (Gmsh 2.2 ASCII) or `.stl` (binary STL of the surface elements).
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| IoError::MalformedPath(format!("{} has no extension", path.display())))?;
        let bytes: Vec<u8> = match ext.as_str() {
            #[cfg(feature = "msh-io")]
            "msh" => self.to_msh().into_bytes(),
            #[cfg(feature = "stl-io")]
            "stl" => {
                let name = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("mesh");
                self.to_stl_binary(name)?
            },
            _ => return Err(IoError::UnsupportedFormat(ext)),
        };
        std::fs::write(path, bytes)?;
        info!("wrote {}", path.display());
        Ok(())
    }
}
