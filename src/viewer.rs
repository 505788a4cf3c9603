//! Interactive viewing through an external program.

use crate::io::IoError;
use crate::mesh::Mesh;
use log::{info, warn};
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

pub const DEFAULT_PROGRAM: &str = "gmsh";

/// Environment variable naming the viewer program.
pub const VIEWER_ENV: &str = "GEOMESH_VIEWER";

/// `-nopopup` (gmsh spelling) or `--nopopup`.
pub fn is_nopopup_flag(arg: &str) -> bool {
    matches!(arg, "-nopopup" | "--nopopup")
}

/// `false` when the command line asks for no popup.
pub fn popup_requested<I, S>(args: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    !args.into_iter().any(|a| is_nopopup_flag(a.as_ref()))
}

/// External program launched on an exported mesh file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for Viewer {
    fn default() -> Self {
        Viewer::from_env()
    }
}

impl Viewer {
    pub fn new(program: impl Into<String>) -> Self {
        Viewer {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// `$GEOMESH_VIEWER` when set and not blank, `gmsh` otherwise.
    pub fn from_env() -> Self {
        let program = std::env::var(VIEWER_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROGRAM.to_string());
        Viewer::new(program)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn export_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("geomesh-{}-{name}.msh", std::process::id()))
    }

    /// Export `mesh` to a temporary MSH file and block until the viewer exits.
    ///
    /// Returns `None` when the program cannot be found; the file is left in
    /// place so it can be opened by hand.
    pub fn show(&self, mesh: &Mesh, name: &str) -> Result<Option<ExitStatus>, IoError> {
        let path = Self::export_path(name);
        std::fs::write(&path, mesh.to_msh())?;
        info!("launching {} on {}", self.program, path.display());
        match Command::new(&self.program).args(&self.args).arg(&path).status() {
            Ok(status) => {
                if !status.success() {
                    warn!("viewer {} exited with {status}", self.program);
                }
                Ok(Some(status))
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "viewer {:?} not found, mesh written to {}",
                    self.program,
                    path.display()
                );
                Ok(None)
            },
            Err(e) => Err(e.into()),
        }
    }
}
