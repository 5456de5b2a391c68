// src/meshing/mod.rs

//! Mesh generation by handing a `.geo` script to an external mesher.

use crate::config::{FailurePolicy, MesherConfig};
use crate::PipelineError;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// What happened when the mesher ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshOutcome {
    pub tool: String,
    /// Exit code, or `None` if the process could not be started or was killed.
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub mesh_path: PathBuf,
    pub mesh_exists: bool,
    /// Why the run is considered failed, if it is.
    pub failure: Option<String>,
}

/// Anything that turns a geometry file into a mesh file.
pub trait MeshGenerator {
    /// Returns the name of the backend, for logs and provenance.
    fn name(&self) -> &str;

    /// Path of the mesh file produced for `geo_path`.
    fn mesh_path_for(&self, geo_path: &Path) -> PathBuf {
        geo_path.with_extension("msh")
    }

    /// Meshes the geometry file, blocking until the mesh is written.
    fn generate(&self, geo_path: &Path) -> Result<MeshOutcome, PipelineError>;
}

/// Runs the `gmsh` command-line tool.
pub struct GmshCli {
    config: MesherConfig,
}

impl GmshCli {
    pub fn new(config: MesherConfig) -> Self {
        GmshCli { config }
    }

    /// Builds `<gmsh> -<dim> -format <format> [extra args] <geo_path>`.
    pub fn command(&self, geo_path: &Path) -> Command {
        let mut command = Command::new(&self.config.executable);
        command
            .arg(format!("-{}", self.config.dimension))
            .arg("-format")
            .arg(&self.config.format)
            .args(&self.config.extra_args)
            .arg(geo_path);
        command
    }

    fn executable(&self) -> String {
        self.config.executable.display().to_string()
    }

    /// Applies the failure policy to a failed run.
    fn fail(&self, outcome: MeshOutcome, error: PipelineError) -> Result<MeshOutcome, PipelineError> {
        match self.config.failure_policy {
            FailurePolicy::Checked => Err(error),
            FailurePolicy::Ignore => {
                log::warn!("Ignoring mesher failure: {}", error);
                Ok(MeshOutcome {
                    failure: Some(error.to_string()),
                    ..outcome
                })
            }
        }
    }
}

impl MeshGenerator for GmshCli {
    fn name(&self) -> &str {
        "gmsh"
    }

    fn generate(&self, geo_path: &Path) -> Result<MeshOutcome, PipelineError> {
        let mesh_path = self.mesh_path_for(geo_path);

        // A mesh left over from an earlier run must not pass for this run's output.
        match fs::remove_file(&mesh_path) {
            Ok(()) => log::debug!("Removed stale mesh {}", mesh_path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(PipelineError::Io { path: mesh_path, source }),
        }

        let mut command = self.command(geo_path);
        log::info!("Running mesh command: {:?}", command);

        let mut outcome = MeshOutcome {
            tool: self.executable(),
            exit_code: None,
            success: false,
            stdout: String::new(),
            stderr: String::new(),
            mesh_path: mesh_path.clone(),
            mesh_exists: false,
            failure: None,
        };

        let output = match command.output() {
            Ok(output) => output,
            Err(source) => {
                let error = PipelineError::ToolNotFound {
                    executable: self.executable(),
                    source,
                };
                return self.fail(outcome, error);
            }
        };

        outcome.exit_code = output.status.code();
        outcome.stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        outcome.stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        outcome.mesh_exists = mesh_path.is_file();

        if !output.status.success() {
            let error = PipelineError::MeshingFailed {
                status: output.status.to_string(),
                stdout: outcome.stdout.clone(),
                stderr: outcome.stderr.clone(),
            };
            return self.fail(outcome, error);
        }
        if !outcome.mesh_exists {
            return self.fail(outcome, PipelineError::MissingMeshOutput { path: mesh_path });
        }

        outcome.success = true;
        log::info!("Mesh written to {}", mesh_path.display());
        Ok(outcome)
    }
}
