pub mod config;
pub mod geometry;
pub mod meshing;
pub mod provenance;
pub mod scenes;
pub mod serialize;

pub use config::{ControlVolumeConfig, DomainConfig, FailurePolicy, MesherConfig, ScriptConfig};
pub use geometry::{Geometry, GeometryError};
pub use meshing::{GmshCli, MeshGenerator, MeshOutcome};

use provenance::ProvenanceChain;
use std::path::{Path, PathBuf};
use thiserror::Error;

// --- Errors ---

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Geometry construction failed: {0}")]
    Geometry(#[from] GeometryError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Mesh tool `{executable}` could not be started: {source}")]
    ToolNotFound {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Mesh tool failed: {status}\nStdout: {stdout}\nStderr: {stderr}")]
    MeshingFailed {
        status: String,
        stdout: String,
        stderr: String,
    },

    #[error("Mesh tool exited successfully but did not produce {}", .path.display())]
    MissingMeshOutput { path: PathBuf },

    #[error("Provenance failed: {0}")]
    Provenance(String),
}

// --- Pipeline ---

/// Where a pipeline run currently stands. Runs only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Building,
    Serialized,
    Invoked,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct PipelineReport {
    pub geo_path: PathBuf,
    pub geo_code: String,
    pub mesh: MeshOutcome,
    pub provenance_chain: ProvenanceChain,
}

impl PipelineReport {
    /// Path of the provenance sidecar: `<stem>.provenance.json` next to the
    /// geometry file.
    pub fn provenance_path(&self) -> PathBuf {
        self.geo_path.with_extension("provenance.json")
    }

    /// Writes the provenance chain as JSON next to the geometry file.
    pub fn write_provenance(&self) -> Result<PathBuf, PipelineError> {
        let path = self.provenance_path();
        let json = self.provenance_chain.to_json()?;
        std::fs::write(&path, json).map_err(|source| PipelineError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Runs build output through serialization and meshing, in that order.
pub struct Pipeline {
    mesher: Box<dyn MeshGenerator>,
    provenance_chain: ProvenanceChain,
    stage: Stage,
}

impl Pipeline {
    pub fn new(mesher: Box<dyn MeshGenerator>) -> Self {
        Pipeline {
            mesher,
            provenance_chain: ProvenanceChain::new(),
            stage: Stage::Building,
        }
    }

    /// A pipeline that meshes with the gmsh command-line tool.
    pub fn with_gmsh(config: MesherConfig) -> Self {
        Self::new(Box::new(GmshCli::new(config)))
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Writes `geometry` to `geo_path`, then meshes it.
    ///
    /// The geometry file is fully written and closed before the mesher starts.
    /// Whether a mesher failure is an error depends on the mesher's failure
    /// policy; a failed write always is.
    pub fn run(&mut self, geometry: &Geometry, geo_path: &Path) -> Result<PipelineReport, PipelineError> {
        self.stage = Stage::Building;
        self.provenance_chain = ProvenanceChain::new();
        let counts = serde_json::json!({
            "points": geometry.point_count(),
            "curves": geometry.curve_count(),
            "loops": geometry.loop_count(),
            "surfaces": geometry.surface_count(),
            "physical_groups": geometry.physical_count(),
        });
        self.provenance_chain
            .add_record("geometry_built", counts.to_string().as_bytes(), counts.clone())?;

        let geo_code = serialize::write_geo(geometry, geo_path)?;
        self.advance(Stage::Serialized);
        self.provenance_chain.add_record(
            "geometry_serialized",
            geo_code.as_bytes(),
            serde_json::json!({ "path": geo_path.display().to_string(), "bytes": geo_code.len() }),
        )?;

        let mesh = self.mesher.generate(geo_path)?;
        self.advance(Stage::Invoked);
        let mesh_json = serde_json::to_string(&mesh).map_err(|e| PipelineError::Provenance(e.to_string()))?;
        self.provenance_chain.add_record(
            "mesh_invoked",
            mesh_json.as_bytes(),
            serde_json::json!({
                "mesher": self.mesher.name(),
                "success": mesh.success,
                "mesh_path": mesh.mesh_path.display().to_string(),
            }),
        )?;

        Ok(PipelineReport {
            geo_path: geo_path.to_path_buf(),
            geo_code,
            mesh,
            provenance_chain: self.provenance_chain.take(),
        })
    }

    fn advance(&mut self, stage: Stage) {
        log::debug!("Pipeline stage {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }
}
