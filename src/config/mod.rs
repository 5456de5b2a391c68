// src/config/mod.rs

//! Named configuration values for the geometry scripts and the mesher.
//!
//! Every struct has a `Default` reproducing the stock geometry, so a script
//! run without a config file emits the same `.geo` text every time. A JSON
//! file may override any subset of the fields.

use crate::PipelineError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration of the square control volume (`cv.geo`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlVolumeConfig {
    /// Target mesh size attached to every point. Smaller values give a finer
    /// triangulation near that point.
    pub mesh_size: f64,
    /// Corners of the outer boundary, in loop order.
    pub square: Vec<[f64; 3]>,
    /// Center of the inner circle.
    pub arc_center: [f64; 3],
    /// Points on the inner circle, in order. Consecutive points (wrapping
    /// around) are joined by circle arcs, so at least 3 are needed and all
    /// must lie at the same distance from `arc_center`.
    pub arc_rim: Vec<[f64; 3]>,
    /// Registers the inner circle's arcs as their own physical group.
    pub tag_arcs: bool,
    pub boundary_label: Option<String>,
    pub arc_label: Option<String>,
    pub surface_label: Option<String>,
    /// Where the `.geo` script is written. The mesh lands next to it.
    pub output: PathBuf,
}

impl Default for ControlVolumeConfig {
    fn default() -> Self {
        ControlVolumeConfig {
            mesh_size: 0.01,
            square: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            arc_center: [0.5, 0.5, 0.0],
            arc_rim: vec![[0.75, 0.5, 0.0], [0.5, 0.75, 0.0], [0.25, 0.5, 0.0], [0.5, 0.25, 0.0]],
            tag_arcs: false,
            boundary_label: None,
            arc_label: None,
            surface_label: None,
            output: PathBuf::from("cv.geo"),
        }
    }
}

/// An axis-aligned ellipse sampled as a closed polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EllipseConfig {
    pub center: [f64; 2],
    /// Semi-axis along x.
    pub semi_x: f64,
    /// Semi-axis along y.
    pub semi_y: f64,
    /// Number of points (and lines) on the polygon.
    pub segments: usize,
    /// Physical group name. An outer boundary split into several groups
    /// names them `<label>_1`, `<label>_2`, and so on.
    #[serde(default)]
    pub label: Option<String>,
}

/// Configuration of the annular domain with elliptical holes (`domain.geo`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DomainConfig {
    pub mesh_size: f64,
    pub outer: EllipseConfig,
    /// The outer boundary is split into this many consecutive physical
    /// groups of (nearly) equal length.
    pub outer_groups: usize,
    pub holes: Vec<EllipseConfig>,
    pub surface_label: Option<String>,
    pub output: PathBuf,
}

impl Default for DomainConfig {
    fn default() -> Self {
        DomainConfig {
            mesh_size: 0.25,
            outer: EllipseConfig {
                center: [0.0, 0.0],
                semi_x: 1.5,
                semi_y: 1.0,
                segments: 256,
                label: None,
            },
            outer_groups: 4,
            holes: vec![
                EllipseConfig {
                    center: [-0.5, 0.25],
                    semi_x: 0.25,
                    semi_y: 0.25,
                    segments: 72,
                    label: None,
                },
                EllipseConfig {
                    center: [0.5, -0.25],
                    semi_x: 0.375,
                    semi_y: 0.375,
                    segments: 96,
                    label: None,
                },
            ],
            surface_label: None,
            output: PathBuf::from("domain.geo"),
        }
    }
}

/// What to do when the mesh tool cannot be started or reports failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Surface the failure as an error.
    #[default]
    Checked,
    /// Log the failure, record it in the outcome and carry on.
    Ignore,
}

/// How the external mesher is invoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MesherConfig {
    /// Executable name or path, looked up on `PATH` when bare.
    pub executable: PathBuf,
    /// Mesh dimension flag (`-2` for planar triangulation).
    pub dimension: u8,
    /// Value passed to `-format`; `msh2` selects legacy format version 2.
    pub format: String,
    /// Extra arguments placed before the geometry file.
    pub extra_args: Vec<String>,
    pub failure_policy: FailurePolicy,
}

impl Default for MesherConfig {
    fn default() -> Self {
        MesherConfig {
            executable: PathBuf::from("gmsh"),
            dimension: 2,
            format: "msh2".to_string(),
            extra_args: Vec::new(),
            failure_policy: FailurePolicy::Checked,
        }
    }
}

/// A script's full configuration: its geometry plus the mesher settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[serde(bound(deserialize = "G: DeserializeOwned + Default"))]
pub struct ScriptConfig<G> {
    pub geometry: G,
    pub mesher: MesherConfig,
}

impl<G: DeserializeOwned + Default> ScriptConfig<G> {
    /// Parses a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json_str: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(json_str).map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Loads a configuration file.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_yields_defaults() {
        let config = ScriptConfig::<DomainConfig>::from_json("{}").unwrap();
        assert_eq!(config, ScriptConfig::default());
        assert_eq!(config.geometry.outer.segments, 256);
        assert_eq!(config.geometry.holes.len(), 2);
        assert_eq!(config.mesher.format, "msh2");
        assert_eq!(config.mesher.failure_policy, FailurePolicy::Checked);
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "geometry": { "mesh_size": 0.05, "tag_arcs": true, "output": "out/cv.geo" },
            "mesher": { "executable": "/opt/gmsh/bin/gmsh", "failure_policy": "ignore" }
        }"#;
        let config = ScriptConfig::<ControlVolumeConfig>::from_json(json).unwrap();

        assert_eq!(config.geometry.mesh_size, 0.05);
        assert!(config.geometry.tag_arcs);
        assert_eq!(config.geometry.output, PathBuf::from("out/cv.geo"));
        assert_eq!(config.geometry.arc_rim.len(), 4);
        assert_eq!(config.mesher.executable, PathBuf::from("/opt/gmsh/bin/gmsh"));
        assert_eq!(config.mesher.dimension, 2);
        assert_eq!(config.mesher.failure_policy, FailurePolicy::Ignore);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result = ScriptConfig::<ControlVolumeConfig>::from_json(r#"{"geometry": {"mesh_sise": 0.1}}"#);
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domain.json");
        std::fs::write(&path, r#"{"geometry": {"outer_groups": 8}}"#).unwrap();

        let config = ScriptConfig::<DomainConfig>::load(&path).unwrap();
        assert_eq!(config.geometry.outer_groups, 8);

        let missing = ScriptConfig::<DomainConfig>::load(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(PipelineError::Io { .. })));
    }
}
