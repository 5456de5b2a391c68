// src/bin/make_domain.rs

//! Builds the elliptical domain with holes, writes `domain.geo` and meshes it.
//!
//! Usage: `make_domain [config.json]`

use geomesh::config::{DomainConfig, ScriptConfig};
use geomesh::scenes::domain;
use geomesh::{Pipeline, PipelineError};
use std::path::Path;
use std::process::ExitCode;

fn run() -> Result<(), PipelineError> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => ScriptConfig::<DomainConfig>::load(Path::new(&path))?,
        None => ScriptConfig::default(),
    };

    let geometry = domain::build(&config.geometry)?;
    let mut pipeline = Pipeline::with_gmsh(config.mesher);
    let report = pipeline.run(&geometry, &config.geometry.output)?;
    let provenance = report.write_provenance()?;

    log::info!(
        "Domain done: mesh {} (success: {}), provenance {}",
        report.mesh.mesh_path.display(),
        report.mesh.success,
        provenance.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
