// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The export command: load, check preconditions, traverse, write.

use crate::error::ShellError;
use anyhow::Context;
use clap::{Parser, ValueEnum};
use scenebake_core::{DriveOutcome, SceneDump, ViewKind};
use scenebake_export::{run_export, ExportConfig, GltfWriter, LengthUnit};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Binary container
    Glb,
    /// JSON text with a sibling .bin buffer
    Gltf,
    Both,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "scenebake")]
#[command(about = "Export a recorded host scene to glTF", long_about = None)]
pub struct ExportArgs {
    /// Recorded scene (JSON)
    pub input: PathBuf,

    /// Output path; the extension is replaced per format. Defaults to the input path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Glb)]
    pub format: OutputFormat,

    /// Convert host feet to meters
    #[arg(long, conflicts_with = "unit_scale")]
    pub meters: bool,

    /// Factor applied to every output coordinate
    #[arg(long)]
    pub unit_scale: Option<f64>,

    /// Embed the binary buffer into .gltf output as a data URI
    #[arg(long)]
    pub embed: bool,
}

impl ExportArgs {
    /// Environment configuration with command-line overrides applied
    fn config(&self) -> Result<ExportConfig, ShellError> {
        let mut config = ExportConfig::from_env();
        if self.meters {
            config = config.with_length_unit(LengthUnit::Meters);
        }
        if let Some(scale) = self.unit_scale {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(ShellError::InvalidUnitScale(scale));
            }
            config = config.with_unit_scale(scale);
        }
        config.embed_buffers |= self.embed;
        Ok(config)
    }

    fn output_base(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| self.input.clone())
    }
}

/// Reject exports that cannot produce a meaningful scene
pub fn check_preconditions(dump: &SceneDump) -> Result<(), ShellError> {
    if !dump.documents.iter().any(|d| d.title == dump.root_document) {
        return Err(ShellError::NoActiveDocument(dump.root_document.clone()));
    }
    let view = dump.active_view.as_ref().ok_or(ShellError::NoActiveView)?;
    if view.kind != ViewKind::ThreeD {
        return Err(ShellError::NotThreeDView(view.kind));
    }
    Ok(())
}

pub fn load_dump(path: &Path) -> anyhow::Result<SceneDump> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    SceneDump::from_json(&json).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Run one export and return the files written
pub fn run(args: &ExportArgs) -> anyhow::Result<Vec<PathBuf>> {
    let config = args.config()?;
    let dump = load_dump(&args.input)?;
    check_preconditions(&dump)?;

    tracing::info!(
        input = %args.input.display(),
        unit_scale = config.unit_scale,
        "Exporting scene"
    );

    let run = run_export(&dump, config.clone()).context("Traversal failed")?;
    if run.outcome == DriveOutcome::Canceled {
        tracing::warn!("Export canceled; writing the elements completed so far");
    }

    let writer = GltfWriter::from_scene(&run.scene, &config.generator)?;
    let base = args.output_base();
    let mut written = Vec::new();

    if matches!(args.format, OutputFormat::Glb | OutputFormat::Both) {
        let path = base.with_extension("glb");
        writer
            .save_glb(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    if matches!(args.format, OutputFormat::Gltf | OutputFormat::Both) {
        let path = base.with_extension("gltf");
        writer
            .save_gltf(&path, config.embed_buffers)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }

    tracing::info!(
        nodes = run.summary.nodes,
        triangles = run.summary.triangles,
        files = written.len(),
        "Export complete"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"{
        "root_document": "Project",
        "documents": [{
            "title": "Project",
            "elements": [{ "id": 1, "category": { "name": "Walls" } }]
        }],
        "active_view": {
            "id": 100,
            "name": "{3D}",
            "kind": "three_d",
            "nodes": [
                { "type": "element", "id": 1, "children": [
                    { "type": "polymesh", "points": [[0,0,0],[1,0,0],[0,1,0]], "facets": [[0,1,2]] }
                ]}
            ]
        }
    }"#;

    fn args(input: PathBuf, format: OutputFormat) -> ExportArgs {
        ExportArgs {
            input,
            output: None,
            format,
            meters: false,
            unit_scale: None,
            embed: false,
        }
    }

    #[test]
    fn parses_flags() {
        let args = ExportArgs::parse_from([
            "scenebake",
            "model.json",
            "-o",
            "out/model",
            "--format",
            "both",
            "--meters",
        ]);
        assert_eq!(args.format, OutputFormat::Both);
        assert!(args.meters);
        assert_eq!(args.output_base(), PathBuf::from("out/model"));
    }

    #[test]
    fn meters_conflicts_with_explicit_scale() {
        let parsed = ExportArgs::try_parse_from([
            "scenebake",
            "model.json",
            "--meters",
            "--unit-scale",
            "2",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn rejects_non_3d_view() {
        let mut dump = SceneDump::from_json(SCENE).unwrap();
        if let Some(view) = dump.active_view.as_mut() {
            view.kind = ViewKind::FloorPlan;
        }
        assert!(matches!(
            check_preconditions(&dump),
            Err(ShellError::NotThreeDView(ViewKind::FloorPlan))
        ));

        dump.active_view = None;
        assert!(matches!(
            check_preconditions(&dump),
            Err(ShellError::NoActiveView)
        ));
    }

    #[test]
    fn rejects_missing_root_document() {
        let mut dump = SceneDump::from_json(SCENE).unwrap();
        dump.root_document = "Elsewhere".into();
        assert!(matches!(
            check_preconditions(&dump),
            Err(ShellError::NoActiveDocument(_))
        ));
    }

    #[test]
    fn writes_both_formats_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.json");
        std::fs::write(&input, SCENE).unwrap();

        let written = run(&args(input, OutputFormat::Both)).unwrap();
        assert_eq!(
            written,
            vec![dir.path().join("model.glb"), dir.path().join("model.gltf")]
        );
        assert!(dir.path().join("model.bin").exists());
    }

    #[test]
    fn precondition_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("plan.json");
        std::fs::write(&input, SCENE.replace("three_d", "floor_plan")).unwrap();

        let err = run(&args(input, OutputFormat::Glb)).unwrap_err();
        assert!(err.downcast_ref::<ShellError>().is_some());
        assert!(!dir.path().join("plan.glb").exists());
    }
}
