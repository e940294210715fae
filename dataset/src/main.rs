//! Dataset generator front end
//!
//! Usage:
//!   dataset render <job.json>    render every scene of the job
//!   dataset extents <job.json>   print model extents as JSON

mod job;
mod output;

use anyhow::Context as _;
use job::JobConfig;
use std::{env, path::Path, process};
use synth::assets::ModelStore;
use synth::SynthRenderer;
use tracing::info;

const USAGE: &str = "usage: dataset <render|extents> <job.json>";

fn main() -> anyhow::Result<()> {
    synth::init_logging();

    let args: Vec<String> = env::args().collect();
    match (args.get(1).map(String::as_str), args.get(2)) {
        (Some("render"), Some(job)) => render(Path::new(job)),
        (Some("extents"), Some(job)) => extents(Path::new(job)),
        _ => {
            eprintln!("{USAGE}");
            process::exit(2);
        }
    }
}

fn render(job_path: &Path) -> anyhow::Result<()> {
    let job = JobConfig::load_from_file(job_path)?;
    let mut renderer =
        SynthRenderer::new(job.renderer.clone()).context("failed to create renderer")?;
    info!(adapter = %renderer.adapter_info().name, "Renderer ready");

    for directory in &job.backgrounds {
        renderer
            .add_background_images_directory(directory)
            .with_context(|| format!("failed to load backgrounds from {}", directory.display()))?;
    }
    renderer.load_models(&job.model_list())?;

    std::fs::create_dir_all(&job.output_dir)
        .with_context(|| format!("failed to create {}", job.output_dir.display()))?;

    for (index, scene) in job.scenes.iter().enumerate() {
        let result = renderer
            .render_image(&scene.to_request())
            .with_context(|| format!("failed to render scene {index}"))?;
        let written = output::write_scene(&job.output_dir, index, &result)?;
        info!(scene = index, files = written.len(), "Scene written");
    }

    info!(
        scenes = job.scenes.len(),
        output = ?job.output_dir,
        "Dataset complete"
    );
    Ok(())
}

/// Extents only need the hulls, so no GPU context is created
fn extents(job_path: &Path) -> anyhow::Result<()> {
    let job = JobConfig::load_from_file(job_path)?;
    let mut store = ModelStore::new();
    for (name, path) in job.model_list() {
        store
            .load(name, path)
            .with_context(|| format!("failed to load model '{name}'"))?;
    }

    println!("{}", serde_json::to_string_pretty(&store.extent_all())?);
    Ok(())
}
