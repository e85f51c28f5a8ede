mod render;
mod source;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use fresh_proto::report::ImageOrigin;
use fresh_vision::{doctor, open_backend, BackendConfig, Pipeline, PipelineConfig, SharedPipeline};

use render::RenderConfig;

#[derive(Debug, Parser)]
#[command(name = "freshscan", version, about = "freshscan - detect produce in a photo and grade its freshness")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Detect and classify everything in one photo.
    Detect {
        /// Photo to analyse.
        image: Option<String>,
        /// The photo came straight from a camera: apply its EXIF orientation.
        #[arg(long)]
        camera: bool,
        /// Write an annotated PNG here.
        #[arg(long)]
        out: Option<String>,
        /// Print the JSON report instead of the text summary.
        #[arg(long)]
        json: bool,
    },
    Doctor,
    /// Print model tensor layout (tflite backends only).
    Inspect,
}

#[derive(Debug, serde::Deserialize)]
struct Config {
    #[serde(default)]
    pipeline: PipelineConfig,
    detector: BackendConfig,
    classifier: Option<BackendConfig>,
    #[serde(default)]
    render: RenderConfig,
}

impl Config {
    /// Parses TOML and fills unset model input sizes per section.
    fn parse(s: &str) -> Result<Self> {
        let mut cfg: Config = toml::from_str(s).context("parse config toml")?;
        cfg.detector = cfg.detector.with_default_input(BackendConfig::DETECTOR_INPUT);
        cfg.classifier = cfg.classifier.map(|c| c.with_default_input(BackendConfig::CLASSIFIER_INPUT));
        Ok(cfg)
    }
}

fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).context("read config")?;
    Config::parse(&s)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Detect { image, camera, out, json } => {
            let origin = if camera { ImageOrigin::Camera } else { ImageOrigin::Gallery };
            detect(&cfg, image.as_deref(), origin, out.as_deref(), json).await?
        }
        Command::Doctor => doctor_cmd(&cfg)?,
        Command::Inspect => inspect(&cfg)?,
    }
    Ok(())
}

fn build_pipeline(cfg: &Config) -> Result<Pipeline> {
    let detector = open_backend(&cfg.detector).context("open detector")?;
    let classifier = match &cfg.classifier {
        Some(c) => Some(open_backend(c).context("open classifier")?),
        None => None,
    };
    Ok(Pipeline::new(cfg.pipeline.clone(), detector, classifier))
}

async fn detect(cfg: &Config, image: Option<&str>, origin: ImageOrigin, out: Option<&str>, json: bool) -> Result<()> {
    let Some(path) = image else {
        warn!("detect: no image given");
        println!("Please load an image first.");
        return Ok(());
    };

    let loaded = source::load(Path::new(path), origin)?;
    let shared = SharedPipeline::new(build_pipeline(cfg)?);
    let outcome = shared
        .run(loaded.image.clone(), cfg.pipeline.timeout())
        .await
        .context("pipeline run")?;
    shared.close().await;

    let report = render::report(&loaded, &outcome);
    info!("detect: {} box(es) in {}", report.boxes.len(), path);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary);
    }

    if let Some(out) = out {
        render::annotate(&loaded.image, &outcome, &cfg.render)
            .save(out)
            .with_context(|| format!("write annotated image {}", out))?;
        info!("detect: wrote {}", out);
    }
    Ok(())
}

fn doctor_cmd(cfg: &Config) -> Result<()> {
    info!("doctor: starting");
    doctor::check_thresholds(&cfg.pipeline)?;
    doctor::check_backend("detector", &cfg.detector)?;
    match &cfg.classifier {
        Some(c) => doctor::check_backend("classifier", c)?,
        None => warn!("doctor: no [classifier] section, boxes will be reported unlabelled"),
    }
    anyhow::ensure!(cfg.render.stroke >= 1, "render.stroke must be >= 1");
    info!("doctor: OK");
    println!("OK");
    Ok(())
}

fn inspect(cfg: &Config) -> Result<()> {
    anyhow::ensure!(
        cfg.detector.backend == "tflite",
        "inspect needs a tflite detector (detector.backend = {:?})",
        cfg.detector.backend
    );
    inspect_tflite(cfg)
}

#[cfg(feature = "tflite")]
fn inspect_tflite(cfg: &Config) -> Result<()> {
    use fresh_vision::tflite::TfliteBackend;

    print!("{}", TfliteBackend::new(&cfg.detector)?.inspect()?);
    if let Some(c) = cfg.classifier.as_ref().filter(|c| c.backend == "tflite") {
        print!("{}", TfliteBackend::new(c)?.inspect()?);
    }
    Ok(())
}

#[cfg(not(feature = "tflite"))]
fn inspect_tflite(_cfg: &Config) -> Result<()> {
    anyhow::bail!("tflite backend not available; build with --features tflite");
}

#[cfg(test)]
mod tests {
    use super::*;
    use fresh_vision::SelectionMode;

    #[test]
    fn example_config_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/freshscan.example.toml");
        let cfg = load_config(path).unwrap();
        assert_eq!(cfg.pipeline.selection, SelectionMode::AllSurvivors);
        assert_eq!(cfg.pipeline.max_detections, Some(32));
        assert_eq!(cfg.detector.input_size(), Some(BackendConfig::DETECTOR_INPUT));
        let cls = cfg.classifier.unwrap();
        assert_eq!(cls.input_size(), Some(BackendConfig::CLASSIFIER_INPUT));
        assert_eq!(cfg.render.stroke, 4);
    }

    #[test]
    fn render_section_is_optional() {
        let cfg = Config::parse(
            "[detector]\nbackend = \"replay\"\nreplay_path = \"x\"\ninput_w = 320\ninput_h = 320\n",
        )
        .unwrap();
        assert_eq!(cfg.render.stroke, 4);
        assert!(cfg.classifier.is_none());
        assert_eq!(cfg.pipeline.iou_threshold, 0.4);
        assert_eq!(cfg.detector.input_size(), Some((320, 320)));
    }

    #[test]
    fn input_sizes_default_per_section() {
        let cfg = Config::parse(
            r#"
            [detector]
            backend = "replay"
            replay_path = "fixtures/two_boxes.txt"

            [classifier]
            backend = "replay"
            replay_path = "fixtures/fresh.txt"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.detector.input_size(), Some((416, 416)));
        assert_eq!(cfg.classifier.unwrap().input_size(), Some((240, 240)));
    }
}
