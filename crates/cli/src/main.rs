use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use emoscope_core::annotation::frame_annotator::FrameAnnotator;
use emoscope_core::capture::camera_controller::CameraController;
use emoscope_core::capture::infrastructure::ffmpeg_camera::FfmpegCameraProvider;
use emoscope_core::classification::domain::emotion_classifier::EmotionClassifier;
use emoscope_core::classification::domain::image_normalizer::ImageNormalizer;
use emoscope_core::classification::infrastructure::onnx_emotion_model::OnnxEmotionModel;
use emoscope_core::config::EmoscopeConfig;
use emoscope_core::detection::infrastructure::seeta_face_locator::SeetaFaceLocator;
use emoscope_core::media::infrastructure::image_frame_decoder::ImageFrameDecoder;
use emoscope_core::media::infrastructure::jpeg_frame_encoder::JpegFrameEncoder;
use emoscope_core::pipeline::analyze_upload_use_case::{AnalyzeUploadUseCase, UploadedFile};
use emoscope_core::pipeline::live_annotation_use_case::LiveAnnotationUseCase;
use emoscope_core::pipeline::multipart::STREAM_CONTENT_TYPE;
use emoscope_core::pipeline::pipeline_logger::LogPipelineLogger;
use emoscope_core::pipeline::responses::StatusBody;
use emoscope_core::shared::constants::IMAGE_EXTENSIONS;
use emoscope_core::shared::resource_resolver::{default_chain, resolve_with};

/// Face-emotion annotation for images and camera streams.
#[derive(Parser)]
#[command(name = "emoscope", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to the per-user config when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emotion model file, overriding the configured one.
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Directory searched first for model files.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Classify every face in one image and print the result as JSON.
    Analyze {
        /// Image file to analyze.
        image: PathBuf,
    },
    /// Annotate camera frames and write them as an MJPEG multipart stream.
    Stream {
        /// Output file, or `-` for stdout.
        #[arg(long, default_value = "-")]
        output: PathBuf,

        /// Stop after this many frames.
        #[arg(long)]
        max_frames: Option<usize>,

        /// Stop the camera after this many seconds.
        #[arg(long)]
        duration: Option<f64>,

        /// Capture device (e.g. /dev/video0).
        #[arg(long)]
        device: Option<String>,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = EmoscopeConfig::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);

    match cli.command {
        Command::Analyze { image } => run_analyze(&image, &config),
        Command::Stream {
            output,
            max_frames,
            duration,
            device,
        } => {
            if let Some(device) = device {
                config.camera.device = Some(device);
            }
            let duration = duration.map(parse_duration).transpose()?;
            run_stream(&output, max_frames, duration, &config)
        }
    }
}

fn run_analyze(image: &Path, config: &EmoscopeConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !image.exists() {
        return Err(format!("Input file not found: {}", image.display()).into());
    }
    if !is_image(image) {
        log::warn!("{} has no known image extension", image.display());
    }

    let upload = UploadedFile {
        filename: image.file_name().map(|n| n.to_string_lossy().into_owned()),
        bytes: std::fs::read(image)?,
    };

    let mut use_case = AnalyzeUploadUseCase::new(
        Box::new(ImageFrameDecoder::new()),
        Box::new(build_locator(config)?),
        build_classifier(config)?,
    )
    .with_max_bytes(config.upload.max_bytes);

    match use_case.process_upload(Some(&upload)) {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&e.to_error_body())?);
            Err(format!("{e} (status {})", e.status_code()).into())
        }
    }
}

fn run_stream(
    output: &Path,
    max_frames: Option<usize>,
    duration: Option<Duration>,
    config: &EmoscopeConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let use_case = LiveAnnotationUseCase::new(
        Box::new(build_locator(config)?),
        build_classifier(config)?,
        FrameAnnotator::new(),
        Box::new(JpegFrameEncoder::new(config.stream.jpeg_quality)),
        Box::new(LogPipelineLogger::default()),
    );
    let camera = CameraController::new(Arc::new(FfmpegCameraProvider::new(config.camera.clone())));

    let mut writer = open_output(output)?;
    let stream = use_case.start(&camera)?;
    log::info!("Streaming {STREAM_CONTENT_TYPE} to {}", output.display());

    if let Some(duration) = duration {
        let timer = camera.clone();
        std::thread::spawn(move || {
            std::thread::sleep(duration);
            timer.stop();
            log::info!("Stop requested after {:.1}s", duration.as_secs_f64());
        });
    }

    let mut frames = 0usize;
    for chunk in stream.take(max_frames.unwrap_or(usize::MAX)) {
        writer.write_all(&chunk?)?;
        writer.flush()?;
        frames += 1;
    }

    camera.stop();
    log::info!(
        "Stream ended after {frames} frames: {}",
        serde_json::to_string(&StatusBody::success())?
    );
    Ok(())
}

fn build_locator(config: &EmoscopeConfig) -> Result<SeetaFaceLocator, Box<dyn std::error::Error>> {
    log::info!("Resolving face locator model: {}", config.resources.locator_model);
    let chain = default_chain(config.resources.data_dir.clone());
    let locator = SeetaFaceLocator::from_candidates(
        &config.resources.locator_model,
        &chain,
        config.locator.clone(),
    )?;
    log::debug!(
        "Locator ready: {} (min size {}, neighbors {})",
        locator.model_path().display(),
        config.locator.min_size,
        config.locator.min_neighbors
    );
    Ok(locator)
}

fn build_classifier(config: &EmoscopeConfig) -> Result<EmotionClassifier, Box<dyn std::error::Error>> {
    let model = match &config.classifier.model_path {
        Some(path) => OnnxEmotionModel::new(path)?,
        None => {
            log::info!("Resolving emotion model: {}", config.resources.emotion_model);
            let chain = default_chain(config.resources.data_dir.clone());
            let (_, model) = resolve_with(&config.resources.emotion_model, &chain, |path| {
                if !path.is_file() {
                    return Err("file not found".into());
                }
                OnnxEmotionModel::new(path).map_err(|e| e.to_string().into())
            })?;
            model
        }
    };
    Ok(EmotionClassifier::new(
        Box::new(model),
        ImageNormalizer::new(config.classifier.channel_order),
    ))
}

fn apply_overrides(config: &mut EmoscopeConfig, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.classifier.model_path = Some(model.clone());
    }
    if let Some(dir) = &cli.data_dir {
        config.resources.data_dir = Some(dir.clone());
    }
}

fn open_output(output: &Path) -> Result<Box<dyn Write>, Box<dyn std::error::Error>> {
    if output == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Box::new(BufWriter::new(File::create(output)?)))
}

fn parse_duration(seconds: f64) -> Result<Duration, Box<dyn std::error::Error>> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("Duration must be a positive number of seconds, got {seconds}").into());
    }
    Ok(Duration::from_secs_f64(seconds))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
