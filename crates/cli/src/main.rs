use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

use clap::Parser;

use facespot_core::detection::domain::face_detector::FaceDetector;
use facespot_core::detection::domain::face_encoder::FaceEncoder;
use facespot_core::detection::infrastructure::model_resolver;
use facespot_core::detection::infrastructure::onnx_arcface_encoder::OnnxArcfaceEncoder;
use facespot_core::detection::infrastructure::onnx_blazeface_detector::{
    OnnxBlazefaceDetector, DEFAULT_CONFIDENCE,
};
use facespot_core::pipeline::encode_reference_use_case::EncodeReferenceUseCase;
use facespot_core::pipeline::scan_video_use_case::{ProgressFn, ScanConfig, ScanVideoUseCase};
use facespot_core::shared::constants::{
    DETECTOR_MODEL_NAME, DETECTOR_MODEL_URL, ENCODER_MODEL_NAME, ENCODER_MODEL_URL,
};
use facespot_core::video::domain::video_fetcher::VideoFetcher;
use facespot_core::video::domain::video_reader::VideoReader;
use facespot_core::video::infrastructure::ffmpeg_video_reader::FfmpegVideoReader;
use facespot_core::video::infrastructure::http_video_fetcher::HttpVideoFetcher;
use facespot_core::video::infrastructure::image_file_reader::ImageFileReader;

/// Checks whether a reference face appears anywhere in a video.
#[derive(Parser)]
#[command(name = "facespot")]
struct Cli {
    /// Video file path or HTTP(S) URL.
    video: String,

    /// Reference image containing the target face.
    reference: PathBuf,

    /// Max embedding distance for two faces to count as the same person.
    #[arg(long, default_value = "0.55")]
    threshold: f64,

    /// Probe every Nth frame for faces.
    #[arg(long, default_value = "30")]
    sample_interval: usize,

    /// Stop scanning after this many frames.
    #[arg(long, default_value = "10000")]
    frame_ceiling: usize,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Abort the scan after this many seconds.
    #[arg(long)]
    timeout: Option<u64>,
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
    validate(&cli)?;

    // The working directory owns every per-request temp file; dropping it
    // cleans up on success and on every error path alike.
    let workdir = tempfile::tempdir()?;
    let video_path = acquire_video(&cli.video, workdir.path())?;

    let detector = build_detector(cli.confidence)?;
    let encoder = build_encoder()?;

    log::info!("Processing reference image: {}", cli.reference.display());
    let reference_image = ImageFileReader::new().read(&cli.reference)?;
    let mut encode = EncodeReferenceUseCase::new(detector, encoder);
    let reference = encode.execute(&reference_image)?;
    log::info!("Reference face embedding created");
    let (detector, encoder) = encode.into_parts();

    let mut reader: Box<dyn VideoReader> = Box::new(FfmpegVideoReader::new());
    let metadata = reader.open(&video_path)?;
    log::info!(
        "Opened video: {}x{} {} ({} frames)",
        metadata.width,
        metadata.height,
        metadata.codec,
        metadata.total_frames
    );

    let config = ScanConfig {
        match_threshold: cli.threshold,
        sample_interval: cli.sample_interval,
        frame_ceiling: cli.frame_ceiling,
    };
    let deadline = cli.timeout.map(|secs| Instant::now() + Duration::from_secs(secs));
    let progress: ProgressFn = Box::new(move |frame| {
        eprint!("\rScanning frame {frame}");
        deadline.map_or(true, |d| Instant::now() < d)
    });

    let mut scan = ScanVideoUseCase::new(reader, detector, encoder, config, Some(progress))?;
    let outcome = scan.execute(&reference)?;
    eprintln!();

    let result = serde_json::json!({
        "face_present": outcome.face_present,
        "matched_frame_index": outcome.matched_frame_index,
        "distance": outcome.distance,
    });
    println!("{result}");

    Ok(())
}

fn acquire_video(locator: &str, workdir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if is_url(locator) {
        let dest = workdir.join("video.mp4");
        log::info!("Downloading video from: {locator}");
        HttpVideoFetcher::new().fetch(locator, &dest)?;
        log::info!("Video download complete");
        Ok(dest)
    } else {
        Ok(PathBuf::from(locator))
    }
}

fn build_detector(confidence: f64) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {DETECTOR_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        DETECTOR_MODEL_NAME,
        DETECTOR_MODEL_URL,
        None,
        Some(Box::new(download_progress)),
    )?;
    eprintln!();

    Ok(Box::new(OnnxBlazefaceDetector::new(&model_path, confidence)?))
}

fn build_encoder() -> Result<Box<dyn FaceEncoder>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {ENCODER_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        ENCODER_MODEL_NAME,
        ENCODER_MODEL_URL,
        None,
        Some(Box::new(download_progress)),
    )?;
    eprintln!();

    Ok(Box::new(OnnxArcfaceEncoder::new(&model_path)?))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.reference.exists() {
        return Err(format!("Reference image not found: {}", cli.reference.display()).into());
    }
    if !is_url(&cli.video) && !Path::new(&cli.video).exists() {
        return Err(format!("Video file not found: {}", cli.video).into());
    }
    if cli.threshold < 0.0 {
        return Err(format!("Threshold must be >= 0, got {}", cli.threshold).into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if cli.sample_interval < 1 {
        return Err("Sample interval must be >= 1".into());
    }
    if cli.frame_ceiling < 1 {
        return Err("Frame ceiling must be >= 1".into());
    }
    if cli.timeout == Some(0) {
        return Err("Timeout must be >= 1 second".into());
    }
    Ok(())
}

fn is_url(locator: &str) -> bool {
    locator.starts_with("http://") || locator.starts_with("https://")
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}
