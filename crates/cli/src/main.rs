//! CLI tool for turning PowerPoint slides into generated videos.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use deckreel_core::{
    mime_type_for_path, AspectRatio, FrameRate, GenerationConfig, Genre, Progress, PromptComposer,
    SelectionMap, SlideImage, SlideRecord, Transition, VideoQuality, VideoResult, VideoStyle,
};
use deckreel_genai::{
    bundle_zip, media_file_name, suggest_keywords, ClientConfig, GeminiClient,
    GenerationOrchestrator, MediaFetcher, OcrEnricher, PollConfig, ResultAssembler,
    BUNDLE_FILE_NAME, DEFAULT_TEXT_MODEL, DEFAULT_VIDEO_MODEL,
};
use deckreel_pptx::{PptxArchive, SlideExtractor};

/// Turn PowerPoint slides into generated video clips.
#[derive(Parser, Debug)]
#[command(name = "deckreel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract slide text and images as JSON
    Extract(ExtractArgs),
    /// Generate videos from a presentation
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Input presentation (.pptx)
    input: PathBuf,

    /// Append text recognized in slide images (requires an API key)
    #[arg(long)]
    ocr: bool,

    /// Skip slide thumbnails
    #[arg(long)]
    no_thumbnails: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Model used for text recognition
    #[arg(long, default_value = DEFAULT_TEXT_MODEL)]
    text_model: String,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Input presentation (.pptx)
    input: PathBuf,

    /// JSON file with generation settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Video style (Default, Cinematic, Animation, Documentary, Vibrant, Hollywood, Stop-motion, Abstract)
    #[arg(long)]
    style: Option<VideoStyle>,

    /// Resolution tier (480p, 720p, 1080p)
    #[arg(long)]
    quality: Option<VideoQuality>,

    /// Aspect ratio (16:9, 9:16, 1:1, 4:3, 3:4)
    #[arg(long)]
    aspect_ratio: Option<AspectRatio>,

    /// Frame rate (24fps, 30fps, 60fps)
    #[arg(long)]
    frame_rate: Option<FrameRate>,

    /// Genre for the Hollywood style (None, Action, Sci-Fi, Drama, Thriller, Epic Fantasy)
    #[arg(long)]
    genre: Option<Genre>,

    /// Extra keywords for the Hollywood style
    #[arg(long)]
    keywords: Option<String>,

    /// Ask the text model for genre keywords when none are given
    #[arg(long)]
    suggest_keywords: bool,

    /// Transition (None, Fade, Slide, Zoom); anything but None makes one combined video
    #[arg(long)]
    transition: Option<Transition>,

    /// Do not ask for a voiceover
    #[arg(long)]
    no_voiceover: bool,

    /// Start with a trailer-style intro (Hollywood style only)
    #[arg(long)]
    intro: bool,

    /// Target duration in seconds (5-60)
    #[arg(long)]
    duration: Option<u32>,

    /// Append text recognized in slide images
    #[arg(long)]
    ocr: bool,

    /// Add an image to a slide and use it as the seed, e.g. 3=photo.png
    #[arg(long = "image", value_name = "N=PATH")]
    images: Vec<String>,

    /// Use another extracted image as the seed, e.g. 2=1
    #[arg(long = "select", value_name = "N=INDEX")]
    selections: Vec<String>,

    /// Directory to download videos and results.json into
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Bundle downloaded videos into a single zip
    #[arg(long, requires = "output")]
    zip: bool,

    /// Model used for video generation
    #[arg(long, default_value = DEFAULT_VIDEO_MODEL)]
    video_model: String,

    /// Model used for text recognition and keyword suggestions
    #[arg(long, default_value = DEFAULT_TEXT_MODEL)]
    text_model: String,

    /// Seconds between status polls
    #[arg(long, default_value_t = 10)]
    poll_interval: u64,
}

/// Prints progress to stderr and each new result to stdout.
struct CliProgress;

impl Progress for CliProgress {
    fn message(&self, message: &str) {
        log::info!("{}", message);
        eprintln!("{}", message);
    }

    fn results(&self, results: &[VideoResult]) {
        if let Some(latest) = results.last() {
            println!("slide {}: {}", latest.slide_number, latest.media_uri);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    if let Err(e) = dotenvy::dotenv() {
        log::debug!("No .env file loaded: {}", e);
    }

    match cli.command {
        Command::Extract(args) => run_extract(args).await,
        Command::Generate(args) => run_generate(args).await,
    }
}

async fn run_extract(args: ExtractArgs) -> Result<()> {
    let extractor = SlideExtractor::new().with_thumbnails(!args.no_thumbnails);
    let mut slides = read_slides(&args.input, &extractor)?;

    if args.ocr {
        let client = Arc::new(GeminiClient::new(ClientConfig::from_env()?));
        let enricher = OcrEnricher::new(client).with_model(&args.text_model);
        slides = enricher.enrich(slides, &CliProgress).await;
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&slides)?
    } else {
        serde_json::to_string(&slides)?
    };
    println!("{}", json);

    Ok(())
}

async fn run_generate(args: GenerateArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let client = Arc::new(GeminiClient::new(ClientConfig::from_env()?));

    let mut slides = read_slides(&args.input, &SlideExtractor::new())?;
    eprintln!("Found {} slides", slides.len());

    if args.ocr {
        let enricher = OcrEnricher::new(Arc::clone(&client)).with_model(&args.text_model);
        slides = enricher.enrich(slides, &CliProgress).await;
    }

    let mut selections = SelectionMap::defaults_for(&slides);
    for assignment in &args.images {
        add_user_image(&mut slides, &mut selections, assignment)?;
    }
    for assignment in &args.selections {
        let (slide_number, index) = parse_assignment(assignment)?;
        let index: usize = index
            .parse()
            .with_context(|| format!("Invalid image index in '{}'", assignment))?;
        selections.select(slide_number, index);
    }

    if args.suggest_keywords && config.is_cinematic_trailer() && config.keywords.trim().is_empty() {
        config.keywords = suggest_keywords(&*client, &args.text_model, config.genre).await?;
        if !config.keywords.is_empty() {
            eprintln!("Using keywords: {}", config.keywords);
        }
    }

    log::debug!("Generation settings: {:?}", config);

    let orchestrator = GenerationOrchestrator::new(Arc::clone(&client))
        .with_model(&args.video_model)
        .with_poll_config(PollConfig {
            interval: Duration::from_secs(args.poll_interval),
            ..PollConfig::default()
        });
    let composer = PromptComposer::new(config);

    let mut assembler = ResultAssembler::new();
    let outcome = assembler
        .run(&orchestrator, &composer, &slides, &selections, &CliProgress)
        .await;

    if let Some(dir) = &args.output {
        write_results(dir, assembler.results())?;
    }

    if let Err(e) = outcome {
        if !assembler.results().is_empty() {
            eprintln!(
                "{} video(s) completed before the failure",
                assembler.results().len()
            );
        }
        return Err(e).context("Video generation failed");
    }

    if let Some(dir) = &args.output {
        let fetcher = MediaFetcher::new(client.api_key());
        let videos = fetcher.fetch_all(assembler.results()).await?;
        if args.zip {
            let path = dir.join(BUNDLE_FILE_NAME);
            write_file(&path, &bundle_zip(&videos)?)?;
            eprintln!("Written to: {}", path.display());
        } else {
            for (slide_number, bytes) in &videos {
                let path = dir.join(media_file_name(*slide_number));
                write_file(&path, bytes)?;
                eprintln!("Written to: {}", path.display());
            }
        }
    }

    Ok(())
}

/// Read and extract a presentation file.
fn read_slides(input_path: &Path, extractor: &SlideExtractor) -> Result<Vec<SlideRecord>> {
    let bytes =
        fs::read(input_path).with_context(|| format!("Failed to open {}", input_path.display()))?;
    let mut archive = PptxArchive::open(bytes)
        .with_context(|| format!("Failed to parse the presentation {}", input_path.display()))?;
    let slides = extractor
        .extract_with_progress(&mut archive, &CliProgress)
        .with_context(|| format!("Failed to parse the presentation {}", input_path.display()))?;
    Ok(slides)
}

/// Defaults, replaced by the JSON config file if one is given.
fn load_config(path: Option<&Path>) -> Result<GenerationConfig> {
    let Some(path) = path else {
        return Ok(GenerationConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

fn apply_overrides(config: &mut GenerationConfig, args: &GenerateArgs) {
    if let Some(style) = args.style {
        config.style = style;
    }
    if let Some(quality) = args.quality {
        config.quality = quality;
    }
    if let Some(aspect_ratio) = args.aspect_ratio {
        config.aspect_ratio = aspect_ratio;
    }
    if let Some(frame_rate) = args.frame_rate {
        config.frame_rate = frame_rate;
    }
    if let Some(genre) = args.genre {
        config.genre = genre;
    }
    if let Some(keywords) = &args.keywords {
        config.keywords = keywords.clone();
    }
    if let Some(transition) = args.transition {
        config.transition = transition;
    }
    if args.no_voiceover {
        config.voiceover = false;
    }
    if args.intro {
        config.intro = true;
    }
    if let Some(duration) = args.duration {
        config.duration_secs = duration;
    }
}

/// Split `N=VALUE` into a slide number and the value.
fn parse_assignment(assignment: &str) -> Result<(usize, &str)> {
    let Some((slide, value)) = assignment.split_once('=') else {
        bail!("Expected N=VALUE, got '{}'", assignment);
    };
    let slide_number = slide
        .trim()
        .parse()
        .with_context(|| format!("Invalid slide number in '{}'", assignment))?;
    Ok((slide_number, value.trim()))
}

/// Append an image file to a slide and select it.
fn add_user_image(
    slides: &mut [SlideRecord],
    selections: &mut SelectionMap,
    assignment: &str,
) -> Result<()> {
    let (slide_number, path) = parse_assignment(assignment)?;
    let Some(slide) = slides.iter_mut().find(|s| s.slide_number == slide_number) else {
        bail!("Slide {} was not extracted from the presentation", slide_number);
    };

    let bytes = fs::read(path).with_context(|| format!("Failed to read image {}", path))?;
    let index = slide.push_image(SlideImage::from_bytes(&bytes, mime_type_for_path(path)));
    selections.select(slide_number, index);
    log::debug!("Slide {}: added {} as image {}", slide_number, path, index);
    Ok(())
}

/// Write results.json into the output directory.
fn write_results(dir: &Path, results: &[VideoResult]) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    let json = serde_json::to_string_pretty(results)?;
    write_file(&dir.join("results.json"), json.as_bytes())
}

/// Write output to a file.
fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(number: usize, images: usize) -> SlideRecord {
        let mut slide = SlideRecord::new(number);
        slide.text = format!("Slide {}", number);
        for i in 0..images {
            slide.push_image(SlideImage::new(format!("{}", i), "image/png"));
        }
        slide
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("3=photo.png").unwrap(), (3, "photo.png"));
        assert_eq!(parse_assignment(" 2 = 1 ").unwrap(), (2, "1"));
        assert!(parse_assignment("photo.png").is_err());
        assert!(parse_assignment("x=1").is_err());
    }

    #[test]
    fn test_overrides_apply_over_config() {
        let args = Cli::parse_from([
            "deckreel",
            "generate",
            "deck.pptx",
            "--style",
            "hollywood",
            "--genre",
            "sci-fi",
            "--transition",
            "fade",
            "--no-voiceover",
            "--duration",
            "30",
        ]);
        let Command::Generate(args) = args.command else {
            panic!("expected generate");
        };

        let mut config = GenerationConfig::default().with_keywords("kept");
        apply_overrides(&mut config, &args);
        assert_eq!(config.style, VideoStyle::Hollywood);
        assert_eq!(config.genre, Genre::SciFi);
        assert_eq!(config.transition, Transition::Fade);
        assert!(!config.voiceover);
        assert_eq!(config.duration_secs, 30);
        assert_eq!(config.keywords, "kept");
        assert_eq!(config.aspect_ratio, AspectRatio::Landscape);
    }

    #[test]
    fn test_rejects_unknown_style() {
        let result = Cli::try_parse_from(["deckreel", "generate", "deck.pptx", "--style", "sepia"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_add_user_image_selects_it() {
        let dir = std::env::temp_dir().join(format!("deckreel-cli-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let image_path = dir.join("extra.jpg");
        fs::write(&image_path, [0xff, 0xd8, 0xff]).unwrap();

        let mut slides = vec![slide(1, 2)];
        let mut selections = SelectionMap::defaults_for(&slides);
        add_user_image(
            &mut slides,
            &mut selections,
            &format!("1={}", image_path.display()),
        )
        .unwrap();

        assert_eq!(slides[0].images.len(), 3);
        assert_eq!(slides[0].images[2].mime_type, "image/jpeg");
        assert_eq!(selections.get(1), Some(2));

        assert!(add_user_image(&mut slides, &mut selections, "9=missing.png").is_err());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_invalid_duration_fails_before_reading_input() {
        let cli = Cli::parse_from([
            "deckreel",
            "generate",
            "does-not-exist.pptx",
            "--duration",
            "90",
            "--ocr",
            "--suggest-keywords",
        ]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };

        let err = run_generate(args).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<deckreel_core::Error>(),
            Some(deckreel_core::Error::InvalidConfig(_))
        ));
    }
}
