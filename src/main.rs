use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use imgkit::api;
use imgkit::assets::AssetLoader;
use imgkit::models::{
    AppConfig, Credentials, GeneratedImage, ImageMime, SizePreset, Style, UploadPolicy,
    UploadedFile, ARK_API_KEY_ENV, REMOVE_BG_API_KEY_ENV,
};
use imgkit::server;
use imgkit::services::{
    compressor, ArkClient, BackgroundRemover, CompressOptions, GenerationRequest, ImageGenerator,
    ImageRecognizer, RemoveBgClient,
};

#[derive(Parser)]
#[command(name = "imgkit")]
#[command(about = "Image tools: compression, background removal, recognition and AI generation")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Compress an image file locally
    Compress {
        /// Input image (jpeg, png, webp or bmp)
        input: PathBuf,

        /// Output file path (default: compressed_<name> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Quality percentage, 10-100
        #[arg(short, long)]
        quality: Option<u8>,

        /// Downscale so the longest side is at most this many pixels
        #[arg(long)]
        max_dimension: Option<u32>,
    },
    /// Remove the background of an image (needs REMOVE_BG_API_KEY)
    RemoveBg {
        /// Input image
        input: PathBuf,

        /// Output PNG path (default: no_bg_<name>.png next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Ask the vision model about an image (needs ARK_API_KEY)
    Recognize {
        /// Input image
        input: PathBuf,

        /// Question about the image
        #[arg(short, long)]
        prompt: Option<String>,
    },
    /// Generate an image from a prompt and print its URL (needs ARK_API_KEY)
    Generate {
        /// What to draw
        prompt: String,

        /// realistic, artistic, anime, cartoon, digital or watercolor
        #[arg(short, long, default_value = "realistic")]
        style: String,

        /// Size preset, e.g. 512x512, 768x512, 1024x1024
        #[arg(long, default_value = "512x512")]
        size: String,
    },
    /// Extract the embedded config.yaml for customization
    Init {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "imgkit API",
        description = "Image compression, background removal, recognition and AI generation",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(
        api::handle_compress,
        api::handle_remove_bg,
        api::handle_recognize,
        api::handle_generate,
        api::handle_history,
        api::handle_clear_history,
        api::handle_download,
    ),
    components(schemas(
        api::CompressForm,
        api::RemoveBgForm,
        api::RecognizeForm,
        api::RecognizeResponse,
        api::GenerateRequest,
        api::GenerateResponse,
        api::ClearHistoryResponse,
        GeneratedImage,
        Style,
    )),
    tags(
        (name = "Compression", description = "Local image re-encoding"),
        (name = "Background removal", description = "Transparent cut-outs via remove.bg"),
        (name = "Recognition", description = "Image question answering"),
        (name = "Generation", description = "Text-to-image generation and history")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => run_server().await,
        Some(Commands::Compress {
            input,
            output,
            quality,
            max_dimension,
        }) => run_compress_command(&input, output, quality, max_dimension),
        Some(Commands::RemoveBg { input, output }) => run_remove_bg_command(&input, output).await,
        Some(Commands::Recognize { input, prompt }) => {
            run_recognize_command(&input, prompt.as_deref()).await
        }
        Some(Commands::Generate {
            prompt,
            style,
            size,
        }) => run_generate_command(&prompt, &style, &size).await,
        Some(Commands::Init { force }) => run_init_command(force),
        None => {
            run_status_command();
            Ok(())
        }
    }
}

fn init_cli_logging() {
    // Minimal logging for CLI
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imgkit=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

fn asset_loader_from_env() -> AssetLoader {
    let config_file = std::env::var("CONFIG_FILE").ok().map(PathBuf::from);
    AssetLoader::new(config_file)
}

fn load_config() -> AppConfig {
    let loader = asset_loader_from_env();
    if let Err(e) = loader.seed_if_configured() {
        tracing::warn!(%e, "Failed to seed config file");
    }
    AppConfig::load_from_assets(&loader)
}

/// Read an image from disk and run it through the same checks as an upload
fn read_image(path: &Path, max_bytes: usize) -> anyhow::Result<(UploadedFile, ImageMime)> {
    let bytes = std::fs::read(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let declared = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ImageMime::from_extension)
        .map(|m| m.as_str())
        .unwrap_or("application/octet-stream");

    let file = UploadedFile::new(file_name, declared, bytes);
    let mime = UploadPolicy::new(max_bytes).validate(&file)?;
    Ok((file, mime))
}

fn sibling(input: &Path, file_name: String) -> PathBuf {
    input.with_file_name(file_name)
}

/// Compress an image file (no server needed)
fn run_compress_command(
    input: &Path,
    output: Option<PathBuf>,
    quality: Option<u8>,
    max_dimension: Option<u32>,
) -> anyhow::Result<()> {
    init_cli_logging();
    let config = load_config();

    let (file, mime) = read_image(input, config.uploads.compress.max_bytes)?;
    let options = CompressOptions::new(
        quality.unwrap_or(config.compress.default_quality),
        max_dimension,
    )?;

    let compressed = compressor::compress(&file.bytes, mime, &options)?;
    let output = output.unwrap_or_else(|| sibling(input, compressed.download_name(file.stem())));

    std::fs::write(&output, &compressed.bytes)?;
    let saved = 100.0 - (compressed.compressed_size() as f64 * 100.0 / file.size() as f64);
    println!(
        "Compressed {} -> {} ({} -> {} bytes, {saved:.1}% smaller, {}x{})",
        input.display(),
        output.display(),
        file.size(),
        compressed.compressed_size(),
        compressed.width,
        compressed.height
    );

    Ok(())
}

async fn run_remove_bg_command(input: &Path, output: Option<PathBuf>) -> anyhow::Result<()> {
    init_cli_logging();
    let config = load_config();

    let (file, mime) = read_image(input, config.uploads.remove_bg.max_bytes)?;
    let client = RemoveBgClient::new(&config.vendors.remove_bg, Credentials::from_env().remove_bg)?;
    let image = client.remove_background(&file, mime).await?;

    let output = output.unwrap_or_else(|| sibling(input, format!("no_bg_{}.png", file.stem())));
    std::fs::write(&output, &image.bytes)?;
    println!("Saved {} ({} bytes)", output.display(), image.bytes.len());

    Ok(())
}

async fn run_recognize_command(input: &Path, prompt: Option<&str>) -> anyhow::Result<()> {
    init_cli_logging();
    let config = load_config();

    let (file, mime) = read_image(input, config.uploads.recognize.max_bytes)?;
    let client = ArkClient::new(&config.vendors.ark, Credentials::from_env().ark)?;
    let recognition = client
        .recognize(&file.bytes, mime, prompt.unwrap_or_default())
        .await?;

    println!("{}", recognition.content);

    Ok(())
}

async fn run_generate_command(prompt: &str, style: &str, size: &str) -> anyhow::Result<()> {
    init_cli_logging();
    let config = load_config();

    let request = GenerationRequest {
        prompt: prompt.trim().to_string(),
        style: style.parse::<Style>().map_err(anyhow::Error::msg)?,
        size: size.parse::<SizePreset>().map_err(anyhow::Error::msg)?,
    };
    let client = ArkClient::new(&config.vendors.ark, Credentials::from_env().ark)?;
    let generation = client.generate(&request).await?;

    println!("{}", generation.url);

    Ok(())
}

/// Extract the embedded config to the filesystem
fn run_init_command(force: bool) -> anyhow::Result<()> {
    let loader = asset_loader_from_env();
    let report = loader.init(force)?;

    for f in &report.written {
        println!("  + {f}");
    }
    for f in &report.skipped {
        println!("  - {f} (exists, use --force to overwrite)");
    }

    Ok(())
}

/// Display status and configuration information
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let bind_addr = std::env::var("BIND_ADDR").ok();
    let config_file = std::env::var("CONFIG_FILE").ok();
    let credentials = Credentials::from_env();

    println!("imgkit v{VERSION}");
    println!("Image compression, background removal, recognition and AI generation\n");

    println!("Environment Variables:");
    println!(
        "  BIND_ADDR         = {}",
        bind_addr.as_deref().unwrap_or("(not set, using config)")
    );
    println!(
        "  CONFIG_FILE       = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );
    let key_state = |set: bool| if set { "set" } else { "(not set)" };
    println!(
        "  {ARK_API_KEY_ENV:<17} = {}",
        key_state(credentials.ark.is_some())
    );
    println!(
        "  {REMOVE_BG_API_KEY_ENV:<17} = {}",
        key_state(credentials.remove_bg.is_some())
    );

    let config_source = match config_file {
        Some(ref path) if Path::new(path).exists() => path.to_string(),
        Some(_) => "embedded (file not found)".to_string(),
        None => "embedded".to_string(),
    };
    println!("\nConfig:  {config_source}");

    println!("\nCommands:");
    println!("  imgkit serve       Start the HTTP server");
    println!("  imgkit compress    Compress an image file");
    println!("  imgkit remove-bg   Remove an image background");
    println!("  imgkit recognize   Describe an image");
    println!("  imgkit generate    Generate an image from a prompt");
    println!("  imgkit init        Extract the embedded config.yaml");
    println!("\nRun 'imgkit --help' for more details.");
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imgkit=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let loader = asset_loader_from_env();
    tracing::info!(
        config = %loader
            .config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "embedded".to_string()),
        "Config source"
    );

    if let Err(e) = loader.seed_if_configured() {
        tracing::warn!(%e, "Failed to seed config file");
    }

    let config = AppConfig::load_from_assets(&loader);
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| config.server.bind_addr.clone());

    let state = server::create_app_state(config, Credentials::from_env())?;

    // Build router: start with shared API routes, add production-only routes
    let app = server::build_router(state)
        // OpenAPI documentation (production only)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "imgkit server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
