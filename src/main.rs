use clap::{Parser, Subcommand, ValueEnum};
use meme_pack::config::{self, PackConfig};
use meme_pack::generator::{EnvApiKey, GeminiGenerator, GenerationParams, LocalAssets, ReferenceImage};
use meme_pack::imaging::{RustBackend, fit_encoded, slice_composite};
use meme_pack::output;
use meme_pack::pipeline::{self, CancelToken, OutputTarget, PackError, PackEvent, PackOutcome};
use meme_pack::types::{FittedKind, Metadata};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

#[derive(Parser)]
#[command(name = "meme-pack")]
#[command(version)]
#[command(about = "Generate a themed sticker pack and package it as a zip")]
#[command(long_about = "\
Generate a themed sticker pack and package it as a zip

One prompt produces four assets: a composite grid image, a banner, a logo and
a title/description. The composite is cut into equal cells (6x4 by default),
banner and logo are cover-fitted to their exact sizes, and everything is
bundled with an info.txt:

  meme_pack.zip
  ├── stickers/
  │   ├── meme_01.png              # row-major, left-to-right, top-to-bottom
  │   ├── ...
  │   └── meme_24.png
  ├── banner.png                   # 750x400
  ├── logo.png                     # 240x240
  └── info.txt                     # title, description, attribution

The API key is read from $GEMINI_API_KEY (or generator.api_key in pack.toml).

Run 'meme-pack gen-config' to generate a documented pack.toml.")]
struct Cli {
    /// Config file (optional; stock defaults when absent)
    #[arg(long, default_value = "pack.toml", global = true)]
    config: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Shared flags for commands that write a pack.
#[derive(clap::Args, Clone)]
struct PackArgs {
    /// Also write the pack as loose files next to the archive
    #[arg(long)]
    extract: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Generate all assets from a prompt and write the pack
    Generate {
        /// Theme of the pack
        #[arg(long)]
        prompt: String,
        /// Style reference image
        #[arg(long)]
        reference: Option<PathBuf>,
        #[command(flatten)]
        pack: PackArgs,
    },
    /// Build a pack from images already on disk
    Package {
        /// Composite grid image
        #[arg(long)]
        composite: PathBuf,
        /// Banner source image (any size)
        #[arg(long)]
        banner: PathBuf,
        /// Logo source image (any size)
        #[arg(long)]
        logo: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[command(flatten)]
        pack: PackArgs,
    },
    /// Cut a composite image into grid cells
    Slice {
        composite: PathBuf,
        #[arg(long)]
        columns: Option<u32>,
        #[arg(long)]
        rows: Option<u32>,
    },
    /// Cover-fit one image to an exact size
    Fit {
        image: PathBuf,
        /// Which pack asset the image is; sets the default size and name
        #[arg(long, value_enum, default_value_t = FitKind::Banner)]
        kind: FitKind,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// Output file name
        #[arg(long)]
        name: Option<String>,
    },
    /// Print a stock pack.toml with all options documented
    GenConfig,
}

#[derive(ValueEnum, Clone, Copy)]
enum FitKind {
    Banner,
    Logo,
}

impl From<FitKind> for FittedKind {
    fn from(kind: FitKind) -> Self {
        match kind {
            FitKind::Banner => FittedKind::Banner,
            FitKind::Logo => FittedKind::Logo,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate {
            prompt,
            reference,
            pack,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);

            let mut params = GenerationParams::new(prompt);
            if let Some(path) = reference {
                params = params.with_reference(ReferenceImage::from_path(&path)?);
            }
            let generator = GeminiGenerator::new(
                config.generator.clone(),
                config.grid_spec(),
                EnvApiKey::from_config(&config.generator),
            )?;

            println!("==> Generating pack \u{2192} {}", cli.output.display());
            let target = output_target(&cli.output, &pack);
            let outcome = with_progress(|tx| {
                pipeline::run(
                    &generator,
                    &RustBackend::new(),
                    &params,
                    &config,
                    &target,
                    &CancelToken::new(),
                    Some(&tx),
                )
            })?;
            output::print_pack_summary(&outcome);
        }
        Command::Package {
            composite,
            banner,
            logo,
            title,
            description,
            pack,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);

            let assets = LocalAssets {
                composite,
                banner,
                logo,
                metadata: Metadata { title, description },
            };

            println!("==> Packaging local assets \u{2192} {}", cli.output.display());
            let target = output_target(&cli.output, &pack);
            let outcome = with_progress(|tx| {
                pipeline::run(
                    &assets,
                    &RustBackend::new(),
                    &GenerationParams::default(),
                    &config,
                    &target,
                    &CancelToken::new(),
                    Some(&tx),
                )
            })?;
            output::print_pack_summary(&outcome);
        }
        Command::Slice {
            composite,
            columns,
            rows,
        } => {
            let mut config = config::load_config(&cli.config)?;
            if let Some(columns) = columns {
                config.grid.columns = columns;
            }
            if let Some(rows) = rows {
                config.grid.rows = rows;
            }
            config.validate()?;
            init_thread_pool(&config.processing);

            let bytes = std::fs::read(&composite)?;
            let slices = slice_composite(
                &RustBackend::new(),
                &bytes,
                config.grid_spec(),
                &config.slice_options(),
            )?;
            std::fs::create_dir_all(&cli.output)?;
            for slice in &slices {
                std::fs::write(cli.output.join(&slice.file_name), &slice.bytes)?;
            }
            output::print_slice_output(&slices, &cli.output);
        }
        Command::Fit {
            image,
            kind,
            width,
            height,
            name,
        } => {
            let config = config::load_config(&cli.config)?;
            let kind = FittedKind::from(kind);
            let (default_w, default_h) = default_size(&config, kind);
            let target = (width.unwrap_or(default_w), height.unwrap_or(default_h));

            let bytes = std::fs::read(&image)?;
            let asset = fit_encoded(
                &RustBackend::new(),
                &bytes,
                kind,
                target,
                config.encode_options(),
            )?;
            std::fs::create_dir_all(&cli.output)?;
            let path = cli.output.join(name.as_deref().unwrap_or(&asset.file_name));
            std::fs::write(&path, &asset.bytes)?;
            println!("{}", output::format_fitted(&asset, Some(&path)));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run a pipeline step while a printer thread formats its progress events.
fn with_progress(
    step: impl FnOnce(Sender<PackEvent>) -> Result<PackOutcome, PackError>,
) -> Result<PackOutcome, Box<dyn std::error::Error>> {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_pack_event(&event) {
                println!("{}", line);
            }
        }
    });
    // `step` owns the sender; the printer loop ends when it is dropped.
    let result = step(tx);
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    Ok(result?)
}

fn output_target(dir: &Path, pack: &PackArgs) -> OutputTarget {
    OutputTarget {
        dir: dir.to_path_buf(),
        extract: pack.extract,
    }
}

fn default_size(config: &PackConfig, kind: FittedKind) -> (u32, u32) {
    match kind {
        FittedKind::Banner => config.banner_size(),
        FittedKind::Logo => config.logo_size(),
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
