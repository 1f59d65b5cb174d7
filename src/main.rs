use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use chartmeta::archive::{ScanOptions, DEFAULT_MAX_MANIFEST_SIZE};
use chartmeta::commands;
use chartmeta::patch::{PatchTool, DEFAULT_STRIP, PATCH_PROGRAM};
use chartmeta::{Metadata, MetadataLoader, PatchStrategy};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "chartmeta")]
#[command(about = "Read and patch Helm chart metadata from packaged charts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the metadata of a packaged chart
    Metadata {
        /// Path to the chart archive (.tgz)
        chart: PathBuf,

        /// Unified diff to apply to Chart.yaml before reporting
        #[arg(short, long)]
        patch: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
        format: Format,

        #[command(flatten)]
        loader: LoaderArgs,
    },
    /// Extract the raw Chart.yaml from a packaged chart
    Extract {
        /// Path to the chart archive (.tgz)
        chart: PathBuf,

        /// Write the manifest here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Largest manifest accepted, in bytes
        #[arg(long, default_value_t = DEFAULT_MAX_MANIFEST_SIZE)]
        max_size: u64,
    },
    /// Check charts for the rancher-version and kube-version catalog annotations
    Check {
        /// Chart archives to check
        #[arg(required = true)]
        charts: Vec<PathBuf>,

        /// Directory to save the lists of failing charts in
        #[arg(long)]
        out_dir: Option<PathBuf>,

        #[command(flatten)]
        loader: LoaderArgs,
    },
}

#[derive(Args)]
struct LoaderArgs {
    /// How a patch is applied to Chart.yaml
    #[arg(long, value_enum, default_value_t = Strategy::RoundTrip)]
    strategy: Strategy,

    /// Patch executable to run
    #[arg(long, default_value = PATCH_PROGRAM)]
    patch_program: String,

    /// Leading path components to strip from file names in the patch
    #[arg(long, default_value_t = DEFAULT_STRIP)]
    strip: u32,

    /// Largest manifest accepted, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_MANIFEST_SIZE)]
    max_size: u64,
}

impl LoaderArgs {
    fn loader(&self) -> MetadataLoader {
        let strategy = match self.strategy {
            Strategy::DirectiveScan => PatchStrategy::DirectiveScan,
            Strategy::RoundTrip => PatchStrategy::FilesystemRoundTrip,
        };
        MetadataLoader::new(strategy)
            .with_patch_tool(PatchTool::new(&self.patch_program).with_strip(self.strip))
            .with_scan_options(ScanOptions {
                max_manifest_size: self.max_size,
            })
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// Take the chart name from `+name:` lines in the patch
    DirectiveScan,
    /// Apply the patch with the patch tool in a temporary directory
    RoundTrip,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

fn render(metadata: &Metadata, format: Format) -> Result<String, String> {
    match format {
        Format::Yaml => serde_yaml::to_string(metadata).map_err(|e| e.to_string()),
        Format::Json => serde_json::to_string_pretty(metadata)
            .map(|s| s + "\n")
            .map_err(|e| e.to_string()),
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Metadata {
            chart,
            patch,
            format,
            loader,
        } => match commands::metadata::run(&chart, patch.as_deref(), &loader.loader()) {
            Ok(metadata) => match render(&metadata, format) {
                Ok(rendered) => print!("{}", rendered),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(2);
                }
            },
            Err(e) => {
                eprintln!("Error: {}", e);
                if let Some(partial) = e.partial_metadata() {
                    eprintln!("Partially loaded: name={:?} version={:?}", partial.name, partial.version);
                }
                process::exit(2);
            }
        },
        Commands::Extract {
            chart,
            output,
            max_size,
        } => {
            let options = ScanOptions {
                max_manifest_size: max_size,
            };
            match commands::extract::run(&chart, output.as_deref(), &options) {
                Ok(manifest) => {
                    if let Some(output) = output {
                        println!("{} -> {}", manifest.entry_path, output.display());
                    } else if let Err(e) = io::stdout().write_all(&manifest.data) {
                        eprintln!("Error: {}", e);
                        process::exit(2);
                    }
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(2);
                }
            }
        }
        Commands::Check {
            charts,
            out_dir,
            loader,
        } => match commands::check::run(&charts, &loader.loader(), out_dir.as_deref()) {
            Ok(report) => {
                println!("Checked {} charts", report.checked);
                for id in &report.no_rancher_version {
                    println!("Missing rancher-version annotation: {}", id);
                }
                for id in &report.no_kube_version {
                    println!("Missing kube-version annotation: {}", id);
                }
                for (chart, reason) in &report.failed {
                    println!("Failed to load {}: {}", chart.display(), reason);
                }
                if !report.passed() {
                    process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(2);
            }
        },
    }
}
