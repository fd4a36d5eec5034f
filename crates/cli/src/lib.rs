use anyhow::{Context, Result};
use byte_range::{respond, ByteSource};
use clap::{Parser, Subcommand};
use doc_model::{PageNumber, ReaderState, Scale, ViewMode};
use serde::Serialize;
use simplelog::{LevelFilter, WriteLogger};
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use viewer_config::ViewerConfig;
use viewer_core::{
    paginated_visible_pages, preload_window, select_layout, PageBitmap, PageRange, PageSession,
    PreloadRequest, PreloadWindow, RangeHistory, RenderPriority,
};

#[derive(Debug, Parser)]
#[command(name = "folio-cli")]
#[command(about = "Folio viewer core CLI")]
pub struct Cli {
    /// Configuration file to use instead of the platform default.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the preload window around a page.
    Preload {
        #[arg(long, default_value_t = 1)]
        page: PageNumber,
        #[arg(long, default_value_t = 1)]
        pages: u32,
        /// single, double or scroll; unknown names fall back to single.
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        zoom_index: Option<usize>,
    },
    /// Merge page ranges in the order given and print what is retained.
    Merge {
        #[arg(long = "range", value_name = "START-END", required = true)]
        ranges: Vec<PageRange>,
        #[arg(long)]
        retention: Option<usize>,
    },
    /// Choose which visible pages to present.
    Layout {
        #[arg(long, value_delimiter = ',', required = true)]
        visible: Vec<PageNumber>,
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        zoom_index: Option<usize>,
        /// Rendered bitmap size at the current scale.
        #[arg(long = "bitmap", value_name = "PAGE:WxH")]
        bitmaps: Vec<BitmapArg>,
    },
    /// Plan rendering for a freshly opened document.
    Plan {
        #[arg(long)]
        pages: u32,
        #[arg(long, default_value_t = 1)]
        page: PageNumber,
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        zoom_index: Option<usize>,
        /// Defaults to the page, or the spread starting at it in double mode.
        #[arg(long, value_delimiter = ',')]
        visible: Vec<PageNumber>,
    },
    /// Answer a byte-range request for a file.
    Range {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Value of the Range header, e.g. "bytes=0-1023".
        #[arg(long)]
        header: Option<String>,
        /// Write the response body here.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the effective configuration.
    Config,
    /// Print CLI version.
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BitmapArg {
    page: PageNumber,
    width: u32,
    height: u32,
}

impl FromStr for BitmapArg {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("expected PAGE:WIDTHxHEIGHT, got `{value}`");

        let (page, size) = value.split_once(':').ok_or_else(invalid)?;
        let (width, height) = size
            .split_once(|c: char| c.eq_ignore_ascii_case(&'x'))
            .ok_or_else(invalid)?;

        Ok(Self {
            page: page.trim().parse().map_err(|_| invalid())?,
            width: width.trim().parse().map_err(|_| invalid())?,
            height: height.trim().parse().map_err(|_| invalid())?,
        })
    }
}

#[derive(Debug, Serialize)]
struct WindowOutput {
    pages: Vec<PageNumber>,
    scale: f64,
    scale_key: String,
}

impl From<&PreloadWindow> for WindowOutput {
    fn from(window: &PreloadWindow) -> Self {
        Self {
            pages: window.pages.clone(),
            scale: window.scale.value(),
            scale_key: window.scale.key(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MergeOutput {
    ranges: Vec<[PageNumber; 2]>,
}

#[derive(Debug, Serialize)]
struct LayoutOutput {
    mode: ViewMode,
    pages: Vec<PageNumber>,
}

#[derive(Debug, Serialize)]
struct JobOutput {
    page: PageNumber,
    priority: &'static str,
}

#[derive(Debug, Serialize)]
struct PlanOutput {
    window: WindowOutput,
    to_render: Vec<PageNumber>,
    layout: Vec<PageNumber>,
    ranges: Vec<[PageNumber; 2]>,
    jobs: Vec<JobOutput>,
}

#[derive(Debug, Serialize)]
struct RangeOutput {
    status: u16,
    headers: BTreeMap<&'static str, String>,
    body_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    let config = ViewerConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_logging(cli.verbose, &config)?;

    match cli.command {
        Commands::Preload { page, pages, mode, zoom_index } => {
            let request = PreloadRequest {
                current_page: page,
                view_mode: resolve_mode(mode.as_deref(), &config),
                zoom_index: zoom_index.unwrap_or(config.default_zoom_index),
                pages_count: pages,
            };
            print_json(&WindowOutput::from(&preload_window(&request)))
        }
        Commands::Merge { ranges, retention } => {
            let retention = retention.unwrap_or(config.session_limits().range_retention);
            let mut history = RangeHistory::new(retention);
            for range in ranges {
                history.record(range);
            }
            print_json(&MergeOutput { ranges: as_pairs(history.ranges()) })
        }
        Commands::Layout { visible, mode, zoom_index, bitmaps } => {
            let mode = resolve_mode(mode.as_deref(), &config);
            let scale = Scale::from_zoom_index(zoom_index.unwrap_or(config.default_zoom_index));
            let sizes: HashMap<PageNumber, (u32, u32)> =
                bitmaps.iter().map(|bitmap| (bitmap.page, (bitmap.width, bitmap.height))).collect();
            let lookup = |page: PageNumber, _scale: Scale| sizes.get(&page).copied();

            print_json(&LayoutOutput { mode, pages: select_layout(mode, &visible, scale, &lookup) })
        }
        Commands::Plan { pages, page, mode, zoom_index, visible } => {
            let view_mode = resolve_mode(mode.as_deref(), &config);
            let visible_pages = if visible.is_empty() {
                paginated_visible_pages(view_mode, page, pages)
            } else {
                visible
            };
            let state = ReaderState {
                current_page: page,
                view_mode,
                zoom_index: zoom_index.unwrap_or(config.default_zoom_index),
                pages_count: pages,
                visible_pages,
            };
            run_plan(&state, &config)
        }
        Commands::Range { file, header, output } => {
            run_range(&file, header.as_deref(), output.as_deref())
        }
        Commands::Config => print_json(&config),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_logging(verbose: bool, config: &ViewerConfig) -> Result<()> {
    let level = if verbose { LevelFilter::Debug } else { config.log_level_filter()? };

    if WriteLogger::init(level, simplelog::Config::default(), std::io::stderr()).is_err() {
        log::debug!("logger already installed");
    }

    Ok(())
}

fn resolve_mode(name: Option<&str>, config: &ViewerConfig) -> ViewMode {
    name.map(ViewMode::from_name).unwrap_or(config.default_view_mode)
}

fn run_plan(state: &ReaderState, config: &ViewerConfig) -> Result<()> {
    let mut session = PageSession::<PageBitmap>::new(&config.session_limits());
    let plan = session.plan(state);

    let jobs = std::iter::from_fn(|| session.next_job())
        .map(|job| JobOutput {
            page: job.key.page,
            priority: match job.priority {
                RenderPriority::Visible => "visible",
                RenderPriority::Prefetch => "prefetch",
            },
        })
        .collect();

    print_json(&PlanOutput {
        window: WindowOutput::from(&plan.window),
        to_render: plan.to_render,
        layout: plan.layout,
        ranges: as_pairs(session.ranges()),
        jobs,
    })
}

fn run_range(file: &Path, header: Option<&str>, output: Option<&Path>) -> Result<()> {
    ensure_file_exists(file)?;

    let response = respond(&ByteSource::from(file), header)
        .with_context(|| format!("failed to read {}", file.display()))?;

    if let Some(output) = output {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, &response.body)
            .with_context(|| format!("failed to write body to {}", output.display()))?;
    }

    print_json(&RangeOutput {
        status: response.status,
        headers: response.headers.iter().cloned().collect(),
        body_len: response.body.len(),
        output: output.map(|path| path.display().to_string()),
    })
}

fn ensure_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

fn as_pairs(ranges: &[PageRange]) -> Vec<[PageNumber; 2]> {
    ranges.iter().map(|range| [range.start(), range.end()]).collect()
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_args_parse_page_and_size() {
        let parsed = "3:800x600".parse::<BitmapArg>();

        assert_eq!(parsed, Ok(BitmapArg { page: 3, width: 800, height: 600 }));
        assert!("3-800x600".parse::<BitmapArg>().is_err());
        assert!("3:800".parse::<BitmapArg>().is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
