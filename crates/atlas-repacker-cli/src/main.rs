use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use atlas_repacker_core::compositing::{DebugRects, debug_view};
use atlas_repacker_core::{
    Alignment, InputImage, RegionSource, RepackConfig, RepackOutput, parse_manifest, repack,
    to_json,
};
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::{DynamicImage, ImageReader};
use serde::Deserialize;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "atlas-repacker",
    about = "Detect sprites (or read .atlas manifests) and repack them into new atlas sheets",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Repack the sprites of one or more images into new sheet(s)
    Pack(PackArgs),
    /// Count region names across every .atlas file under a directory
    Count(CountArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Input images; regions are numbered in this order
    #[arg(required = true, help_heading = "Input/Output")]
    inputs: Vec<PathBuf>,
    /// Output image; extra sheets are written as <stem>_<n>.<ext>
    #[arg(short, long, default_value = "output.png", help_heading = "Input/Output")]
    output: PathBuf,
    /// Read regions from the .atlas file next to each image instead of detecting islands
    #[arg(long, default_value_t = false, help_heading = "Input/Output")]
    atlas: bool,
    /// Comma separated region names to keep (with --atlas, case-sensitive)
    #[arg(long, help_heading = "Input/Output")]
    filter: Option<String>,
    /// YAML config file; values set there override the flags
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    // Layout
    /// Sheet width
    #[arg(short = 'w', long, default_value_t = 512, help_heading = "Layout")]
    width: u32,
    /// Sheet height
    #[arg(short = 'H', long, default_value_t = 512, help_heading = "Layout")]
    height: u32,
    /// Extra pixels reserved around each region (total per axis)
    #[arg(long, default_value_t = 1, help_heading = "Layout")]
    margin: u32,
    /// Placement inside the margin: 0 = top left, 1 = center, 2 = bottom right
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=2), help_heading = "Layout")]
    align: u8,
    /// Spill regions that do not fit into additional sheets
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    multi_sheet: bool,

    // Detection
    /// Treat diagonally touching pixels as connected
    #[arg(long, default_value_t = false, help_heading = "Detection")]
    diagonal: bool,

    // Search
    /// Find the smallest square sheet whose side is a multiple of N (overrides -w/-H)
    #[arg(long, value_name = "N", help_heading = "Search")]
    find_min_square: Option<u32>,
    /// Find the largest margin that still packs every region
    #[arg(long, default_value_t = false, help_heading = "Search")]
    find_max_margin: bool,

    // Export
    /// Write debug.png showing the source rects found in the first image
    #[arg(long, default_value_t = false, help_heading = "Export")]
    debug: bool,
    /// Write the placements as JSON to this file
    #[arg(long, help_heading = "Export")]
    json: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute the layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct CountArgs {
    /// Directory to search for .atlas files
    dir: PathBuf,
    /// Exclude patterns (glob). Files matching any pattern are ignored
    #[arg(long)]
    exclude: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
        Commands::Count(args) => run_count(args),
    }
}

fn run_pack(cli: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let mut cfg = RepackConfig::builder()
        .with_dimensions(cli.width, cli.height)
        .margin(cli.margin)
        .alignment(Alignment::from_index(cli.align).unwrap_or_default())
        .diagonal(cli.diagonal)
        .region_source(if cli.atlas {
            RegionSource::Manifest
        } else {
            RegionSource::Islands
        })
        .min_square(cli.find_min_square)
        .find_max_margin(cli.find_max_margin)
        .multi_sheet(cli.multi_sheet)
        .build();
    if let Some(filter) = &cli.filter {
        cfg.name_filter = Some(parse_filter(filter));
    }
    if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg = y.into_repack_config(cfg)?;
    }

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }
    cfg.validate()?;
    if cli.filter.is_some() && cfg.region_source == RegionSource::Islands {
        warn!("--filter only applies to manifest regions; islands have no names");
    }

    let inputs = load_inputs_with_progress(&cli.inputs, cfg.region_source, show_progress)?;
    info!(count = inputs.len(), "loaded input images");
    let first_dims = inputs
        .first()
        .map(|i| (i.image.width(), i.image.height()))
        .unwrap_or((0, 0));

    let t0 = Instant::now();
    let out = repack(inputs, cfg)?;
    info!(elapsed_ms = t0.elapsed().as_millis() as u64, "repack finished");

    if let Some(fit) = out.square {
        println!("Calculated output size (W&H): {}", fit.side);
    }
    if cli.find_max_margin {
        println!("Margin chosen: {}", out.margin);
    }
    if !out.unpacked.is_empty() {
        println!("Note: {} regions couldn't be packed", out.unpacked.len());
    }
    println!("{}", out.stats().summary());

    if cli.dry_run {
        return Ok(());
    }

    if cli.debug {
        write_debug_view(&out, &cli.output, first_dims, cli.inputs.len())?;
    }
    write_sheets(&out, &cli.output)?;
    if let Some(json_path) = &cli.json {
        let text = serde_json::to_string_pretty(&to_json(&out))?;
        fs::write(json_path, text)
            .with_context(|| format!("write {}", json_path.display()))?;
    }
    Ok(())
}

fn write_sheets(out: &RepackOutput, output: &Path) -> anyhow::Result<()> {
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
    }
    let many = out.sheets.len() > 1;
    for s in &out.sheets {
        let path = if many {
            sheet_path(output, s.sheet.id)
        } else {
            output.to_path_buf()
        };
        s.rgba
            .save(&path)
            .with_context(|| format!("write {}", path.display()))?;
        info!(path = %path.display(), regions = s.sheet.boxes.len(), "sheet written");
    }
    Ok(())
}

fn write_debug_view(
    out: &RepackOutput,
    output: &Path,
    (width, height): (u32, u32),
    input_count: usize,
) -> anyhow::Result<()> {
    let boxes: Vec<_> = out.boxes().cloned().collect();
    let img = debug_view(&boxes, width, height, DebugRects::Source, 0);
    let path = output.with_file_name("debug.png");
    img.save(&path)
        .with_context(|| format!("write {}", path.display()))?;
    println!("{} has been written", path.display());
    if input_count > 1 {
        println!("NOTE: only the first image you loaded has been debugged.");
    }
    Ok(())
}

/// `out.png` -> `out_<id>.png`.
fn sheet_path(output: &Path, id: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".into());
    output.with_file_name(format!("{stem}_{id}.{ext}"))
}

/// Manifest path for an image: `foo/bar.png` -> `foo/bar.atlas`.
fn manifest_path_for(image_path: &Path) -> PathBuf {
    image_path.with_extension("atlas")
}

fn parse_filter(s: &str) -> BTreeSet<String> {
    s.split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from)
        .collect()
}

fn load_inputs_with_progress(
    paths: &[PathBuf],
    source: RegionSource,
    progress: bool,
) -> anyhow::Result<Vec<InputImage>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        let image = load_image(p).with_context(|| format!("load image {}", p.display()))?;
        let key = p.to_string_lossy().replace('\\', "/");
        let mut input = InputImage::new(key, image);
        if source == RegionSource::Manifest {
            let atlas = manifest_path_for(p);
            match fs::read_to_string(&atlas) {
                Ok(text) => input.manifest = Some(text),
                Err(e) => warn!(path = %atlas.display(), error = %e, "cannot read manifest"),
            }
        }
        list.push(input);
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn load_image(p: &Path) -> anyhow::Result<DynamicImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img)
}

fn run_count(args: &CountArgs) -> anyhow::Result<()> {
    let exclude = build_globset(&args.exclude)?;
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut files = 0usize;
    for entry in WalkDir::new(&args.dir).into_iter().filter_map(|e| e.ok()) {
        let p = entry.path();
        if !p.is_file() || !is_manifest(p) {
            continue;
        }
        let s = p.to_string_lossy().replace('\\', "/");
        if exclude.as_ref().is_some_and(|ex| ex.is_match(&s)) {
            continue;
        }
        let text = match fs::read_to_string(p) {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %p.display(), error = %e, "cannot read manifest");
                continue;
            }
        };
        match parse_manifest(&text) {
            Ok(m) => {
                files += 1;
                for r in m.regions() {
                    *counts.entry(r.name.clone()).or_default() += 1;
                }
            }
            Err(e) => warn!(path = %p.display(), error = %e, "skipping manifest"),
        }
    }
    info!(files, names = counts.len(), "manifests counted");
    for (name, n) in rank_counts(counts) {
        println!("{name}: {n}");
    }
    Ok(())
}

/// Highest count first; equal counts by name.
fn rank_counts(counts: HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut v: Vec<(String, usize)> = counts.into_iter().collect();
    v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    v
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat)?);
    }
    Ok(Some(b.build()?))
}

fn is_manifest(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("atlas"))
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct YamlConfig {
    width: Option<u32>,
    height: Option<u32>,
    margin: Option<u32>,
    align: Option<String>,
    diagonal: Option<bool>,
    atlas: Option<bool>,
    filter: Option<Vec<String>>,
    find_min_square: Option<u32>,
    find_max_margin: Option<bool>,
    multi_sheet: Option<bool>,
}

impl YamlConfig {
    fn into_repack_config(self, mut cfg: RepackConfig) -> anyhow::Result<RepackConfig> {
        if let Some(v) = self.width {
            cfg.width = v;
        }
        if let Some(v) = self.height {
            cfg.height = v;
        }
        if let Some(v) = self.margin {
            cfg.margin = v;
        }
        if let Some(v) = self.align {
            cfg.alignment = v
                .parse()
                .map_err(|_| anyhow::anyhow!("unknown align value: {v}"))?;
        }
        if let Some(v) = self.diagonal {
            cfg.diagonal = v;
        }
        if let Some(v) = self.atlas {
            cfg.region_source = if v {
                RegionSource::Manifest
            } else {
                RegionSource::Islands
            };
        }
        if let Some(v) = self.filter {
            cfg.name_filter = Some(v.into_iter().collect());
        }
        if let Some(v) = self.find_min_square {
            cfg.min_square = Some(v);
        }
        if let Some(v) = self.find_max_margin {
            cfg.find_max_margin = v;
        }
        if let Some(v) = self.multi_sheet {
            cfg.multi_sheet = v;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_sits_next_to_image() {
        assert_eq!(
            manifest_path_for(Path::new("foo/bar.png")),
            PathBuf::from("foo/bar.atlas")
        );
        assert_eq!(
            manifest_path_for(Path::new("noext")),
            PathBuf::from("noext.atlas")
        );
    }

    #[test]
    fn extra_sheets_get_numbered_names() {
        assert_eq!(
            sheet_path(Path::new("out/atlas.png"), 2),
            PathBuf::from("out/atlas_2.png")
        );
        assert_eq!(sheet_path(Path::new("sheet"), 0), PathBuf::from("sheet_0.png"));
    }

    #[test]
    fn filter_is_split_and_trimmed() {
        let f = parse_filter("head, arm,,Leg ");
        let names: Vec<&str> = f.iter().map(String::as_str).collect();
        assert_eq!(names, ["Leg", "arm", "head"]);
    }

    #[test]
    fn counts_rank_by_frequency_then_name() {
        let counts: HashMap<String, usize> = [("b", 2), ("a", 2), ("c", 5)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let ranked = rank_counts(counts);
        let order: Vec<&str> = ranked.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }

    #[test]
    fn yaml_overrides_flags() {
        let y: YamlConfig =
            serde_yaml::from_str("margin: 3\nalign: top_left\natlas: true\nfilter: [head]\n")
                .unwrap();
        let cfg = y.into_repack_config(RepackConfig::default()).unwrap();
        assert_eq!(cfg.margin, 3);
        assert_eq!(cfg.alignment, Alignment::TopLeft);
        assert_eq!(cfg.region_source, RegionSource::Manifest);
        assert!(cfg.name_filter.unwrap().contains("head"));
    }

    #[test]
    fn yaml_rejects_bad_alignment() {
        let y: YamlConfig = serde_yaml::from_str("align: middle\n").unwrap();
        assert!(y.into_repack_config(RepackConfig::default()).is_err());
    }
}
