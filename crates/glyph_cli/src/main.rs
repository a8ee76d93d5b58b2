use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glyph_match::{FontSheet, GlyphImage, GlyphMatcher, MatchConfig, SheetLayout};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and compare glyphs cut from bitmap font sheets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print one cell of a font sheet as ASCII art
    Preview(PreviewArgs),
    /// Run every matcher on two cells and print the verdicts
    Compare(CompareArgs),
    /// Write the ASCII art of every non-empty cell to text files
    Dump(DumpArgs),
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Font sheet image path
    sheet: PathBuf,
    /// Cell column
    #[arg(long)]
    column: usize,
    /// Cell row
    #[arg(long)]
    row: usize,
    /// Show the whole cell instead of the clipped glyph
    #[arg(long, default_value_t = false)]
    raw: bool,
    #[command(flatten)]
    layout: LayoutSettings,
}

#[derive(Parser, Debug)]
struct CompareArgs {
    /// Font sheet image path
    sheet: PathBuf,
    /// First cell, as COLUMN,ROW
    #[arg(long, value_parser = parse_cell)]
    first: (usize, usize),
    /// Second cell, as COLUMN,ROW
    #[arg(long, value_parser = parse_cell)]
    second: (usize, usize),
    /// Rows the second glyph is raised by relative to the first
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    offset: i32,
    /// Columns between the glyphs when measuring their distance
    #[arg(long, default_value_t = 0)]
    separation: usize,
    /// Share of the first glyph's width that must match exactly in diagonal matching
    #[arg(long, default_value_t = 0.0)]
    perfect_match_ratio: f64,
    /// Columns the second glyph may reach back into the first in diagonal matching
    #[arg(long, default_value_t = 0)]
    overlap: usize,
    #[command(flatten)]
    layout: LayoutSettings,
    #[command(flatten)]
    matching: MatchSettings,
}

#[derive(Parser, Debug)]
struct DumpArgs {
    /// Font sheet image, or a directory searched for sheets
    input: PathBuf,
    /// Output directory for the text files
    #[arg(short, long)]
    out_dir: PathBuf,
    #[command(flatten)]
    layout: LayoutSettings,
}

#[derive(Args, Debug, Clone)]
struct LayoutSettings {
    /// Cells per sheet row
    #[arg(long, default_value_t = 20)]
    columns: usize,
    /// Baseline position as a fraction of the cell size
    #[arg(long, default_value_t = 0.65)]
    baseline_ratio: f64,
    /// Keep the grid lines along the top and left edge of each cell
    #[arg(long, default_value_t = false)]
    keep_edges: bool,
}

#[derive(Args, Debug, Clone)]
struct MatchSettings {
    /// Largest difference tolerated between two pixels
    #[arg(long, default_value_t = glyph_match::DEFAULT_MAX_PIXEL_DIFF)]
    max_pixel_diff: u32,
    /// Difference total tolerated by exact and left matching
    #[arg(long, default_value_t = glyph_match::DEFAULT_MAX_TOTAL_DIFF)]
    max_total_diff: u32,
    /// Area-proportional tolerance of right and diagonal matching
    #[arg(long, default_value_t = glyph_match::DEFAULT_MAX_DIFF_RATIO)]
    max_diff_ratio: f64,
    /// Mismatching pixels diagonal matching may absorb
    #[arg(long, default_value_t = glyph_match::DEFAULT_MAX_SOFT_TAKEN_PIXELS)]
    max_soft_taken_pixels: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Preview(args) => preview(args),
        Commands::Compare(args) => compare(args),
        Commands::Dump(args) => dump(args),
    }
}

fn preview(args: PreviewArgs) -> Result<()> {
    let sheet = open_sheet(&args.sheet, &args.layout)?;
    let glyph = sheet.glyph(args.column, args.row, !args.raw)?;
    let raster = glyph
        .raster()
        .with_context(|| format!("failed to decode cell ({}, {})", args.column, args.row))?;

    if raster.is_empty() {
        info!("Cell ({}, {}) is blank", args.column, args.row);
        return Ok(());
    }

    println!("{}x{}, baseline {}", raster.width(), raster.height(), raster.baseline());
    for row in raster.rows() {
        println!("|{}|", row);
    }

    Ok(())
}

fn compare(args: CompareArgs) -> Result<()> {
    let sheet = open_sheet(&args.sheet, &args.layout)?;
    let matcher = GlyphMatcher::new(args.matching.to_config());
    let first = load_cell(&sheet, args.first)?;
    let second = load_cell(&sheet, args.second)?;

    match (first.to_clipped(), second.to_clipped()) {
        (Ok(a), Ok(b)) => println!("exact:         {}", matcher.exact_match(&a, &b, args.offset)),
        _ => println!("exact:         n/a (blank cell)"),
    }
    println!("pixel perfect: {}", matcher.pixel_perfect_match(&first, &second)?);

    let left = matcher.left_match(&first, &second, args.offset)?;
    match left.first_diff_column {
        Some(column) => println!("left:          {} (first difference at column {})", left.is_match, column),
        None => println!("left:          {}", left.is_match),
    }
    println!("right:         {}", matcher.right_match(&first, &second, args.offset)?);

    let diagonal = matcher.left_diagonal_match(
        &first,
        args.perfect_match_ratio,
        args.overlap,
        &second,
        args.offset,
    )?;
    println!("diagonal:      {}", diagonal);

    let test_width = first.width()?.min(second.width()?);
    println!(
        "compatible:    {} (over {} columns)",
        matcher.is_compatible(&first, &second, test_width)?,
        test_width
    );
    println!("distance:      {:.3}", matcher.distance(&first, &second, args.separation)?);

    Ok(())
}

fn dump(args: DumpArgs) -> Result<()> {
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create output directory {:?}", args.out_dir))?;

    let sheets = find_sheets(&args.input)?;
    let progress = ProgressBar::new(sheets.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} sheets",
        )
        .context("invalid progress template")?
        .progress_chars("=> "),
    );

    let mut written = 0;
    for path in &sheets {
        let sheet = match open_sheet(path, &args.layout) {
            Ok(sheet) => sheet,
            Err(err) => {
                warn!("Skipping {:?}: {:#}", path, err);
                progress.inc(1);
                continue;
            },
        };

        let stem = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or("sheet");
        let out_path = args.out_dir.join(format!("{}.txt", stem));
        write_sheet(&sheet, &out_path)?;
        written += 1;
        progress.inc(1);
    }

    progress.finish_with_message(format!("{} sheet(s) written to {:?}", written, args.out_dir));
    info!("Dumped {} of {} sheet(s)", written, sheets.len());
    Ok(())
}

fn write_sheet(sheet: &Arc<FontSheet>, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
    let mut out = BufWriter::new(file);

    for (column, row, glyph) in sheet.glyphs(true) {
        let raster = glyph
            .raster()
            .with_context(|| format!("failed to decode cell ({}, {})", column, row))?;
        if raster.is_empty() {
            continue;
        }

        writeln!(out, "# {},{} baseline {}", column, row, raster.baseline())?;
        for line in raster.rows() {
            writeln!(out, "{}", line)?;
        }
        writeln!(out)?;
    }

    out.flush().with_context(|| format!("failed to write {:?}", path))?;
    Ok(())
}

fn find_sheets(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut entries: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().to_path_buf())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .collect();
    entries.sort();
    if entries.is_empty() {
        anyhow::bail!("no font sheets found in {:?}", path);
    }

    Ok(entries)
}

fn open_sheet(path: &Path, layout: &LayoutSettings) -> Result<Arc<FontSheet>> {
    let sheet = FontSheet::open(path, layout.to_layout())
        .with_context(|| format!("failed to open font sheet {:?}", path))?;
    Ok(Arc::new(sheet))
}

fn load_cell(sheet: &Arc<FontSheet>, (column, row): (usize, usize)) -> Result<GlyphImage> {
    let glyph = sheet.glyph(column, row, true)?;
    glyph.materialize().with_context(|| format!("failed to decode cell ({}, {})", column, row))?;
    Ok(glyph)
}

fn parse_cell(value: &str) -> Result<(usize, usize), String> {
    let (column, row) =
        value.split_once(',').ok_or_else(|| format!("expected COLUMN,ROW, got {:?}", value))?;
    let parse = |part: &str| {
        part.trim().parse::<usize>().map_err(|err| format!("invalid cell index {:?}: {}", part, err))
    };
    Ok((parse(column)?, parse(row)?))
}

impl LayoutSettings {
    fn to_layout(&self) -> SheetLayout {
        SheetLayout {
            columns: self.columns,
            baseline_ratio: self.baseline_ratio,
            clear_edges: !self.keep_edges,
        }
    }
}

impl MatchSettings {
    fn to_config(&self) -> MatchConfig {
        MatchConfig {
            max_pixel_diff: self.max_pixel_diff,
            max_total_diff: self.max_total_diff,
            max_diff_ratio: self.max_diff_ratio.max(0.0),
            max_soft_taken_pixels: self.max_soft_taken_pixels,
        }
    }
}
