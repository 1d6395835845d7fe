// Command-line front end: life simulation and autotile rendering

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use girder::{
    autotile::{autotile, blob_index, render_walls},
    life::{Generation, Rule},
    recorder::{FrameRecorder, PlaybackMeta, RunConfig, RunHeader},
    Grid,
};
use log::{debug, info, warn};

#[derive(Debug, Parser)]
#[command(name = "girder")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a life-like automaton from a random soup
    Life {
        #[arg(long, default_value_t = 64)]
        width: i32,
        #[arg(long, default_value_t = 32)]
        height: i32,
        /// Rule in B/S notation
        #[arg(long, default_value = "B3/S23")]
        rule: String,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Probability of a cell starting alive
        #[arg(long, default_value_t = 0.35)]
        density: f64,
        #[arg(long, default_value_t = 200)]
        steps: u64,
        /// Record every Nth generation
        #[arg(long, default_value_t = 10)]
        save_interval: u64,
        /// Write recorded frames here
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print the final generation
        #[arg(long)]
        print: bool,
    },
    /// Render a wall map with box-drawing tiles
    Autotile {
        /// ASCII map, `#` marks a wall
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 40)]
        width: i32,
        #[arg(long, default_value_t = 16)]
        height: i32,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[arg(long, default_value_t = 0.45)]
        density: f64,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::Life {
            width,
            height,
            rule,
            seed,
            density,
            steps,
            save_interval,
            output,
            print,
        } => {
            check_dimensions(width, height)?;
            check_density(density)?;
            if save_interval == 0 {
                bail!("--save-interval must be at least 1");
            }
            let rule: Rule = rule.parse()?;
            let config = RunConfig {
                width,
                height,
                rule: rule.to_string(),
                seed,
                density,
            };
            run_life(config, rule, steps, save_interval, output.as_deref(), print)
        }
        Command::Autotile {
            input,
            width,
            height,
            seed,
            density,
        } => {
            let walls = match input {
                Some(path) => load_map(&path)?,
                None => {
                    check_dimensions(width, height)?;
                    check_density(density)?;
                    Generation::seeded(width, height, density, seed, Rule::conway()).cells
                }
            };
            run_autotile(&walls);
            Ok(())
        }
    }
}

fn check_dimensions(width: i32, height: i32) -> Result<()> {
    if width < 0 || height < 0 {
        bail!("--width and --height must not be negative, got {width}x{height}");
    }
    Ok(())
}

fn check_density(density: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&density) {
        bail!("--density must be within [0, 1], got {density}");
    }
    Ok(())
}

fn run_life(
    config: RunConfig,
    rule: Rule,
    steps: u64,
    save_interval: u64,
    output: Option<&Path>,
    print: bool,
) -> Result<()> {
    println!("🧫 Girder - Life");
    println!("================\n");

    let mut generation =
        Generation::seeded(config.width, config.height, config.density, config.seed, rule);
    println!(
        "🔧 {}x{} grid, rule {}, seed {}",
        config.width, config.height, rule, config.seed
    );
    println!("   Initial population: {}\n", generation.population());

    let mut recorder = match output {
        Some(path) => {
            let header = RunHeader::new(
                config.clone(),
                PlaybackMeta {
                    total_frames: (steps / save_interval) as usize,
                    save_interval,
                },
            );
            println!("💾 Recording frames to {path:?} (every {save_interval} steps)\n");
            Some(FrameRecorder::create(path, header)?)
        }
        None => None,
    };

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("failed to install Ctrl-C handler")?;
    }

    let mut last_report_time = Instant::now();
    let mut steps_since_last_report = 0u64;

    for step in 1..=steps {
        if !running.load(Ordering::SeqCst) {
            warn!("interrupted at step {step}");
            break;
        }

        generation.advance();
        steps_since_last_report += 1;

        if step % save_interval == 0 {
            if let Some(recorder) = recorder.as_mut() {
                recorder.write_frame(&generation.cells)?;
            }
        }

        if step % 20 == 0 {
            let elapsed = last_report_time.elapsed().as_secs_f64();
            let sps = steps_since_last_report as f64 / elapsed.max(f64::EPSILON);
            println!(
                "  Step {}: Population = {}, Steps/s = {:.1}",
                step,
                generation.population(),
                sps
            );

            last_report_time = Instant::now();
            steps_since_last_report = 0;
        }
    }

    if let Some(recorder) = recorder {
        let frames = recorder.frames_written();
        recorder.finish()?;
        println!("✅ Recorded {} frames.", frames);
    }

    info!(
        "finished at generation {} with population {}",
        generation.number,
        generation.population()
    );

    if print {
        println!();
        print!("{}", render_cells(&generation.cells));
    }
    Ok(())
}

fn run_autotile(walls: &Grid<bool>) {
    let masks = autotile(walls, false, |c| *c);
    let mut variants = HashSet::new();

    for y in 0..walls.height() {
        for x in 0..walls.width() {
            if let (Some(true), Some(mask)) = (walls.cell(x, y), masks.cell(x, y)) {
                variants.insert(blob_index(*mask));
            }
        }
    }

    print!("{}", render_walls(walls));
    println!("\n🧱 {} distinct blob variants used", variants.len());
}

fn render_cells(cells: &Grid<bool>) -> String {
    let mut out = String::new();
    for y in 0..cells.height() {
        for x in 0..cells.width() {
            out.push(if cells.get(x, y).0 { '█' } else { '·' });
        }
        out.push('\n');
    }
    out
}

/// Reads an ASCII map where `#` is a wall. Short rows are padded with floor.
fn load_map(path: &Path) -> Result<Grid<bool>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read map: {path:?}"))?;
    let rows: Vec<&str> = text.lines().collect();

    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let width = i32::try_from(width).context("map is too wide")?;
    let height = i32::try_from(rows.len()).context("map is too tall")?;
    if width == 0 || height == 0 {
        bail!("map {path:?} is empty");
    }
    debug!("loaded {width}x{height} map from {path:?}");

    let mut walls = Grid::new(width, height);
    for (y, row) in (0..).zip(&rows) {
        for (x, ch) in (0..).zip(row.chars()) {
            walls.set(x, y, ch == '#');
        }
    }
    Ok(walls)
}
