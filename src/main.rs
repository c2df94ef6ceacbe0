use std::time::Duration;

use clap::Parser;
use cut_layout::config::SolverConfig;
use cut_layout::render;
use cut_layout::request::{MaterialKind, OptimizeRequest, PieceRequest, StockRequest};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "cut_layout",
    about = "Rectangular cutting layout optimizer for sheets and rolls"
)]
struct Cli {
    /// Stock dimensions (WxH, e.g. 2440x1220); with --roll only the width is used
    #[arg(long)]
    stock: String,

    /// Pieces as [id=]WxH[:qty] (e.g. door=800x600:3 400x300:5)
    #[arg(long = "cuts", num_args = 1..)]
    cuts: Vec<String>,

    /// Blade kerf width in mm
    #[arg(long, default_value_t = 0)]
    kerf: u32,

    /// Disable piece rotation (grain lock)
    #[arg(long)]
    no_rotate: bool,

    /// Treat the stock as a roll of unbounded length
    #[arg(long)]
    roll: bool,

    /// Add the exact model to every tournament
    #[arg(long)]
    exact: bool,

    /// Time budget for each exact model run
    #[arg(long, default_value_t = 20_000)]
    exact_time_limit_ms: u64,

    /// Largest piece count the exact model will take on
    #[arg(long, default_value_t = 12)]
    exact_max_items: usize,

    /// Skip the pass that tries to save a sheet
    #[arg(long)]
    no_refine: bool,

    /// Material thickness in mm
    #[arg(long, default_value_t = 0.0)]
    thickness: f64,

    /// Cut depth per pass in mm
    #[arg(long, default_value_t = 0.0)]
    depth_per_pass: f64,

    /// Cutting speed in mm per minute
    #[arg(long, default_value_t = 0.0)]
    cutting_speed: f64,

    /// Show ASCII layout of each bin
    #[arg(long)]
    layout: bool,

    /// Print the response as JSON
    #[arg(long)]
    json: bool,

    /// Log search progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_dimensions(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("invalid dimensions '{}', expected WxH", s))?;
    let w = w
        .parse::<u32>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let h = h
        .parse::<u32>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    Ok((w, h))
}

fn parse_cut(s: &str, n: usize) -> Result<PieceRequest, String> {
    let (id, rest) = match s.split_once('=') {
        Some((id, rest)) => (id.to_string(), rest),
        None => (n.to_string(), s),
    };
    let (dims, quantity) = match rest.split_once(':') {
        Some((dims, qty)) => (
            dims,
            qty.parse::<u32>()
                .map_err(|_| format!("invalid quantity in '{}'", s))?,
        ),
        None => (rest, 1),
    };
    let (width, height) = parse_dimensions(dims)?;
    Ok(PieceRequest {
        id,
        width,
        height,
        quantity,
        grain_locked: false,
    })
}

fn build_request(cli: &Cli) -> Result<OptimizeRequest, String> {
    let (width, height) = if cli.roll && !cli.stock.contains('x') {
        let width = cli
            .stock
            .parse::<u32>()
            .map_err(|_| format!("invalid roll width '{}'", cli.stock))?;
        (width, 0)
    } else {
        parse_dimensions(&cli.stock)?
    };
    let pieces = cli
        .cuts
        .iter()
        .enumerate()
        .map(|(i, c)| parse_cut(c, i + 1))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OptimizeRequest {
        material: if cli.roll {
            MaterialKind::Roll
        } else {
            MaterialKind::Sheet
        },
        stock: StockRequest { width, height },
        pieces,
        kerf: cli.kerf,
        grain_lock: cli.no_rotate,
        cutting_speed: cli.cutting_speed,
        thickness: cli.thickness,
        depth_per_pass: cli.depth_per_pass,
        exact: Some(cli.exact),
        exact_time_limit_ms: Some(cli.exact_time_limit_ms),
        exact_max_items: Some(cli.exact_max_items),
    })
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let request = build_request(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let config = SolverConfig::default()
        .with_refine(!cli.no_refine)
        .with_exact_time_limit(Duration::from_millis(cli.exact_time_limit_ms))
        .with_exact_max_items(cli.exact_max_items);
    let response = request.solve(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if cli.json {
        match serde_json::to_string_pretty(&response) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    for bin in &response.bins {
        println!(
            "Bin {} ({}, {:.1}% used):",
            bin.index, bin.dimensions, bin.efficiency_percent
        );
        for p in &bin.placements {
            let rot = if p.rotated { " [rotated]" } else { "" };
            println!("  {} {} @ ({}, {}){}", p.id, p.rect, p.x, p.y, rot);
        }
        if cli.layout {
            print!("{}", render::render_bin(bin.dimensions, &bin.placements));
        }
        println!();
    }

    if !response.impossible_ids.is_empty() {
        println!("Impossible: {}", response.impossible_ids.join(", "));
    }
    if !response.unplaced_ids.is_empty() {
        println!("Unplaced: {}", response.unplaced_ids.join(", "));
    }

    let m = &response.metrics;
    println!(
        "Summary: {} bin{} used, {}/{} pieces placed, {:.1}% waste, {} mm cut{}",
        m.bins_used,
        if m.bins_used == 1 { "" } else { "s" },
        m.placed_pieces,
        m.total_pieces,
        m.waste_percent,
        m.total_cut_length,
        if m.estimated_cut_time > 0.0 {
            format!(", ~{:.1} min over {} pass(es)", m.estimated_cut_time, m.passes)
        } else {
            String::new()
        },
    );
}
