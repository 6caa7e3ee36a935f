//! Wirecell - field maps of wire-chamber cells
//!
//! Evaluates the electric field of a cell description at given points or
//! along a straight line and writes the values as tab-separated columns.
//!
//! # Usage
//!
//! ```bash
//! wirecell mwpc.cell --point 0.1,0.2,0 --point 0.2,0.1,0
//! wirecell mwpc.cell --from 0,-0.5,0 --to 0,0.5,0 --steps 200 > scan.tsv
//! wirecell mwpc.cell --from 0,-0.5,0 --to 0,0.5,0 --weighting anode
//! ```

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use log::info;
use wirecell_core::{dsl, error::Result, AnalyticField, FieldError};

/// Electric and weighting fields of wire-chamber cells
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the cell description file
    #[arg(value_name = "CELL_FILE")]
    cell_file: PathBuf,

    /// Evaluation point as x,y,z in cm (repeatable)
    #[arg(short, long, value_parser = parse_point, allow_hyphen_values = true)]
    point: Vec<[f64; 3]>,

    /// Start of a line scan as x,y,z
    #[arg(long, value_parser = parse_point, requires = "to", allow_hyphen_values = true)]
    from: Option<[f64; 3]>,

    /// End of a line scan as x,y,z
    #[arg(long, value_parser = parse_point, requires = "from", allow_hyphen_values = true)]
    to: Option<[f64; 3]>,

    /// Number of intervals in a line scan
    #[arg(long, default_value_t = 100)]
    steps: usize,

    /// Print the weighting field of this readout group instead
    #[arg(short, long)]
    weighting: Option<String>,

    /// Log the cell type, bounding box, voltage range and wire charges
    #[arg(short, long)]
    summary: bool,

    /// Bessel terms of the point-charge series
    #[arg(long)]
    nbessel: Option<usize>,

    /// Polynomial terms of the point-charge series
    #[arg(long)]
    npoly: Option<usize>,

    /// Fourier copies per periodic axis for weighting fields
    #[arg(long)]
    nfourier: Option<usize>,

    /// Log the residual of the charge solve
    #[arg(long)]
    check: bool,
}

fn parse_point(text: &str) -> std::result::Result<[f64; 3], String> {
    let coords = text
        .split(',')
        .map(|c| dsl::parse_value(c).ok_or_else(|| format!("invalid coordinate '{c}'")))
        .collect::<std::result::Result<Vec<f64>, String>>()?;
    match coords[..] {
        [x, y, z] => Ok([x, y, z]),
        [x, y] => Ok([x, y, 0.0]),
        _ => Err(format!("expected x,y[,z], got '{text}'")),
    }
}

/// Points to evaluate: the explicit ones, then the line scan.
fn sample_points(args: &Args) -> Vec<[f64; 3]> {
    let mut points = args.point.clone();
    if let (Some(a), Some(b)) = (args.from, args.to) {
        let n = args.steps.max(1);
        points.extend((0..=n).map(|i| {
            let t = i as f64 / n as f64;
            [0, 1, 2].map(|k| a[k] + t * (b[k] - a[k]))
        }));
    }
    points
}

fn configure(field: &mut AnalyticField, args: &Args) {
    if let Some(n) = args.nbessel {
        field.set_n_term_bessel(n);
    }
    if let Some(n) = args.npoly {
        field.set_n_term_poly(n);
    }
    if let Some(n) = args.nfourier {
        field.set_n_fourier(n);
    }
    if args.check {
        field.set_charge_check(true);
    }
}

fn summarize(field: &mut AnalyticField) -> Result<()> {
    field.prepare()?;
    if let Some(kind) = field.cell_type() {
        info!("cell type: {}", kind);
    }
    if let Some(bb) = field.bounding_box() {
        info!(
            "bounding box: x [{}, {}], y [{}, {}], z [{}, {}]",
            bb.xmin, bb.xmax, bb.ymin, bb.ymax, bb.zmin, bb.zmax
        );
    }
    if let Some((vmin, vmax)) = field.voltage_range() {
        info!("voltage range: [{}, {}] V", vmin, vmax);
    }
    field.print_charges();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.summary || args.check { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let ast = dsl::parse_file(&args.cell_file)?;
    let mut field = ast.build()?;
    configure(&mut field, &args);

    if args.summary {
        summarize(&mut field)?;
    }

    let points = sample_points(&args);
    if points.is_empty() && !args.summary {
        return Err(FieldError::invalid(
            "command line",
            "give at least one --point or a --from/--to scan",
        ));
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let io_error = |e: io::Error| FieldError::invalid("output", e.to_string());

    match &args.weighting {
        Some(label) => {
            if !field.readout_groups().contains(label) {
                field.add_readout(label);
            }
            field.prepare_signals()?;
            writeln!(out, "x\ty\tz\twx\twy\twz\tw").map_err(io_error)?;
            for [x, y, z] in points {
                let (wx, wy, wz) = field.weighting_field(x, y, z, label);
                let w = field.weighting_potential(x, y, z, label);
                writeln!(out, "{x}\t{y}\t{z}\t{wx:e}\t{wy:e}\t{wz:e}\t{w:e}").map_err(io_error)?;
            }
        }
        None => {
            writeln!(out, "x\ty\tz\tstatus\tex\tey\tez\tv").map_err(io_error)?;
            for [x, y, z] in points {
                let (status, e) = field.electric_field_potential(x, y, z);
                writeln!(
                    out,
                    "{x}\t{y}\t{z}\t{status}\t{:e}\t{:e}\t{:e}\t{:e}",
                    e.ex, e.ey, e.ez, e.v
                )
                .map_err(io_error)?;
            }
        }
    }
    out.flush().map_err(io_error)
}
