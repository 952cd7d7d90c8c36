use std::env;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};

use ps_impose::{dimen, dsc, nup, paper, Dims, NupOptions};

#[derive(Parser)]
#[command(
    name = "psnup",
    about = "Put multiple pages of a PostScript document on to one page",
    version,
    disable_help_flag = true
)]
struct Cli {
    /// Suppress informational output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Draw a border around each placed page (line width, default 1pt)
    #[arg(
        short = 'd',
        long = "draw",
        value_name = "DIMEN",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "1"
    )]
    draw: Option<String>,

    /// Landscape pages, rotated left
    #[arg(short = 'l', long = "rotatedleft")]
    rotated_left: bool,

    /// Landscape pages, rotated right
    #[arg(short = 'r', long = "rotatedright")]
    rotated_right: bool,

    /// Swap output sheet width and height
    #[arg(short = 'f', long = "flip")]
    flip: bool,

    /// Fill cells in column-major order
    #[arg(short = 'c', long = "columns")]
    column: bool,

    /// Output sheet width
    #[arg(short = 'w', long = "width", value_name = "DIMEN")]
    width: Option<String>,

    /// Output sheet height
    #[arg(short = 'h', long = "height", value_name = "DIMEN")]
    height: Option<String>,

    /// Input page width
    #[arg(short = 'W', long = "inwidth", value_name = "DIMEN")]
    in_width: Option<String>,

    /// Input page height
    #[arg(short = 'H', long = "inheight", value_name = "DIMEN")]
    in_height: Option<String>,

    /// Output paper name
    #[arg(short = 'p', long = "paper", value_name = "NAME")]
    paper: Option<String>,

    /// Output paper name (alias kept for compatibility)
    #[arg(short = 'P', long = "inpaper", value_name = "NAME")]
    in_paper: Option<String>,

    /// Margin around the whole sheet
    #[arg(short = 'm', long = "margin", value_name = "DIMEN", default_value = "0")]
    margin: String,

    /// Border inside each grid cell
    #[arg(short = 'b', long = "border", value_name = "DIMEN", default_value = "0")]
    border: String,

    /// Largest acceptable wasted-area score
    #[arg(short = 't', long = "tolerance", value_name = "NUMBER", default_value = "100000")]
    tolerance: f64,

    /// Override the computed page scale
    #[arg(short = 's', long = "scale", value_name = "NUMBER")]
    scale: Option<f64>,

    /// Pages per output sheet
    #[arg(short = 'n', long = "nup", value_name = "N", default_value = "1")]
    nup: usize,

    /// Input file (default standard input)
    #[arg(value_name = "INFILE")]
    infile: Option<PathBuf>,

    /// Output file (default standard output)
    #[arg(value_name = "OUTFILE")]
    outfile: Option<PathBuf>,

    /// Print help
    #[arg(long, action = ArgAction::HelpLong)]
    help: Option<bool>,
}

/// Accept the traditional `-N` page counts (`psnup -4`) by rewriting them to
/// `-n N` before parsing.
fn rewrite_digit_args(args: impl Iterator<Item = String>) -> Vec<String> {
    let mut rewritten = Vec::new();
    for arg in args {
        let rest = arg.strip_prefix('-').unwrap_or("");
        if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
            rewritten.push("-n".to_string());
            rewritten.push(rest.to_string());
        } else {
            rewritten.push(arg);
        }
    }
    rewritten
}

fn run(cli: &Cli) -> Result<()> {
    if cli.nup < 1 {
        bail!("number of pages per sheet must be positive");
    }

    let named = match cli.paper.as_deref().or(cli.in_paper.as_deref()) {
        Some(name) => {
            Some(paper::paper_size(name).with_context(|| format!("paper size '{name}' not recognised"))?)
        }
        None => None,
    };
    let sheet = match (&cli.width, &cli.height) {
        (Some(width), Some(height)) => Dims::new(
            dimen::single_dimen(width, named)?,
            dimen::single_dimen(height, named)?,
        ),
        (None, None) => named.unwrap_or_else(paper::default_paper),
        _ => bail!("output page width and height must both be set, or neither"),
    };

    let input_paper = match (&cli.in_width, &cli.in_height) {
        (Some(width), Some(height)) => Some(Dims::new(
            dimen::single_dimen(width, Some(sheet))?,
            dimen::single_dimen(height, Some(sheet))?,
        )),
        (None, None) => None,
        _ => bail!("input page width and height must both be set, or neither"),
    };

    let mut options = NupOptions::new(cli.nup, sheet);
    options.input_paper = input_paper;
    options.margin = dimen::single_dimen(&cli.margin, Some(sheet))?;
    options.border = dimen::single_dimen(&cli.border, Some(sheet))?;
    options.tolerance = cli.tolerance;
    options.scale = cli.scale;
    options.flip = cli.flip;
    options.draw = match cli.draw.as_deref() {
        Some(text) => dimen::single_dimen(text, Some(sheet))?,
        None => 0.0,
    };
    // -l and -r pick the two landscape reading orders, -c swaps the fill
    // direction; each toggles so they compose.
    if cli.rotated_left {
        options.column = !options.column;
        options.topbottom = !options.topbottom;
    }
    if cli.rotated_right {
        options.column = !options.column;
        options.leftright = !options.leftright;
    }
    if cli.column {
        options.column = !options.column;
    }

    let mut infile = match &cli.infile {
        Some(path) => dsc::seekable(
            File::open(path)
                .with_context(|| format!("can't open input file {}", path.display()))?,
        )?,
        None => dsc::spool(io::stdin().lock())?,
    };
    let index = dsc::scan(&mut infile)?;

    match &cli.outfile {
        Some(path) => {
            let out = File::create(path)
                .with_context(|| format!("can't open output file {}", path.display()))?;
            nup(&mut infile, &index, &options, BufWriter::new(out))?;
        }
        None => {
            nup(&mut infile, &index, &options, BufWriter::new(io::stdout().lock()))?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse_from(rewrite_digit_args(env::args()));
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.quiet { "warn" } else { "info" }),
    )
    .format_timestamp(None)
    .format_level(false)
    .format_target(false)
    .init();
    run(&cli)
}
