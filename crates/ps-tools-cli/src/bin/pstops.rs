use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};

use ps_impose::select::{self, Selection};
use ps_impose::{dimen, dsc, paper, parse_specs, rearrange, Dims, RearrangeOptions};

#[derive(Parser)]
#[command(
    name = "pstops",
    about = "Rearrange pages of a PostScript document",
    version,
    disable_help_flag = true
)]
struct Cli {
    /// Suppress informational output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Disable bind operators in the prologue
    #[arg(short = 'b', long = "nobind")]
    nobind: bool,

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

    /// Select only even-numbered pages
    #[arg(short = 'e', long = "even", conflicts_with = "odd")]
    even: bool,

    /// Select only odd-numbered pages
    #[arg(short = 'o', long = "odd")]
    odd: bool,

    /// Reverse the order of the selected pages
    #[arg(short = 'r', long = "reverse")]
    reverse: bool,

    /// Select page ranges, e.g. 1-4,7,_2-_1
    #[arg(short = 'R', long = "pages", value_name = "RANGES")]
    ranges: Option<String>,

    /// Output sheet width
    #[arg(short = 'w', long = "width", value_name = "DIMEN")]
    width: Option<String>,

    /// Output sheet height
    #[arg(short = 'h', long = "height", value_name = "DIMEN")]
    height: Option<String>,

    /// Output paper name
    #[arg(short = 'p', long = "paper", value_name = "NAME")]
    paper: Option<String>,

    /// Input page width
    #[arg(short = 'W', long = "inwidth", value_name = "DIMEN")]
    in_width: Option<String>,

    /// Input page height
    #[arg(short = 'H', long = "inheight", value_name = "DIMEN")]
    in_height: Option<String>,

    /// Input paper name
    #[arg(short = 'P', long = "inpaper", value_name = "NAME")]
    in_paper: Option<String>,

    /// Page specifications: [MODULO:]SPEC, SPEC = [-]PAGENO[L|R|U|H|V][@SCALE][(XOFF,YOFF)]
    /// joined by "," (new sheet) or "+" (same sheet)
    #[arg(value_name = "PAGESPECS", allow_hyphen_values = true)]
    pagespecs: String,

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

/// Resolve a paper name, or a width/height pair, into sheet dimensions.
/// Dimension arguments may use the w/h suffixes once a paper name fixed them.
fn resolve_size(
    name: Option<&str>,
    width: Option<&str>,
    height: Option<&str>,
    which: &str,
) -> Result<Option<Dims>> {
    let mut size = match name {
        Some(name) => {
            Some(paper::paper_size(name).with_context(|| format!("paper size '{name}' not recognised"))?)
        }
        None => None,
    };
    if width.is_some() || height.is_some() {
        let (Some(width), Some(height)) = (width, height) else {
            bail!("{which} page width and height must both be set, or neither");
        };
        let width = dimen::single_dimen(width, size)?;
        let height = dimen::single_dimen(height, size)?;
        size = Some(Dims::new(width, height));
    }
    Ok(size)
}

fn run(cli: &Cli) -> Result<()> {
    let size = resolve_size(
        cli.paper.as_deref(),
        cli.width.as_deref(),
        cli.height.as_deref(),
        "output",
    )?;
    let in_size = resolve_size(
        cli.in_paper.as_deref(),
        cli.in_width.as_deref(),
        cli.in_height.as_deref(),
        "input",
    )?;
    let draw = match cli.draw.as_deref() {
        Some(text) => dimen::single_dimen(text, size)?,
        None => 0.0,
    };

    let parsed = parse_specs(&cli.pagespecs, size)?;

    let mut infile = match &cli.infile {
        Some(path) => dsc::seekable(
            File::open(path)
                .with_context(|| format!("can't open input file {}", path.display()))?,
        )?,
        None => dsc::spool(io::stdin().lock())?,
    };
    let index = dsc::scan(&mut infile)?;

    let selection = Selection {
        ranges: match &cli.ranges {
            Some(text) => select::parse_ranges(text)?,
            None => Vec::new(),
        },
        odd: cli.odd,
        even: cli.even,
        reverse: cli.reverse,
    };
    let page_list = select::select_pages(&selection, index.pages())?;

    let options = RearrangeOptions {
        modulo: parsed.modulo,
        nobind: cli.nobind,
        draw,
        paper: size,
        page_size: in_size,
    };

    match &cli.outfile {
        Some(path) => {
            let out = File::create(path)
                .with_context(|| format!("can't open output file {}", path.display()))?;
            rearrange(
                &mut infile,
                &index,
                &page_list,
                &parsed.specs,
                &options,
                BufWriter::new(out),
            )?;
        }
        None => {
            rearrange(
                &mut infile,
                &index,
                &page_list,
                &parsed.specs,
                &options,
                BufWriter::new(io::stdout().lock()),
            )?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.quiet { "warn" } else { "info" }),
    )
    .format_timestamp(None)
    .format_level(false)
    .format_target(false)
    .init();
    run(&cli)
}
