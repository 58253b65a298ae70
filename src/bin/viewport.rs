use poagraph_view::{ColumnRange, LayoutBase, LayoutInterface};
use poagraph_view::formats;

use std::time::Instant;
use std::{env, io, process};

use getopts::Options;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();
    env_logger::init();

    // Parse arguments.
    let config = Config::new()?;

    // Open the database.
    let database = LayoutBase::open(&config.filename)?;
    let mut interface = LayoutInterface::new(&database)?;

    // Select the window.
    let window = interface.viewport(config.range()?)?;
    eprintln!(
        "Columns {}: {} nodes and {} edges",
        window.range, window.nodes.len(), window.edges.len()
    );

    // JSON output.
    let mut output = io::stdout().lock();
    formats::write_json(&window, &mut output, config.pretty).map_err(|x| x.to_string())?;

    let end_time = Instant::now();
    let seconds = end_time.duration_since(start_time).as_secs_f64();
    eprintln!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

pub struct Config {
    pub filename: String,
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub pretty: bool,
}

impl Config {
    pub fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("s", "start", "first column of the window", "INT");
        opts.optopt("e", "end", "last column of the window (inclusive)", "INT");
        opts.optflag("p", "pretty", "indent the JSON output");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        let mut start: Option<usize> = None;
        let mut end: Option<usize> = None;
        if matches.opt_present("h") {
            let header = format!("Usage: {} [options] layout.db", program);
            eprint!("{}", opts.usage(&header));
            eprintln!();
            eprintln!("Without --start and --end, the window covers 30% to 60% of the columns.");
            process::exit(0);
        }
        if let Some(s) = matches.opt_str("s") {
            start = Some(s.parse::<usize>().map_err(|x| format!("--start: {}", x))?);
        }
        if let Some(s) = matches.opt_str("e") {
            end = Some(s.parse::<usize>().map_err(|x| format!("--end: {}", x))?);
        }
        let pretty = matches.opt_present("p");

        let filename = if let Some(s) = matches.free.first() {
            s.clone()
        } else {
            let header = format!("Usage: {} [options] layout.db", program);
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };

        Ok(Config { filename, start, end, pretty })
    }

    // The window requires both ends or neither.
    pub fn range(&self) -> Result<Option<ColumnRange>, String> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Ok(Some(ColumnRange::new(start, end))),
            (None, None) => Ok(None),
            _ => Err(String::from("Options --start and --end must be used together")),
        }
    }
}

//-----------------------------------------------------------------------------
