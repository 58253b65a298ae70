use poagraph_view::{ConsensusTree, Frontier, TreeLayout, TreeLayoutParams};
use poagraph_view::formats::{self, PruneRecord, TreeNodeElement, TreeSegment};

use std::time::Instant;
use std::{env, io, process};

use getopts::Options;
use serde::Serialize;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();
    env_logger::init();

    // Parse arguments.
    let config = Config::new()?;

    // Load the tree.
    let dataset = formats::read_dataset(&config.filename)?;
    let records = dataset.tree.unwrap_or_default();
    if records.is_empty() {
        log::warn!("Dataset {} does not contain a consensus tree", config.filename);
    }
    let tree = ConsensusTree::from_records(&records)?;

    // Layout and cut.
    let layout = TreeLayout::new(&tree, &config.params);
    let frontier = Frontier::new(&tree, config.threshold);
    eprintln!(
        "Threshold {}: {} visible and {} hidden tree nodes",
        config.threshold, frontier.visible.len(), frontier.hidden.len()
    );

    // JSON output.
    let output = TreeOutput {
        nodes: layout.node_elements(),
        segments: layout.segments(),
        prune: frontier.to_record(&tree),
    };
    let mut stdout = io::stdout().lock();
    formats::write_json(&output, &mut stdout, config.pretty).map_err(|x| x.to_string())?;

    let end_time = Instant::now();
    let seconds = end_time.duration_since(start_time).as_secs_f64();
    eprintln!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

#[derive(Serialize)]
struct TreeOutput {
    nodes: Vec<TreeNodeElement>,
    segments: Vec<TreeSegment>,
    prune: PruneRecord,
}

//-----------------------------------------------------------------------------

pub struct Config {
    pub filename: String,
    pub threshold: f64,
    pub params: TreeLayoutParams,
    pub pretty: bool,
}

impl Config {
    pub fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("t", "threshold", "compatibility threshold in [0, 1] (default 0.5)", "FLOAT");
        opts.optflag("", "no-normalize", "use raw compatibilities as x coordinates");
        opts.optflag("p", "pretty", "indent the JSON output");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        let mut threshold: f64 = 0.5;
        if matches.opt_present("h") {
            let header = format!("Usage: {} [options] dataset.json[.gz]", program);
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }
        if let Some(s) = matches.opt_str("t") {
            threshold = s.parse::<f64>().map_err(|x| format!("--threshold: {}", x))?;
        }
        if !(0.0..=1.0).contains(&threshold) {
            return Err(format!("Threshold must be in [0, 1], got {}", threshold));
        }
        let params = TreeLayoutParams {
            normalize_x: !matches.opt_present("no-normalize"),
            ..TreeLayoutParams::default()
        };
        let pretty = matches.opt_present("p");

        let filename = if let Some(s) = matches.free.first() {
            s.clone()
        } else {
            let header = format!("Usage: {} [options] dataset.json[.gz]", program);
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };

        Ok(Config { filename, threshold, params, pretty })
    }
}

//-----------------------------------------------------------------------------
