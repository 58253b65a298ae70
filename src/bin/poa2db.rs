use std::time::Instant;
use std::{env, fs, process};

use poagraph_view::{LayoutBase, LayoutParams};
use poagraph_view::utils;

use getopts::Options;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();
    env_logger::init();

    // Parse arguments.
    let config = Config::new()?;

    // Check if the database already exists.
    if utils::file_exists(&config.db_file) {
        if config.overwrite {
            eprintln!("Overwriting database {}", config.db_file);
            fs::remove_file(&config.db_file).map_err(|x| x.to_string())?;
        } else {
            return Err(format!("Database {} already exists", config.db_file));
        }
    }

    // Create the database.
    LayoutBase::create_from_file(&config.json_file, &config.db_file, &config.params)?;

    // Statistics.
    let database = LayoutBase::open(&config.db_file)?;
    eprintln!(
        "The layout contains {} nodes, {} edges, {} columns, and {} chains",
        database.nodes(), database.edges(), database.columns(), database.chains()
    );
    eprintln!("Dataset key: {}", database.key());
    if let Some(size) = database.file_size() {
        eprintln!("Database size: {}", size);
    }

    let end_time = Instant::now();
    let seconds = end_time.duration_since(start_time).as_secs_f64();
    eprintln!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub json_file: String,
    pub db_file: String,
    pub overwrite: bool,
    pub params: LayoutParams,
}

impl Config {
    pub fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("o", "output", "output file name (default: <input>.db)", "FILE");
        opts.optflag("", "overwrite", "overwrite the database file if it exists");
        opts.optopt("s", "spacing", "distance between columns and stacked nodes (default 10)", "FLOAT");
        opts.optopt("l", "lane-step", "distance between candidate lanes for chains (default: spacing)", "FLOAT");
        opts.optflag("", "no-compaction", "do not compact unbranched chains");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        let mut db_file: Option<String> = None;
        if matches.opt_present("h") {
            let header = format!("Usage: {} [options] dataset.json[.gz]", program);
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }
        if let Some(s) = matches.opt_str("o") {
            db_file = Some(s);
        }

        let mut params = LayoutParams::default();
        if let Some(s) = matches.opt_str("s") {
            params.spacing = s.parse::<f64>().map_err(|x| format!("--spacing: {}", x))?;
            params.lane_step = params.spacing;
        }
        if let Some(s) = matches.opt_str("l") {
            params.lane_step = s.parse::<f64>().map_err(|x| format!("--lane-step: {}", x))?;
        }
        params.compact_paths = !matches.opt_present("no-compaction");
        params.validate()?;

        let json_file = if let Some(s) = matches.free.first() {
            s.clone()
        } else {
            let header = format!("Usage: {} [options] dataset.json[.gz]", program);
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };
        let db_file = db_file.unwrap_or_else(|| format!("{}.db", json_file));

        let overwrite = matches.opt_present("overwrite");

        Ok(Config {
            json_file,
            db_file,
            overwrite,
            params,
        })
    }
}

//-----------------------------------------------------------------------------
