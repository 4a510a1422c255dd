use clap::Parser;
use sailc_drv::{init_logging, run, Config};

fn main() {
    let config = Config::parse();
    init_logging(config.verbose);
    std::process::exit(run(&config));
}
