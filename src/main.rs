use clap::Parser;
use log::{debug, error};

mod advice;
mod args;

fn main() {
    let args = args::Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    debug!("main: args: {:?}", args);

    if let Err(e) = advice::run(&args) {
        error!("{:?}", e);
        eprintln!("An error occured: {}", e);
        std::process::exit(1);
    }
}
