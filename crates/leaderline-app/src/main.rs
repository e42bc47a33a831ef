//! Main application entry point (native).

#[cfg(feature = "native")]
fn main() {
    use clap::Parser;
    use log::LevelFilter;
    use std::str::FromStr;

    let args = leaderline_app::Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", args.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    log::info!("Starting LeaderLine");
    log::debug!("Parsed arguments: {args:?}");

    if let Err(err) = pollster::block_on(leaderline_app::run(&args)) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
