use elo_ladder::{cli, telemetry};

fn main() {
    let cli = cli::parse_from(std::env::args_os());
    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("elobot: {e}");
            std::process::exit(1);
        }
    };

    let telemetry_guard = telemetry::init(telemetry::TelemetryConfig::new(
        cli.verbose,
        config.logging.clone(),
    ));

    if let Err(e) = cli::run(cli, config) {
        drop(telemetry_guard);
        eprintln!("elobot: {e}");
        std::process::exit(1);
    }
}
