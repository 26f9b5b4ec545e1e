use clap::Parser;
use sealstore::cli::{describe_error, Cli, Commands, KekAction};

fn main() {
    let cli = Cli::parse();
    sealstore::logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Put {
            ref path,
            ref value,
            ref version_id,
        } => sealstore::cli::commands::put::execute(
            &cli,
            path,
            value.as_deref(),
            version_id.as_deref(),
        ),
        Commands::Get {
            ref path,
            ref version_id,
            json,
        } => sealstore::cli::commands::get::execute(&cli, path, version_id, json),
        Commands::Versions { ref path } => sealstore::cli::commands::versions::execute(&cli, path),
        Commands::Paths => sealstore::cli::commands::paths::execute(&cli),
        Commands::Inspect {
            ref path,
            ref version_id,
        } => sealstore::cli::commands::inspect::execute(&cli, path, version_id),
        Commands::Delete { ref path, force } => {
            sealstore::cli::commands::delete::execute(&cli, path, force)
        }
        Commands::Kek { ref action } => match action {
            KekAction::Init => sealstore::cli::commands::kek::execute_init(&cli),
            KekAction::Info => sealstore::cli::commands::kek::execute_info(&cli),
        },
    };

    if let Err(e) = result {
        let reveal = sealstore::cli::load_settings()
            .map(|s| s.reveal_error_detail)
            .unwrap_or(false);
        let (message, code) = describe_error(&e, reveal);
        sealstore::cli::output::error(&message);
        std::process::exit(code);
    }
}
