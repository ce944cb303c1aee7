// polysync CLI entry point.

use clap::Parser;

mod commands;
mod exit_code;
mod output;
mod workspace;

use exit_code::ExitCode;

#[derive(Parser)]
#[command(name = "polysync", about = "Local document editing with inline AI transforms")]
struct Cli {
    #[command(flatten)]
    globals: workspace::GlobalOpts,

    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match commands::run(cli.command, &cli.globals).await {
        Ok(()) => ExitCode::Success.into(),
        Err(e) => ExitCode::from_error(&e).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_transform_with_range() {
        let cli = Cli::try_parse_from([
            "polysync", "--data-dir", "/tmp/x", "transform", "doc", "--action", "formal", "--range", "0..8",
        ])
        .unwrap();
        assert_eq!(cli.globals.data_dir.as_deref(), Some(std::path::Path::new("/tmp/x")));
        let commands::Command::Transform(args) = cli.command else { panic!("expected transform") };
        assert_eq!(args.range, Some(0..8));
    }

    #[test]
    fn chat_requires_message_or_quick() {
        assert!(Cli::try_parse_from(["polysync", "chat", "doc"]).is_err());
        assert!(Cli::try_parse_from(["polysync", "chat", "doc", "--quick", "6"]).is_err());
        assert!(Cli::try_parse_from(["polysync", "chat", "doc", "--quick", "2"]).is_ok());
    }
}
