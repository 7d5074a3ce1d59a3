//! CLI module for the trip prediction gateway
//!
//! Subcommands:
//! - `serve`: HTTP prediction service (default)
//! - `check`: validate configuration and the model artifact, then exit

pub mod check;
pub mod serve;

use clap::{Parser, Subcommand};

/// Trip Predict Gateway - cache-aside trip duration / fare predictions
#[derive(Parser)]
#[command(name = "trip-predict-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP prediction service (default)
    Serve(serve::ServeArgs),

    /// Load configuration and model, run the feature self-check and exit
    Check,
}

impl Cli {
    /// Subcommand to run, `serve` when none is given
    pub fn command(self) -> Command {
        self.command
            .unwrap_or_else(|| Command::Serve(serve::ServeArgs::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::try_parse_from(["trip-predict-gateway"]).unwrap();
        assert_eq!(cli.command(), Command::Serve(serve::ServeArgs::default()));
    }

    #[test]
    fn test_serve_overrides() {
        let cli =
            Cli::try_parse_from(["trip-predict-gateway", "serve", "--port", "9090"]).unwrap();

        match cli.command() {
            Command::Serve(args) => {
                assert_eq!(args.port, Some(9090));
                assert!(args.host.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_check() {
        let cli = Cli::try_parse_from(["trip-predict-gateway", "check"]).unwrap();
        assert_eq!(cli.command(), Command::Check);
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(Cli::try_parse_from(["trip-predict-gateway", "ui"]).is_err());
    }
}
