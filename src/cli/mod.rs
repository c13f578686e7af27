//! CLI module for the user CRUD service
//!
//! Provides subcommands:
//! - `serve`: HTTP API server (default)

pub mod serve;

use clap::{Parser, Subcommand};

/// User CRUD service over a relational table
#[derive(Parser)]
#[command(name = "user-crud")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server (default mode)
    Serve(serve::ServeArgs),
}

impl Cli {
    /// The subcommand to run, defaulting to `serve`
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
        let cli = Cli::try_parse_from(["user-crud"]).unwrap();

        match cli.command() {
            Command::Serve(args) => {
                assert_eq!(args.host, None);
                assert_eq!(args.port, None);
            }
        }
    }

    #[test]
    fn test_serve_overrides() {
        let cli =
            Cli::try_parse_from(["user-crud", "serve", "--host", "127.0.0.1", "--port", "9000"])
                .unwrap();

        match cli.command() {
            Command::Serve(args) => {
                assert_eq!(args.host.as_deref(), Some("127.0.0.1"));
                assert_eq!(args.port, Some(9000));
            }
        }
    }
}
