//! Command-line interface definition.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// shiftcal - Turn a monthly shift roster into calendar events
#[derive(Debug, Parser)]
#[command(name = "shiftcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "SHIFTCAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authentication commands
    Auth {
        #[command(subcommand)]
        provider: AuthProvider,
    },

    /// List the calendars shifts can be imported into
    Calendars,

    /// List the people named in a roster
    People {
        /// Roster file (.pdf or .csv)
        roster: PathBuf,
    },

    /// Show the events that would be created for one person
    Preview {
        /// Roster file (.pdf or .csv)
        roster: PathBuf,

        /// Name as it appears in the roster's first column
        #[arg(long, short)]
        person: String,

        /// Print the event plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create one person's shifts in a calendar
    Import {
        /// Roster file (.pdf or .csv)
        roster: PathBuf,

        /// Name as it appears in the roster's first column
        #[arg(long, short)]
        person: String,

        /// Target calendar ID (see `shiftcal calendars`)
        #[arg(long)]
        calendar: String,

        /// Run against an in-memory calendar instead of the real one
        #[arg(long)]
        dry_run: bool,
    },

    /// Run the HTTP upload server in the foreground
    Serve {
        /// Address to listen on (overrides [server] bind)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Authentication providers.
#[derive(Debug, Subcommand)]
pub enum AuthProvider {
    /// Authenticate with Google Calendar
    #[cfg(feature = "google")]
    Google {
        /// OAuth client ID (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_ID")]
        client_id: Option<String>,

        /// OAuth client secret (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_SECRET")]
        client_secret: Option<String>,

        /// Path to Google Cloud Console credentials JSON file
        ///
        /// This is the JSON file downloaded from the Google Cloud Console
        /// OAuth 2.0 credentials page. Alternative to providing client_id
        /// and client_secret separately.
        #[arg(long, env = "GOOGLE_CREDENTIALS_FILE")]
        credentials_file: Option<PathBuf>,

        /// Force re-authentication even if already authenticated
        #[arg(long, short)]
        force: bool,

        /// Delete the stored tokens instead of logging in
        #[arg(long, conflicts_with = "force")]
        logout: bool,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_import() {
        let cli = Cli::try_parse_from([
            "shiftcal",
            "-v",
            "import",
            "plan.pdf",
            "--person",
            "Alice Muster",
            "--calendar",
            "primary",
            "--dry-run",
        ])
        .unwrap();

        assert!(cli.debug);
        match cli.command {
            Command::Import {
                roster,
                person,
                calendar,
                dry_run,
            } => {
                assert_eq!(roster, PathBuf::from("plan.pdf"));
                assert_eq!(person, "Alice Muster");
                assert_eq!(calendar, "primary");
                assert!(dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn preview_requires_a_person() {
        assert!(Cli::try_parse_from(["shiftcal", "preview", "plan.pdf"]).is_err());
    }

    #[test]
    fn serve_bind_must_be_an_address() {
        assert!(Cli::try_parse_from(["shiftcal", "serve", "--bind", "nowhere"]).is_err());
        let cli = Cli::try_parse_from(["shiftcal", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        assert!(matches!(cli.command, Command::Serve { bind: Some(addr) } if addr.port() == 8080));
    }
}
