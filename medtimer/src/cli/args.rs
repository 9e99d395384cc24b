//! CLI argument definitions.

use std::path::PathBuf;

use chrono::NaiveTime;
use clap::{Parser, Subcommand};

use crate::config::{DEFAULT_HISTORY_LIMIT, DEFAULT_PORT};
use crate::models::time_format::parse_hhmm;
use crate::models::MedicationForm;

/// Medtimer - a calm daily medication tracker
#[derive(Parser, Debug)]
#[command(name = "medtimer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the tracker server and dashboard
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Open browser automatically
        #[arg(long)]
        open: bool,

        /// Start from a previously exported snapshot
        #[arg(long)]
        restore: Option<PathBuf>,
    },

    /// Add a medication to today's schedule
    Add {
        /// Medicine name
        #[arg(required = true, trailing_var_arg = true)]
        name: Vec<String>,

        /// Form: pill, injection, syrup, inhaler, drops, patch, cream, capsule
        #[arg(short, long, default_value = "pill", value_parser = parse_form)]
        form: MedicationForm,

        /// Scheduled time (HH:MM, 24-hour)
        #[arg(short, long, value_parser = parse_time)]
        time: NaiveTime,

        /// Dosage, e.g. "100mg"
        #[arg(short, long)]
        dosage: Option<String>,
    },

    /// Show today's schedule, progress and streaks
    List,

    /// Mark a dose as taken
    Take {
        /// Medication ID (from `medtimer list`)
        id: String,
    },

    /// Remove a medication from the schedule
    Delete {
        /// Medication ID (from `medtimer list`)
        id: String,
    },

    /// Close out today: update the streak and reset all doses
    NewDay,

    /// Erase all medications, history and streaks
    Clear,

    /// Show recent taken doses, newest first
    History {
        /// Maximum number of records to show
        #[arg(short, long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,
    },

    /// Toggle the motivation panel
    Motivation,

    /// Print today's tip
    Tip,

    /// Write the current session to a JSON file
    Export {
        /// Destination file
        file: PathBuf,
    },
}

fn parse_form(s: &str) -> Result<MedicationForm, String> {
    MedicationForm::from_str(s).ok_or_else(|| {
        let known: Vec<_> = MedicationForm::ALL.iter().map(|f| f.as_str()).collect();
        format!("unknown form '{s}', expected one of: {}", known.join(", "))
    })
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    parse_hhmm(s).ok_or_else(|| format!("invalid time '{s}', expected HH:MM"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "medtimer", "add", "--form", "capsule", "--time", "21:30", "-d", "5mg", "Fish", "Oil",
        ])
        .unwrap();

        match cli.command {
            Commands::Add {
                name,
                form,
                time,
                dosage,
            } => {
                assert_eq!(name.join(" "), "Fish Oil");
                assert_eq!(form, MedicationForm::Capsule);
                assert_eq!(time, NaiveTime::from_hms_opt(21, 30, 0).unwrap());
                assert_eq!(dosage.as_deref(), Some("5mg"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_add_rejects_bad_form_and_time() {
        assert!(Cli::try_parse_from(["medtimer", "add", "--time", "8am", "X"]).is_err());
        assert!(
            Cli::try_parse_from(["medtimer", "add", "--form", "potion", "--time", "08:00", "X"])
                .is_err()
        );
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["medtimer", "serve"]).unwrap();
        match cli.command {
            Commands::Serve {
                port,
                open,
                restore,
            } => {
                assert_eq!(port, DEFAULT_PORT);
                assert!(!open);
                assert!(restore.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
