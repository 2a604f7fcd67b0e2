//! CLI argument definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use record_signals::Gender;
use std::path::PathBuf;

/// Top-level CLI parser for `record-signals`.
#[derive(Debug, Parser)]
#[command(name = "record-signals", version, about = "Student and image catalog with lifecycle signals")]
pub struct Cli {
    /// Media root (overrides RECORD_SIGNALS_MEDIA_ROOT)
    #[arg(long, global = true)]
    pub media_root: Option<PathBuf>,

    /// Catalog database file (overrides RECORD_SIGNALS_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the catalog tables if they are missing.
    Migrate {
        #[arg(long, default_value_t = 1)]
        verbosity: u8,
    },
    /// Manage students.
    #[command(subcommand)]
    Student(StudentCommand),
    /// Manage uploaded images.
    #[command(subcommand)]
    Image(ImageCommand),
    /// Import every image found under a folder.
    Import { folder: PathBuf },
}

#[derive(Debug, Subcommand)]
pub enum StudentCommand {
    /// Create a student.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        gender: GenderArg,
    },
    /// Change a student's name or gender.
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_enum)]
        gender: Option<GenderArg>,
    },
    /// Delete a student.
    Delete { id: i64 },
    /// Show one student.
    Show {
        id: i64,
        #[command(flatten)]
        output: Output,
    },
    /// List all students.
    List {
        #[command(flatten)]
        output: Output,
    },
}

#[derive(Debug, Subcommand)]
pub enum ImageCommand {
    /// Upload an image and generate its thumbnails.
    Add { path: PathBuf },
    /// Delete an image record.
    Delete { id: i64 },
    /// Show one image record.
    Show {
        id: i64,
        #[command(flatten)]
        output: Output,
    },
    /// List all image records.
    List {
        #[command(flatten)]
        output: Output,
    },
}

#[derive(Debug, Args)]
pub struct Output {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GenderArg {
    Male,
    Female,
}

impl From<GenderArg> for Gender {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::Male => Gender::Male,
            GenderArg::Female => Gender::Female,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_student_add() {
        let cli = Cli::parse_from(["record-signals", "student", "add", "--name", "Alice", "--gender", "female"]);
        match cli.command {
            Command::Student(StudentCommand::Add { name, gender }) => {
                assert_eq!(name, "Alice");
                assert_eq!(Gender::from(gender), Gender::Female);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parses_global_overrides_after_subcommand() {
        let cli = Cli::parse_from(["record-signals", "image", "list", "--json", "--db", "/tmp/c.db"]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/c.db")));
        assert!(matches!(cli.command, Command::Image(ImageCommand::List { output: Output { json: true } })));
    }

    #[test]
    fn test_parses_migrate_default_verbosity() {
        let cli = Cli::parse_from(["record-signals", "migrate"]);
        assert!(matches!(cli.command, Command::Migrate { verbosity: 1 }));
    }
}
