use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `brandvoice` - organization-voice text generation and correction.
#[derive(Parser, Debug)]
#[command(name = "brandvoice")]
#[command(version)]
#[command(about = "Write and correct texts in your organization's voice.", long_about = None)]
pub struct Cli {
    /// Print machine-readable JSON instead of styled text
    #[arg(long, global = true)]
    pub json: bool,

    /// Backend tried first (e.g. gemini, groq, simulator)
    #[arg(long, global = true)]
    pub backend: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the workspace, config and the initial style profile
    Init {
        /// JSON style profile to start from (default: built-in seed)
        #[arg(long)]
        profile: Option<PathBuf>,
    },

    /// Write a new text for a category
    Generate {
        /// What the text is about
        instruction: String,

        /// internal_communication, commercial_email, recognition, diversity_content, service_proposal
        #[arg(short, long)]
        category: String,

        /// Produce this many variants with different creative approaches
        #[arg(long)]
        options: Option<usize>,
    },

    /// Rewrite a draft, or a stored artifact, in the organization's voice
    Correct {
        /// Draft text to correct
        #[arg(required_unless_present = "artifact", conflicts_with = "artifact")]
        text: Option<String>,

        /// Category of the draft
        #[arg(short, long, required_unless_present = "artifact")]
        category: Option<String>,

        /// Re-correct a stored artifact instead of a draft
        #[arg(long)]
        artifact: Option<String>,
    },

    /// Rate a produced artifact
    Feedback {
        artifact_id: String,

        /// 1 (poor) to 5 (excellent)
        #[arg(short, long)]
        rating: i64,

        #[arg(short = 'm', long)]
        comment: Option<String>,
    },

    /// Show feedback events, newest first
    History {
        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Every event recorded for one artifact, oldest first
        #[arg(long, conflicts_with = "category")]
        artifact: Option<String>,
    },

    /// Fold pending feedback into the style profile
    Learn,

    /// List term candidates waiting for a decision
    Candidates {
        /// Include confirmed and rejected candidates
        #[arg(long)]
        all: bool,
    },

    /// Accept a staged candidate as a preferred term
    Confirm {
        candidate_id: String,

        /// Preferred term to use instead of the reviewers' proposal
        #[arg(long)]
        term: Option<String>,
    },

    /// Dismiss a staged candidate
    Reject { candidate_id: String },

    /// List rules with their learned confidence
    Rules {
        /// Only show deactivated rules
        #[arg(long)]
        inactive: bool,
    },

    /// Switch a deactivated rule back on (e.g. term:empleados)
    Reactivate { rule_id: String },

    /// Show configuration, backend chain and profile summary
    Status,

    /// Style profile operations
    Profile {
        #[command(subcommand)]
        profile_command: ProfileCommands,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ProfileCommands {
    /// Write the current profile as JSON
    Export {
        /// Destination file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List stored profile versions
    Versions,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, ProfileCommands};
    use clap::CommandFactory;
    use clap::Parser;

    #[test]
    fn cli_definition_has_no_flag_conflicts() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_generate_with_options() {
        let cli = Cli::parse_from([
            "brandvoice",
            "generate",
            "Día de la Mujer",
            "--category",
            "internal_communication",
            "--options",
            "3",
            "--json",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Generate {
                instruction,
                category,
                options,
            } => {
                assert_eq!(instruction, "Día de la Mujer");
                assert_eq!(category, "internal_communication");
                assert_eq!(options, Some(3));
            }
            other => panic!("expected generate command, got {other:?}"),
        }
    }

    #[test]
    fn correct_accepts_artifact_without_category() {
        let cli = Cli::parse_from(["brandvoice", "correct", "--artifact", "abc"]);
        match cli.command {
            Commands::Correct { text, artifact, .. } => {
                assert!(text.is_none());
                assert_eq!(artifact.as_deref(), Some("abc"));
            }
            other => panic!("expected correct command, got {other:?}"),
        }
        assert!(Cli::try_parse_from(["brandvoice", "correct", "hola"]).is_err());
    }

    #[test]
    fn parse_profile_export() {
        let cli = Cli::parse_from(["brandvoice", "profile", "export", "-o", "voice.json"]);
        match cli.command {
            Commands::Profile {
                profile_command: ProfileCommands::Export { output },
            } => assert_eq!(output.unwrap().to_str(), Some("voice.json")),
            other => panic!("expected profile export, got {other:?}"),
        }
    }

    #[test]
    fn feedback_takes_negative_rating_for_validation_downstream() {
        let cli = Cli::parse_from(["brandvoice", "feedback", "abc", "--rating=-1"]);
        match cli.command {
            Commands::Feedback { rating, .. } => assert_eq!(rating, -1),
            other => panic!("expected feedback command, got {other:?}"),
        }
    }
}
