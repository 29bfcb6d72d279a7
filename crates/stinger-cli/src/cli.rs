//! CLI argument parsing for the `stinger` binary (spec §6.3).

use clap::{Parser, Subcommand};

/// Stinger - pluggable LLM safety guardrail pipeline
#[derive(Parser, Debug)]
#[command(name = "stinger")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate a prompt against the input stage of the default preset
    CheckPrompt {
        /// Text to evaluate
        text: String,
    },

    /// Evaluate a model response against the output stage of the default preset
    CheckResponse {
        /// Text to evaluate
        text: String,
    },

    /// Run a built-in demonstration prompt through the default preset
    Demo,

    /// Print the system health snapshot (spec §4.7)
    Health {
        /// Include per-guardrail configs and construction errors
        #[arg(long)]
        detailed: bool,
    },

    /// Interactive configuration wizard (external to the engine core)
    Setup,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_prompt_requires_text() {
        let parsed = Cli::try_parse_from(["stinger", "check-prompt"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn check_prompt_parses_text() {
        let cli = Cli::try_parse_from(["stinger", "check-prompt", "hello there"]).unwrap();
        assert!(matches!(cli.command, Command::CheckPrompt { text } if text == "hello there"));
    }

    #[test]
    fn health_detailed_flag() {
        let cli = Cli::try_parse_from(["stinger", "health", "--detailed"]).unwrap();
        assert!(matches!(cli.command, Command::Health { detailed: true }));
    }

    #[test]
    fn health_without_flag_defaults_false() {
        let cli = Cli::try_parse_from(["stinger", "health"]).unwrap();
        assert!(matches!(cli.command, Command::Health { detailed: false }));
    }

    #[test]
    fn demo_and_setup_take_no_args() {
        assert!(Cli::try_parse_from(["stinger", "demo"]).is_ok());
        assert!(Cli::try_parse_from(["stinger", "setup"]).is_ok());
    }

    #[test]
    fn missing_subcommand_is_a_user_error() {
        assert!(Cli::try_parse_from(["stinger"]).is_err());
    }
}
