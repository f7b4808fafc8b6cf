//! CLI entry point for issue-board.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

/// Group, filter and rearrange issues stored in a JSON document.
#[derive(Parser, Debug)]
#[command(
    name = "issue-board",
    version,
    about = "issue-board: grouped issue views over a JSON issue document"
)]
struct Cli {
    /// Directory holding `.issue-board/config.toml` (defaults to current).
    #[arg(long, global = true)]
    workdir: Option<PathBuf>,

    /// Project to operate on; required when the document spans several.
    #[arg(long, global = true)]
    project: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the projection of the project view.
    Show {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        layout: Option<String>,
        #[arg(long)]
        group_by: Option<String>,
        #[arg(long)]
        sub_group_by: Option<String>,
        #[arg(long)]
        order_by: Option<String>,
        /// Active day of the calendar layout (`YYYY-MM-DD`, defaults to today).
        #[arg(long)]
        date: Option<String>,
    },

    /// Print the query parameters sent for a filter set.
    Params {
        /// Filter options as JSON, e.g. `{"priority":["urgent"]}`.
        #[arg(long)]
        filters: String,
        #[arg(long)]
        layout: Option<String>,
    },

    /// Patch fields of an issue.
    Update {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        issue: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// Workflow state id, or `None` to clear it.
        #[arg(long)]
        state: Option<String>,
    },

    /// Drag an issue into another group of the current view.
    Move {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        issue: String,
        /// Destination group key (`None` for the empty bucket).
        #[arg(long)]
        group: String,
        /// Group the issue is dragged out of (multi-valued dimensions).
        #[arg(long)]
        from: Option<String>,
        /// Destination swimlane key.
        #[arg(long)]
        lane: Option<String>,
        #[arg(long, default_value_t = 0)]
        index: usize,
    },

    /// Delete an issue.
    Rm {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        issue: String,
    },
}

fn main() -> Result<()> {
    let Cli { workdir, project, cmd } = Cli::parse();
    install_tracing();

    let workdir = workdir.unwrap_or_else(|| PathBuf::from("."));
    commands::run(&workdir, project.as_deref(), cmd)
}

fn install_tracing() {
    // RUST_LOG overrides the default INFO level.
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_show_command() {
        let cli = Cli::parse_from([
            "issue-board",
            "show",
            "--file",
            "issues.json",
            "--layout",
            "kanban",
            "--group-by",
            "state",
            "--sub-group-by",
            "priority",
        ]);

        match cli.cmd {
            Command::Show {
                file,
                layout,
                group_by,
                sub_group_by,
                order_by,
                ..
            } => {
                assert_eq!(file, PathBuf::from("issues.json"));
                assert_eq!(layout.as_deref(), Some("kanban"));
                assert_eq!(group_by.as_deref(), Some("state"));
                assert_eq!(sub_group_by.as_deref(), Some("priority"));
                assert!(order_by.is_none());
            }
            _ => panic!("expected show command"),
        }
    }

    #[test]
    fn parse_move_command_with_global_flags() {
        let cli = Cli::parse_from([
            "issue-board",
            "move",
            "--file",
            "issues.json",
            "--issue",
            "0192e0a4-5b7c-7d1e-8f00-000000000001",
            "--group",
            "done",
            "--index",
            "2",
            "--workdir",
            "/tmp/board",
        ]);

        assert_eq!(cli.workdir, Some(PathBuf::from("/tmp/board")));
        match cli.cmd {
            Command::Move {
                group, index, from, ..
            } => {
                assert_eq!(group, "done");
                assert_eq!(index, 2);
                assert!(from.is_none());
            }
            _ => panic!("expected move command"),
        }
    }

    #[test]
    fn parse_params_command() {
        let cli = Cli::parse_from([
            "issue-board",
            "params",
            "--filters",
            r#"{"priority":["urgent"]}"#,
        ]);
        match cli.cmd {
            Command::Params { filters, layout } => {
                assert_eq!(filters, r#"{"priority":["urgent"]}"#);
                assert!(layout.is_none());
            }
            _ => panic!("expected params command"),
        }
    }
}
