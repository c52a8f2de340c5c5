//! Command-line surface of the `userdb` binary.

use clap::{Parser, Subcommand};
use userdb_config::Config;

/// Looks up users and groups through the systemd userdb multiplexer.
#[derive(Parser, Debug)]
#[command(name = "userdb", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: Config,
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// The five lookups.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// Looks up a user by login name.
    User {
        /// Login name.
        name: String,
    },
    /// Looks up a user by numeric id.
    Uid {
        /// Decimal user id.
        id: String,
    },
    /// Looks up a group by name.
    Group {
        /// Group name.
        name: String,
    },
    /// Looks up a group by numeric id.
    Gid {
        /// Decimal group id.
        id: String,
    },
    /// Lists the ids of every group a user belongs to.
    Groups {
        /// Login name.
        user: String,
    },
}

impl Command {
    /// Short description used in "not found" messages.
    pub(crate) fn subject(&self) -> String {
        match self {
            Self::User { name } => format!("user '{name}'"),
            Self::Uid { id } => format!("user id {id}"),
            Self::Group { name } => format!("group '{name}'"),
            Self::Gid { id } => format!("group id {id}"),
            Self::Groups { user } => format!("groups of '{user}'"),
        }
    }
}
