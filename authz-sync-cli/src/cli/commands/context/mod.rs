//! `context` command definitions

pub mod handler;

use clap::Subcommand;

pub use handler::handle_context_command;

#[derive(Subcommand)]
pub enum ContextCommands {
    /// List saved contexts
    List,
    /// Show one context (the current one if no name is given)
    Show {
        name: Option<String>,
    },
    /// Create or update a context
    Set {
        name: String,

        /// Tenant URL
        #[arg(long)]
        url: String,

        /// OAuth client id
        #[arg(long)]
        client_id: String,

        /// Client secret or secret reference (env://, kube://secrets/, dev://, dev-literal://).
        /// Prompted for when omitted.
        #[arg(long)]
        client_secret: Option<String>,
    },
    /// Make a context the current one
    Use {
        name: String,
    },
    /// Delete a context
    Delete {
        name: String,
    },
}
