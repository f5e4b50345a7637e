use clap::{Parser, Subcommand, ValueEnum};
use clausevault::config::StoreBackendKind;
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    File,
    Sqlite,
}

impl From<BackendArg> for StoreBackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::File => StoreBackendKind::File,
            BackendArg::Sqlite => StoreBackendKind::Sqlite,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "cvault", bin_name = "cvault", version, disable_help_subcommand = true)]
#[command(about = "Manage clausevault login settings", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (defaults to $CLAUSEVAULT_DATA, then the OS data dir)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data: Option<PathBuf>,

    /// Settings backend, overriding clausevault.toml
    #[arg(long, global = true, value_enum, help_heading = "Options")]
    pub backend: Option<BackendArg>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage tenants
    #[command(subcommand)]
    Tenant(TenantCommands),

    /// Manage libraries
    #[command(subcommand)]
    Library(LibraryCommands),

    /// Manage users
    #[command(subcommand)]
    User(UserCommands),

    /// Show the message a remote failure with this status produces
    Classify {
        /// HTTP status code
        code: u16,

        /// Explicit reason, overriding the canned one
        #[arg(long)]
        reason: Option<String>,

        /// Also append the message to today's diagnostic log
        #[arg(long)]
        log: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TenantCommands {
    /// Add a tenant
    Add {
        /// Tenant ID (generated when omitted)
        id: Option<String>,
    },
    /// Show a tenant and its libraries
    Show { id: String },
    /// Remove a tenant
    #[command(alias = "remove")]
    Rm { id: String },
}

#[derive(Subcommand, Debug)]
pub enum LibraryCommands {
    /// Add a library to a tenant
    Add {
        /// Library ID (generated when omitted)
        id: Option<String>,

        /// Owning tenant
        #[arg(long)]
        tenant: String,
    },
    /// Show a library
    Show { id: String },
    /// Remove a library
    #[command(alias = "remove")]
    Rm { id: String },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Add a user to a tenant
    Add {
        /// User ID (generated when omitted)
        id: Option<String>,

        /// Owning tenant
        #[arg(long)]
        tenant: String,

        /// Default library
        #[arg(long)]
        library: Option<String>,

        /// Refresh token to store
        #[arg(long, default_value = "")]
        token: String,
    },
    /// Show a user with its tenant and default library
    Show { id: String },
    /// Remove a user
    #[command(alias = "remove")]
    Rm { id: String },
}
