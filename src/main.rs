use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fieldnote::cli::{entry, export, list, location, record, vocab};
use fieldnote::config::Config;
use fieldnote::export::ExportFormat;
use fieldnote::session::SessionStore;
use fieldnote::store::{Store, VocabKind};

#[derive(Parser)]
#[command(name = "fieldnote")]
#[command(about = "Field data collection for found-object surveys")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "fieldnote.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Record the user identity stamped on new entries
    Login {
        /// User identifier; its SHA-256 hash becomes the creator hash
        user_id: String,
    },

    /// Create a new entry
    Record(record::RecordArgs),

    /// List entries, newest first
    List,

    /// Show one entry
    Show {
        /// Entry id (or a unique prefix)
        id: String,
    },

    /// Edit an entry; unspecified fields keep their values
    Edit {
        /// Entry id (or a unique prefix)
        id: String,

        #[command(flatten)]
        args: record::EditArgs,
    },

    /// Copy an entry into a new one with fresh id and timestamps
    Duplicate {
        /// Entry id (or a unique prefix)
        id: String,
    },

    /// Delete an entry and its photo files
    Delete {
        /// Entry id (or a unique prefix)
        id: String,
    },

    /// Export all entries to a file
    Export {
        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,
    },

    /// Vocabulary management
    Vocab {
        #[command(subcommand)]
        command: VocabCommands,
    },

    /// Session location management
    Location {
        #[command(subcommand)]
        command: LocationCommands,
    },
}

#[derive(Subcommand)]
enum VocabCommands {
    /// List a vocabulary
    List {
        #[arg(value_enum)]
        kind: VocabKind,
    },

    /// Add a user-defined item
    Add {
        #[arg(value_enum)]
        kind: VocabKind,

        /// Display name (Arabic script is fine)
        name: String,

        /// For materials: tie the new item to this category (name or id)
        #[arg(long)]
        category: Option<String>,
    },

    /// Materials suggested for a category (name or id)
    Materials { category: String },
}

#[derive(Subcommand)]
enum LocationCommands {
    /// Show the remembered location and user
    Show,

    /// Remember a location for the next entries
    Set { city: String, district: String },

    /// Forget the session (location and login)
    Clear,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config).unwrap_or_default();
    let store = Store::open(&config.database_path())?;
    let mut session = SessionStore::load(&config.data_dir());

    match cli.command {
        Commands::Login { user_id } => {
            location::login(&mut session, &user_id)?;
        }
        Commands::Record(args) => {
            record::run(&store, &mut session, &config, args)?;
        }
        Commands::List => {
            list::run(&store)?;
        }
        Commands::Show { id } => {
            list::show(&store, &id)?;
        }
        Commands::Edit { id, args } => {
            record::edit(&store, &config, &id, args)?;
        }
        Commands::Duplicate { id } => {
            entry::duplicate(&store, &id)?;
        }
        Commands::Delete { id } => {
            entry::delete(&store, &id)?;
        }
        Commands::Export { format } => {
            export::run(Arc::new(store), config.export_dir(), format)?;
        }
        Commands::Vocab { command } => match command {
            VocabCommands::List { kind } => {
                vocab::list(&store, kind)?;
            }
            VocabCommands::Add {
                kind,
                name,
                category,
            } => {
                vocab::add(&store, kind, &name, category.as_deref())?;
            }
            VocabCommands::Materials { category } => {
                vocab::materials(&store, &config, &category)?;
            }
        },
        Commands::Location { command } => match command {
            LocationCommands::Show => {
                location::show(&session, &config)?;
            }
            LocationCommands::Set { city, district } => {
                location::set(&mut session, &city, &district)?;
            }
            LocationCommands::Clear => {
                location::clear(&mut session)?;
            }
        },
    }

    Ok(())
}
