// src/cli.rs
use crate::config::{self, Config};
use crate::editor::{EditMode, PayloadEditor, SwitchOutcome};
use crate::error::{AppError, AppResult};
use crate::hex_codec;
use crate::inspector::{Inspector, MutationOutcome, QueryOutcome};
use crate::models::{CredentialRecord, RecordClass};
use crate::store::LocalCredentialStore;
use clap::{Args, Parser, Subcommand};
use log;
use rpassword;
use std::path::PathBuf;
use uuid::Uuid;

/// Inspect and edit credential records scoped to an access group.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// Credential store file (overrides the configured path)
    #[clap(long, global = true, value_parser)]
    pub store: Option<PathBuf>,
    /// Access group to use for this invocation (overrides the configured group)
    #[clap(short, long, global = true)]
    pub group: Option<String>,
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct Selector {
    /// Service (generic) or server (internet) of the record
    pub title: String,
    #[clap(short, long)]
    pub account: Option<String>,
    #[clap(short, long)]
    pub class: Option<RecordClass>,
}

#[derive(Args, Debug)]
pub struct PayloadArgs {
    /// Payload as UTF-8 text
    #[clap(long, conflicts_with = "hex")]
    pub text: Option<String>,
    /// Payload as hex digits
    #[clap(long)]
    pub hex: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List records in the access group
    List,
    /// Show one record's attributes and payload
    Show {
        #[clap(flatten)]
        selector: Selector,
        /// Show the payload as hex even when it is text
        #[clap(long)]
        hex: bool,
    },
    /// Add a record to the access group
    Add {
        title: String,
        #[clap(short, long, default_value = "")]
        account: String,
        #[clap(short, long, default_value = "generic")]
        class: RecordClass,
        #[clap(flatten)]
        payload: PayloadArgs,
    },
    /// Replace a record's payload
    Update {
        #[clap(flatten)]
        selector: Selector,
        #[clap(flatten)]
        payload: PayloadArgs,
    },
    /// Delete a record
    Delete {
        #[clap(flatten)]
        selector: Selector,
    },
    /// Show or set the persisted target access group
    Group {
        name: Option<String>,
    },
}

pub fn handle_cli_command(cli: Cli, mut config: Config) -> AppResult<()> {
    log::debug!("Handling CLI command: {:?}", cli.command);

    if let Commands::Group { name } = &cli.command {
        match name {
            Some(name) => {
                config.target_access_group = name.clone();
                config::save_config(&config)?;
                println!("Target access group set to '{}'.", name);
                log::info!("Target access group changed to '{}'", name);
            }
            None if config.target_access_group.is_empty() => println!("No access group selected."),
            None => println!("{}", config.target_access_group),
        }
        return Ok(());
    }

    let group = cli.group.clone().unwrap_or_else(|| config.target_access_group.clone());
    let store_path = cli.store.clone().unwrap_or_else(|| config.resolved_store_path());
    let store = LocalCredentialStore::open(store_path, config.entitlements.clone());
    let mut inspector = Inspector::new(store);

    if inspector.refresh(&group)? == QueryOutcome::NoGroupSelected {
        println!("No access group selected. Set one with the 'group' command or pass --group.");
        return Ok(());
    }

    match cli.command {
        Commands::List => {
            if inspector.records().is_empty() {
                println!("No records found in access group '{}'.", group);
            }
            for record in inspector.records() {
                println!("  - [{}] {} / account: '{}'", record.record_class, record.title, record.account);
            }
            log::info!("Listed {} records for '{}'", inspector.records().len(), group);
        }
        Commands::Show { selector, hex } => {
            let id = select(&inspector, &selector)?;
            inspector.begin_edit(id)?;
            if hex {
                if let Some(editor) = inspector.editor_mut() {
                    editor.switch_mode(EditMode::Hex);
                }
            }
            if let (Some(record), Some(editor)) = (inspector.record(id), inspector.editor()) {
                print_record(record, editor);
            }
            inspector.cancel_edit();
        }
        Commands::Add { title, account, class, payload } => {
            let bytes = match (payload.text, payload.hex) {
                (Some(text), _) => text.into_bytes(),
                (None, Some(hex)) => hex_codec::decode(&hex)?,
                (None, None) => prompt_secret()?.into_bytes(),
            };
            inspector.add(&group, class, &title, &account, &bytes)?;
            println!("Added {} record '{}'.", class, title);
        }
        Commands::Update { selector, payload } => {
            let id = select(&inspector, &selector)?;
            let (mode, input) = match (payload.text, payload.hex) {
                (Some(text), _) => (EditMode::Text, text),
                (None, Some(hex)) => (EditMode::Hex, hex),
                (None, None) => (EditMode::Text, prompt_secret()?),
            };
            inspector.begin_edit(id)?;
            if let Some(editor) = inspector.editor_mut() {
                if editor.switch_mode(mode) == SwitchOutcome::Failed {
                    log::debug!("Existing payload is not text; replacing it outright");
                }
                editor.set_buffer(input);
            }
            let outcome = inspector.save_edit(&group).map_err(|e| {
                inspector.cancel_edit();
                e
            })?;
            match outcome {
                MutationOutcome::Applied => println!("Updated '{}'.", selector.title),
                MutationOutcome::AlreadyGone => println!("Record '{}' no longer exists.", selector.title),
            }
        }
        Commands::Delete { selector } => {
            let id = select(&inspector, &selector)?;
            match inspector.delete(id)? {
                MutationOutcome::Applied => println!("Deleted '{}'.", selector.title),
                MutationOutcome::AlreadyGone => println!("Record '{}' was already gone.", selector.title),
            }
        }
        Commands::Group { .. } => {}
    }
    Ok(())
}

fn select(inspector: &Inspector<LocalCredentialStore>, selector: &Selector) -> AppResult<Uuid> {
    let matches = inspector.find_by_key(selector.class, &selector.title, selector.account.as_deref());
    match matches.as_slice() {
        [] => Err(AppError::Cli(format!("No record titled '{}' matches.", selector.title))),
        [record] => Ok(record.id),
        _ => Err(AppError::Cli(format!(
            "{} records titled '{}' match; narrow with --account or --class.",
            matches.len(),
            selector.title
        ))),
    }
}

fn print_record(record: &CredentialRecord, editor: &PayloadEditor) {
    println!("{} ({})", record.title, record.record_class);
    println!("  account: {}", record.account);
    println!("  access group: {}", record.access_group);
    println!("  attributes:");
    for (key, value) in &record.attributes {
        println!("    {}: {}", key, value);
    }

    let label = match editor.mode() {
        EditMode::Text => "text",
        EditMode::Hex => "hex",
    };
    println!("  payload ({}, {} bytes): {}", label, record.payload.len(), editor.buffer());
}

fn prompt_secret() -> AppResult<String> {
    rpassword::prompt_password("Payload: ").map_err(|e| {
        log::error!("Failed to read payload: {}", e);
        AppError::Cli(format!("Failed to read payload: {}", e))
    })
}
