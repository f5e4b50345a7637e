use super::render::{render_library, render_saved, render_tenant, render_user};
use super::setup::{Cli, Commands, LibraryCommands, TenantCommands, UserCommands};
use anyhow::{bail, Result};
use clap::Parser;
use clausevault::classify::classify_status;
use clausevault::diagnostics::LogEntry;
use clausevault::init::{initialize, BoxedStore, VaultContext};
use clausevault::model::{Entity, Library, Tenant, User};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

fn new_id(id: Option<String>) -> String {
    id.unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Classification without logging needs no data directory.
    if let Commands::Classify {
        code,
        reason,
        log: false,
    } = &cli.command
    {
        println!("{}", classify_status(*code, reason.as_deref()));
        return Ok(());
    }

    let mut ctx = initialize(cli.data, cli.backend.map(Into::into))?;
    tracing::debug!(
        "data root {} ({:?} backend)",
        ctx.root.display(),
        ctx.config.backend
    );

    match cli.command {
        Commands::Tenant(cmd) => handle_tenant(&mut ctx.store, cmd),
        Commands::Library(cmd) => handle_library(&mut ctx.store, cmd),
        Commands::User(cmd) => handle_user(&mut ctx.store, cmd),
        Commands::Classify { code, reason, .. } => handle_classify(&ctx, code, reason),
    }
}

fn add_and_save(store: &mut BoxedStore, entity: Entity) -> Result<()> {
    let key = entity.key();
    store.add(entity)?;
    store.save()?;
    println!("{}", render_saved("Added", &key));
    Ok(())
}

fn delete_and_save(store: &mut BoxedStore, entity: Entity) -> Result<()> {
    let key = entity.key();
    store.delete(&entity)?;
    store.save()?;
    println!("{}", render_saved("Removed", &key));
    Ok(())
}

fn handle_tenant(store: &mut BoxedStore, cmd: TenantCommands) -> Result<()> {
    match cmd {
        TenantCommands::Add { id } => {
            let id = new_id(id);
            if store.get_tenant_by_id(&id)?.is_some() {
                bail!("tenant {} already exists", id);
            }
            add_and_save(store, Tenant::new(id).into())
        }
        TenantCommands::Show { id } => match store.get_tenant_by_id(&id)? {
            Some(tenant) => {
                print!("{}", render_tenant(&tenant));
                Ok(())
            }
            None => bail!("tenant {} not found", id),
        },
        TenantCommands::Rm { id } => match store.get_tenant_by_id(&id)? {
            Some(tenant) => delete_and_save(store, tenant.into()),
            None => bail!("tenant {} not found", id),
        },
    }
}

fn handle_library(store: &mut BoxedStore, cmd: LibraryCommands) -> Result<()> {
    match cmd {
        LibraryCommands::Add { id, tenant } => {
            let id = new_id(id);
            if store.get_library_by_id(&id)?.is_some() {
                bail!("library {} already exists", id);
            }
            if store.get_tenant_by_id(&tenant)?.is_none() {
                tracing::warn!("tenant {} does not exist", tenant);
            }
            add_and_save(store, Library::new(id, tenant).into())
        }
        LibraryCommands::Show { id } => match store.get_library_by_id(&id)? {
            Some(library) => {
                print!("{}", render_library(&library));
                Ok(())
            }
            None => bail!("library {} not found", id),
        },
        LibraryCommands::Rm { id } => match store.get_library_by_id(&id)? {
            Some(library) => delete_and_save(store, library.into()),
            None => bail!("library {} not found", id),
        },
    }
}

fn handle_user(store: &mut BoxedStore, cmd: UserCommands) -> Result<()> {
    match cmd {
        UserCommands::Add {
            id,
            tenant,
            library,
            token,
        } => {
            let id = new_id(id);
            if store.get_user_by_id(&id)?.is_some() {
                bail!("user {} already exists", id);
            }
            let mut user = User::new(id, tenant).with_refresh_token(token);
            if let Some(library) = library {
                user = user.with_default_library(library);
            }
            add_and_save(store, user.into())
        }
        UserCommands::Show { id } => match store.get_user_by_id(&id)? {
            Some(user) => {
                print!("{}", render_user(&user));
                Ok(())
            }
            None => bail!("user {} not found", id),
        },
        UserCommands::Rm { id } => match store.get_user_by_id(&id)? {
            Some(user) => delete_and_save(store, user.detached().into()),
            None => bail!("user {} not found", id),
        },
    }
}

fn handle_classify(ctx: &VaultContext, code: u16, reason: Option<String>) -> Result<()> {
    let message = classify_status(code, reason.as_deref());
    ctx.diagnostics.log(&LogEntry::new(message.as_str()));
    println!("{}", message);
    Ok(())
}
