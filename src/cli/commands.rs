use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::PositionOutcome;
use crate::cli::args::{node_id, Cli, Commands, ConfigCommands, Format};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{self, Settings};
use crate::infrastructure::{InfraError, InfraResult, ServiceContainer};
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Some(Commands::Config { command }) => _config(cli, command),
        Some(command) => {
            let container = ServiceContainer::new(load_settings(cli)?);
            debug!("store: {}", container.settings.store_path.display());
            match command {
                Commands::List { flat } => _list(&container, *flat),
                Commands::Show { id } => _show(&container, *id),
                Commands::Add { parent } => _add(&container, *parent),
                Commands::Move { id, parent, root: _ } => _move(&container, *id, *parent),
                Commands::Remove { id } => _remove(&container, *id),
                Commands::Reorder { file, format } => _reorder(&container, file, *format),
                Commands::Rebuild => _rebuild(&container),
                Commands::Check => _check(&container),
                Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
            }
        }
        None => Err(CliError::Usage(
            "no command given, see `rsnest --help`".into(),
        )),
    }
}

fn project_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| InfraError::io("determine current directory", e).into()),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let dir = project_dir(cli)?;
    let mut settings = Settings::load(Some(&dir))?;
    if let Some(store) = &cli.store {
        settings.store_path = store.clone();
    }
    Ok(settings)
}

#[instrument(skip(container))]
fn _list(container: &ServiceContainer, flat: bool) -> CliResult<()> {
    if flat {
        for node in container.nodes.list()? {
            output::info(&output::node_line(&node));
        }
        return Ok(());
    }
    let forest = container.nodes.forest()?;
    if forest.is_empty() {
        output::warning("store is empty");
    }
    for tree in forest.to_tree_strings() {
        print!("{}", tree);
    }
    Ok(())
}

#[instrument(skip(container))]
fn _show(container: &ServiceContainer, id: u64) -> CliResult<()> {
    let node = container.nodes.read(node_id(id))?;
    output::info(&output::node_line(&node));
    Ok(())
}

#[instrument(skip(container))]
fn _add(container: &ServiceContainer, parent: Option<u64>) -> CliResult<()> {
    let node = container.nodes.create(parent.map(node_id))?;
    output::action("Added", &output::node_line(&node));
    Ok(())
}

#[instrument(skip(container))]
fn _move(container: &ServiceContainer, id: u64, parent: Option<u64>) -> CliResult<()> {
    let node = container
        .nodes
        .update_parent(node_id(id), parent.map(node_id))?;
    output::action("Moved", &output::node_line(&node));
    Ok(())
}

#[instrument(skip(container))]
fn _remove(container: &ServiceContainer, id: u64) -> CliResult<()> {
    let removed = container.nodes.delete(node_id(id))?;
    let ids: Vec<String> = removed.iter().map(|id| id.to_string()).collect();
    output::action("Removed", &ids.join(", "));
    Ok(())
}

#[instrument(skip(container))]
fn _reorder(container: &ServiceContainer, file: &Path, format: Format) -> CliResult<()> {
    let payload = read_payload(file)?;
    if payload.trim().is_empty() {
        return Err(CliError::InvalidArgs(format!(
            "empty ordering payload: {}",
            file.display()
        )));
    }
    match container
        .positions
        .update_positions_payload(&payload, format.into())?
    {
        PositionOutcome::Reordered { nodes } => {
            output::success(&format!("reordered {nodes} nodes"));
        }
        PositionOutcome::Rebuilt { reason, nodes } => {
            output::warning(&format!("ordering rejected: {reason}"));
            output::success(&format!("rebuilt {nodes} nodes from parent links"));
        }
    }
    Ok(())
}

fn read_payload(file: &Path) -> InfraResult<String> {
    if file == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| InfraError::io("read ordering from stdin", e))?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file)
            .map_err(|e| InfraError::io(format!("read ordering {}", file.display()), e))
    }
}

#[instrument(skip(container))]
fn _rebuild(container: &ServiceContainer) -> CliResult<()> {
    let nodes = container.nodes.rebuild()?;
    output::success(&format!("rebuilt {nodes} nodes"));
    Ok(())
}

#[instrument(skip(container))]
fn _check(container: &ServiceContainer) -> CliResult<()> {
    let violations = container.nodes.check()?;
    if violations.is_empty() {
        output::success("tree is consistent");
        return Ok(());
    }
    output::header("Violations");
    for violation in &violations {
        output::failure(violation);
    }
    Err(CliError::InvalidTree(violations.len()))
}

fn _config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            print!("{}", settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let global = config::global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unavailable)".into());
            output::detail(&format!("global: {global}"));
            let local = config::local_config_path(&project_dir(cli)?);
            output::detail(&format!("local:  {}", local.display()));
        }
        ConfigCommands::Template => print!("{}", Settings::template()),
    }
    Ok(())
}
