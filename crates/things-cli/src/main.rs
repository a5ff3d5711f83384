use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use things_core::client::ThingsClient;
use things_core::command::{ProjectDraft, TaskDraft, UpdateDraft};
use things_core::config::{default_config_path, load_config, write_config, ThingsConfig};
use things_core::container::TargetHints;
use things_core::decode::ListedItem;
use things_core::runner::{ExecError, OsascriptRunner, ScriptRunner};
use things_core::script::Script;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "things", version, about = "Things 3 from the command line")]
struct Cli {
    /// Print the AppleScript instead of running it.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.things-cli/config.toml).
    #[arg(long, global = true, env = "THINGS_CLI_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Create a to-do.
    Add {
        title: String,
        #[arg(long)]
        notes: Option<String>,
        /// Comma-separated tag names.
        #[arg(long)]
        tags: Option<String>,
        /// Due date (YYYY-MM-DD).
        #[arg(long)]
        due: Option<String>,
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Change fields of an existing to-do.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        project_id: Option<String>,
        #[arg(long = "project")]
        project_name: Option<String>,
        /// Remove the to-do from its project.
        #[arg(long)]
        no_project: bool,
        #[arg(long)]
        area_id: Option<String>,
        #[arg(long = "area")]
        area_name: Option<String>,
        /// Remove the to-do from its area.
        #[arg(long)]
        no_area: bool,
    },

    /// Mark a to-do completed.
    Complete { id: String },

    /// List to-dos of a list, project or area.
    List {
        /// Inbox, Today, Anytime, Someday, Upcoming, Logbook, or a project/area.
        name: String,
        /// Show ids next to names.
        #[arg(long)]
        ids: bool,
        /// Full metadata as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Manage projects.
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },

    /// Manage areas.
    Area {
        #[command(subcommand)]
        command: AreaCommand,
    },

    /// Manage tags.
    Tag {
        #[command(subcommand)]
        command: TagCommand,
    },

    /// Open the Quick Entry panel.
    Quick {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show or change configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Print version information.
    Version,
}

#[derive(Args)]
struct TargetArgs {
    /// Built-in list to add to.
    #[arg(long)]
    list: Option<String>,
    #[arg(long)]
    project_id: Option<String>,
    #[arg(long = "project")]
    project_name: Option<String>,
    #[arg(long)]
    area_id: Option<String>,
    #[arg(long = "area")]
    area_name: Option<String>,
}

impl From<TargetArgs> for TargetHints {
    fn from(args: TargetArgs) -> Self {
        TargetHints {
            list: args.list,
            project_id: args.project_id,
            project_name: args.project_name,
            area_id: args.area_id,
            area_name: args.area_name,
        }
    }
}

#[derive(Subcommand)]
enum ProjectCommand {
    Add {
        name: String,
        #[arg(long)]
        notes: Option<String>,
        /// Area (by name) to file the project under.
        #[arg(long)]
        area: Option<String>,
    },
    List {
        #[arg(long)]
        ids: bool,
    },
}

#[derive(Subcommand)]
enum AreaCommand {
    Add { name: String },
    List {
        #[arg(long)]
        ids: bool,
    },
}

#[derive(Subcommand)]
enum TagCommand {
    Add { name: String },
    List,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the config file path and contents.
    Show,
    /// Set a key (app_name, osascript_cmd, default_list). Empty clears it.
    Set { key: String, value: String },
}

/// Live osascript, or printing scripts for `--dry-run`.
enum Backend {
    Live(OsascriptRunner),
    DryRun,
}

impl ScriptRunner for Backend {
    fn run(&self, script: &Script) -> Result<String, ExecError> {
        match self {
            Backend::Live(runner) => runner.run(script),
            Backend::DryRun => {
                print!("{}", script);
                Ok(String::new())
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("THINGS_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    explicit
        .or_else(default_config_path)
        .ok_or_else(|| anyhow!("cannot locate a config directory; pass --config"))
}

fn print_items(items: &[ListedItem]) {
    for item in items {
        match &item.id {
            Some(id) => println!("{}\t{}", id, item.name),
            None => println!("{}", item.name),
        }
    }
}

fn main() -> Result<()> {
    let Cli {
        dry_run,
        verbose,
        config,
        command,
    } = Cli::parse();
    init_tracing(verbose);

    let command = match command {
        None => {
            Cli::command().print_help()?;
            println!();
            return Ok(());
        }
        Some(Command::Version) => {
            println!("things {}", things_core::version());
            return Ok(());
        }
        Some(command) => command,
    };

    let path = config_path(config)?;
    let config = load_config(&path)
        .with_context(|| format!("load config {}", path.display()))?
        .unwrap_or_default();
    debug!(path = %path.display(), app = config.app_name(), "config loaded");

    if let Command::Config { command } = command {
        return run_config(command, &path, config);
    }

    let backend = if dry_run {
        Backend::DryRun
    } else {
        let runner = OsascriptRunner::resolve(
            config.osascript_cmd.as_deref(),
            Some(config.app_name()),
            None,
        )?;
        Backend::Live(runner)
    };
    let client = ThingsClient::with_app_name(backend, config.app_name());
    let quiet = dry_run;

    match command {
        Command::Add {
            title,
            notes,
            tags,
            due,
            target,
        } => {
            let mut target = TargetHints::from(target);
            if target.is_empty() {
                target.list = config.default_list.clone();
            }
            let draft = TaskDraft {
                title,
                notes,
                tags,
                due,
                target,
            };
            let id = client.add_task(&draft)?;
            if !quiet {
                println!("Created to-do {}", id);
            }
        }
        Command::Update {
            id,
            title,
            notes,
            tags,
            due,
            project_id,
            project_name,
            no_project,
            area_id,
            area_name,
            no_area,
        } => {
            let draft = UpdateDraft {
                id,
                title,
                notes,
                tags,
                due,
                project_id,
                project_name,
                no_project,
                area_id,
                area_name,
                no_area,
            };
            let id = client.update_task(&draft)?;
            if !quiet {
                println!("Updated to-do {}", id);
            }
        }
        Command::Complete { id } => {
            let name = client.complete_task(&id)?;
            if !quiet {
                println!("Completed: {}", name);
            }
        }
        Command::List { name, ids, json } => {
            if json {
                let records = client.list_json(&name)?;
                if !quiet {
                    println!("{}", serde_json::to_string_pretty(&records)?);
                }
            } else {
                let items = client.list(&name, ids)?;
                if !quiet {
                    print_items(&items);
                }
            }
        }
        Command::Project { command } => match command {
            ProjectCommand::Add { name, notes, area } => {
                let id = client.add_project(&ProjectDraft { name, notes, area })?;
                if !quiet {
                    println!("Created project {}", id);
                }
            }
            ProjectCommand::List { ids } => {
                let items = client.list_projects(ids)?;
                if !quiet {
                    print_items(&items);
                }
            }
        },
        Command::Area { command } => match command {
            AreaCommand::Add { name } => {
                let id = client.add_area(&name)?;
                if !quiet {
                    println!("Created area {}", id);
                }
            }
            AreaCommand::List { ids } => {
                let items = client.list_areas(ids)?;
                if !quiet {
                    print_items(&items);
                }
            }
        },
        Command::Tag { command } => match command {
            TagCommand::Add { name } => {
                let name = client.add_tag(&name)?;
                if !quiet {
                    println!("Created tag {}", name);
                }
            }
            TagCommand::List => {
                for tag in client.list_tags()? {
                    println!("{}", tag);
                }
            }
        },
        Command::Quick { title, notes } => {
            client.quick_entry(title.as_deref(), notes.as_deref())?;
        }
        Command::Config { .. } | Command::Version => {}
    }
    Ok(())
}

fn run_config(command: ConfigCommand, path: &Path, mut config: ThingsConfig) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let effective = ThingsConfig {
                app_name: Some(config.app_name().to_string()),
                ..config
            };
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(&effective)?);
        }
        ConfigCommand::Set { key, value } => {
            config.set(&key, &value)?;
            let written = write_config(path, &config)
                .with_context(|| format!("write config {}", path.display()))?;
            println!("Updated {}", written.display());
        }
    }
    Ok(())
}
