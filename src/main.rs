use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use kubemap_graph::{
    BuildOptions, CollapseOptions, GraphEdge, GraphNode, GroupBy, ResourceFilter, ResourceNode, build_tree,
    collapse, path_to,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod input;
mod render;

use config::Config;
use render::{MapStats, OutputFormat};

#[derive(Parser, Debug)]
#[clap(version, about = "Kubernetes resource map utilities")]
struct Args {
    /// Enable verbose output
    #[arg(short = 'v', global = true)]
    verbose: bool,

    /// Config file with flag defaults (defaults to ./kubemap.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct SnapshotArgs {
    /// Snapshot JSON file, or a directory of snapshot files
    #[arg()]
    snapshot: PathBuf,

    /// Grouping criterion: 'namespace', 'node', 'instance' or 'crd'
    #[arg(long)]
    group_by: Option<GroupBy>,

    /// Only keep resources in this namespace (can be repeated)
    #[arg(long = "namespace", short = 'n')]
    namespaces: Vec<String>,

    /// Kind pattern to drop, e.g. 'Event' or '*Binding' (can be repeated)
    #[arg(long = "exclude-kind")]
    exclude_kinds: Vec<String>,
}

impl SnapshotArgs {
    fn filter(&self, config: &Config) -> ResourceFilter {
        ResourceFilter {
            namespaces: prefer_flags(&self.namespaces, &config.namespaces),
            exclude_kinds: prefer_flags(&self.exclude_kinds, &config.exclude_kinds),
        }
    }

    fn load(&self, config: &Config) -> Result<(Vec<ResourceNode>, Vec<GraphEdge>, GraphNode)> {
        let snapshot = input::load_snapshot(&self.snapshot)?;
        let (nodes, edges) = snapshot
            .into_graph(&self.filter(config))
            .with_context(|| format!("Invalid snapshot {}", self.snapshot.display()))?;

        let options = BuildOptions {
            group_by: self.group_by.or(config.group_by),
        };
        let tree = build_tree(&nodes, &edges, options);
        info!(resources = nodes.len(), edges = edges.len(), "built resource map");

        Ok((nodes, edges, tree))
    }
}

fn prefer_flags(flags: &[String], configured: &[String]) -> Vec<String> {
    if flags.is_empty() {
        configured.to_vec()
    } else {
        flags.to_vec()
    }
}

/// `Some` when one side of an `--x`/`--no-x` pair was given; clap keeps only the last.
fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the resource map and render it
    Build {
        #[command(flatten)]
        source: SnapshotArgs,

        /// Node id to select; the map narrows to the group containing it
        #[arg(long)]
        select: Option<String>,

        /// Expand every resource group
        #[arg(long, overrides_with = "no_expand_all")]
        expand_all: bool,

        /// Collapse unselected resource groups even when the config expands them
        #[arg(long, overrides_with = "expand_all")]
        no_expand_all: bool,

        /// Output format: 'outline', 'json', 'flat' or 'dot' (default: outline)
        #[arg(long, value_parser = OutputFormat::NAMES)]
        format: Option<String>,
    },

    /// Show the parent, containing group and ancestor path of a node
    Locate {
        #[command(flatten)]
        source: SnapshotArgs,

        /// Node id: the resource uid, or Kind/namespace/name without one
        #[arg()]
        id: String,
    },

    /// Print resource, edge and component counts
    Stats {
        #[command(flatten)]
        source: SnapshotArgs,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    debug!(?args, "parsed arguments");

    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Command::Build {
            source,
            select,
            expand_all,
            no_expand_all,
            format,
        } => {
            let format = match format.as_deref().map(OutputFormat::from_name) {
                Some(Some(format)) => format,
                Some(None) => unreachable!("Invalid format validated by clap"),
                None => config.format.unwrap_or_default(),
            };

            let (_, _, tree) = source.load(&config)?;

            if let Some(id) = select.as_deref() {
                if path_to(&tree, id).is_none() {
                    warn!(id, "selected node is not in the resource map");
                }
            }

            let options = CollapseOptions {
                selected_node_id: select,
                expand_all: config.expand_all_or(flag_pair(expand_all, no_expand_all)),
            };
            let view = collapse(&tree, &options);
            print!("{}", render::render(&view, format)?);
        }
        Command::Locate { source, id } => {
            let (_, _, tree) = source.load(&config)?;
            match render::to_location(&tree, &id) {
                Some(location) => print!("{location}"),
                None => bail!("Node {id} is not in the resource map"),
            }
        }
        Command::Stats { source } => {
            let (nodes, edges, tree) = source.load(&config)?;
            print!("{}", MapStats::collect(&nodes, &edges, &tree).to_text());
        }
    }

    Ok(())
}
