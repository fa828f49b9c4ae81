//! Subcommands of the `owc` tool.
//!
//! Every command reads a context document, and mutating commands write the
//! edited document to `--output`, back to the input with `--in-place`, or to
//! stdout.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use ows_context::{
    AppendOutcome, MoveOutcome, OwsContext, Position, Resource, ResourceId, SharedContext,
    TreeNode,
};
use tracing::{info, warn};
use wms_protocol::WmsCapabilities;

use crate::config::CliConfig;
use crate::fetch::{is_remote, CapabilitiesClient};

/// Where an edited context goes.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Write the edited context to this file
    #[arg(short, long, conflicts_with = "in_place")]
    pub output: Option<PathBuf>,

    /// Overwrite the input file
    #[arg(long)]
    pub in_place: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Check that a context document is a well-formed layer tree
    Validate {
        /// Context document (GeoJSON)
        context: PathBuf,
    },

    /// Print the layer tree
    Tree {
        context: PathBuf,

        /// Print the nested tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move a resource (with its subtree) relative to another one
    Move {
        context: PathBuf,

        /// Id of the resource to move
        source: String,

        /// Id of the reference resource
        #[arg(short, long)]
        target: Option<String>,

        /// left, right, first-child or last-child
        #[arg(short, long, default_value = "right")]
        position: Position,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Insert a new, empty resource
    Insert {
        context: PathBuf,

        /// Title of the new resource
        title: String,

        /// Id of the new resource (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Id of the reference resource; a new root is created when omitted
        #[arg(short, long)]
        target: Option<String>,

        #[arg(short, long, default_value = "last-child")]
        position: Position,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Remove a resource and its subtree
    Remove {
        context: PathBuf,
        id: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Switch a resource (and its subtree) on or off
    Activate {
        context: PathBuf,
        id: String,

        /// Deactivate instead of activating
        #[arg(long)]
        off: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the batched GetMap requests for the active layers
    GetmapUrls {
        context: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Append the layers of a WMS as a new root
    AppendWms {
        context: PathBuf,

        /// Capabilities file or service URL
        source: String,

        /// Service URL to record for a local capabilities file
        #[arg(long)]
        href: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the reference systems usable with the active layers
    Crs {
        context: PathBuf,

        /// Print only the first one the client can draw natively
        #[arg(long)]
        preferred: bool,
    },
}

/// Run `command` and return what should be printed to stdout.
pub async fn execute(command: Command, config: &CliConfig) -> Result<String> {
    match command {
        Command::Validate { context } => {
            let ctx = load_context(&context)?;
            Ok(format!(
                "{}: {} resources in {} trees",
                context.display(),
                ctx.len(),
                ctx.roots().len()
            ))
        }

        Command::Tree { context, json } => {
            let ctx = load_context(&context)?;
            let forest = ctx.treeify()?;
            if json {
                Ok(serde_json::to_string_pretty(&forest)?)
            } else {
                let mut out = String::new();
                for node in &forest {
                    render_node(&ctx, node, &mut out)?;
                }
                Ok(out.trim_end().to_string())
            }
        }

        Command::Move {
            context,
            source,
            target,
            position,
            output,
        } => {
            let mut ctx = load_context(&context)?;
            let target = target.map(ResourceId::new);
            let outcome = ctx.move_feature(&ResourceId::new(&source), target.as_ref(), position)?;
            match &outcome {
                MoveOutcome::Moved { from, to } => info!(%source, %from, %to, "moved"),
                MoveOutcome::Unchanged => warn!(%source, "move had no effect"),
            }
            save_context(&ctx, &context, &output)
        }

        Command::Insert {
            context,
            title,
            id,
            target,
            position,
            output,
        } => {
            let mut ctx = load_context(&context)?;
            let id = id.map(ResourceId::new).unwrap_or_else(ResourceId::generate);
            let target = target.map(ResourceId::new);
            let inserted = ctx.insert_feature(target.as_ref(), Resource::new(id, title), position)?;
            if let Some(resource) = ctx.get(&inserted) {
                info!(id = %inserted, folder = %resource.folder(), "inserted");
            }
            save_context(&ctx, &context, &output)
        }

        Command::Remove {
            context,
            id,
            output,
        } => {
            let mut ctx = load_context(&context)?;
            let removed = ctx.remove_feature(&ResourceId::new(id))?;
            info!(count = removed.len(), "removed");
            save_context(&ctx, &context, &output)
        }

        Command::Activate {
            context,
            id,
            off,
            output,
        } => {
            let mut ctx = load_context(&context)?;
            ctx.activate_feature(&ResourceId::new(id), !off)?;
            save_context(&ctx, &context, &output)
        }

        Command::GetmapUrls { context, json } => {
            let ctx = load_context(&context)?;
            let batches = ctx.optimized_get_map_urls()?;
            if json {
                Ok(serde_json::to_string_pretty(&batches)?)
            } else {
                Ok(batches
                    .iter()
                    .map(|b| b.url.to_string())
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
        }

        Command::AppendWms {
            context,
            source,
            href,
            output,
        } => {
            let ctx = load_context(&context)?;
            let shared = SharedContext::new(ctx);

            let (ticket, capabilities) = if is_remote(&source) {
                let href = href.unwrap_or_else(|| source.clone());
                let ticket = shared.begin_append(&href).await;
                let client = CapabilitiesClient::new(config)?;
                let capabilities = client.fetch(&source).await?;
                (ticket, capabilities)
            } else {
                let capabilities = read_capabilities(Path::new(&source))?;
                let href = match href {
                    Some(href) => href,
                    None => capabilities
                        .get_capabilities_href
                        .clone()
                        .or_else(|| capabilities.get_map_href.clone())
                        .with_context(|| {
                            format!("{} names no service URL, pass --href", source)
                        })?,
                };
                (shared.begin_append(&href).await, capabilities)
            };

            match shared.complete_append(ticket, capabilities).await? {
                AppendOutcome::Applied(ids) => info!(layers = ids.len(), "appended"),
                AppendOutcome::Superseded { generation, latest } => {
                    bail!("append {} was superseded by {}", generation, latest)
                }
            }
            save_context(&shared.snapshot().await, &context, &output)
        }

        Command::Crs { context, preferred } => {
            let ctx = load_context(&context)?;
            if preferred {
                let crs = ctx
                    .preferred_crs()
                    .context("active layers share no supported reference system")?;
                Ok(crs.to_string())
            } else {
                Ok(ctx.crs_intersection().join("\n"))
            }
        }
    }
}

pub fn load_context(path: &Path) -> Result<OwsContext> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    OwsContext::from_json_str(&json)
        .with_context(|| format!("{} is not a valid OWS Context document", path.display()))
}

fn read_capabilities(path: &Path) -> Result<WmsCapabilities> {
    let xml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    WmsCapabilities::parse(&xml).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write `ctx` where `output` says; returns the text for stdout.
fn save_context(ctx: &OwsContext, input: &Path, output: &OutputArgs) -> Result<String> {
    let json = ctx.to_json_string_pretty()?;
    let target = match (&output.output, output.in_place) {
        (Some(path), _) => path.as_path(),
        (None, true) => input,
        (None, false) => return Ok(json),
    };
    std::fs::write(target, json).with_context(|| format!("Failed to write {}", target.display()))?;
    info!(path = %target.display(), resources = ctx.len(), "context written");
    Ok(String::new())
}

fn render_node(ctx: &OwsContext, node: &TreeNode<'_>, out: &mut String) -> Result<()> {
    let resource = node.resource;
    let state = if resource.is_active() {
        "[x]"
    } else if ctx.get_indeterminate_state_of(resource) {
        "[-]"
    } else {
        "[ ]"
    };
    writeln!(
        out,
        "{:indent$}{} {} {} ({})",
        "",
        state,
        resource.folder(),
        resource.title(),
        resource.id,
        indent = resource.depth() * 2
    )?;
    for child in &node.children {
        render_node(ctx, child, out)?;
    }
    Ok(())
}
