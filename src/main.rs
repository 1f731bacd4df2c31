//! dotcypher CLI - graph text pipeline and graph API server

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dotcypher::config::{self, DotcypherConfig};
use dotcypher::dot::DotWriter;
use dotcypher::lineage::{Algorithm, Direction, LineageGraph};
use dotcypher::server::{self, AppState};
use dotcypher::output::is_quiet;
use dotcypher::tabular::{self, TableOptions};
use dotcypher::ui::{self, stats_table, Icons, Spinner};
use dotcypher::viz::{self, VizOptions};
use dotcypher::{cypher, subset, DotDocument, GraphBackend, Neo4jBackend};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dotcypher")]
#[command(version)]
#[command(about = "Graph text pipeline - CSV to DOT, DOT to Cypher, and a small graph API")]
#[command(long_about = r#"
dotcypher moves a graph between text formats and a graph database:
  • CSV node/edge tables -> Graphviz DOT
  • DOT subsetting (first N body lines)
  • DOT -> idempotent Cypher MERGE script
  • Lineage slices and interactive HTML views of a DOT graph
  • A JSON graph API over Neo4j

Example usage:
  dotcypher csv-to-dot --nodes nodes.csv --edges edges.csv --output graph.dot
  dotcypher subset --input graph.dot --output graph_1000.dot --lines 1000
  dotcypher to-cypher --input graph_1000.dot --output import.cypher
  dotcypher serve --port 5000
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert node and edge CSV tables into a DOT graph
    CsvToDot {
        /// Node table (columns: node_id, name)
        #[arg(short, long)]
        nodes: PathBuf,

        /// Edge table (columns: Source, Target, edge_type)
        #[arg(short, long)]
        edges: PathBuf,

        /// Output DOT file (overwritten)
        #[arg(short, long, default_value = "graph.dot")]
        output: PathBuf,

        /// Maximum rows read from each table
        #[arg(short, long, conflicts_with = "all")]
        max_rows: Option<usize>,

        /// Read every row
        #[arg(long)]
        all: bool,

        /// Graph name in the `digraph` line
        #[arg(long, default_value = "G")]
        graph_name: String,
    },

    /// Keep the header, footer and first N body lines of a DOT file
    Subset {
        /// Input DOT file
        #[arg(short, long)]
        input: PathBuf,

        /// Output DOT file (overwritten)
        #[arg(short, long)]
        output: PathBuf,

        /// Number of body lines to keep
        #[arg(short, long)]
        lines: Option<usize>,
    },

    /// Convert a DOT file into a Cypher MERGE script
    ToCypher {
        /// Input DOT file
        #[arg(short, long)]
        input: PathBuf,

        /// Output Cypher file (overwritten)
        #[arg(short, long, default_value = "import.cypher")]
        output: PathBuf,

        /// Maximum edges kept, in file order
        #[arg(short, long, conflicts_with = "all")]
        max_edges: Option<usize>,

        /// Keep every edge
        #[arg(long)]
        all: bool,

        /// Node label used in MERGE statements
        #[arg(long)]
        node_label: Option<String>,

        /// Relationship type used for every edge
        #[arg(long)]
        relationship_type: Option<String>,
    },

    /// Extract the downstream/upstream lineage of a node
    Lineage {
        /// Input DOT file
        #[arg(short, long)]
        input: PathBuf,

        /// Start node id or label
        #[arg(short, long)]
        start: String,

        /// Direction (downstream, upstream, both)
        #[arg(short, long, default_value = "downstream")]
        direction: String,

        /// Maximum number of hops
        #[arg(long, default_value = "3")]
        depth: usize,

        /// Traversal order (bfs, dfs)
        #[arg(short, long, default_value = "bfs")]
        algorithm: String,

        /// Write the lineage as DOT to this file instead of listing it
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format for the listing (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Render a DOT file as an interactive HTML page
    Visualize {
        /// Input DOT file
        #[arg(short, long)]
        input: PathBuf,

        /// Output HTML file (overwritten)
        #[arg(short, long, default_value = "graph_visualization.html")]
        output: PathBuf,

        /// Page title
        #[arg(long)]
        title: Option<String>,

        /// Start with physics disabled
        #[arg(long)]
        no_physics: bool,
    },

    /// Serve the graph API and front-end
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory with index.html and assets
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Row limit of the graph query
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Check connectivity to the graph database
    Check,

    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = config::resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::CsvToDot { nodes, edges, output, max_rows, all, graph_name } => {
            let limit = if all { None } else { max_rows.or(config.convert.max_rows) };
            run_csv_to_dot(&nodes, &edges, &output, TableOptions::with_max_rows(limit), &graph_name)?;
        }

        Commands::Subset { input, output, lines } => {
            let n = lines.unwrap_or(config.convert.subset_lines);
            ui::header(Icons::SCISSORS, &format!("Subsetting {} to {} body lines", input.display(), n));
            let stats = subset::subset_file(&input, &output, n)?;
            print_stats(&[
                ("Body lines in", stats.input_lines.to_string()),
                ("Body lines kept", stats.kept_lines.to_string()),
            ]);
            ui::success(&format!("Subset written to {}", output.display()));
        }

        Commands::ToCypher { input, output, max_edges, all, node_label, relationship_type } => {
            let mut options = config.cypher_options();
            if all {
                options.max_edges = None;
            } else if max_edges.is_some() {
                options.max_edges = max_edges;
            }
            if let Some(label) = node_label {
                options.node_label = label;
            }
            if let Some(rel) = relationship_type {
                options.relationship_type = rel;
            }

            ui::header(Icons::LINK, &format!("Converting {} to Cypher", input.display()));
            let report = cypher::convert_file(&input, &output, options)?;
            print_stats(&[
                ("Declared nodes", report.declared_nodes.to_string()),
                ("Recorded edges", report.recorded_edges.to_string()),
                ("Retained edges", report.retained_edges.to_string()),
                ("Node statements", report.emitted_nodes.to_string()),
                ("Undeclared endpoints", report.dangling_nodes.to_string()),
                ("Skipped lines", report.unrecognized_lines.to_string()),
            ]);
            ui::success(&format!(
                "Cypher script written to {} with {} nodes and {} edges",
                output.display(),
                report.emitted_nodes,
                report.retained_edges
            ));
        }

        Commands::Lineage { input, start, direction, depth, algorithm, output, format } => {
            let direction: Direction = direction.parse()?;
            let algorithm: Algorithm = algorithm.parse()?;
            let doc = DotDocument::from_path(&input)?;
            let graph = LineageGraph::from_document(&doc);
            let lineage = graph.traverse(&start, direction, depth, algorithm)?;

            if let Some(path) = output {
                graph.render_lineage(&lineage).write_to_path(&path)?;
                ui::success(&format!(
                    "{} lineage of {} ({} nodes) written to {}",
                    direction,
                    lineage.start,
                    lineage.visits.len(),
                    path.display()
                ));
            } else if format == "json" {
                println!("{}", serde_json::to_string_pretty(&lineage)?);
            } else {
                ui::header(Icons::TREE, &format!("{} lineage of {} (depth: {}, {})", direction, lineage.start, depth, algorithm));
                for visit in &lineage.visits {
                    let name = graph.label(&visit.id).unwrap_or("");
                    println!(
                        "{}[L{}] {} {}  ({})",
                        "  ".repeat(visit.level),
                        visit.level,
                        visit.id,
                        name,
                        visit.path.join(" -> ")
                    );
                }
            }
        }

        Commands::Visualize { input, output, title, no_physics } => {
            let options = VizOptions {
                title: title.unwrap_or_else(|| {
                    input
                        .file_stem()
                        .map(|s| s.to_string_lossy().to_string())
                        .unwrap_or_else(|| "Graph".to_string())
                }),
                physics: !no_physics,
                ..VizOptions::default()
            };
            let graph = viz::render_file(&input, &output, &options)?;
            ui::success(&format!(
                "Visualization with {} nodes and {} edges written to {}",
                graph.nodes.len(),
                graph.edges.len(),
                output.display()
            ));
        }

        Commands::Serve { port, static_dir, limit } => {
            let port = port.unwrap_or(config.server.port);
            let backend = connect(&config).await?;
            let state = AppState {
                backend: Arc::new(backend),
                query_limit: limit.unwrap_or(config.server.query_limit),
                static_dir: static_dir.unwrap_or_else(|| config.server.static_dir.clone()),
            };
            ui::header(Icons::GLOBE, &format!("Server running at http://0.0.0.0:{}", port));
            server::start_server(port, state).await?;
        }

        Commands::Check => {
            ui::header(Icons::DATABASE, &format!("Checking {}", config.database.uri));
            let backend = connect(&config).await?;
            let spinner = Spinner::new("Running RETURN 1 ...");
            let result = backend.ping().await;
            spinner.finish_and_clear();
            match result {
                Ok(()) => ui::success(&format!("Connected to {}", config.database.uri)),
                Err(e) => {
                    ui::error(&format!("Query against {} failed: {}", config.database.uri, e));
                    return Err(e.into());
                }
            }
        }

        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            config::write_config(&path, &DotcypherConfig::default(), force)?;
            ui::success(&format!("Config written to {}", path.display()));
            ui::info("Credentials", &format!("set {} to avoid storing a password", config::ENV_NEO4J_PASSWORD));
        }
    }

    Ok(())
}

fn run_csv_to_dot(
    nodes_path: &Path,
    edges_path: &Path,
    output: &Path,
    options: TableOptions,
    graph_name: &str,
) -> anyhow::Result<()> {
    ui::header(Icons::FILE, "Converting CSV tables to DOT");
    ui::info("Nodes", &nodes_path.display().to_string());
    ui::info("Edges", &edges_path.display().to_string());

    let nodes = tabular::read_nodes_from_path(nodes_path, options)?;
    let edges = tabular::read_edges_from_path(edges_path, options)?;

    DotWriter::new(graph_name).write_to_path(output, &nodes, &edges)?;
    tracing::info!("Wrote {} nodes and {} edges to {}", nodes.len(), edges.len(), output.display());

    print_stats(&[("Nodes", nodes.len().to_string()), ("Edges", edges.len().to_string())]);
    ui::success(&format!("DOT file written to {}", output.display()));
    Ok(())
}

fn print_stats(rows: &[(&str, String)]) {
    if !is_quiet() {
        println!("{}", stats_table(rows));
    }
}

async fn connect(config: &DotcypherConfig) -> anyhow::Result<Neo4jBackend> {
    let spinner = Spinner::new(&format!("Connecting to {} ...", config.database.uri));
    let backend = Neo4jBackend::connect(&config.database).await;
    spinner.finish_and_clear();

    if config.database.password.is_empty() {
        ui::warn(&format!("No database password configured (set {})", config::ENV_NEO4J_PASSWORD));
    }
    Ok(backend?)
}
