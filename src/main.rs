use anyhow::Result;
use clap::Parser;
use graph_cluster_metrics::cluster::{self, metrics, ClusteringSummary, SingletonMode};
use graph_cluster_metrics::config::Config;
use graph_cluster_metrics::data::{self, clusters::ClusterFormat};
use graph_cluster_metrics::{frame, storage, Graph};
use std::path::Path;

#[derive(Parser, Debug)]
#[clap(
    name = "graph-cluster-metrics",
    about = "Score clusterings of large graphs with modularity, CPM and coverage statistics"
)]
struct Cli {
    /// Graph file: edge list (.txt/.tsv), Parquet edge table (.parquet) or snapshot (.bin)
    #[clap(long)]
    graph: String,

    /// Cluster file
    #[clap(long)]
    clustering: String,

    /// Cluster file layout: pairs, lists or json
    #[clap(long)]
    cluster_format: Option<ClusterFormat>,

    /// Field separator for pairs files
    #[clap(long)]
    sep: Option<char>,

    /// Handling of unclustered nodes: ignore, as-is or auto-populate
    #[clap(long)]
    mode: Option<SingletonMode>,

    /// Resolution parameter (repeatable)
    #[clap(long = "resolution", short = 'r')]
    resolutions: Vec<f64>,

    /// Drop input clusters with fewer nodes than this
    #[clap(long)]
    min_cluster_size: Option<usize>,

    /// Source and target column names of a Parquet edge table
    #[clap(long, default_value = "src")]
    src_col: String,

    #[clap(long, default_value = "dst")]
    dst_col: String,

    /// Output directory for results
    #[clap(long, default_value = "cluster_metrics")]
    output_dir: String,

    /// JSON configuration file; command line flags take precedence
    #[clap(long)]
    config: Option<String>,

    /// Write a binary snapshot of the loaded graph to this path
    #[clap(long)]
    save_snapshot: Option<String>,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long)]
    threads: Option<usize>,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };
        if !self.resolutions.is_empty() {
            config.resolutions = self.resolutions.clone();
        }
        if let Some(mode) = self.mode {
            config.singleton_mode = mode;
        }
        if let Some(format) = self.cluster_format {
            config.cluster_format = format;
        }
        if let Some(sep) = self.sep {
            config.separator = sep;
        }
        if let Some(size) = self.min_cluster_size {
            config.min_cluster_size = size;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        Ok(config)
    }
}

fn load_graph(args: &Cli) -> Result<Graph> {
    let extension = Path::new(&args.graph)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let graph = match extension {
        "parquet" => data::parquet::load_edge_table(&args.graph, &args.src_col, &args.dst_col)?,
        "bin" => storage::load_graph(&args.graph)?,
        _ => data::edgelist::load_edge_list(&args.graph)?,
    };
    Ok(graph)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let config = args.resolve_config()?;

    let num_threads = config.worker_threads();
    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    log::info!("Starting cluster scoring");
    log::info!("Graph: {}", args.graph);
    log::info!("Clustering: {}", args.clustering);
    log::info!("Output: {}", args.output_dir);

    // 1. Load graph
    let graph = load_graph(&args)?;
    if let Some(path) = &args.save_snapshot {
        storage::save_graph(&graph, path)?;
    }

    // 2. Read clusters
    let parsed = data::clusters::read_cluster_file(
        &args.clustering,
        config.cluster_format,
        config.separator,
    )?;
    let rows = data::clusters::resolve(&graph, parsed)?;
    let table = cluster::read_filtered_membership(
        &graph,
        rows,
        config.singleton_mode,
        config.min_cluster_size,
    )?;

    // 3. Score
    let df = frame::cluster_frame(&graph, &table)?;
    let mut df = frame::with_scores(df, graph.m() as u64, &config.resolutions)?;
    let clustering_summary = ClusteringSummary::compute(&table)?;
    let edge_coverage = metrics::edge_coverage(&graph, &table)?;

    log::info!(
        "{} clusters cover {} of {} nodes and {} of {} edges",
        table.len(),
        clustering_summary.overlap.covered_nodes,
        graph.n(),
        edge_coverage,
        graph.m()
    );

    // 4. Save results
    storage::save_results(
        &mut df,
        &graph.summary(),
        &clustering_summary,
        edge_coverage,
        &args.output_dir,
    )?;

    log::info!("Scoring complete. Results saved to {}", args.output_dir);

    Ok(())
}
