use clap::Parser;
use nearvec_core::config;
use nearvec_core::hnsw::graph::{HnswConfig, HnswIndex};
use nearvec_core::hnsw::search::knn_search_with_distances;
use nearvec_core::storage::{index_info, load_index, save_index};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nearvec", about = "In-memory approximate nearest-neighbor search demo")]
struct Args {
    /// Number of random vectors to insert
    #[arg(short = 'n', long, default_value_t = 1000)]
    vectors: usize,

    /// Vector dimension
    #[arg(short, long, default_value_t = 3)]
    dim: usize,

    /// Neighbors to return per query
    #[arg(short, long, default_value_t = 10)]
    k: usize,

    /// Candidate horizon at the base layer
    #[arg(long, default_value_t = config::DEFAULT_EF_SEARCH)]
    ef: usize,

    /// Distance metric: euclidean, manhattan, cosine, or dot
    #[arg(short, long, default_value = "euclidean")]
    metric: String,

    /// Target degree per layer
    #[arg(long, default_value_t = config::DEFAULT_M)]
    m: usize,

    /// Degree cap per layer
    #[arg(long, default_value_t = config::DEFAULT_MAX_M)]
    max_m: usize,

    /// Candidate horizon during construction
    #[arg(long, default_value_t = config::DEFAULT_EF_CONSTRUCTION)]
    ef_construction: usize,

    /// Seed for vector generation and level assignment (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Save the built index to this file, then load it back and re-query
    #[arg(long)]
    save: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                "nearvec_core=info"
                    .parse()
                    .expect("valid directive literal"),
            ),
        )
        .init();

    let args = Args::parse();

    if args.dim == 0 || args.dim > config::MAX_DIMENSION {
        eprintln!(
            "Error: dim must be in 1..={}, got {}",
            config::MAX_DIMENSION,
            args.dim
        );
        std::process::exit(1);
    }
    if args.k == 0 || args.k > config::MAX_K {
        eprintln!("Error: k must be in 1..={}, got {}", config::MAX_K, args.k);
        std::process::exit(1);
    }

    let cfg = HnswConfig::new(args.m, args.max_m, args.ef_construction, false)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    let index = HnswIndex::with_seed(cfg, &args.metric, seed)?;

    let mut rng = StdRng::seed_from_u64(seed);
    println!(
        "Inserting {} {}-dim vectors (metric {}, seed {seed})...",
        args.vectors, args.dim, args.metric
    );
    let start = Instant::now();
    for id in 0..args.vectors as u64 {
        let vector: Vec<f64> = (0..args.dim).map(|_| rng.gen()).collect();
        index.insert(id, vector)?;
    }
    println!("Insertion took {:?}", start.elapsed());
    tracing::info!(
        nodes = index.len(),
        max_level = index.max_level(),
        "index built"
    );

    let query: Vec<f64> = (0..args.dim).map(|_| rng.gen()).collect();
    println!("\nQuery vector: {query:?}");
    let start = Instant::now();
    let results = knn_search_with_distances(&index, &query, args.k, args.ef);
    println!("Search took {:?}", start.elapsed());

    println!("\nNearest {} neighbors:", args.k);
    for (rank, (id, distance)) in results.iter().enumerate() {
        println!("{:>3}. ID: {id}, Distance: {distance:.4}", rank + 1);
    }

    if let Some(path) = args.save {
        save_index(&index, &path, "nearvec demo index")?;
        let meta = index_info(&path)?;
        println!(
            "\nSaved to {:?} (version {}, {} nodes, max level {})",
            path, meta.version, meta.nodes_count, meta.max_level
        );

        let reloaded = load_index(&path, &args.metric)?;
        let again = knn_search_with_distances(&reloaded, &query, args.k, args.ef);
        match (results.first(), again.first()) {
            (Some(a), Some(b)) if a.0 == b.0 => {
                println!("Reload check: nearest neighbor {} matches", a.0);
            }
            _ => println!("Reload check: results differ (graph rebuilt from snapshot)"),
        }
    }

    Ok(())
}
