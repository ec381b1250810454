use clap::Parser;
use std::fs;
use std::process;

use mstrain::distance;
use mstrain::mstree::{minimum_spanning_tree, Heuristic};
use mstrain::mstree_v2::minimum_arborescence;
use mstrain::newick::format_tree;
use mstrain::{compute_tree, Edge};

/// CLI tool for building minimum spanning trees from allelic profiles
#[derive(Parser, Debug)]
#[command(name = "mstrain")]
#[command(about = "Build minimum spanning trees from allelic profiles with Newick output", long_about = None)]
struct Args {
    /// Input profile JSON file ({"strains": [...], "profiles": [[...]]})
    input: String,

    /// Output Newick file path
    output: String,

    /// Tree method: MSTree or MSTreeV2
    #[arg(short, long, default_value = "MSTreeV2")]
    method: String,

    /// Distance matrix type: symmetric or asymmetric
    #[arg(long, default_value = "asymmetric")]
    matrix: String,

    /// Missing-value handling code (0=ignore, 1=remove-column, 2=treat-as-allele, 3=absolute)
    #[arg(long, default_value_t = 0)]
    missing: i32,

    /// Tiebreak heuristic for MSTree: eburst or harmonic
    #[arg(long, default_value = "eburst")]
    heuristic: String,

    /// Treat the input as an aligned FASTA file and use p-distance
    #[arg(long, default_value_t = false)]
    fasta: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let newick = if args.fasta {
        tree_from_fasta(&args)?
    } else {
        tree_from_profiles(&args)?
    };

    fs::write(&args.output, format!("{}\n", newick))?;
    eprintln!("Success! Tree written to {}", args.output);

    Ok(())
}

fn tree_from_profiles(args: &Args) -> Result<String, Box<dyn std::error::Error>> {
    eprintln!("Loading profiles from {}...", args.input);
    let profile_json = fs::read_to_string(&args.input)?;

    eprintln!(
        "Computing {} tree over the {} distance matrix...",
        args.method, args.matrix
    );
    let result = compute_tree(
        &profile_json,
        &args.method,
        &args.matrix,
        args.missing,
        &args.heuristic,
    );

    let response: serde_json::Value = serde_json::from_str(&result)?;
    if !response["success"].as_bool().unwrap_or(false) {
        let message = response["error"].as_str().unwrap_or("tree construction failed");
        return Err(message.into());
    }

    eprintln!(
        "Built tree with {} edges over {} strains",
        response["n_edges"], response["n_nodes"]
    );

    let newick = response["newick"]
        .as_str()
        .ok_or("response is missing the newick field")?;
    Ok(newick.to_string())
}

fn tree_from_fasta(args: &Args) -> Result<String, Box<dyn std::error::Error>> {
    eprintln!("Loading aligned sequences from {}...", args.input);

    let reader = bio::io::fasta::Reader::from_file(&args.input)?;
    let mut names: Vec<String> = Vec::new();
    let mut sequences: Vec<Vec<u8>> = Vec::new();

    for result in reader.records() {
        let record = result?;
        names.push(record.id().to_string());
        sequences.push(record.seq().to_vec());
    }

    if sequences.is_empty() {
        return Err("no sequences found in input file".into());
    }
    eprintln!("Loaded {} sequences", sequences.len());

    let matrix = distance::p_distance_matrix(&sequences);

    eprintln!("Computing {} tree over the p-distance matrix...", args.method);
    let edges: Vec<Edge> = match args.method.as_str() {
        "MSTree" => minimum_spanning_tree(&matrix, Heuristic::from_name(&args.heuristic)),
        "MSTreeV2" => minimum_arborescence(&matrix),
        other => return Err(format!("Unknown method: {}", other).into()),
    };

    Ok(format_tree(&edges, &names))
}
