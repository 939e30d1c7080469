//! haplophy
// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

//! Command-line driver: haplotype blocks, compatible intervals and local
//! phylogenies from a strain genotype table.

mod mylog;

pub use mylog::init_log;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use genotype_io::{
    create_buffered, read_genotypes, write_blocks_csv, write_classes_csv, write_intervals_csv,
    write_phylogeny_csv, GenotypeFilter, GenotypeTable, PhylogenyInterval, ReadStats,
};
use haplotype_blocks::{
    estimate_haplotype_blocks, sort_blocks, to_partitioned_intervals, EquivalenceClasses,
};
use log::info;
use perfect_phylogeny::infer_perfect_phylogenies;
use scan_parameters::ScanParameters;
use serde::Serialize;
use snp_intervals::{
    create_core_intervals, greedy_scan, max_k_scan_columns, reverse_greedy_scan,
    to_ordered_physical_intervals, uber_scan, IndexedSnpInterval,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[clap(name = "haplophy", about = "Haplotype blocks and local phylogenies of inbred strains")]
pub struct Cli {
    /// Log at debug level.
    #[clap(short, long, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate haplotype blocks.
    Blocks {
        #[clap(flatten)]
        input: InputArgs,
        /// Output CSV of blocks.
        #[clap(long)]
        output: PathBuf,
        /// Also write the blocks grouped by strain group.
        #[clap(long)]
        classes: Option<PathBuf>,
    },
    /// Report SDP-compatible intervals in base pairs.
    Intervals {
        #[clap(flatten)]
        input: InputArgs,
        /// Output CSV of intervals.
        #[clap(long)]
        output: PathBuf,
        /// Which scan to report.
        #[clap(long, value_enum, default_value_t = IntervalKind::MaxK)]
        kind: IntervalKind,
    },
    /// Build a perfect phylogeny for every max-k interval.
    Phylogeny {
        #[clap(flatten)]
        input: InputArgs,
        /// Output CSV of one Newick tree per interval.
        #[clap(long)]
        output: PathBuf,
    },
}

/// The interval scans the `intervals` subcommand can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IntervalKind {
    /// Forward greedy tiling.
    Greedy,
    /// Greedy tiling scanned from the last SNP backwards.
    Reverse,
    /// Intersections of the forward and reverse tiles.
    Core,
    /// Every maximal compatible interval.
    Uber,
    /// One widest uber interval per core.
    MaxK,
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Genotype CSV, optionally gzipped.
    #[clap(long)]
    pub genotypes: PathBuf,
    /// Only use SNPs on this chromosome.
    #[clap(long)]
    pub chromosome: Option<String>,
    /// Comma-separated strains to analyze instead of every strain in the file.
    #[clap(long, value_delimiter = ',')]
    pub strains: Option<Vec<String>>,
    /// Parameters file; defaults to parameters.toml next to the executable.
    #[clap(long)]
    pub params: Option<PathBuf>,
    /// Override the parameters file's minimum block length in SNPs.
    #[clap(long)]
    pub min_column_span: Option<usize>,
    /// Override the parameters file's minimum strains per block.
    #[clap(long)]
    pub min_group_size: Option<usize>,
    /// Print a JSON run summary to stdout.
    #[clap(long)]
    pub json: bool,
}

/// What a subcommand read and wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Strains analyzed.
    pub strains: usize,
    /// Biallelic SNP columns fed to the interval scans.
    pub biallelic_columns: usize,
    /// Rows read and skipped from the genotype file.
    pub read_stats: ReadStats,
    /// Records written to the output file.
    pub records_written: usize,
}

struct Inputs {
    table: GenotypeTable,
    params: ScanParameters,
}

impl InputArgs {
    fn load(&self) -> Result<Inputs> {
        let mut params = ScanParameters::load_or_default(self.params.as_deref())?;
        if let Some(span) = self.min_column_span {
            params.min_column_span = span;
        }
        if let Some(size) = self.min_group_size {
            params.min_group_size = size;
        }
        let filter = GenotypeFilter {
            chromosome: self.chromosome.clone(),
            strains: self.strains.clone(),
        };
        let table = read_genotypes(&self.genotypes, &filter)?;
        info!(
            "loaded {} strains and {} biallelic SNPs",
            table.universe().len(),
            table.columns().len()
        );
        Ok(Inputs { table, params })
    }
}

impl Inputs {
    fn summary(&self, records_written: usize) -> RunSummary {
        RunSummary {
            strains: self.table.universe().len(),
            biallelic_columns: self.table.columns().len(),
            read_stats: self.table.stats(),
            records_written,
        }
    }
}

/// Run one subcommand, returning its summary.
pub fn run_command(command: &Command) -> Result<RunSummary> {
    match command {
        Command::Blocks {
            input,
            output,
            classes,
        } => run_blocks(&input.load()?, output, classes.as_deref()),
        Command::Intervals {
            input,
            output,
            kind,
        } => run_intervals(&input.load()?, output, *kind),
        Command::Phylogeny { input, output } => run_phylogeny(&input.load()?, output),
    }
}

pub fn run(cli: &Cli) -> Result<()> {
    let summary = run_command(&cli.command)?;
    let json = match &cli.command {
        Command::Blocks { input, .. }
        | Command::Intervals { input, .. }
        | Command::Phylogeny { input, .. } => input.json,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn run_blocks(inputs: &Inputs, output: &Path, classes: Option<&Path>) -> Result<RunSummary> {
    let table = &inputs.table;
    let blocks = estimate_haplotype_blocks(
        table.universe().len(),
        table.allele_groups(),
        inputs.params.min_column_span,
        inputs.params.min_group_size,
    )?;
    let mut blocks = to_partitioned_intervals(&blocks, table.allele_group_positions())?;
    sort_blocks(&mut blocks);
    write_blocks_csv(create_buffered(output)?, table.universe(), &blocks)
        .with_context(|| output.display().to_string())?;

    if let Some(path) = classes {
        let classes = EquivalenceClasses::from_blocks(blocks.iter().cloned());
        info!("grouped blocks into {} equivalence classes", classes.len());
        write_classes_csv(create_buffered(path)?, table.universe(), &classes)
            .with_context(|| path.display().to_string())?;
    }
    Ok(inputs.summary(blocks.len()))
}

fn scan_intervals(table: &GenotypeTable, kind: IntervalKind) -> Result<Vec<IndexedSnpInterval>> {
    let columns = table.columns();
    Ok(match kind {
        IntervalKind::Greedy => greedy_scan(&mut columns.forward())?,
        IntervalKind::Reverse => reverse_greedy_scan(&mut columns.reverse())?,
        IntervalKind::Core => create_core_intervals(
            &greedy_scan(&mut columns.forward())?,
            &reverse_greedy_scan(&mut columns.reverse())?,
        )?,
        IntervalKind::Uber => uber_scan(&mut columns.forward())?,
        IntervalKind::MaxK => max_k_scan_columns(columns)?,
    })
}

fn run_intervals(inputs: &Inputs, output: &Path, kind: IntervalKind) -> Result<RunSummary> {
    let intervals = scan_intervals(&inputs.table, kind)?;
    let physical = to_ordered_physical_intervals(&intervals, inputs.table.positions())?;
    write_intervals_csv(create_buffered(output)?, &physical)
        .with_context(|| output.display().to_string())?;
    Ok(inputs.summary(physical.len()))
}

fn run_phylogeny(inputs: &Inputs, output: &Path) -> Result<RunSummary> {
    let table = &inputs.table;
    let params = &inputs.params;
    let intervals = max_k_scan_columns(table.columns())?;
    let trees = infer_perfect_phylogenies(table.universe(), table.columns(), &intervals)?;
    let physical = to_ordered_physical_intervals(&intervals, table.positions())?;
    let phylogenies: Vec<PhylogenyInterval> = physical
        .into_iter()
        .zip(trees)
        .map(|(interval, tree)| {
            let mut tree = tree.collapse_short_edges(params.collapse_edge_threshold);
            if params.remove_nonbranching_nodes {
                tree = tree.remove_nonbranching_nodes();
            }
            PhylogenyInterval { interval, tree }
        })
        .collect();
    write_phylogeny_csv(create_buffered(output)?, &phylogenies)
        .with_context(|| output.display().to_string())?;
    Ok(inputs.summary(phylogenies.len()))
}
