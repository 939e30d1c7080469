//! genotype_io
// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

//! Reading strain genotype tables and writing analysis results as CSV.

mod genotypes;
mod io_utils;
mod output;

pub use genotypes::{
    read_genotypes, read_genotypes_from, GenotypeFilter, GenotypeTable, ReadStats,
    CHROMOSOME_HEADER, POSITION_HEADER, SNP_ID_HEADER,
};
pub use io_utils::{create_buffered, open_with_gz};
pub use output::{
    read_phylogeny_csv, write_blocks_csv, write_classes_csv, write_intervals_csv,
    write_phylogeny_csv, PhylogenyInterval, STRAIN_SEPARATOR,
};
