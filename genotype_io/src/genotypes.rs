// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

// Reading strain genotype tables into SDP columns and allele groups.

use crate::io_utils::open_with_gz;
use anyhow::{bail, ensure, Context, Result};
use itertools::Itertools;
use log::{debug, info};
use serde::Serialize;
use snp_intervals::{SdpColumns, SnpPosition};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use strain_sdp::{allele_groups, sdp_from_calls, Sdp, SdpError, StrainUniverse};

pub const SNP_ID_HEADER: &str = "snp_id";
pub const CHROMOSOME_HEADER: &str = "chromosome";
pub const POSITION_HEADER: &str = "position_bp";
const FIXED_HEADERS: [&str; 3] = [SNP_ID_HEADER, CHROMOSOME_HEADER, POSITION_HEADER];

const MISSING_CALLS: [&str; 4] = ["", "N", "-", "?"];

/// Which part of a genotype file to load.
#[derive(Debug, Clone, Default)]
pub struct GenotypeFilter {
    /// Keep only rows on this chromosome.  Without a filter the file must
    /// hold a single chromosome.
    pub chromosome: Option<String>,
    /// Keep only these strains.  The universe is then ordered by name.
    pub strains: Option<Vec<String>>,
}

/// Row counts collected while reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadStats {
    /// Data rows in the file.
    pub rows: usize,
    /// Rows on a chromosome other than the selected one.
    pub other_chromosome: usize,
    /// Rows skipped because a selected strain has no call.
    pub missing_calls: usize,
    /// Rows skipped because every selected strain has the same call.
    pub monomorphic: usize,
    /// Rows with more than two symbols; used for allele groups only.
    pub multiallelic: usize,
}

/// The usable SNP columns of a genotype file.
#[derive(Debug, Clone)]
pub struct GenotypeTable {
    universe: StrainUniverse,
    columns: SdpColumns,
    positions: Vec<SnpPosition>,
    allele_groups: Vec<Vec<Sdp>>,
    allele_group_positions: Vec<SnpPosition>,
    stats: ReadStats,
}

impl GenotypeTable {
    /// The selected strains.
    pub fn universe(&self) -> &StrainUniverse {
        &self.universe
    }

    /// Minority-normalized SDPs of the biallelic rows.
    pub fn columns(&self) -> &SdpColumns {
        &self.columns
    }

    /// Positions of the biallelic rows, parallel to [`Self::columns`].
    pub fn positions(&self) -> &[SnpPosition] {
        &self.positions
    }

    /// Allele groups of every polymorphic row, including rows with more
    /// than two symbols.
    pub fn allele_groups(&self) -> &[Vec<Sdp>] {
        &self.allele_groups
    }

    /// Positions parallel to [`Self::allele_groups`].
    pub fn allele_group_positions(&self) -> &[SnpPosition] {
        &self.allele_group_positions
    }

    pub fn stats(&self) -> ReadStats {
        self.stats
    }
}

/// Read a genotype CSV, plain or gzipped.
pub fn read_genotypes(path: &Path, filter: &GenotypeFilter) -> Result<GenotypeTable> {
    let reader = open_with_gz(path)?;
    read_genotypes_from(reader, filter).with_context(|| path.display().to_string())
}

/// Read a genotype CSV from any reader.
///
/// The header is `snp_id,chromosome,position_bp` followed by one column per
/// strain; every call is a single character.
pub fn read_genotypes_from<R: Read>(reader: R, filter: &GenotypeFilter) -> Result<GenotypeTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let fixed: Vec<&str> = headers.iter().take(FIXED_HEADERS.len()).collect();
    ensure!(
        fixed == FIXED_HEADERS,
        "expected the header to start with {}, found {}",
        FIXED_HEADERS.join(","),
        fixed.join(",")
    );
    let file_strains: Vec<&str> = headers.iter().skip(FIXED_HEADERS.len()).collect();
    let (universe, strain_columns) = select_strains(&file_strains, filter.strains.as_deref())?;

    let mut stats = ReadStats::default();
    let mut sdps = Vec::new();
    let mut positions = Vec::new();
    let mut groups = Vec::new();
    let mut group_positions = Vec::new();
    let mut last: Option<SnpPosition> = None;

    for (row, record) in rdr.records().enumerate() {
        // header is line 1
        let line = row + 2;
        let record = record.with_context(|| format!("line {line}"))?;
        stats.rows += 1;

        let chromosome = &record[1];
        if filter
            .chromosome
            .as_deref()
            .is_some_and(|want| want != chromosome)
        {
            stats.other_chromosome += 1;
            continue;
        }
        let position_bp: u64 = record[2]
            .parse()
            .with_context(|| format!("line {line}: invalid position '{}'", &record[2]))?;
        let position = SnpPosition {
            chromosome: chromosome.to_string(),
            position_bp,
        };
        if let Some(prev) = &last {
            ensure!(
                prev.chromosome == position.chromosome,
                "line {line}: chromosome {} follows chromosome {}; select a single chromosome",
                position.chromosome,
                prev.chromosome
            );
            ensure!(
                prev.position_bp <= position.position_bp,
                "line {line}: position {} is before the previous position {}",
                position.position_bp,
                prev.position_bp
            );
        }
        last = Some(position.clone());

        let mut calls = Vec::with_capacity(strain_columns.len());
        for (strain, &col) in strain_columns.iter().enumerate() {
            match parse_call(&record[col]) {
                Ok(Some(c)) => calls.push(c),
                Ok(None) => break,
                Err(e) => {
                    return Err(e.context(format!(
                        "line {line}: bad call for strain {}",
                        universe.name(strain)
                    )))
                }
            }
        }
        if calls.len() < strain_columns.len() {
            debug!("skipping {} at line {line}: missing call", &record[0]);
            stats.missing_calls += 1;
            continue;
        }

        let row_groups = allele_groups(&calls);
        match row_groups.len() {
            1 => {
                debug!("skipping {} at line {line}: monomorphic", &record[0]);
                stats.monomorphic += 1;
                continue;
            }
            2 => {
                sdps.push(sdp_from_calls(&calls)?);
                positions.push(position.clone());
            }
            _ => {
                debug!("{} at line {line} has {} alleles", &record[0], row_groups.len());
                stats.multiallelic += 1;
            }
        }
        groups.push(row_groups);
        group_positions.push(position);
    }

    info!(
        "read {} rows: {} biallelic, {} multiallelic, {} missing calls, {} monomorphic, {} on other chromosomes",
        stats.rows,
        sdps.len(),
        stats.multiallelic,
        stats.missing_calls,
        stats.monomorphic,
        stats.other_chromosome
    );

    Ok(GenotypeTable {
        columns: SdpColumns::new(universe.len(), sdps)?,
        universe,
        positions,
        allele_groups: groups,
        allele_group_positions: group_positions,
        stats,
    })
}

/// Resolve the strain universe and the record column of each of its strains.
fn select_strains(
    file_strains: &[&str],
    subset: Option<&[String]>,
) -> Result<(StrainUniverse, Vec<usize>)> {
    let mut seen = HashSet::new();
    if let Some(dup) = file_strains.iter().find(|s| !seen.insert(**s)) {
        bail!("strain {dup} appears more than once in the header");
    }
    let names: Vec<&str> = match subset {
        None => file_strains.to_vec(),
        Some(subset) => subset.iter().map(String::as_str).sorted().dedup().collect(),
    };
    if names.is_empty() {
        return Err(SdpError::EmptyUniverse.into());
    }
    let columns = names
        .iter()
        .map(|name| match file_strains.iter().position(|s| s == name) {
            Some(i) => Ok(i + FIXED_HEADERS.len()),
            None => bail!("strain {name} is not in the genotype file"),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((StrainUniverse::new(names), columns))
}

fn parse_call(field: &str) -> Result<Option<u8>> {
    if MISSING_CALLS.iter().any(|m| m.eq_ignore_ascii_case(field)) {
        return Ok(None);
    }
    match field.as_bytes() {
        &[c] => Ok(Some(c.to_ascii_uppercase())),
        _ => bail!("call '{field}' is not a single character"),
    }
}
