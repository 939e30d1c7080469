// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

// CSV tables of blocks, equivalence classes, intervals and phylogenies.

use anyhow::{Context, Result};
use haplotype_blocks::{EquivalenceClasses, PartitionedInterval};
use itertools::Itertools;
use perfect_phylogeny::{parse_newick, PhylogenyTreeNode};
use serde::{Deserialize, Serialize};
use snp_intervals::BasePairInterval;
use std::io::{Read, Write};
use strain_sdp::{Sdp, StrainUniverse};

/// Separates strain names within the `strains` column.
pub const STRAIN_SEPARATOR: &str = ";";

const INTERVAL_HEADERS: [&str; 3] = ["chromosome", "start_bp", "extent_bp"];

/// A phylogeny attached to the base-pair interval it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct PhylogenyInterval {
    pub interval: BasePairInterval,
    pub tree: PhylogenyTreeNode,
}

#[derive(Serialize)]
struct BlockRecord<'a> {
    chromosome: &'a str,
    start_bp: u64,
    extent_bp: u64,
    strains: String,
}

#[derive(Serialize)]
struct ClassRecord<'a> {
    class: usize,
    chromosome: &'a str,
    start_bp: u64,
    extent_bp: u64,
    strains: String,
}

#[derive(Serialize, Deserialize)]
struct PhylogenyRecord {
    chromosome: String,
    start_bp: u64,
    extent_bp: u64,
    newick: String,
}

fn strain_names(universe: &StrainUniverse, sdp: &Sdp) -> String {
    universe.names_of(sdp).join(STRAIN_SEPARATOR)
}

/// A CSV writer that has already written `headers`, so empty tables still
/// carry a header line.
fn csv_writer<W: Write>(w: W, headers: &[&str]) -> Result<csv::Writer<W>> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(w);
    wtr.write_record(headers)?;
    Ok(wtr)
}

/// Write base-pair intervals as `chromosome,start_bp,extent_bp`.
pub fn write_intervals_csv<W: Write>(w: W, intervals: &[BasePairInterval]) -> Result<()> {
    let mut wtr = csv_writer(w, &INTERVAL_HEADERS)?;
    for interval in intervals {
        wtr.serialize(interval)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write haplotype blocks as `chromosome,start_bp,extent_bp,strains`.
pub fn write_blocks_csv<W: Write>(
    w: W,
    universe: &StrainUniverse,
    blocks: &[PartitionedInterval],
) -> Result<()> {
    let mut wtr = csv_writer(w, &["chromosome", "start_bp", "extent_bp", "strains"])?;
    for b in blocks {
        wtr.serialize(BlockRecord {
            chromosome: &b.chromosome,
            start_bp: b.start_bp,
            extent_bp: b.extent_bp,
            strains: strain_names(universe, &b.strain_group),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write one row per member block, numbering the classes from zero in
/// their stored order.
pub fn write_classes_csv<W: Write>(
    w: W,
    universe: &StrainUniverse,
    classes: &EquivalenceClasses,
) -> Result<()> {
    let mut wtr = csv_writer(
        w,
        &["class", "chromosome", "start_bp", "extent_bp", "strains"],
    )?;
    for (class, eq) in classes.classes().iter().enumerate() {
        let strains = strain_names(universe, &eq.strain_group);
        for m in &eq.members {
            wtr.serialize(ClassRecord {
                class,
                chromosome: &m.chromosome,
                start_bp: m.start_bp,
                extent_bp: m.extent_bp,
                strains: strains.clone(),
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Write phylogenies as `chromosome,start_bp,extent_bp,newick`.
pub fn write_phylogeny_csv<W: Write>(w: W, phylogenies: &[PhylogenyInterval]) -> Result<()> {
    let mut wtr = csv_writer(w, &["chromosome", "start_bp", "extent_bp", "newick"])?;
    for p in phylogenies {
        wtr.serialize(PhylogenyRecord {
            chromosome: p.interval.chromosome.clone(),
            start_bp: p.interval.start_bp,
            extent_bp: p.interval.extent_bp,
            newick: p.tree.to_newick(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a table written by [`write_phylogeny_csv`].
pub fn read_phylogeny_csv<R: Read>(r: R) -> Result<Vec<PhylogenyInterval>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(r);
    rdr.deserialize::<PhylogenyRecord>()
        .enumerate()
        .map(|(row, record)| -> Result<PhylogenyInterval> {
            let line = row + 2;
            let record = record.with_context(|| format!("line {line}"))?;
            Ok(PhylogenyInterval {
                tree: parse_newick(&record.newick).with_context(|| format!("line {line}"))?,
                interval: BasePairInterval {
                    chromosome: record.chromosome,
                    start_bp: record.start_bp,
                    extent_bp: record.extent_bp,
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfect_phylogeny::PhylogenyTreeEdge;
    use pretty_assertions::assert_eq;

    fn universe() -> StrainUniverse {
        StrainUniverse::new(["B6", "A_J", "CAST"])
    }

    fn block(start_bp: u64, extent_bp: u64, strains: &[usize]) -> PartitionedInterval {
        PartitionedInterval {
            chromosome: "X".to_string(),
            start_bp,
            extent_bp,
            strain_group: Sdp::from_indices(3, strains.iter().copied()),
        }
    }

    fn to_string(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_blocks() {
        let blocks = [block(100, 51, &[0, 2]), block(120, 1, &[1, 2])];
        let text = to_string(|w| write_blocks_csv(w, &universe(), &blocks));
        assert_eq!(
            text,
            "chromosome,start_bp,extent_bp,strains\nX,100,51,B6;CAST\nX,120,1,A_J;CAST\n"
        );
    }

    #[test]
    fn test_write_classes() {
        let classes = EquivalenceClasses::from_blocks([
            block(100, 51, &[0, 2]),
            block(120, 1, &[1, 2]),
            block(300, 10, &[0, 2]),
        ]);
        let text = to_string(|w| write_classes_csv(w, &universe(), &classes));
        assert_eq!(
            text,
            "class,chromosome,start_bp,extent_bp,strains\n\
             0,X,100,51,B6;CAST\n\
             0,X,300,10,B6;CAST\n\
             1,X,120,1,A_J;CAST\n"
        );
    }

    #[test]
    fn test_empty_intervals_keep_header() {
        let text = to_string(|w| write_intervals_csv(w, &[]));
        assert_eq!(text, "chromosome,start_bp,extent_bp\n");
    }

    #[test]
    fn test_phylogeny_table() -> Result<()> {
        let leaf = |name: &str, length| PhylogenyTreeEdge {
            length,
            node: PhylogenyTreeNode::Leaf {
                strain: name.to_string(),
            },
        };
        let tree = PhylogenyTreeNode::Internal {
            edges: vec![
                PhylogenyTreeEdge {
                    length: 3.0,
                    node: PhylogenyTreeNode::Internal {
                        edges: vec![leaf("B6", 0.0), leaf("A_J", 0.0)],
                    },
                },
                leaf("CAST", 0.0),
            ],
        };
        let phylogenies = vec![PhylogenyInterval {
            interval: BasePairInterval {
                chromosome: "1".to_string(),
                start_bp: 100,
                extent_bp: 200,
            },
            tree,
        }];
        let text = to_string(|w| write_phylogeny_csv(w, &phylogenies));
        assert_eq!(
            text,
            "chromosome,start_bp,extent_bp,newick\n1,100,200,\"((B6:0,A_J:0):3,CAST:0);\"\n"
        );
        assert_eq!(read_phylogeny_csv(text.as_bytes())?, phylogenies);

        let broken = "chromosome,start_bp,extent_bp,newick\n1,100,200,(B6\n";
        let err = read_phylogeny_csv(broken.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
        Ok(())
    }
}
