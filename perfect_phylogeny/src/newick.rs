// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

use crate::{PhylogenyTreeEdge, PhylogenyTreeNode};
use nom::branch::alt;
use nom::bytes::complete::{is_not, tag};
use nom::character::complete::{char, multispace0};
use nom::combinator::{all_consuming, map, opt, value};
use nom::multi::{fold_many0, separated_list1};
use nom::number::complete::double;
use nom::sequence::{delimited, pair, preceded, terminated};
use nom::IResult;
use std::fmt::Write;

/// Failure to parse a Newick string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NewickError {
    /// The input is not a well-formed Newick tree.
    #[error("malformed newick: {message}")]
    Malformed {
        /// What went wrong and where.
        message: String,
    },
}

const METACHARACTERS: &str = "()[]':;, \t\r\n";

fn write_name(out: &mut String, name: &str) {
    if !name.is_empty() && !name.contains(|c: char| METACHARACTERS.contains(c)) {
        out.push_str(name);
    } else {
        out.push('\'');
        out.push_str(&name.replace('\'', "''"));
        out.push('\'');
    }
}

impl PhylogenyTreeNode {
    /// Render the tree in Newick format, terminated by `;`.  Branch lengths
    /// are written on every non-root edge.
    pub fn to_newick(&self) -> String {
        let mut out = String::new();
        self.write_newick(&mut out);
        out.push(';');
        out
    }

    fn write_newick(&self, out: &mut String) {
        match self {
            PhylogenyTreeNode::Leaf { strain } => write_name(out, strain),
            PhylogenyTreeNode::Internal { edges } => {
                out.push('(');
                for (i, e) in edges.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    e.node.write_newick(out);
                    // writing to a String cannot fail
                    let _ = write!(out, ":{}", e.length);
                }
                out.push(')');
            }
        }
    }
}

fn ws<'a, O>(
    inner: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    delimited(multispace0, inner, multispace0)
}

fn quoted_name(input: &str) -> IResult<&str, String> {
    delimited(
        char('\''),
        fold_many0(
            alt((is_not("'"), value("'", tag("''")))),
            String::new,
            |mut acc, part| {
                acc.push_str(part);
                acc
            },
        ),
        char('\''),
    )(input)
}

fn name(input: &str) -> IResult<&str, String> {
    alt((quoted_name, map(is_not(METACHARACTERS), str::to_string)))(input)
}

fn branch(input: &str) -> IResult<&str, PhylogenyTreeEdge> {
    map(
        pair(subtree, opt(preceded(ws(char(':')), double))),
        |(node, length)| PhylogenyTreeEdge {
            length: length.unwrap_or(0.0),
            node,
        },
    )(input)
}

fn internal(input: &str) -> IResult<&str, PhylogenyTreeNode> {
    map(
        terminated(
            delimited(
                char('('),
                separated_list1(char(','), ws(branch)),
                char(')'),
            ),
            // internal labels carry no meaning here
            opt(name),
        ),
        |edges| PhylogenyTreeNode::Internal { edges },
    )(input)
}

fn subtree(input: &str) -> IResult<&str, PhylogenyTreeNode> {
    alt((
        internal,
        map(name, |strain| PhylogenyTreeNode::Leaf { strain }),
    ))(input)
}

/// Parse a Newick tree.  A root branch length, if present, is discarded, as
/// are internal node labels.
pub fn parse_newick(input: &str) -> Result<PhylogenyTreeNode, NewickError> {
    let tree = terminated(
        ws(subtree),
        pair(opt(preceded(ws(char(':')), double)), ws(char(';'))),
    );
    match all_consuming(tree)(input) {
        Ok((_, node)) => Ok(node),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(NewickError::Malformed {
            message: format!("unexpected input at {:?}", e.input),
        }),
        Err(nom::Err::Incomplete(_)) => Err(NewickError::Malformed {
            message: "incomplete input".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leaf(name: &str, length: f64) -> PhylogenyTreeEdge {
        PhylogenyTreeEdge {
            length,
            node: PhylogenyTreeNode::Leaf {
                strain: name.to_string(),
            },
        }
    }

    fn sample() -> PhylogenyTreeNode {
        PhylogenyTreeNode::Internal {
            edges: vec![
                PhylogenyTreeEdge {
                    length: 2.0,
                    node: PhylogenyTreeNode::Internal {
                        edges: vec![leaf("A/J", 1.0), leaf("B6", 0.0)],
                    },
                },
                leaf("CAST EiJ", 0.5),
                leaf("o'hara", 0.0),
            ],
        }
    }

    #[test]
    fn test_write_newick() {
        assert_eq!(
            sample().to_newick(),
            "((A/J:1,B6:0):2,'CAST EiJ':0.5,'o''hara':0);"
        );
        let single = PhylogenyTreeNode::Leaf {
            strain: "A".to_string(),
        };
        assert_eq!(single.to_newick(), "A;");
    }

    #[test]
    fn test_parse_written_tree() {
        let tree = sample();
        assert_eq!(parse_newick(&tree.to_newick()).unwrap(), tree);
    }

    #[test]
    fn test_parse_lenient_forms() {
        let tree = parse_newick(" ( A , (B:1.5, C)x:2 ) :0.0 ;\n").unwrap();
        assert_eq!(
            tree,
            PhylogenyTreeNode::Internal {
                edges: vec![
                    leaf("A", 0.0),
                    PhylogenyTreeEdge {
                        length: 2.0,
                        node: PhylogenyTreeNode::Internal {
                            edges: vec![leaf("B", 1.5), leaf("C", 0.0)],
                        },
                    },
                ]
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["(A,B)", "(A,B;", "(A,,B);", "();", "(A,B);extra"] {
            assert!(
                matches!(parse_newick(bad), Err(NewickError::Malformed { .. })),
                "{bad} should not parse"
            );
        }
    }
}
