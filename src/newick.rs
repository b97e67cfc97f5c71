// src/newick.rs

use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

use crate::error::{Error, Result};
use crate::tree::WeightedTree;

/// Reads a Newick-formatted file into a weighted tree.
pub fn read_newick<P: AsRef<Path>>(path: P) -> Result<WeightedTree> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    parse_newick(&text)
}

/// Parses Newick text, e.g. `((A:0.1,B:0.2):0.05,C:0.3);`, into a
/// [`WeightedTree`]. Branch lengths default to 0 when omitted.
pub fn parse_newick(text: &str) -> Result<WeightedTree> {
    let mut parser = Parser {
        chars: text.chars().peekable(),
        tree: WeightedTree::new(),
    };
    let (_root, length) = parser.subtree()?;
    if length != 0.0 {
        // A root branch length has nothing to attach to; tolerated, ignored.
        log::debug!("ignoring branch length {length} on the root node");
    }
    parser.skip_whitespace();
    if let Some(&c) = parser.chars.peek() {
        if c == ';' {
            parser.chars.next();
        } else {
            return Err(Error::MalformedTree(format!(
                "unexpected character '{c}' after tree"
            )));
        }
    }
    parser.skip_whitespace();
    if parser.chars.next().is_some() {
        return Err(Error::MalformedTree("trailing text after ';'".into()));
    }
    Ok(parser.tree)
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    tree: WeightedTree,
}

impl Parser<'_> {
    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    /// One subtree: either a leaf label or a parenthesized group, with an
    /// optional name and branch length. Returns the node index and the
    /// length of the branch joining it to its parent.
    fn subtree(&mut self) -> Result<(usize, f64)> {
        self.skip_whitespace();
        let node = if self.chars.peek() == Some(&'(') {
            self.chars.next();
            let group = self.tree.add_node(None);
            loop {
                let (child, length) = self.subtree()?;
                self.tree.add_edge(group, child, length);
                self.skip_whitespace();
                match self.chars.next() {
                    Some(',') => continue,
                    Some(')') => break,
                    other => {
                        return Err(Error::MalformedTree(format!(
                            "expected ',' or ')', found {other:?}"
                        )))
                    }
                }
            }
            // Internal nodes may carry a name; keep it as the label.
            let name = self.label();
            if !name.is_empty() {
                self.tree.set_label(group, name);
            }
            group
        } else {
            let name = self.label();
            if name.is_empty() {
                return Err(Error::MalformedTree(
                    "expected a label or '('".to_string(),
                ));
            }
            self.tree.add_node(Some(name))
        };

        self.skip_whitespace();
        let length = if self.chars.peek() == Some(&':') {
            self.chars.next();
            self.branch_length()?
        } else {
            0.0
        };
        Ok((node, length))
    }

    fn label(&mut self) -> String {
        self.skip_whitespace();
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c == '(' || c == ')' || c == ',' || c == ':' || c == ';' || c.is_whitespace() {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        out
    }

    fn branch_length(&mut self) -> Result<f64> {
        self.skip_whitespace();
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E') {
                out.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        out.parse::<f64>()
            .map_err(|_| Error::MalformedTree(format!("invalid branch length '{out}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_star_tree() {
        let tree = parse_newick("(A:1,B:2,C:3);").unwrap();
        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.leaves().count(), 3);
        let labels: Vec<_> = tree
            .leaves()
            .filter_map(|n| tree.label(n).map(str::to_string))
            .collect();
        assert_eq!(labels, ["A", "B", "C"]);
        assert_eq!(tree.diameter().unwrap(), 5.0);
    }

    #[test]
    fn parses_nested_groups_with_internal_names() {
        let tree = parse_newick("((A:0.1,B:0.2)ab:0.05,C:0.3)root;").unwrap();
        assert_eq!(tree.leaves().count(), 3);
        // A-B = 0.3; A-C = 0.1 + 0.05 + 0.3
        assert!((tree.diameter().unwrap() - 0.45).abs() < 1e-12);
    }

    #[test]
    fn missing_branch_lengths_default_to_zero() {
        let tree = parse_newick("(A,B,(C,D));").unwrap();
        assert_eq!(tree.leaves().count(), 4);
        assert_eq!(tree.diameter().unwrap(), 0.0);
    }

    #[test]
    fn parses_scientific_notation_lengths() {
        let tree = parse_newick("(A:1e-05,B:2.5e-05);").unwrap();
        assert!((tree.diameter().unwrap() - 3.5e-05).abs() < 1e-15);
    }

    #[test]
    fn single_leaf_with_semicolon() {
        let tree = parse_newick("A;").unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.diameter().unwrap(), 0.0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_newick("(A:1,B:2"), Err(Error::MalformedTree(_))));
        assert!(matches!(parse_newick(""), Err(Error::MalformedTree(_))));
        assert!(matches!(parse_newick("(A:x);"), Err(Error::MalformedTree(_))));
        assert!(matches!(parse_newick("(A:1); extra"), Err(Error::MalformedTree(_))));
    }
}
