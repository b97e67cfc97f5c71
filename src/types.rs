//src/types.rs

use ahash::AHashSet;

/// Characters treated as gaps / missing data inside alignment rows.
pub const GAP_CHARS: &[char] = &['-', '?'];

/// One aligned (or not-yet-aligned) sequence: an OTU identifier plus its
/// residue string. Immutable after parse.
#[derive(Debug, Clone)]
pub struct Sequence {
    /// OTU identifier (first whitespace-separated token of the FASTA header).
    pub otu: String,
    /// Full header line, without the leading '>'.
    pub header_line: String,
    /// Residues, possibly containing gap symbols.
    pub residues: String,
}

impl Sequence {
    /// Residue count excluding gap symbols.
    pub fn ungapped_len(&self) -> usize {
        self.residues.chars().filter(|c| !GAP_CHARS.contains(c)).count()
    }

    /// Gap-symbol count within this row.
    pub fn gap_count(&self) -> usize {
        self.residues.chars().filter(|c| GAP_CHARS.contains(c)).count()
    }
}

/// An ordered collection of sequences sharing a nominal column count.
/// Owned by the pipeline run that parsed it; read-only thereafter.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// File stem this alignment was parsed from.
    pub name: String,
    pub sequences: Vec<Sequence>,
}

impl Alignment {
    /// Nominal column count: the longest row. Rows may disagree before
    /// realignment; the maximum is what a concatenation would occupy.
    pub fn alignment_len(&self) -> usize {
        self.sequences
            .iter()
            .map(|s| s.residues.chars().count())
            .max()
            .unwrap_or(0)
    }

    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    /// Unique OTU identifiers across this alignment's sequences.
    pub fn otus(&self) -> AHashSet<&str> {
        self.sequences.iter().map(|s| s.otu.as_str()).collect()
    }

    /// Fraction of missing data in this alignment, as if it were one block
    /// of a concatenated supermatrix. Gap cells in present rows count, and
    /// each of the `otus_missing` OTUs absent from this alignment counts as
    /// an entirely-gap row of `alignment_len()` columns.
    pub fn missing_data(&self, otus_missing: usize) -> f64 {
        let len = self.alignment_len();
        let rows = self.sequences.len() + otus_missing;
        if len == 0 || rows == 0 {
            return 0.0;
        }
        let gap_cells: usize = self
            .sequences
            .iter()
            .map(|s| s.gap_count() + (len - s.residues.chars().count()))
            .sum();
        let missing_cells = gap_cells + otus_missing * len;
        missing_cells as f64 / (rows * len) as f64
    }
}
