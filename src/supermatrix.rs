// src/supermatrix.rs

use ahash::AHashSet;

use crate::types::Alignment;

/// Cross-alignment statistics view: the batch of alignments read as if
/// concatenated into one supermatrix, without materializing it.
///
/// Constructed once from a closed collection; every accessor is a pure
/// function of that snapshot, so repeated calls always agree.
#[derive(Debug, Default)]
pub struct Supermatrix {
    msas: Vec<Alignment>,
}

impl Supermatrix {
    pub fn new(msas: Vec<Alignment>) -> Self {
        Self { msas }
    }

    pub fn alignments(&self) -> &[Alignment] {
        &self.msas
    }

    pub fn alignment_count(&self) -> usize {
        self.msas.len()
    }

    /// Column count of the hypothetical concatenation.
    pub fn total_length(&self) -> usize {
        self.msas.iter().map(|m| m.alignment_len()).sum()
    }

    /// Total number of sequences across all alignments.
    pub fn sequence_count(&self) -> usize {
        self.msas.iter().map(|m| m.sequence_count()).sum()
    }

    /// Union of OTU identifiers across all alignments.
    pub fn otu_union(&self) -> AHashSet<&str> {
        let mut otus = AHashSet::new();
        for msa in &self.msas {
            otus.extend(msa.otus());
        }
        otus
    }

    /// Percent missing data under the virtual concatenation model: each
    /// alignment's missing fraction (OTUs from the union absent from it
    /// count as all-gap rows) averaged over alignments, as a percentage
    /// rounded to one decimal place.
    pub fn missing_data_percent(&self) -> f64 {
        if self.msas.is_empty() {
            return 0.0;
        }
        let union_size = self.otu_union().len();
        let total: f64 = self
            .msas
            .iter()
            .map(|msa| msa.missing_data(union_size - msa.otus().len()))
            .sum();
        let pct = total / self.msas.len() as f64 * 100.0;
        (pct * 10.0).round() / 10.0
    }

    /// Integer-truncated mean sequence count per alignment; 0 when empty.
    pub fn avg_sequences_per_alignment(&self) -> usize {
        if self.msas.is_empty() {
            return 0;
        }
        self.sequence_count() / self.msas.len()
    }

    /// Integer-truncated mean OTU count per alignment; 0 when empty.
    pub fn avg_otus_per_alignment(&self) -> usize {
        if self.msas.is_empty() {
            return 0;
        }
        let total: usize = self.msas.iter().map(|m| m.otus().len()).sum();
        total / self.msas.len()
    }

    /// Minimum ungapped length over every sequence; `None` when no
    /// sequences exist (the report layer decides how to render that).
    pub fn shortest_sequence(&self) -> Option<usize> {
        self.msas
            .iter()
            .flat_map(|m| m.sequences.iter())
            .map(|s| s.ungapped_len())
            .min()
    }

    /// Maximum ungapped length over every sequence; `None` when empty.
    pub fn longest_sequence(&self) -> Option<usize> {
        self.msas
            .iter()
            .flat_map(|m| m.sequences.iter())
            .map(|s| s.ungapped_len())
            .max()
    }

    /// Integer-truncated mean ungapped sequence length; 0 when empty.
    pub fn avg_sequence_length(&self) -> usize {
        let mut lengths = 0usize;
        let mut sequences = 0usize;
        for msa in &self.msas {
            for seq in &msa.sequences {
                sequences += 1;
                lengths += seq.ungapped_len();
            }
        }
        if sequences > 0 {
            lengths / sequences
        } else {
            0
        }
    }
}
