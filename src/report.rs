// src/report.rs

use std::fmt::Write as FmtWrite;
use std::io::{self, Write};

use crate::supermatrix::Supermatrix;
use crate::tree::DiameterSummary;

/// Header line for the delimited record, field order fixed.
pub const REPORT_HEADER: &str = "id;alignment_count;sequence_count;otu_count;\
avg_sequences_per_alignment;avg_otus_per_alignment;avg_ungapped_seq_len;\
shortest_ungapped_seq_len;longest_ungapped_seq_len;pct_missing_data;\
concatenated_length;min_tree_diameter;max_tree_diameter;mean_tree_diameter;\
median_tree_diameter\n";

/// The merged, read-only snapshot of one pipeline run's statistics.
#[derive(Debug, Clone)]
pub struct AggregateReport {
    pub alignment_count: usize,
    pub sequence_count: usize,
    pub otu_count: usize,
    pub avg_sequences_per_alignment: usize,
    pub avg_otus_per_alignment: usize,
    pub avg_sequence_length: usize,
    /// `None` when the batch holds no sequences at all.
    pub shortest_sequence: Option<usize>,
    pub longest_sequence: Option<usize>,
    pub missing_data_percent: f64,
    pub concatenated_length: usize,
    pub diameters: DiameterSummary,
}

impl AggregateReport {
    pub fn from_parts(matrix: &Supermatrix, diameters: DiameterSummary) -> Self {
        Self {
            alignment_count: matrix.alignment_count(),
            sequence_count: matrix.sequence_count(),
            otu_count: matrix.otu_union().len(),
            avg_sequences_per_alignment: matrix.avg_sequences_per_alignment(),
            avg_otus_per_alignment: matrix.avg_otus_per_alignment(),
            avg_sequence_length: matrix.avg_sequence_length(),
            shortest_sequence: matrix.shortest_sequence(),
            longest_sequence: matrix.longest_sequence(),
            missing_data_percent: matrix.missing_data_percent(),
            concatenated_length: matrix.total_length(),
            diameters,
        }
    }
}

/// Writes one delimited record per invocation to an append-only sink and
/// renders the human-readable block. Truncating a pre-existing sink is the
/// pipeline's overwrite policy, not the emitter's.
pub struct ReportEmitter {
    /// Write [`REPORT_HEADER`] before the record. The caller sets this only
    /// when the sink is fresh.
    pub write_header: bool,
}

impl ReportEmitter {
    /// Appends the header (when configured) and exactly one record.
    pub fn append_record(
        &self,
        title: &str,
        report: &AggregateReport,
        sink: &mut dyn Write,
    ) -> io::Result<()> {
        if self.write_header {
            sink.write_all(REPORT_HEADER.as_bytes())?;
        }
        let row = format!(
            "{};{};{};{};{};{};{};{};{};{:.1};{};{:.2};{:.2};{:.2};{:.2}\n",
            title,
            report.alignment_count,
            report.sequence_count,
            report.otu_count,
            report.avg_sequences_per_alignment,
            report.avg_otus_per_alignment,
            report.avg_sequence_length,
            report.shortest_sequence.unwrap_or(0),
            report.longest_sequence.unwrap_or(0),
            report.missing_data_percent,
            report.concatenated_length,
            report.diameters.min,
            report.diameters.max,
            report.diameters.mean,
            report.diameters.median,
        );
        sink.write_all(row.as_bytes())
    }

    /// Formatted block for the primary output stream.
    pub fn render(&self, report: &AggregateReport) -> String {
        let mut out = String::new();
        let mut line = |name: &str, value: String| {
            let _ = writeln!(out, "  {name:<34}{value:>8}");
        };
        line("No. of alignments:", report.alignment_count.to_string());
        line("No. of sequences:", report.sequence_count.to_string());
        line("No. of OTUs:", report.otu_count.to_string());
        line(
            "Avg no. of sequences / alignment:",
            report.avg_sequences_per_alignment.to_string(),
        );
        line(
            "Avg no. of OTUs / alignment:",
            report.avg_otus_per_alignment.to_string(),
        );
        line(
            "Avg sequence length (ungapped):",
            report.avg_sequence_length.to_string(),
        );
        line(
            "Shortest sequence (ungapped):",
            report
                .shortest_sequence
                .map_or_else(|| "n/a".into(), |n| n.to_string()),
        );
        line(
            "Longest sequence (ungapped):",
            report
                .longest_sequence
                .map_or_else(|| "n/a".into(), |n| n.to_string()),
        );
        line(
            "% missing data:",
            format!("{:.2}", report.missing_data_percent),
        );
        line(
            "Concatenated alignment length:",
            report.concatenated_length.to_string(),
        );
        line("Min tree diameter:", format!("{:.2}", report.diameters.min));
        line("Max tree diameter:", format!("{:.2}", report.diameters.max));
        line("Avg tree diameter:", format!("{:.2}", report.diameters.mean));
        line(
            "Median tree diameter:",
            format!("{:.2}", report.diameters.median),
        );
        format!("Ortholog statistics:\n{out}")
    }
}
