// src/lib.rs
pub mod error;
pub mod fasta;
pub mod newick;
pub mod pipeline;
pub mod pool;
pub mod report;
pub mod supermatrix;
pub mod tools;
pub mod tree;
pub mod types;

pub use crate::error::{Error, Result};
pub use crate::pipeline::{run_pipeline, PipelineConfig};
pub use crate::report::AggregateReport;
pub use crate::supermatrix::Supermatrix;
pub use crate::tools::{run_tool, OutputMode, PipelineJob, ScratchDir, TempAllocator, ToolSpec};
pub use crate::tree::{DiameterSummary, WeightedTree};
pub use crate::types::{Alignment, Sequence};
