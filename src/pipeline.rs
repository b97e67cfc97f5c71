// src/pipeline.rs

use std::fs::OpenOptions;
use std::path::PathBuf;

use crate::error::Result;
use crate::fasta::{collect_fasta_files, read_fasta};
use crate::newick::read_newick;
use crate::pool::{default_worker_count, map_jobs};
use crate::report::{AggregateReport, ReportEmitter};
use crate::supermatrix::Supermatrix;
use crate::tools::{run_tool, PipelineJob, ScratchDir, ToolSpec};
use crate::tree::DiameterSummary;

/// Options for one pipeline run.
pub struct PipelineConfig {
    /// Name written as the first field of the delimited record.
    pub id: String,
    /// Realign every input with the aligner before computing statistics.
    pub realign: bool,
    /// Infer a tree per alignment and report diameter statistics. When
    /// off, the diameter block of the report is all zeroes.
    pub infer_trees: bool,
    /// Also search one level of subdirectories when expanding directories.
    pub subdirs: bool,
    /// Bound on concurrent external-tool jobs.
    pub worker_count: usize,
    /// Write the header line when the sink is fresh.
    pub write_header: bool,
    /// Remove a pre-existing sink before emitting.
    pub overwrite: bool,
    /// Report sink path.
    pub output: PathBuf,
    /// Where to create the run's scratch directory; system temp when unset.
    pub scratch_parent: Option<PathBuf>,
    pub aligner: ToolSpec,
    pub tree_builder: ToolSpec,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            id: "unknown".into(),
            realign: false,
            infer_trees: true,
            subdirs: false,
            worker_count: default_worker_count(),
            write_header: true,
            overwrite: false,
            output: PathBuf::from("supermatrix_stats.csv"),
            scratch_parent: None,
            aligner: ToolSpec::mafft(),
            tree_builder: ToolSpec::fasttree(),
        }
    }
}

/// Runs the whole batch:
/// CLASSIFY -> (REALIGN)? -> (TREE_INFER)? -> DIAMETER_SUMMARY -> AGGREGATE
/// -> EMIT -> CLEANUP.
///
/// Every temporary file belongs to the run's scratch directory and is
/// removed before this function returns, whether or not EMIT succeeded; an
/// EMIT failure is surfaced after cleanup.
pub fn run_pipeline(inputs: &[PathBuf], config: &PipelineConfig) -> Result<AggregateReport> {
    let alignment_files = collect_fasta_files(inputs, config.subdirs)?;
    log::info!("processing {} alignment file(s)", alignment_files.len());

    let scratch = match &config.scratch_parent {
        Some(parent) => ScratchDir::new_in(parent)?,
        None => ScratchDir::new()?,
    };

    let outcome = run_stages(alignment_files, &scratch, config);
    let cleanup = scratch.close();
    let report = outcome?;
    cleanup?;
    Ok(report)
}

fn run_stages(
    mut files: Vec<PathBuf>,
    scratch: &ScratchDir,
    config: &PipelineConfig,
) -> Result<AggregateReport> {
    if config.realign {
        log::info!(
            "realigning {} alignment(s) with {}",
            files.len(),
            config.aligner.program
        );
        let outcome = map_jobs(files, config.worker_count, |path| {
            run_tool(&config.aligner, &path, None, scratch)
        })?;
        if outcome.failed > 0 {
            log::warn!("{} realignment job(s) failed and were skipped", outcome.failed);
        }
        files = complete_outputs(outcome.outputs, &config.aligner.program);
    }

    let diameter_summary = if config.infer_trees {
        log::info!(
            "generating {} tree(s) with {}",
            files.len(),
            config.tree_builder.program
        );
        let outcome = map_jobs(files.clone(), config.worker_count, |path| {
            run_tool(&config.tree_builder, &path, None, scratch)
        })?;
        if outcome.failed > 0 {
            log::warn!("{} tree job(s) failed and were skipped", outcome.failed);
        }
        let tree_files = complete_outputs(outcome.outputs, &config.tree_builder.program);

        let mut diameters = Vec::with_capacity(tree_files.len());
        for tree_file in &tree_files {
            match read_newick(tree_file).and_then(|tree| tree.diameter()) {
                Ok(diameter) => diameters.push(diameter),
                Err(err) => log::warn!("skipping tree {}: {err}", tree_file.display()),
            }
        }
        DiameterSummary::from_diameters(&diameters)?
    } else {
        log::info!("skipping tree inference and tree diameter statistics");
        DiameterSummary::default()
    };

    let mut msas = Vec::with_capacity(files.len());
    for file in &files {
        msas.push(read_fasta(file)?);
    }
    let matrix = Supermatrix::new(msas);
    let report = AggregateReport::from_parts(&matrix, diameter_summary);

    emit(config, &report)?;
    Ok(report)
}

/// Outputs of jobs whose output file exists and is non-empty. A tool that
/// launched but produced nothing usable is a soft failure at this point.
fn complete_outputs(jobs: Vec<PipelineJob>, tool: &str) -> Vec<PathBuf> {
    let (complete, incomplete): (Vec<_>, Vec<_>) =
        jobs.into_iter().partition(PipelineJob::is_complete);
    for job in &incomplete {
        log::warn!(
            "{} produced no usable output for {}, dropping it from the batch",
            tool,
            job.input.display()
        );
    }
    complete.into_iter().map(|job| job.output).collect()
}

fn emit(config: &PipelineConfig, report: &AggregateReport) -> Result<()> {
    if config.overwrite && config.output.exists() {
        std::fs::remove_file(&config.output)?;
    }

    let fresh = std::fs::metadata(&config.output)
        .map(|m| m.len() == 0)
        .unwrap_or(true);
    let mut sink = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&config.output)?;

    let emitter = ReportEmitter {
        write_header: config.write_header && fresh,
    };
    emitter.append_record(&config.id, report, &mut sink)?;

    println!("\n{}", emitter.render(report));
    println!("Wrote ortholog statistics to {}", config.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::tools::OutputMode;
    use std::path::Path;

    fn make_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).unwrap();
    }

    /// Fixture: two alignment files, a stand-in aligner that copies its
    /// input, and a stand-in tree tool that writes a fixed Newick tree.
    struct Fixture {
        dir: tempfile::TempDir,
        inputs: PathBuf,
        config: PipelineConfig,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();

        let inputs = dir.path().join("orthologs");
        std::fs::create_dir(&inputs).unwrap();
        std::fs::write(
            inputs.join("og1.fasta"),
            ">x\nAAAAAAAAAA\n>y\nCCCCCCCCCC\n",
        )
        .unwrap();
        std::fs::write(
            inputs.join("og2.fasta"),
            ">y\nGGGGGGGGGGGGGGGGGGGG\n>z\nTTTTTTTTTTTTTTTTTTTT\n",
        )
        .unwrap();

        let aligner_script = dir.path().join("fakealign.sh");
        std::fs::write(&aligner_script, "#!/bin/sh\ncat \"$1\"\n").unwrap();
        make_executable(&aligner_script);

        let tree_script = dir.path().join("faketree.sh");
        std::fs::write(
            &tree_script,
            "#!/bin/sh\necho '(A:1,B:2,C:3);' > \"$2\"\n",
        )
        .unwrap();
        make_executable(&tree_script);

        let scratch_parent = dir.path().join("scratch");
        std::fs::create_dir(&scratch_parent).unwrap();

        let config = PipelineConfig {
            id: "fixture".into(),
            realign: true,
            worker_count: 1,
            output: dir.path().join("stats.csv"),
            scratch_parent: Some(scratch_parent),
            aligner: ToolSpec {
                program: aligner_script.to_string_lossy().into_owned(),
                args: Vec::new(),
                output: OutputMode::Stdout,
            },
            tree_builder: ToolSpec {
                program: tree_script.to_string_lossy().into_owned(),
                args: Vec::new(),
                output: OutputMode::Flag("-out".into()),
            },
            ..PipelineConfig::default()
        };

        Fixture { dir, inputs, config }
    }

    fn scratch_is_empty(fx: &Fixture) -> bool {
        let parent = fx.config.scratch_parent.as_ref().unwrap();
        std::fs::read_dir(parent).unwrap().next().is_none()
    }

    #[test]
    fn full_run_aggregates_and_cleans_up() {
        let fx = fixture();
        let report = run_pipeline(&[fx.inputs.clone()], &fx.config).unwrap();

        assert_eq!(report.alignment_count, 2);
        assert_eq!(report.sequence_count, 4);
        assert_eq!(report.otu_count, 3);
        assert_eq!(report.concatenated_length, 30);
        assert_eq!(report.missing_data_percent, 33.3);
        // Both fake trees have diameter 5.
        assert_eq!(report.diameters.min, 5.0);
        assert_eq!(report.diameters.max, 5.0);
        assert_eq!(report.diameters.median, 5.0);

        let csv = std::fs::read_to_string(&fx.config.output).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("id;alignment_count;"));
        assert!(lines.next().unwrap().starts_with("fixture;2;4;3;"));
        assert!(lines.next().is_none());

        assert!(scratch_is_empty(&fx));
    }

    #[test]
    fn no_trees_run_reports_zero_diameters() {
        let mut fx = fixture();
        fx.config.infer_trees = false;
        fx.config.realign = false;
        let report = run_pipeline(&[fx.inputs.clone()], &fx.config).unwrap();
        assert_eq!(report.diameters, DiameterSummary::default());
        assert!(scratch_is_empty(&fx));
    }

    #[test]
    fn emit_failure_is_surfaced_after_cleanup() {
        let mut fx = fixture();
        // An output path that cannot be opened as a file.
        fx.config.output = fx.dir.path().join("orthologs");
        let result = run_pipeline(&[fx.inputs.clone()], &fx.config);
        assert!(result.is_err());
        assert!(scratch_is_empty(&fx));
    }

    #[test]
    fn missing_tool_aborts_the_run() {
        let mut fx = fixture();
        fx.config.tree_builder = ToolSpec {
            program: "no-such-tree-tool".into(),
            args: Vec::new(),
            output: OutputMode::Flag("-out".into()),
        };
        let result = run_pipeline(&[fx.inputs.clone()], &fx.config);
        assert!(matches!(result, Err(Error::ToolUnavailable { .. })));
        assert!(scratch_is_empty(&fx));
    }

    #[test]
    fn records_append_unless_overwrite_is_set() {
        let mut fx = fixture();
        fx.config.realign = false;
        fx.config.infer_trees = false;

        run_pipeline(&[fx.inputs.clone()], &fx.config).unwrap();
        run_pipeline(&[fx.inputs.clone()], &fx.config).unwrap();
        let csv = std::fs::read_to_string(&fx.config.output).unwrap();
        // Header once, then one record per run.
        assert_eq!(csv.lines().count(), 3);

        fx.config.overwrite = true;
        run_pipeline(&[fx.inputs.clone()], &fx.config).unwrap();
        let csv = std::fs::read_to_string(&fx.config.output).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn unreadable_inputs_are_fatal() {
        let fx = fixture();
        let result = run_pipeline(&[fx.dir.path().join("nowhere")], &fx.config);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
