// src/tools.rs

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use tempfile::TempDir;

use crate::error::{Error, Result};

/// How a tool delivers its output file.
#[derive(Debug, Clone)]
pub enum OutputMode {
    /// The tool writes the result to standard output; the runner redirects
    /// it into the destination file.
    Stdout,
    /// The tool writes the destination itself, named by this flag.
    Flag(String),
}

/// One external executable and its fixed argument vector. The input path is
/// always appended last.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub program: String,
    pub args: Vec<String>,
    pub output: OutputMode,
}

impl ToolSpec {
    /// MAFFT in L-INS-i mode (iterative refinement, local pairwise
    /// alignment), realigned FASTA on stdout.
    pub fn mafft() -> Self {
        Self {
            program: "mafft".into(),
            args: ["--maxiterate", "1000", "--localpair", "--quiet"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            output: OutputMode::Stdout,
        }
    }

    /// FastTree 2 with exhaustive search and gamma rate heterogeneity,
    /// Newick tree written to an explicit `-out` path.
    pub fn fasttree() -> Self {
        Self {
            program: "fasttree".into(),
            args: ["-slow", "-gamma"].iter().map(|s| s.to_string()).collect(),
            output: OutputMode::Flag("-out".into()),
        }
    }
}

/// Allocates unique output paths for tool invocations. Injected into the
/// runner so tests can substitute their own allocator and so cleanup is
/// scoped to one pipeline run instead of ambient process state.
pub trait TempAllocator: Send + Sync {
    /// Returns a fresh, unique path owned by the allocator's scope.
    fn alloc(&self) -> Result<PathBuf>;
}

/// Run-scoped scratch directory backing [`TempAllocator`]. `close` is the
/// pipeline's CLEANUP step; dropping the value removes the directory too.
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("orthoquoll-").tempdir()?;
        Ok(Self { dir })
    }

    /// Scratch directory under an explicit parent, for callers that pin
    /// temporary files to a known location.
    pub fn new_in<P: AsRef<Path>>(parent: P) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("orthoquoll-")
            .tempdir_in(parent)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the directory and every temporary file allocated in it.
    pub fn close(self) -> Result<()> {
        self.dir.close()?;
        Ok(())
    }
}

impl TempAllocator for ScratchDir {
    fn alloc(&self) -> Result<PathBuf> {
        let file = tempfile::Builder::new()
            .prefix("job-")
            .tempfile_in(self.dir.path())?;
        let (_, path) = file
            .keep()
            .map_err(|e| Error::Io(e.error))?;
        Ok(path)
    }
}

/// One external-tool invocation: the (input, output) pair plus the child's
/// exit status once it has run.
#[derive(Debug)]
pub struct PipelineJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub status: Option<ExitStatus>,
}

impl PipelineJob {
    /// True when the output file exists and is non-empty. Downstream stages
    /// trust this over the exit status: a tool that exited non-zero after
    /// writing usable output still feeds the batch.
    pub fn is_complete(&self) -> bool {
        std::fs::metadata(&self.output)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }
}

/// Runs one tool against one input file.
///
/// The input must exist (`NotFound` otherwise). A caller-supplied output
/// path must not exist (`AlreadyExists`, the file is left untouched); when
/// omitted, a fresh path comes from the allocator. A failure to launch the
/// executable is `ToolUnavailable`; a launched tool that exits non-zero is
/// partial success: the job is returned and the caller inspects
/// [`PipelineJob::is_complete`].
pub fn run_tool(
    spec: &ToolSpec,
    input: &Path,
    output: Option<&Path>,
    alloc: &dyn TempAllocator,
) -> Result<PipelineJob> {
    if !input.is_file() {
        return Err(Error::NotFound(input.to_path_buf()));
    }

    let out_path = match output {
        Some(path) => {
            if path.exists() {
                return Err(Error::AlreadyExists(path.to_path_buf()));
            }
            path.to_path_buf()
        }
        None => alloc.alloc()?,
    };

    let mut cmd = Command::new(&spec.program);
    match &spec.output {
        OutputMode::Stdout => {
            cmd.args(&spec.args).arg(input);
            let out_file = File::create(&out_path)?;
            cmd.stdout(Stdio::from(out_file));
        }
        OutputMode::Flag(flag) => {
            cmd.arg(flag).arg(&out_path).args(&spec.args).arg(input);
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
    }

    let status = cmd.status().map_err(|source| Error::ToolUnavailable {
        tool: spec.program.clone(),
        source,
    })?;

    if !status.success() {
        log::warn!(
            "{} exited with {} on {}",
            spec.program,
            status,
            input.display()
        );
    }

    Ok(PipelineJob {
        input: input.to_path_buf(),
        output: out_path,
        status: Some(status),
    })
}
