use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

use crate::error::{Error, Result};
use crate::types::{Alignment, Sequence};

/// Recognized FASTA file extensions.
pub const FASTA_EXTENSIONS: &[&str] =
    &["fa", "fas", "fasta", "fna", "faa", "fsa", "ffn", "frn"];

/// Recognized Newick file extensions. Used for classifying directory
/// contents, never for parsing decisions.
pub const NEWICK_EXTENSIONS: &[&str] = &["nw", "newick", "tre", "tree", "treefile"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Returns true if the provided path has a recognized FASTA extension.
pub fn is_fasta(path: &Path) -> bool {
    has_extension(path, FASTA_EXTENSIONS)
}

/// Returns true if the provided path has a recognized Newick extension.
pub fn is_newick(path: &Path) -> bool {
    has_extension(path, NEWICK_EXTENSIONS)
}

/// Minimal FASTA read function that also supports .gz
pub fn read_fasta<P: AsRef<Path>>(path: P) -> Result<Alignment> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|_| Error::NotFound(path.to_path_buf()))?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };

    let mut sequences = Vec::new();
    let mut header: Option<String> = None;
    let mut residues = String::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end();
        if let Some(rest) = line.strip_prefix('>') {
            if let Some(header_line) = header.take() {
                sequences.push(make_sequence(header_line, std::mem::take(&mut residues)));
            }
            header = Some(rest.to_string());
        } else if header.is_some() {
            residues.push_str(line.trim());
        }
        // Residue lines before the first header are silently skipped.
    }
    if let Some(header_line) = header {
        sequences.push(make_sequence(header_line, residues));
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Alignment { name, sequences })
}

fn make_sequence(header_line: String, residues: String) -> Sequence {
    let otu = header_line
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string();
    Sequence {
        otu,
        header_line,
        residues,
    }
}

/// Expands files and directories into the list of FASTA files to process.
/// Directories enumerate their immediate children, plus each child
/// directory's children when `subdirs` is set. Zero matches is fatal for
/// the invocation.
pub fn collect_fasta_files(inputs: &[PathBuf], subdirs: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() && is_fasta(input) {
            files.push(input.clone());
        } else if input.is_dir() {
            files.extend(fasta_files_in_dir(input, subdirs)?);
        } else if input.is_file() {
            log::warn!("skipping {}: unrecognized extension", input.display());
        } else {
            return Err(Error::NotFound(input.clone()));
        }
    }

    if files.is_empty() {
        return Err(Error::EmptyInput("no FASTA files found in the provided path"));
    }
    Ok(files)
}

fn fasta_files_in_dir(directory: &Path, subdirs: bool) -> Result<Vec<PathBuf>> {
    let mut directories = vec![directory.to_path_buf()];

    if subdirs {
        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();
            if path.is_dir() {
                directories.push(path);
            }
        }
    }

    let mut files = Vec::new();
    for dir in directories {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && is_fasta(&path) {
                files.push(path);
            }
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn classifies_extensions() {
        assert!(is_fasta(Path::new("orthologs/og42.fasta")));
        assert!(is_fasta(Path::new("OG42.FAS")));
        assert!(!is_fasta(Path::new("og42.tre")));
        assert!(is_newick(Path::new("og42.treefile")));
        assert!(!is_newick(Path::new("og42")));
    }

    #[test]
    fn parses_multiline_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("og1.fasta");
        let mut f = File::create(&path).unwrap();
        write!(f, ">otu_a extra description\nACGT\nAC-G\n>otu_b\nTTTT\n").unwrap();

        let msa = read_fasta(&path).unwrap();
        assert_eq!(msa.name, "og1");
        assert_eq!(msa.sequences.len(), 2);
        assert_eq!(msa.sequences[0].otu, "otu_a");
        assert_eq!(msa.sequences[0].residues, "ACGTAC-G");
        assert_eq!(msa.sequences[1].residues, "TTTT");
    }

    #[test]
    fn reads_gzipped_fasta() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("og1.fasta.gz");
        let f = File::create(&path).unwrap();
        let mut gz = flate2::write::GzEncoder::new(f, flate2::Compression::default());
        gz.write_all(b">a\nACGT\n").unwrap();
        gz.finish().unwrap();

        let msa = read_fasta(&path).unwrap();
        assert_eq!(msa.sequences.len(), 1);
        assert_eq!(msa.sequences[0].residues, "ACGT");
    }

    #[test]
    fn missing_file_is_not_found() {
        match read_fasta("definitely/not/here.fasta") {
            Err(Error::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn directory_expansion_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.fasta"), ">x\nAC\n").unwrap();
        std::fs::write(dir.path().join("b.fa"), ">y\nGT\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
        let sub = dir.path().join("nested");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("c.fna"), ">z\nAA\n").unwrap();

        let flat = collect_fasta_files(&[dir.path().to_path_buf()], false).unwrap();
        assert_eq!(flat.len(), 2);

        let deep = collect_fasta_files(&[dir.path().to_path_buf()], true).unwrap();
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn zero_matches_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        match collect_fasta_files(&[dir.path().to_path_buf()], false) {
            Err(Error::EmptyInput(_)) => {}
            other => panic!("expected EmptyInput, got {:?}", other.map(|_| ())),
        }
    }
}
