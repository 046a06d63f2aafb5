//! Job corpus loading: locate the CSV, check its header, read the rows.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::errors::MatchError;
use crate::models::job::REQUIRED_COLUMNS;
use crate::models::JobPosting;

/// First existing path among `candidates`.
pub fn find_dataset<P: AsRef<Path>>(candidates: &[P]) -> Result<PathBuf, MatchError> {
    candidates
        .iter()
        .map(|p| p.as_ref())
        .find(|p| p.is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| MatchError::MissingDataset {
            tried: candidates.iter().map(|p| p.as_ref().to_path_buf()).collect(),
        })
}

/// Rows dropped while reading the corpus.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct SkippedRows {
    blank_id: usize,
    duplicate_id: usize,
}

/// Reads at most `read_rows` data rows. Header names are trimmed before
/// matching. Rows with a blank or repeated job id are skipped; the first
/// occurrence of an id wins.
pub fn load_corpus(path: &Path, read_rows: Option<usize>) -> Result<Vec<JobPosting>, MatchError> {
    let (jobs, skipped) = read_corpus(path, read_rows)?;

    if skipped.blank_id > 0 || skipped.duplicate_id > 0 {
        warn!(
            path = %path.display(),
            blank_ids = skipped.blank_id,
            duplicate_ids = skipped.duplicate_id,
            "Skipped corpus rows"
        );
    }
    if jobs.is_empty() {
        return Err(MatchError::EmptyCorpus);
    }

    info!(path = %path.display(), rows = jobs.len(), "Loaded job corpus");
    Ok(jobs)
}

fn read_corpus(
    path: &Path,
    read_rows: Option<usize>,
) -> Result<(Vec<JobPosting>, SkippedRows), MatchError> {
    let corpus_err = |source: csv::Error| MatchError::Corpus {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(corpus_err)?;

    let headers = reader.headers().map_err(corpus_err)?.clone();
    let present: HashSet<&str> = headers.iter().collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !present.contains(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(MatchError::SchemaValidation { missing });
    }

    let limit = read_rows.unwrap_or(usize::MAX);
    let mut seen = HashSet::new();
    let mut jobs = Vec::new();
    let mut skipped = SkippedRows::default();

    for record in reader.deserialize::<JobPosting>().take(limit) {
        let mut job = record.map_err(corpus_err)?;
        job.job_id = job.job_id.trim().to_string();
        if job.job_id.is_empty() {
            skipped.blank_id += 1;
            continue;
        }
        if !seen.insert(job.job_id.clone()) {
            skipped.duplicate_id += 1;
            continue;
        }
        jobs.push(job);
    }
    Ok((jobs, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Job Id,Experience,Qualifications,Salary Range,Country,Work Type,Company Size,Job Description,Responsibilities,Extra";

    fn write_csv(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{body}").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_loads_rows_and_ignores_extra_columns() {
        let file = write_csv(&format!(
            "{HEADER}\n\
             J1,2 to 5 Years,BSc,$50K-$80K,France,Full-Time,100,Python developer,Build APIs,x\n\
             J2,,,,,,,,,\n"
        ));
        let jobs = load_corpus(file.path(), None).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].description.as_deref(), Some("Python developer"));
        assert_eq!(jobs[1].country, None);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let file = write_csv(&format!(
            "{HEADER}\n\
             J1,,,,,,,first,,\n\
             J1,,,,,,,second,,\n\
             J2,,,,,,,third,,\n"
        ));
        let jobs = load_corpus(file.path(), None).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].description.as_deref(), Some("first"));
    }

    #[test]
    fn test_blank_and_duplicate_ids_counted_separately() {
        let file = write_csv(&format!(
            "{HEADER}\n\
             J1,,,,,,,first,,\n\
             ,,,,,,,no id,,\n\
             \"  \",,,,,,,blank id,,\n\
             J1,,,,,,,again,,\n\
             J2,,,,,,,second,,\n"
        ));
        let (jobs, skipped) = read_corpus(file.path(), None).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(
            skipped,
            SkippedRows {
                blank_id: 2,
                duplicate_id: 1,
            }
        );
    }

    #[test]
    fn test_padded_header_names_still_deserialize() {
        let padded = HEADER
            .split(',')
            .map(|h| format!(" {h} "))
            .collect::<Vec<_>>()
            .join(",");
        let file = write_csv(&format!(
            "{padded}\nJ1,3+ Years,,,Japan,,,Rust engineer,,\n"
        ));
        let jobs = load_corpus(file.path(), None).unwrap();
        assert_eq!(jobs[0].job_id, "J1");
        assert_eq!(jobs[0].country.as_deref(), Some("Japan"));
        assert_eq!(jobs[0].description.as_deref(), Some("Rust engineer"));
    }

    #[test]
    fn test_read_rows_limits_input() {
        let file = write_csv(&format!(
            "{HEADER}\nJ1,,,,,,,a,,\nJ2,,,,,,,b,,\nJ3,,,,,,,c,,\n"
        ));
        assert_eq!(load_corpus(file.path(), Some(2)).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_columns_are_all_named() {
        let file = write_csv("Job Id,Job Description\nJ1,text\n");
        match load_corpus(file.path(), None) {
            Err(MatchError::SchemaValidation { missing }) => {
                assert_eq!(missing.len(), REQUIRED_COLUMNS.len() - 2);
                assert!(missing.contains(&"Country".to_string()));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_header_only_is_empty_corpus() {
        let file = write_csv(&format!("{HEADER}\n"));
        assert!(matches!(
            load_corpus(file.path(), None),
            Err(MatchError::EmptyCorpus)
        ));
    }

    #[test]
    fn test_find_dataset_reports_every_candidate() {
        let file = write_csv("x");
        let missing = PathBuf::from("/definitely/not/here.csv");
        assert_eq!(
            find_dataset(&[missing.clone(), file.path().to_path_buf()]).unwrap(),
            file.path()
        );
        match find_dataset(&[missing.clone()]) {
            Err(MatchError::MissingDataset { tried }) => assert_eq!(tried, vec![missing]),
            other => panic!("expected missing dataset, got {other:?}"),
        }
    }
}
