use std::fs::{self, File};
use std::path::Path;
use log::info;

use crate::error::SinkError;
use crate::models::JobPosting;

/// Overwrites `path` with a header row and one row per posting, creating
/// parent directories as needed. An empty slice leaves the filesystem alone.
pub fn save_to_csv<P: AsRef<Path>>(jobs: &[JobPosting], path: P) -> Result<usize, SinkError> {
    let path = path.as_ref();
    if jobs.is_empty() {
        info!("No jobs to save to {:?}", path);
        return Ok(0);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| SinkError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file = File::create(path).map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(file);

    for job in jobs {
        writer.serialize(job)?;
    }
    writer.flush().map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Saved {} jobs to {:?}", jobs.len(), path);
    Ok(jobs.len())
}

/// Reads back a file written by [`save_to_csv`].
pub fn load_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<JobPosting>, SinkError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rdr = csv::ReaderBuilder::new().from_reader(file);
    let mut jobs = Vec::new();
    for result in rdr.deserialize() {
        jobs.push(result?);
    }
    Ok(jobs)
}
