use anyhow::Result;
use serde::Serialize;

use crate::config::{ArchiveLocation, Config};

#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub name: String,
    pub location: String,
    /// Whether the archive is already on disk.
    pub cached: bool,
}

pub fn source_statuses(config: &Config) -> Vec<SourceStatus> {
    config
        .sources
        .iter()
        .map(|(name, source)| {
            let (location, cached) = match source.location() {
                Some(ArchiveLocation::Local(path)) => (path.display().to_string(), path.is_file()),
                Some(ArchiveLocation::Remote(url)) => {
                    let archive = config.storage.data_dir.join(source.archive_name(name));
                    (url, archive.is_file())
                }
                None => ("-".to_string(), false),
            };
            SourceStatus {
                name: name.clone(),
                location,
                cached,
            }
        })
        .collect()
}

pub fn list_sources(config: &Config) -> Result<()> {
    let statuses = source_statuses(config);
    if statuses.is_empty() {
        println!("No sources configured.");
        return Ok(());
    }

    println!("{:<20} {:<8} LOCATION", "SOURCE", "CACHED");
    for s in statuses {
        println!("{:<20} {:<8} {}", s.name, s.cached, s.location);
    }
    Ok(())
}
