//! JSON sidecar files carrying descriptive attributes of a written raster

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Sidecar path for a raster: `mask.tif` -> `mask.tif.json`
pub fn sidecar_path<P: AsRef<Path>>(raster_path: P) -> PathBuf {
    let mut name = raster_path.as_ref().as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

/// Write `attrs` as pretty-printed JSON next to `raster_path`; returns the sidecar path
pub fn write_metadata<P, M>(raster_path: P, attrs: &M) -> Result<PathBuf>
where
    P: AsRef<Path>,
    M: Serialize + ?Sized,
{
    let path = sidecar_path(raster_path);
    let writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(writer, attrs)?;
    Ok(path)
}

/// Read the sidecar written by [`write_metadata`]
pub fn read_metadata<P, M>(raster_path: P) -> Result<M>
where
    P: AsRef<Path>,
    M: DeserializeOwned,
{
    let reader = BufReader::new(File::open(sidecar_path(raster_path))?);
    Ok(serde_json::from_reader(reader)?)
}
