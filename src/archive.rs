use super::CoverError;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;
use tracing::instrument;
use zip::{write::FileOptions, ZipWriter};

/// Packs `files` flat into a zip archive at `dest`.
///
/// Directories are skipped. Returns `false` without creating `dest` when
/// there is nothing to pack.
#[instrument(skip(files))]
pub fn make_zip<T1, T2>(files: T1, dest: &Path) -> Result<bool, CoverError>
where
    T1: IntoIterator<Item = T2>,
    T2: AsRef<Path>,
{
    let files: Vec<_> = files
        .into_iter()
        .filter(|f| f.as_ref().is_file())
        .collect();
    if files.is_empty() {
        return Ok(false);
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = ZipWriter::new(fs::File::create(dest)?);
    for file in &files {
        let file = file.as_ref();
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("Add {name}");
        // images are already compressed
        writer.start_file(
            name,
            FileOptions::default().compression_method(zip::CompressionMethod::Stored),
        )?;
        writer.write_all(&fs::read(file)?)?;
    }
    writer.finish()?;
    Ok(true)
}
