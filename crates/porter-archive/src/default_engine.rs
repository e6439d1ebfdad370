//! Built-in archive engine for zip and tar family formats.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use zip::write::SimpleFileOptions;

use porter_core::OpsError;

use crate::{ArchiveEngine, CompressOption, ExtractOption};

/// Formats the default engine can handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Zip,
    Tar,
    TarGz,
    TarXz,
    TarBz2,
}

impl Format {
    fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".tar.xz") {
            Some(Self::TarXz)
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
            Some(Self::TarBz2)
        } else if name.ends_with(".tar") {
            Some(Self::Tar)
        } else {
            None
        }
    }
}

/// Pure-Rust engine backed by the zip and tar crates.
///
/// Passwords are honored on zip extraction only; the tar family has no
/// encryption, and creating encrypted archives is left to external
/// engines.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEngine;

impl DefaultEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ArchiveEngine for DefaultEngine {
    fn compress(
        &self,
        sources: &[PathBuf],
        output: &Path,
        option: &CompressOption,
    ) -> Result<(), OpsError> {
        if option.password.is_some() {
            tracing::warn!(output = %output.display(), "default engine ignores compress passwords");
        }
        let format = Format::detect(output).ok_or_else(|| OpsError::UnsupportedFormat {
            path: output.to_path_buf(),
        })?;
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(OpsError::NotFound {
                    path: parent.to_path_buf(),
                });
            }
        }
        match format {
            Format::Zip => compress_zip(sources, output),
            Format::Tar => {
                let file = File::create(output).map_err(|e| OpsError::io(output, e))?;
                compress_tar(sources, output, file)?;
                Ok(())
            }
            Format::TarGz => {
                let file = File::create(output).map_err(|e| OpsError::io(output, e))?;
                compress_tar(sources, output, GzEncoder::new(file, Compression::default()))?
                    .finish()
                    .map_err(|e| OpsError::io(output, e))?;
                Ok(())
            }
            Format::TarXz => {
                let file = File::create(output).map_err(|e| OpsError::io(output, e))?;
                compress_tar(sources, output, xz2::write::XzEncoder::new(file, 6))?
                    .finish()
                    .map_err(|e| OpsError::io(output, e))?;
                Ok(())
            }
            Format::TarBz2 => {
                let file = File::create(output).map_err(|e| OpsError::io(output, e))?;
                compress_tar(
                    sources,
                    output,
                    bzip2::write::BzEncoder::new(file, bzip2::Compression::default()),
                )?
                .finish()
                .map_err(|e| OpsError::io(output, e))?;
                Ok(())
            }
        }
    }

    fn extract(
        &self,
        input: &Path,
        output: &Path,
        option: &ExtractOption,
    ) -> Result<(), OpsError> {
        let format = Format::detect(input).ok_or_else(|| OpsError::UnsupportedFormat {
            path: input.to_path_buf(),
        })?;
        fs::create_dir_all(output).map_err(|e| OpsError::io(output, e))?;
        let file = File::open(input).map_err(|e| OpsError::io(input, e))?;
        match format {
            Format::Zip => extract_zip(file, input, output, option.password.as_deref()),
            Format::Tar => extract_tar(file, input, output),
            Format::TarGz => extract_tar(GzDecoder::new(file), input, output),
            Format::TarXz => extract_tar(xz2::read::XzDecoder::new(file), input, output),
            Format::TarBz2 => extract_tar(bzip2::read::BzDecoder::new(file), input, output),
        }
    }
}

fn extract_tar<R: Read>(reader: R, input: &Path, output: &Path) -> Result<(), OpsError> {
    tar::Archive::new(reader)
        .unpack(output)
        .map_err(|e| OpsError::archive(input, e.to_string()))
}

fn extract_zip(
    file: File,
    input: &Path,
    output: &Path,
    password: Option<&str>,
) -> Result<(), OpsError> {
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| OpsError::archive(input, e.to_string()))?;
    for i in 0..archive.len() {
        let mut entry = match password {
            Some(pw) => archive
                .by_index_decrypt(i, pw.as_bytes())
                .map_err(|e| OpsError::archive(input, e.to_string()))?,
            None => archive
                .by_index(i)
                .map_err(|e| OpsError::archive(input, e.to_string()))?,
        };
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(input = %input.display(), index = i, "skipping entry with unsafe path");
            continue;
        };
        let out_path = output.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| OpsError::io(&out_path, e))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| OpsError::io(parent, e))?;
        }
        let mut out = File::create(&out_path).map_err(|e| OpsError::io(&out_path, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| OpsError::io(&out_path, e))?;
        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&out_path, fs::Permissions::from_mode(mode));
        }
    }
    Ok(())
}

/// Write a tar stream into `writer` and hand the writer back so
/// wrapping encoders can be finished explicitly.
fn compress_tar<W: Write>(sources: &[PathBuf], output: &Path, writer: W) -> Result<W, OpsError> {
    let mut builder = tar::Builder::new(writer);
    for source in sources {
        let name = archive_entry_name(source)?;
        let meta = fs::metadata(source).map_err(|e| OpsError::io(source, e))?;
        if meta.is_dir() {
            builder
                .append_dir_all(&name, source)
                .map_err(|e| OpsError::archive(source, e.to_string()))?;
        } else {
            builder
                .append_path_with_name(source, &name)
                .map_err(|e| OpsError::archive(source, e.to_string()))?;
        }
    }
    builder
        .into_inner()
        .map_err(|e| OpsError::archive(output, e.to_string()))
}

fn compress_zip(sources: &[PathBuf], output: &Path) -> Result<(), OpsError> {
    let file = File::create(output).map_err(|e| OpsError::io(output, e))?;
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for source in sources {
        let name = archive_entry_name(source)?;
        add_zip_entry(&mut writer, source, &name, options)?;
    }
    writer
        .finish()
        .map_err(|e| OpsError::archive(output, e.to_string()))?;
    Ok(())
}

fn add_zip_entry(
    writer: &mut zip::ZipWriter<File>,
    path: &Path,
    name: &str,
    options: SimpleFileOptions,
) -> Result<(), OpsError> {
    let meta = fs::metadata(path).map_err(|e| OpsError::io(path, e))?;
    if meta.is_dir() {
        writer
            .add_directory(name, options)
            .map_err(|e| OpsError::archive(path, e.to_string()))?;
        let mut entries: Vec<_> = fs::read_dir(path)
            .map_err(|e| OpsError::io(path, e))?
            .collect::<Result<_, _>>()
            .map_err(|e| OpsError::io(path, e))?;
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let child = entry.path();
            let child_name = format!("{name}/{}", entry.file_name().to_string_lossy());
            add_zip_entry(writer, &child, &child_name, options)?;
        }
    } else {
        writer
            .start_file(name, options)
            .map_err(|e| OpsError::archive(path, e.to_string()))?;
        let mut input = File::open(path).map_err(|e| OpsError::io(path, e))?;
        io::copy(&mut input, writer).map_err(|e| OpsError::io(path, e))?;
    }
    Ok(())
}

fn archive_entry_name(source: &Path) -> Result<String, OpsError> {
    source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| OpsError::other(format!("source has no base name: {}", source.display())))
}
