//! File assembly: selects the primary thesis document, renames it under a
//! deterministic scheme, and bundles any supplemental materials.

use std::fs;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::error::DepositError;
use crate::package::PackageData;

// The destination file name is truncated once it grows past this limit.
const FILE_NAME_LIMIT: usize = 120;

/// Select the primary document from the package's data area.
///
/// The main thesis is assumed to be a PDF. File names are not reliably
/// structured, so among the `*.pdf` candidates directly under `data/` the
/// largest file by byte size wins. Not foolproof.
fn find_thesis_pdf(package_path: &Path) -> Result<std::path::PathBuf, DepositError> {
    let data_path = package_path.join("data");
    let mut largest_file_size = 0;
    let mut thesis_file_path = None;

    if let Ok(entries) = fs::read_dir(&data_path) {
        for entry in entries.flatten() {
            let path = entry.path();
            let is_pdf = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false);
            if !path.is_file() || !is_pdf {
                continue;
            }
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > largest_file_size {
                largest_file_size = size;
                thesis_file_path = Some(path);
            }
        }
    }

    thesis_file_path
        .ok_or_else(|| DepositError::MissingFile("could not find pdf file".to_string()))
}

/// Build the deterministic destination name for the primary document:
/// the simplified creator name, a double-hyphen separator, then as many
/// alphanumeric-filtered title words as fit under the length limit.
pub fn destination_file_name(data: &PackageData) -> String {
    let mut dest = data.creator.to_lowercase().replace([' ', ','], "-");
    dest.push_str("--");

    let mut title_words: Vec<String> = Vec::new();
    let mut title_words_len = 0;
    for word in data.title.split_whitespace() {
        let filtered: String = word.chars().filter(char::is_ascii_alphanumeric).collect();
        if dest.len() + title_words_len > FILE_NAME_LIMIT {
            break;
        }
        title_words_len += filtered.len();
        title_words.push(filtered);
    }

    dest.push_str(&title_words.join("-"));
    let mut dest = dest.to_lowercase();
    dest.push_str(".pdf");
    dest
}

/// Copy the primary document into the files area under its deterministic
/// name, preserving file metadata where the platform allows.
fn copy_thesis_pdf(data: &PackageData, files_path: &Path) -> Result<String, DepositError> {
    let thesis_path = find_thesis_pdf(&data.path)?;
    let dest_file_name = destination_file_name(data);
    let dest_path = files_path.join(&dest_file_name);

    fs::copy(&thesis_path, &dest_path)?;
    debug!(
        source = %thesis_path.display(),
        dest = %dest_path.display(),
        "Copied thesis document"
    );
    Ok(dest_file_name)
}

/// Archive a supplemental-materials directory into a single zip, walking
/// subdirectories and storing entry names relative to the directory root.
fn archive_supplemental(supplemental_path: &Path, archive_path: &Path) -> Result<(), DepositError> {
    let file = File::create(archive_path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut pending = vec![supplemental_path.to_path_buf()];
    let mut buffer = Vec::new();
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let relative = path
                .strip_prefix(supplemental_path)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            if path.is_dir() {
                zip.add_directory(relative, options)?;
                pending.push(path);
            } else {
                zip.start_file(relative, options)?;
                buffer.clear();
                File::open(&path)?.read_to_end(&mut buffer)?;
                zip.write_all(&buffer)?;
            }
        }
    }
    zip.finish()?;
    Ok(())
}

/// Stage the package files into the output files area.
///
/// Returns the ordered file-name list, primary document first and the
/// supplemental archive second when the package carries one.
pub fn copy_package_files(
    data: &PackageData,
    files_path: &Path,
) -> Result<Vec<String>, DepositError> {
    let thesis_file_name = copy_thesis_pdf(data, files_path)?;

    let supplemental_path = data.path.join("data").join("supplemental");
    if supplemental_path.is_dir() {
        let stem = thesis_file_name.trim_end_matches(".pdf");
        let archive_file_name = format!("{stem}-supplemental.zip");
        archive_supplemental(&supplemental_path, &files_path.join(&archive_file_name))?;
        info!(
            package = %data.name,
            archive = %archive_file_name,
            "Archived supplemental materials"
        );
        return Ok(vec![thesis_file_name, archive_file_name]);
    }

    Ok(vec![thesis_file_name])
}
