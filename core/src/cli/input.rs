use log::info;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Expands command line inputs into the DICOM files to process
///
/// Files are taken as given. Directories contribute their `.dcm`/`.dicom`
/// files and extension-less files carrying a DICOM header, sorted by path.
pub fn collect_inputs(inputs: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(collect_dicom_files(input)?);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", input.display()),
            ));
        }
    }
    Ok(files)
}

/// DICOM files directly inside `directory`
pub fn collect_dicom_files(directory: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("dcm") || ext.eq_ignore_ascii_case("dicom") => {
                files.push(path)
            }
            Some(_) => {}
            None => {
                if is_dicom_file(&path) {
                    info!("Found headerless DICOM file: {}", path.display());
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Checks for the 128-byte preamble followed by the `DICM` magic
pub fn is_dicom_file(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut buffer = [0u8; 132];
    match file.read_exact(&mut buffer) {
        Ok(()) => &buffer[128..132] == b"DICM",
        Err(_) => false,
    }
}
