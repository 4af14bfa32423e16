//! Cartridge image loading from a loose ROM file or a ZIP archive.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Entry extensions recognised as cartridge images inside an archive.
const ROM_EXTENSIONS: &[&str] = &["bin", "md", "gen", "smd", "sms"];

/// Read a cartridge image.
///
/// A `.zip` path yields its first entry with a ROM extension; anything
/// else is read as-is.
pub fn load_cartridge(path: &Path) -> io::Result<Vec<u8>> {
    if has_extension(path, &["zip"]) {
        return load_from_zip(path);
    }
    std::fs::read(path)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

fn load_from_zip(path: &Path) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut archive = zip::ZipArchive::new(reader)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("invalid ZIP: {e}")))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("ZIP entry error: {e}"))
        })?;

        if entry.is_dir() || !has_extension(Path::new(entry.name()), ROM_EXTENSIONS) {
            continue;
        }

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        return Ok(data);
    }

    Err(io::Error::new(
        io::ErrorKind::NotFound,
        format!("no cartridge image in {}", path.display()),
    ))
}
