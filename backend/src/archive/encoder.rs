use std::io::{self, Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// One file inside a bundle, already carrying its final, unique name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Turns a list of entries into archive bytes. Equal input must give equal output.
pub trait ArchiveEncoder: Send + Sync {
    fn encode(&self, entries: &[ArchiveEntry]) -> io::Result<Vec<u8>>;

    /// File extension of the produced archive, without a leading dot.
    fn extension(&self) -> &'static str;
}

/// Deflated zip with every entry stamped at the DOS epoch and mode 0644, so an
/// unchanged file set encodes to the same bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipEncoder;

impl ArchiveEncoder for ZipEncoder {
    fn encode(&self, entries: &[ArchiveEntry]) -> io::Result<Vec<u8>> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in entries {
            writer
                .start_file(entry.name.as_str(), options)
                .map_err(io::Error::other)?;
            writer.write_all(&entry.bytes)?;
        }
        let cursor = writer.finish().map_err(io::Error::other)?;
        Ok(cursor.into_inner())
    }

    fn extension(&self) -> &'static str {
        "zip"
    }
}
