//! Apple maker-note support: the exiftool tag definition, the minimal
//! maker-note block injected into files that have none, and the probe that
//! decides whether injection is needed.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{In, Tag};
use tracing::debug;

use crate::MetadataError;

/// ExifTool user config declaring tag 0x0021 of the Apple maker-note table
/// as the writable float `HDRGamma`.
pub const EXIFTOOL_CONFIG: &str = r#"%Image::ExifTool::UserDefined = (
    'Image::ExifTool::Apple::Main' => {
        0x0021 => {
            Name => 'HDRGamma',
            Writable => 'float',
        },
    },
);
1;
"#;

/// Smallest Apple maker-note block exiftool will accept as a container for
/// `HDRGamma`: the "Apple" signature, a big-endian TIFF header and a
/// five-entry IFD.
pub const APPLE_MAKER_NOTE: [u8; 108] = [
    0x41, 0x70, 0x70, 0x6c, 0x65, 0x00, 0x00, 0x4d, 0x4d, 0x00, 0x2a, 0x00, 0x00, 0x00, 0x08,
    0x00, 0x05, 0x00, 0x01, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x05, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x07, 0x00, 0x01, 0x00, 0x00, 0x00, 0x10, 0x61, 0x70, 0x70, 0x6c, 0x65, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0x03, 0x00, 0x01, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x0a, 0x00, 0x01, 0x00, 0x00, 0x00,
    0x4a, 0x00, 0x00, 0x00, 0x05, 0x00, 0x05, 0x00, 0x01, 0x00, 0x00, 0x00, 0x52, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00,
];

/// Whether the file at `path` already carries an EXIF MakerNote.
///
/// Files without readable EXIF count as having none; only failing to open
/// the file is an error.
pub fn has_maker_note(path: &Path) -> Result<bool, MetadataError> {
    let file = File::open(path).map_err(|source| MetadataError::Io {
        context: format!("open {}", path.display()),
        source,
    })?;
    let mut reader = BufReader::new(file);
    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Ok(exif.get_field(Tag::MakerNote, In::PRIMARY).is_some()),
        Err(err) => {
            debug!(?path, %err, "no readable EXIF, treating as no maker note");
            Ok(false)
        }
    }
}
