use std::io::Write;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::file_format::FileFormat;

pub type Result<T> = anyhow::Result<T>;

pub fn serialize<T: Serialize>(value: &T, format: FileFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    serialize_into(value, format, &mut buffer)?;
    Ok(buffer)
}

pub fn serialize_into<T: Serialize, W: Write>(
    value: &T,
    format: FileFormat,
    writer: &mut W,
) -> Result<()> {
    match format {
        FileFormat::Yaml => {
            let s = serde_yml::to_string(value)?;
            writer.write_all(s.as_bytes())?;
        }
        FileFormat::Json => {
            let s = serde_json::to_string_pretty(value)?;
            writer.write_all(s.as_bytes())?;
        }
        FileFormat::Bin => {
            let encoded = bincode::serde::encode_to_vec(value, bincode::config::standard())?;
            // Uncompressed size goes first (4 bytes, little-endian).
            let compressed = lz4_flex::compress_prepend_size(&encoded);
            writer.write_all(&compressed)?;
        }
    }
    Ok(())
}

pub fn deserialize<T: DeserializeOwned + 'static>(
    serialized: &[u8],
    format: FileFormat,
) -> Result<T> {
    match format {
        FileFormat::Yaml => {
            let text = std::str::from_utf8(serialized)?;
            Ok(serde_yml::from_str(text)?)
        }
        FileFormat::Json => {
            let text = std::str::from_utf8(serialized)?;
            Ok(serde_json::from_str(text)?)
        }
        FileFormat::Bin => {
            let decompressed = lz4_flex::decompress_size_prepended(serialized)?;
            let (decoded, read) =
                bincode::serde::decode_from_slice(&decompressed, bincode::config::standard())?;
            if read != decompressed.len() {
                anyhow::bail!("binary payload should be fully consumed");
            }
            Ok(decoded)
        }
    }
}

/// Read `path` and decode it using the format implied by its extension.
pub fn load_file<T: DeserializeOwned + 'static>(path: impl AsRef<std::path::Path>) -> Result<T> {
    let path = path.as_ref();
    let format = FileFormat::from_file_name(path)?;
    let bytes = std::fs::read(path)?;
    deserialize(&bytes, format)
}
