/// Serialization format options for rules, generator sequences and tables.
///
/// Each format has both compressed (Lz4) and uncompressed variants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SerializationFormat {
    /// JSON format, human readable. Midpoints are written as exact fractions.
    Json,
    /// JSON format with LZ4 compression
    JsonLz4,
    /// Bincode format, compact binary
    Bincode,
    /// Bincode format with LZ4 compression (default)
    #[default]
    BincodeLz4,
}

impl SerializationFormat {
    /// Returns true if this format uses LZ4 compression
    pub fn is_compressed(&self) -> bool {
        matches!(self, SerializationFormat::JsonLz4 | SerializationFormat::BincodeLz4)
    }
}

use crate::errors::GKError;
use serde::{de::DeserializeOwned, Serialize};

fn serialize_serde<T: Serialize>(data: &T, format: SerializationFormat) -> Result<Vec<u8>, GKError> {
    match format {
        SerializationFormat::Json | SerializationFormat::JsonLz4 => {
            serde_json::to_vec(data).map_err(|_| GKError::SerializationFailed)
        }
        SerializationFormat::Bincode | SerializationFormat::BincodeLz4 => {
            bincode::serde::encode_to_vec(data, bincode::config::standard()).map_err(|_| GKError::SerializationFailed)
        }
    }
}

fn deserialize_serde<T: DeserializeOwned>(data: &[u8], format: SerializationFormat) -> Result<T, GKError> {
    match format {
        SerializationFormat::Json | SerializationFormat::JsonLz4 => {
            serde_json::from_slice(data).map_err(|_| GKError::DeserializationFailed)
        }
        SerializationFormat::Bincode | SerializationFormat::BincodeLz4 => {
            bincode::serde::decode_from_slice(data, bincode::config::standard())
                .map(|(value, _)| value)
                .map_err(|_| GKError::DeserializationFailed)
        }
    }
}

/// Serialize data to bytes using the specified format.
/// Applies LZ4 compression if the format variant ends with Lz4.
pub fn serialize<T: Serialize>(data: &T, format: SerializationFormat) -> Result<Vec<u8>, GKError> {
    let bytes = serialize_serde(data, format)?;
    if format.is_compressed() {
        Ok(lz4_flex::compress_prepend_size(&bytes))
    } else {
        Ok(bytes)
    }
}

/// Deserialize data from bytes using the specified format.
/// Applies LZ4 decompression if the format variant ends with Lz4.
pub fn deserialize<T: DeserializeOwned>(data: &[u8], format: SerializationFormat) -> Result<T, GKError> {
    if format.is_compressed() {
        let decompressed = lz4_flex::decompress_size_prepended(data)
            .map_err(|_| GKError::LZ4DecompressionFailed)?;
        deserialize_serde(&decompressed, format)
    } else {
        deserialize_serde(data, format)
    }
}

/// Write `data` to the file at `path`.
pub fn write<T: Serialize>(data: &T, path: &str, format: SerializationFormat) -> Result<(), GKError> {
    use std::io::Write;
    let mut file = std::io::BufWriter::new(std::fs::File::create(path).map_err(|_| GKError::FileIOError)?);
    let buffer = serialize(data, format)?;
    file.write_all(&buffer).map_err(|_| GKError::WriteBufferFailed)?;
    Ok(())
}

/// Read a value from a reader.
pub fn read<T: DeserializeOwned, Reader: std::io::Read>(mut reader: Reader, format: SerializationFormat) -> Result<T, GKError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(|_| GKError::ReadBufferFailed)?;
    deserialize(&bytes, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ball::CertifiedReal;
    use num_bigint::BigInt;
    use num_rational::BigRational;

    fn balls() -> Vec<CertifiedReal> {
        vec![
            CertifiedReal::from_rational(&BigRational::new(BigInt::from(1), BigInt::from(3)), 100),
            CertifiedReal::from_integer(-7),
            CertifiedReal::pi(80),
        ]
    }

    #[test]
    fn test_all_formats_keep_balls_exactly() {
        for format in [SerializationFormat::Json, SerializationFormat::JsonLz4,
            SerializationFormat::Bincode, SerializationFormat::BincodeLz4] {
            let data = balls();
            let bytes = serialize(&data, format).unwrap();
            let result: Vec<CertifiedReal> = deserialize(&bytes, format).unwrap();
            assert_eq!(data, result, "{format:?}");
        }
    }

    #[test]
    fn test_corrupt_input() {
        let garbage = [0xff_u8, 0xff, 0xff, 0xff, 1, 2, 3];
        assert_eq!(deserialize::<Vec<CertifiedReal>>(&garbage, SerializationFormat::BincodeLz4),
            Err(GKError::LZ4DecompressionFailed));
        assert_eq!(deserialize::<Vec<CertifiedReal>>(b"[1, 2", SerializationFormat::Json),
            Err(GKError::DeserializationFailed));
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join("gkrust_serialization_test.bin");
        let path = path.to_str().unwrap();
        write(&balls(), path, SerializationFormat::BincodeLz4).unwrap();
        let back: Vec<CertifiedReal> = read(std::fs::File::open(path).unwrap(), SerializationFormat::BincodeLz4).unwrap();
        assert_eq!(back, balls());
        std::fs::remove_file(path).unwrap();
    }
}
