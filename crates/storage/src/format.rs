//! Store snapshot file format
//!
//! A store is one file holding the latest committed snapshot.
//!
//! # File Structure
//!
//! ```text
//! +------------------+ 0
//! | SnapshotHeader   | 16 bytes (magic, format version, payload length)
//! +------------------+ 16
//! | Payload          | bincode-encoded StoreSnapshot
//! +------------------+ 16 + payload_len
//! | Footer CRC32     | 4 bytes, checksum of the payload
//! +------------------+
//! ```
//!
//! The payload carries the schema version, the persisted schema shape (used
//! by the migration engine for comparison at open time), and the records.
//! Field values are stored at their declared width; a single-precision float
//! round-trips as the same 32 bits it was written with.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use lodestone_core::{Error, Result, SchemaShape, SchemaVersion};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::arena::{Record, RecordId};

/// Magic bytes: "LODE"
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"LODE";

/// Snapshot format version for forward compatibility
pub const FORMAT_VERSION: u32 = 1;

/// Snapshot header size in bytes
pub const HEADER_SIZE: usize = 16;

/// Fixed-layout snapshot header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Magic bytes: "LODE"
    pub magic: [u8; 4],
    /// Format version for forward compatibility
    pub format_version: u32,
    /// Length of the bincode payload that follows
    pub payload_len: u64,
}

impl SnapshotHeader {
    /// Create a header for a payload of the given length
    pub fn new(payload_len: u64) -> Self {
        SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            format_version: FORMAT_VERSION,
            payload_len,
        }
    }

    /// Write the header in fixed little-endian layout
    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        w.write_all(&self.magic)?;
        w.write_u32::<LittleEndian>(self.format_version)?;
        w.write_u64::<LittleEndian>(self.payload_len)?;
        Ok(())
    }

    /// Read and validate a header
    pub fn read_from<R: Read>(mut r: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        let format_version = r.read_u32::<LittleEndian>()?;
        let payload_len = r.read_u64::<LittleEndian>()?;
        let header = SnapshotHeader {
            magic,
            format_version,
            payload_len,
        };
        header.validate()?;
        Ok(header)
    }

    /// Validate magic and format version
    pub fn validate(&self) -> Result<()> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(Error::Corruption(format!(
                "invalid magic bytes: expected {:?}, got {:?}",
                SNAPSHOT_MAGIC, self.magic
            )));
        }
        if self.format_version > FORMAT_VERSION {
            return Err(Error::Corruption(format!(
                "unsupported format version {} (max supported {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        Ok(())
    }
}

/// The durable state of one store
///
/// This is what commit writes and open reads. Records keep their arena ids so
/// creation order is stable across reopen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Schema version the file is stamped with
    pub schema_version: SchemaVersion,
    /// Persisted shape of the schema the file was written under
    pub shape: SchemaShape,
    /// Next record id the arena would allocate
    pub next_record_id: RecordId,
    /// Live records in creation order
    pub records: Vec<(RecordId, Record)>,
}

impl StoreSnapshot {
    /// An empty snapshot at the given version and shape
    pub fn empty(schema_version: SchemaVersion, shape: SchemaShape) -> Self {
        StoreSnapshot {
            schema_version,
            shape,
            next_record_id: 0,
            records: Vec::new(),
        }
    }

    /// Encode to bytes: header + payload + CRC32 footer
    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)?;
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&payload);
        let crc = hasher.finalize();

        let mut out = Vec::with_capacity(HEADER_SIZE + payload.len() + 4);
        SnapshotHeader::new(payload.len() as u64).write_to(&mut out)?;
        out.extend_from_slice(&payload);
        out.write_u32::<LittleEndian>(crc)?;
        Ok(out)
    }

    /// Decode from bytes, validating header and checksum
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cursor = std::io::Cursor::new(bytes);
        let header = SnapshotHeader::read_from(&mut cursor)?;

        let payload_len = header.payload_len as usize;
        let payload_start = HEADER_SIZE;
        let payload_end = payload_start
            .checked_add(payload_len)
            .ok_or_else(|| Error::Corruption("payload length overflow".to_string()))?;
        let total_len = payload_end
            .checked_add(4)
            .ok_or_else(|| Error::Corruption("payload length overflow".to_string()))?;
        if bytes.len() < total_len {
            return Err(Error::Corruption(format!(
                "truncated snapshot: {} bytes, need {}",
                bytes.len(),
                total_len
            )));
        }
        let payload = &bytes[payload_start..payload_end];

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(payload);
        let computed = hasher.finalize();
        let stored = u32::from_le_bytes(
            bytes[payload_end..payload_end + 4]
                .try_into()
                .map_err(|_| Error::Corruption("missing checksum".to_string()))?,
        );
        if computed != stored {
            return Err(Error::Corruption(format!(
                "checksum mismatch: computed {:08x}, stored {:08x}",
                computed, stored
            )));
        }

        Ok(bincode::deserialize(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_core::{FieldType, FieldValue};
    use std::collections::HashMap;

    fn sample_snapshot() -> StoreSnapshot {
        let mut shape = SchemaShape::new();
        shape.insert(
            "Person".to_string(),
            vec![
                ("name".to_string(), FieldType::String),
                ("score".to_string(), FieldType::Float),
            ],
        );
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), FieldValue::String("John".to_string()));
        fields.insert("score".to_string(), FieldValue::Float(-0.9907));
        StoreSnapshot {
            schema_version: SchemaVersion::Version(1),
            shape,
            next_record_id: 1,
            records: vec![(0, Record::new("Person", fields))],
        }
    }

    #[test]
    fn test_header_round_trip() {
        let header = SnapshotHeader::new(1234);
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);
        let back = SnapshotHeader::read_from(bytes.as_slice()).unwrap();
        assert_eq!(header, back);
    }

    #[test]
    fn test_header_rejects_bad_magic() {
        let mut bytes = Vec::new();
        SnapshotHeader::new(0).write_to(&mut bytes).unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            SnapshotHeader::read_from(bytes.as_slice()),
            Err(Error::Corruption(_))
        ));
    }

    #[test]
    fn test_header_rejects_future_format_version() {
        let header = SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            format_version: FORMAT_VERSION + 1,
            payload_len: 0,
        };
        assert!(header.validate().is_err());
    }

    #[test]
    fn test_snapshot_round_trip_exact_precision() {
        let snapshot = sample_snapshot();
        let bytes = snapshot.encode().unwrap();
        let back = StoreSnapshot::decode(&bytes).unwrap();

        assert_eq!(back.schema_version, SchemaVersion::Version(1));
        assert_eq!(back.shape, snapshot.shape);
        assert_eq!(back.records.len(), 1);
        let record = &back.records[0].1;
        assert_eq!(record.fields["score"], FieldValue::Float(-0.9907));
        // still single precision, not silently widened
        assert_ne!(record.fields["score"], FieldValue::Double(-0.9907));
    }

    #[test]
    fn test_decode_detects_payload_corruption() {
        let bytes = {
            let mut b = sample_snapshot().encode().unwrap();
            let mid = HEADER_SIZE + (b.len() - HEADER_SIZE - 4) / 2;
            b[mid] ^= 0xFF;
            b
        };
        assert!(matches!(
            StoreSnapshot::decode(&bytes),
            Err(Error::Corruption(_))
        ));
    }

    #[test]
    fn test_decode_rejects_oversized_payload_length() {
        // a length claim near usize::MAX must come back as corruption, not
        // overflow the bounds arithmetic
        for claimed in [u64::MAX, u64::MAX - 18, u64::MAX - 30] {
            let mut bytes = Vec::new();
            SnapshotHeader::new(claimed).write_to(&mut bytes).unwrap();
            bytes.resize(HEADER_SIZE + 4, 0);
            assert!(matches!(
                StoreSnapshot::decode(&bytes),
                Err(Error::Corruption(_))
            ));
        }
    }

    #[test]
    fn test_decode_detects_truncation() {
        let bytes = sample_snapshot().encode().unwrap();
        let truncated = &bytes[..bytes.len() - 3];
        assert!(matches!(
            StoreSnapshot::decode(truncated),
            Err(Error::Corruption(_))
        ));
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = StoreSnapshot::empty(SchemaVersion::Unversioned, SchemaShape::new());
        let back = StoreSnapshot::decode(&snapshot.encode().unwrap()).unwrap();
        assert_eq!(back.schema_version, SchemaVersion::Unversioned);
        assert!(back.records.is_empty());
        assert_eq!(back.next_record_id, 0);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn field_value() -> impl Strategy<Value = FieldValue> {
            prop_oneof![
                Just(FieldValue::Null),
                any::<bool>().prop_map(FieldValue::Bool),
                any::<i64>().prop_map(FieldValue::Int),
                any::<f32>()
                    .prop_filter("NaN never compares equal", |f| !f.is_nan())
                    .prop_map(FieldValue::Float),
                any::<f64>()
                    .prop_filter("NaN never compares equal", |f| !f.is_nan())
                    .prop_map(FieldValue::Double),
                "[a-z]{0,12}".prop_map(FieldValue::String),
            ]
        }

        fn arbitrary_record() -> impl Strategy<Value = Record> {
            proptest::collection::hash_map("[a-z]{1,8}", field_value(), 0..6)
                .prop_map(|fields| Record::new("Person", fields))
        }

        proptest! {
            #[test]
            fn codec_round_trips_any_record_set(
                records in proptest::collection::vec(arbitrary_record(), 0..8),
                version in any::<u64>(),
            ) {
                let snapshot = StoreSnapshot {
                    schema_version: SchemaVersion::Version(version),
                    shape: SchemaShape::new(),
                    next_record_id: records.len() as RecordId,
                    records: records
                        .into_iter()
                        .enumerate()
                        .map(|(i, r)| (i as RecordId, r))
                        .collect(),
                };
                let back = StoreSnapshot::decode(&snapshot.encode().unwrap()).unwrap();
                prop_assert_eq!(back.schema_version, snapshot.schema_version);
                prop_assert_eq!(back.next_record_id, snapshot.next_record_id);
                prop_assert_eq!(back.records.len(), snapshot.records.len());
                for ((id_a, a), (id_b, b)) in back.records.iter().zip(snapshot.records.iter()) {
                    prop_assert_eq!(id_a, id_b);
                    prop_assert_eq!(&a.fields, &b.fields);
                }
            }

            #[test]
            fn any_payload_byte_flip_is_detected(seed in any::<usize>()) {
                let mut bytes = sample_snapshot().encode().unwrap();
                let payload_len = bytes.len() - HEADER_SIZE - 4;
                let target = HEADER_SIZE + seed % payload_len;
                bytes[target] ^= 0xFF;
                prop_assert!(matches!(
                    StoreSnapshot::decode(&bytes),
                    Err(Error::Corruption(_))
                ));
            }
        }
    }
}
