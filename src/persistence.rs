//! Self-describing binary persistence codec: a format tag, a checked version
//! byte, and a sequence of length-prefixed records, each one
//! `ExclusionInterval` with an explicit presence flag per optional field.

use std::io::{self, Cursor, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::ExclusionError;
use crate::model::ExclusionInterval;

const MAGIC: &[u8; 4] = b"EXMS";
const VERSION: u8 = 1;

/// Encode `records` as a self-describing byte stream.
pub fn encode(records: &[ExclusionInterval]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64 + records.len() * 96);
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.write_u32::<LittleEndian>(records.len() as u32)
        .expect("writing to a Vec never fails");
    for record in records {
        let body = encode_record(record);
        buf.write_u32::<LittleEndian>(body.len() as u32)
            .expect("writing to a Vec never fails");
        buf.extend_from_slice(&body);
    }
    buf
}

/// Decode a byte stream produced by [`encode`]. On any framing, version, or
/// truncation failure, returns `Err` without partially applying anything —
/// callers only see whole, valid stores.
pub fn decode(bytes: &[u8]) -> Result<Vec<ExclusionInterval>, ExclusionError> {
    let mut cursor = Cursor::new(bytes);

    let mut magic = [0u8; 4];
    cursor
        .read_exact(&mut magic)
        .map_err(|_| ExclusionError::PersistenceError("truncated header".into()))?;
    if &magic != MAGIC {
        return Err(ExclusionError::PersistenceError(
            "not an exclusionms-core store file".into(),
        ));
    }

    let version = cursor
        .read_u8()
        .map_err(|e| ExclusionError::PersistenceError(e.to_string()))?;
    if version != VERSION {
        tracing::error!(version, expected = VERSION, "persistence version mismatch");
        return Err(ExclusionError::PersistenceError(format!(
            "unsupported store format version {version}"
        )));
    }

    let count = cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| ExclusionError::PersistenceError(e.to_string()))?;

    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let len = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| ExclusionError::PersistenceError("truncated record length".into()))?;
        let mut body = vec![0u8; len as usize];
        cursor
            .read_exact(&mut body)
            .map_err(|_| ExclusionError::PersistenceError("truncated record body".into()))?;
        records.push(decode_record(&body)?);
    }
    Ok(records)
}

/// `encode` followed by a whole-file write.
pub fn write_to_path(path: impl AsRef<Path>, records: &[ExclusionInterval]) -> io::Result<()> {
    std::fs::write(path, encode(records))
}

/// Whole-file read followed by `decode`.
pub fn read_from_path(path: impl AsRef<Path>) -> Result<Vec<ExclusionInterval>, ExclusionError> {
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

fn encode_record(record: &ExclusionInterval) -> Vec<u8> {
    let mut buf = Vec::with_capacity(96);
    write_opt_string(&mut buf, record.interval_id.as_deref());
    write_opt_i32(&mut buf, record.charge);
    write_opt_f64(&mut buf, record.min_mass);
    write_opt_f64(&mut buf, record.max_mass);
    write_opt_f64(&mut buf, record.min_rt);
    write_opt_f64(&mut buf, record.max_rt);
    write_opt_f64(&mut buf, record.min_ook0);
    write_opt_f64(&mut buf, record.max_ook0);
    write_opt_f64(&mut buf, record.min_intensity);
    write_opt_f64(&mut buf, record.max_intensity);
    buf
}

fn decode_record(body: &[u8]) -> Result<ExclusionInterval, ExclusionError> {
    let mut cursor = Cursor::new(body);
    let bad = |e: io::Error| ExclusionError::PersistenceError(e.to_string());

    let interval_id = read_opt_string(&mut cursor).map_err(bad)?;
    let charge = read_opt_i32(&mut cursor).map_err(bad)?;
    let min_mass = read_opt_f64(&mut cursor).map_err(bad)?;
    let max_mass = read_opt_f64(&mut cursor).map_err(bad)?;
    let min_rt = read_opt_f64(&mut cursor).map_err(bad)?;
    let max_rt = read_opt_f64(&mut cursor).map_err(bad)?;
    let min_ook0 = read_opt_f64(&mut cursor).map_err(bad)?;
    let max_ook0 = read_opt_f64(&mut cursor).map_err(bad)?;
    let min_intensity = read_opt_f64(&mut cursor).map_err(bad)?;
    let max_intensity = read_opt_f64(&mut cursor).map_err(bad)?;

    Ok(ExclusionInterval {
        interval_id,
        charge,
        min_mass,
        max_mass,
        min_rt,
        max_rt,
        min_ook0,
        max_ook0,
        min_intensity,
        max_intensity,
    })
}

fn write_opt_f64(buf: &mut Vec<u8>, value: Option<f64>) {
    match value {
        Some(v) => {
            buf.push(1);
            buf.write_f64::<LittleEndian>(v).expect("Vec write cannot fail");
        }
        None => buf.push(0),
    }
}

fn read_opt_f64(cursor: &mut Cursor<&[u8]>) -> io::Result<Option<f64>> {
    match cursor.read_u8()? {
        0 => Ok(None),
        _ => Ok(Some(cursor.read_f64::<LittleEndian>()?)),
    }
}

fn write_opt_i32(buf: &mut Vec<u8>, value: Option<i32>) {
    match value {
        Some(v) => {
            buf.push(1);
            buf.write_i32::<LittleEndian>(v).expect("Vec write cannot fail");
        }
        None => buf.push(0),
    }
}

fn read_opt_i32(cursor: &mut Cursor<&[u8]>) -> io::Result<Option<i32>> {
    match cursor.read_u8()? {
        0 => Ok(None),
        _ => Ok(Some(cursor.read_i32::<LittleEndian>()?)),
    }
}

fn write_opt_string(buf: &mut Vec<u8>, value: Option<&str>) {
    match value {
        Some(s) => {
            buf.push(1);
            buf.write_u32::<LittleEndian>(s.len() as u32)
                .expect("Vec write cannot fail");
            buf.extend_from_slice(s.as_bytes());
        }
        None => buf.push(0),
    }
}

fn read_opt_string(cursor: &mut Cursor<&[u8]>) -> io::Result<Option<String>> {
    match cursor.read_u8()? {
        0 => Ok(None),
        _ => {
            let len = cursor.read_u32::<LittleEndian>()?;
            let mut bytes = vec![0u8; len as usize];
            cursor.read_exact(&mut bytes)?;
            String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ExclusionInterval> {
        vec![
            ExclusionInterval {
                interval_id: Some("A".into()),
                charge: Some(2),
                min_mass: Some(100.0),
                max_mass: Some(200.0),
                min_rt: None,
                max_rt: None,
                min_ook0: Some(0.8),
                max_ook0: Some(0.9),
                min_intensity: None,
                max_intensity: None,
            },
            ExclusionInterval {
                interval_id: Some("B".into()),
                charge: None,
                min_mass: None,
                max_mass: None,
                min_rt: None,
                max_rt: None,
                min_ook0: None,
                max_ook0: None,
                min_intensity: None,
                max_intensity: None,
            },
        ]
    }

    #[test]
    fn round_trips_through_bytes() {
        let records = sample();
        let bytes = encode(&records);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.bin");
        write_to_path(&path, &sample()).unwrap();
        let decoded = read_from_path(&path).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn empty_store_round_trips() {
        let bytes = encode(&[]);
        assert_eq!(decode(&bytes).unwrap(), Vec::new());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = encode(&sample());
        bytes[0] = b'X';
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, ExclusionError::PersistenceError(_)));
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut bytes = encode(&sample());
        bytes[4] = VERSION + 1;
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, ExclusionError::PersistenceError(_)));
    }

    #[test]
    fn rejects_truncated_stream() {
        let bytes = encode(&sample());
        let truncated = &bytes[..bytes.len() - 3];
        assert!(decode(truncated).is_err());
    }

    #[test]
    fn load_from_missing_path_surfaces_persistence_error() {
        let err = read_from_path("/nonexistent/path/store.bin").unwrap_err();
        assert!(matches!(err, ExclusionError::PersistenceError(_)));
    }
}
