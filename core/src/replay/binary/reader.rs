//! Container reader
//!
//! Reads just enough of a captured container to locate one embedded event.
//! Payloads of other events are skipped, never interpreted.

use byteorder::{BigEndian, ReadBytesExt};
use slp_shared::{EventCode, SLP_MAGIC};
use std::collections::BTreeMap;
use std::io::{self, Cursor};

use super::{ContainerFormatError, EmbeddedBlob, EndOfStream, ReadError};

/// Bounds-checked big-endian reader over a byte slice
pub struct ContainerReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ContainerReader<'a> {
    /// Create a new reader positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Current offset from the start of the input
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.position())
    }

    fn take<T>(
        &mut self,
        requested: usize,
        read: impl FnOnce(&mut Cursor<&'a [u8]>) -> io::Result<T>,
    ) -> Result<T, EndOfStream> {
        let eof = EndOfStream {
            offset: self.position(),
            requested,
            remaining: self.remaining(),
        };
        if eof.remaining < requested {
            return Err(eof);
        }
        read(&mut self.cursor).map_err(|_| eof)
    }

    pub fn read_u8(&mut self) -> Result<u8, EndOfStream> {
        self.take(1, |c| c.read_u8())
    }

    pub fn read_u16(&mut self) -> Result<u16, EndOfStream> {
        self.take(2, |c| c.read_u16::<BigEndian>())
    }

    pub fn read_u32(&mut self) -> Result<u32, EndOfStream> {
        self.take(4, |c| c.read_u32::<BigEndian>())
    }

    /// Borrow the next `len` bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], EndOfStream> {
        let start = self.position();
        if self.remaining() < len {
            return Err(EndOfStream {
                offset: start,
                requested: len,
                remaining: self.remaining(),
            });
        }
        let data: &'a [u8] = *self.cursor.get_ref();
        self.cursor.set_position((start + len) as u64);
        Ok(&data[start..start + len])
    }
}

/// Parsed `0x35` event: payload size per event code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadSizeTable {
    sizes: BTreeMap<u8, u16>,
}

impl PayloadSizeTable {
    /// Read the table event, starting at its command byte
    pub fn read(reader: &mut ContainerReader<'_>) -> Result<Self, ReadError> {
        let command = reader.read_u8()?;
        if command != EventCode::PayloadSizes.code() {
            return Err(ContainerFormatError::UnexpectedCommand(command).into());
        }

        // The size byte counts itself
        let table_size = reader.read_u8()?;
        let entry_bytes = table_size
            .checked_sub(1)
            .filter(|bytes| bytes % 3 == 0)
            .ok_or(ContainerFormatError::UnevenSizeTable(table_size))?;

        let mut sizes = BTreeMap::new();
        for _ in 0..entry_bytes / 3 {
            let code = reader.read_u8()?;
            let size = reader.read_u16()?;
            sizes.insert(code, size);
        }
        Ok(Self { sizes })
    }

    /// Declared payload size for `code`
    pub fn get(&self, code: u8) -> Option<u16> {
        self.sizes.get(&code).copied()
    }

    /// Entries in ascending code order
    pub fn iter(&self) -> impl Iterator<Item = (u8, u16)> + '_ {
        self.sizes.iter().map(|(code, size)| (*code, *size))
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Stream bytes occupied by the table event itself
    pub fn encoded_len(&self) -> usize {
        2 + 3 * self.sizes.len()
    }
}

/// Magic, raw length and payload-size table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Declared byte count of every event, table included
    pub raw_length: u32,
    pub sizes: PayloadSizeTable,
}

impl ContainerHeader {
    /// Validate the magic and read the header
    pub fn read(reader: &mut ContainerReader<'_>) -> Result<Self, ReadError> {
        let available = reader.remaining().min(SLP_MAGIC.len());
        let magic = reader.read_bytes(available)?;
        if magic != SLP_MAGIC {
            return Err(ContainerFormatError::BadMagic {
                found: magic.to_vec(),
            }
            .into());
        }

        let raw_length = reader.read_u32()?;
        let sizes = PayloadSizeTable::read(reader)?;
        Ok(Self { raw_length, sizes })
    }
}

/// Extract the first event with code `target` from a captured container.
///
/// Returns `Ok(None)` when the code does not occur before the recognised
/// stream ends (an unknown code or the declared raw length).
pub fn extract_blob(data: &[u8], target: u8) -> Result<Option<EmbeddedBlob>, ReadError> {
    let mut reader = ContainerReader::new(data);
    let header = ContainerHeader::read(&mut reader)?;

    let raw_length = header.raw_length as usize;
    let mut consumed = header.sizes.encoded_len();

    while consumed < raw_length {
        let code = reader.read_u8()?;
        let Some(size) = header.sizes.get(code) else {
            tracing::debug!(
                "event 0x{:02x} at offset {} not in size table, stopping scan",
                code,
                reader.position() - 1
            );
            return Ok(None);
        };

        let payload = reader.read_bytes(size as usize)?;
        if code == target {
            return Ok(Some(EmbeddedBlob::new(code, payload.to_vec())));
        }
        consumed += 1 + size as usize;
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Container with table {(0x35, 7), (0x3D, n)} and events `events`
    fn container(entries: &[(u8, u16)], events: &[u8]) -> Vec<u8> {
        let table_len = 2 + 3 * entries.len();
        let mut data = SLP_MAGIC.to_vec();
        data.extend_from_slice(&((table_len + events.len()) as u32).to_be_bytes());
        data.push(0x35);
        data.push((3 * entries.len() + 1) as u8);
        for (code, size) in entries {
            data.push(*code);
            data.extend_from_slice(&size.to_be_bytes());
        }
        data.extend_from_slice(events);
        data
    }

    #[test]
    fn test_extract_blob() {
        let payload = [0xC2, 0x00, 0x00, 0x00, 0x60, 0x00];
        let mut events = vec![0x3D];
        events.extend_from_slice(&payload);
        let data = container(&[(0x3D, payload.len() as u16)], &events);

        let blob = extract_blob(&data, 0x3D).unwrap().unwrap();
        assert_eq!(blob.code, 0x3D);
        assert_eq!(blob.payload, payload);
        let mut expected = vec![0x3D];
        expected.extend_from_slice(&payload);
        assert_eq!(blob.to_bytes(), expected);
    }

    #[test]
    fn test_extract_missing_code() {
        let data = container(&[(0x3D, 2)], &[0x3D, 0xAA, 0xBB]);
        assert_eq!(extract_blob(&data, 0x36).unwrap(), None);
    }

    #[test]
    fn test_extract_skips_other_events() {
        let events = [0x36, 1, 2, 3, 0x3D, 9, 9, 0x36, 4, 5, 6];
        let data = container(&[(0x36, 3), (0x3D, 2)], &events);
        let blob = extract_blob(&data, 0x3D).unwrap().unwrap();
        assert_eq!(blob.payload, vec![9, 9]);
    }

    #[test]
    fn test_extract_first_occurrence_only() {
        let events = [0x3D, 1, 0x3D, 2];
        let data = container(&[(0x3D, 1)], &events);
        assert_eq!(extract_blob(&data, 0x3D).unwrap().unwrap().payload, vec![1]);
    }

    #[test]
    fn test_unknown_code_stops_scan() {
        let events = [0x10, 0x3D, 7];
        let data = container(&[(0x3D, 1)], &events);
        assert_eq!(extract_blob(&data, 0x3D).unwrap(), None);
    }

    #[test]
    fn test_bad_magic() {
        let mut data = container(&[(0x3D, 1)], &[0x3D, 7]);
        data[0] = b'X';
        let err = extract_blob(&data, 0x3D).unwrap_err();
        assert!(matches!(
            err,
            ReadError::Format(ContainerFormatError::BadMagic { ref found }) if found[0] == b'X'
        ));

        let err = extract_blob(b"{U", 0x3D).unwrap_err();
        assert!(matches!(err, ReadError::Format(ContainerFormatError::BadMagic { .. })));
    }

    #[test]
    fn test_uneven_table() {
        let mut data = SLP_MAGIC.to_vec();
        data.extend_from_slice(&6u32.to_be_bytes());
        data.extend_from_slice(&[0x35, 5, 0x3D, 0x00, 0x01, 0x00]);
        let err = extract_blob(&data, 0x3D).unwrap_err();
        assert_eq!(err, ReadError::Format(ContainerFormatError::UnevenSizeTable(5)));
    }

    #[test]
    fn test_table_must_lead() {
        let mut data = SLP_MAGIC.to_vec();
        data.extend_from_slice(&2u32.to_be_bytes());
        data.extend_from_slice(&[0x36, 1]);
        let err = extract_blob(&data, 0x3D).unwrap_err();
        assert_eq!(err, ReadError::Format(ContainerFormatError::UnexpectedCommand(0x36)));
    }

    #[test]
    fn test_truncated_payload() {
        let mut data = container(&[(0x3D, 4)], &[0x3D, 1, 2, 3, 4]);
        data.truncate(data.len() - 2);
        let err = extract_blob(&data, 0x3D).unwrap_err();
        assert!(matches!(
            err,
            ReadError::EndOfStream(EndOfStream {
                requested: 4,
                remaining: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_reader_bounds() {
        let mut reader = ContainerReader::new(&[0x01, 0x02, 0x03]);
        assert_eq!(reader.read_u16().unwrap(), 0x0102);
        let err = reader.read_u32().unwrap_err();
        assert_eq!(
            err,
            EndOfStream {
                offset: 2,
                requested: 4,
                remaining: 1
            }
        );
        // A failed read does not consume input
        assert_eq!(reader.read_u8().unwrap(), 0x03);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_payload_size_table() {
        let data = [0x35, 7, 0x36, 0x01, 0x40, 0x3D, 0x00, 0x10];
        let mut reader = ContainerReader::new(&data);
        let table = PayloadSizeTable::read(&mut reader).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0x36), Some(0x140));
        assert_eq!(table.get(0x3D), Some(0x10));
        assert_eq!(table.get(0x37), None);
        assert_eq!(table.encoded_len(), data.len());
        let codes: Vec<u8> = table.iter().map(|(c, _)| c).collect();
        assert_eq!(codes, vec![0x36, 0x3D]);
    }
}
