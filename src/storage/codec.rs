//! Fixed byte layout of table files
//!
//! ```text
//! header (40 bytes)
//!   [0..16)  table name, NUL padded
//!   [16..24) field count      u64 LE
//!   [24..32) record count     u64 LE
//!   [32..40) header length    u64 LE
//!
//! cell (56 bytes), shared by template cells and data cells
//!   [0..16)  field name, NUL padded
//!   [16..20) type tag         u32 LE (0 = TEXT, 1 = LONG)
//!   [20..40) TEXT value, NUL padded
//!   [40..48) LONG value       i64 LE
//!   [48..56) capacity         u64 LE
//! ```
//!
//! [`FieldDescriptor`] and [`Cell`] both go through the private `RawCell`
//! layout but never convert into each other.

use std::path::Path;

use crate::error::{TableError, TableResult};
use crate::types::{
    validate_table_name, Cell, FieldDescriptor, FieldType, Row, Schema, TableHeader,
    MAX_NAME_LEN, MAX_TEXT_LEN,
};

pub const HEADER_SIZE: usize = 40;
pub const CELL_SIZE: usize = 56;

const NAME_SLOT: usize = MAX_NAME_LEN + 1;

const TAG_TEXT: u32 = 0;
const TAG_LONG: u32 = 1;

/// Byte length of a header followed by `field_count` template cells.
pub fn header_len(field_count: usize) -> u64 {
    (HEADER_SIZE + field_count * CELL_SIZE) as u64
}

/// Byte length of one row.
pub fn row_size(field_count: usize) -> u64 {
    (field_count * CELL_SIZE) as u64
}

struct RawCell {
    name: String,
    tag: u32,
    text: String,
    long: i64,
    capacity: u64,
}

impl RawCell {
    fn to_bytes(&self) -> [u8; CELL_SIZE] {
        let mut buf = [0u8; CELL_SIZE];
        put_padded(&mut buf[0..16], &self.name);
        buf[16..20].copy_from_slice(&self.tag.to_le_bytes());
        put_padded(&mut buf[20..40], &self.text);
        buf[40..48].copy_from_slice(&self.long.to_le_bytes());
        buf[48..56].copy_from_slice(&self.capacity.to_le_bytes());
        buf
    }

    fn from_bytes(buf: &[u8], path: &Path) -> TableResult<Self> {
        if buf.len() != CELL_SIZE {
            return Err(malformed(path, format!("cell of {} bytes", buf.len())));
        }
        Ok(Self {
            name: get_padded(&buf[0..16], path)?,
            tag: u32::from_le_bytes(le_array(&buf[16..20])),
            text: get_padded(&buf[20..40], path)?,
            long: i64::from_le_bytes(le_array(&buf[40..48])),
            capacity: u64::from_le_bytes(le_array(&buf[48..56])),
        })
    }
}

fn tag_of(field_type: FieldType) -> u32 {
    match field_type {
        FieldType::Text => TAG_TEXT,
        FieldType::Long => TAG_LONG,
    }
}

fn put_padded(slot: &mut [u8], value: &str) {
    slot[..value.len()].copy_from_slice(value.as_bytes());
}

fn get_padded(slot: &[u8], path: &Path) -> TableResult<String> {
    let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    String::from_utf8(slot[..end].to_vec())
        .map_err(|_| malformed(path, "non UTF-8 name or text".to_string()))
}

fn le_array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}

fn malformed(path: &Path, what: String) -> TableError {
    TableError::FileRead(path.to_path_buf(), format!("malformed {}", what))
}

pub fn encode_header(header: &TableHeader) -> TableResult<[u8; HEADER_SIZE]> {
    validate_table_name(&header.name)?;
    let mut buf = [0u8; HEADER_SIZE];
    put_padded(&mut buf[0..NAME_SLOT], &header.name);
    buf[16..24].copy_from_slice(&header.field_count.to_le_bytes());
    buf[24..32].copy_from_slice(&header.record_count.to_le_bytes());
    buf[32..40].copy_from_slice(&header.header_len.to_le_bytes());
    Ok(buf)
}

pub fn decode_header(buf: &[u8; HEADER_SIZE], path: &Path) -> TableResult<TableHeader> {
    let header = TableHeader {
        name: get_padded(&buf[0..NAME_SLOT], path)?,
        field_count: u64::from_le_bytes(le_array(&buf[16..24])),
        record_count: u64::from_le_bytes(le_array(&buf[24..32])),
        header_len: u64::from_le_bytes(le_array(&buf[32..40])),
    };
    let expected = (header.field_count as u128) * CELL_SIZE as u128 + HEADER_SIZE as u128;
    if header.field_count == 0 || header.header_len as u128 != expected {
        return Err(malformed(
            path,
            format!(
                "header: {} fields but header length {}",
                header.field_count, header.header_len
            ),
        ));
    }
    Ok(header)
}

/// Template cell: descriptor metadata with a zero value.
pub fn encode_descriptor(field: &FieldDescriptor) -> [u8; CELL_SIZE] {
    RawCell {
        name: field.name().to_string(),
        tag: tag_of(field.field_type()),
        text: String::new(),
        long: 0,
        capacity: field.capacity() as u64,
    }
    .to_bytes()
}

pub fn decode_descriptor(buf: &[u8], path: &Path) -> TableResult<FieldDescriptor> {
    let raw = RawCell::from_bytes(buf, path)?;
    match raw.tag {
        TAG_TEXT => FieldDescriptor::text(raw.name, raw.capacity as usize),
        TAG_LONG => FieldDescriptor::long(raw.name),
        tag => Err(malformed(path, format!("type tag {}", tag))),
    }
}

/// Data cell: `field`'s metadata plus the live value. Fails with
/// `FieldLength` if TEXT exceeds the declared capacity.
pub fn encode_cell(field: &FieldDescriptor, cell: &Cell) -> TableResult<[u8; CELL_SIZE]> {
    field.check(cell)?;
    let (text, long) = match cell {
        Cell::Text(s) => (s.clone(), 0),
        Cell::Long(v) => (String::new(), *v),
    };
    Ok(RawCell {
        name: field.name().to_string(),
        tag: tag_of(field.field_type()),
        text,
        long,
        capacity: field.capacity() as u64,
    }
    .to_bytes())
}

pub fn decode_cell(field: &FieldDescriptor, buf: &[u8], path: &Path) -> TableResult<Cell> {
    let raw = RawCell::from_bytes(buf, path)?;
    if raw.tag != tag_of(field.field_type()) {
        return Err(malformed(
            path,
            format!("cell for {}: tag {}", field.name(), raw.tag),
        ));
    }
    match field.field_type() {
        FieldType::Text if raw.text.len() <= MAX_TEXT_LEN => Ok(Cell::Text(raw.text)),
        FieldType::Text => Err(malformed(path, format!("TEXT in {}", field.name()))),
        FieldType::Long => Ok(Cell::Long(raw.long)),
    }
}

pub fn encode_row(schema: &Schema, row: &Row) -> TableResult<Vec<u8>> {
    schema.check_row(row)?;
    let mut buf = Vec::with_capacity(row_size(schema.len()) as usize);
    for (field, cell) in schema.fields().iter().zip(row.cells()) {
        buf.extend_from_slice(&encode_cell(field, cell)?);
    }
    Ok(buf)
}

pub fn decode_row(schema: &Schema, buf: &[u8], path: &Path) -> TableResult<Row> {
    if buf.len() as u64 != row_size(schema.len()) {
        return Err(malformed(path, format!("row of {} bytes", buf.len())));
    }
    let cells = schema
        .fields()
        .iter()
        .zip(buf.chunks_exact(CELL_SIZE))
        .map(|(field, chunk)| decode_cell(field, chunk, path))
        .collect::<TableResult<Vec<_>>>()?;
    Ok(Row::new(cells))
}
