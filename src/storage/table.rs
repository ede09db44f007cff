//! Table engine
//!
//! A table is one file: header, one template cell per field, then the rows
//! back to back. Row `i` (1-based) starts at `header_len + (i - 1) * row_size`.
//!
//! Every operation opens the file, does its I/O and closes it again; nothing
//! is held between calls. The row buffer used for staging and equality
//! lookups lives in [`Cursor`](super::Cursor), not here.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

use super::codec::{
    decode_descriptor, decode_header, decode_row, encode_descriptor, encode_header, encode_row,
    header_len, row_size, CELL_SIZE, HEADER_SIZE,
};
use crate::config::{DbConfig, DurabilityLevel};
use crate::error::{TableError, TableResult};
use crate::types::{validate_table_name, FieldDescriptor, Row, Schema, TableHeader};

#[derive(Debug, Clone)]
pub struct Table {
    path: PathBuf,
    temp_path: PathBuf,
    header: TableHeader,
    schema: Arc<Schema>,
    durability: DurabilityLevel,
}

impl Table {
    /// Create (or truncate) the file for `name` and write header + templates.
    pub fn create(config: &DbConfig, name: &str, schema: Schema) -> TableResult<Self> {
        validate_table_name(name)?;
        if schema.is_empty() {
            return Err(TableError::FieldLength(format!(
                "table {} needs at least one field",
                name
            )));
        }

        let header = TableHeader {
            name: name.to_string(),
            field_count: schema.len() as u64,
            record_count: 0,
            header_len: header_len(schema.len()),
        };
        let table = Self {
            path: config.table_path(name),
            temp_path: config.temp_path(name),
            header,
            schema: Arc::new(schema),
            durability: config.durability,
        };

        let mut buf = Vec::with_capacity(table.header.header_len as usize);
        buf.extend_from_slice(&encode_header(&table.header)?);
        for field in table.schema.fields() {
            buf.extend_from_slice(&encode_descriptor(field));
        }

        let mut file =
            File::create(&table.path).map_err(|e| TableError::FileOpen(table.path.clone(), e))?;
        file.write_all(&buf)
            .map_err(|e| TableError::FileWrite(table.path.clone(), e))?;
        table.finish_write(&mut file)?;

        info!("created table {} with {} fields", name, table.schema.len());
        Ok(table)
    }

    /// Read header and schema of an existing table.
    pub fn open(config: &DbConfig, name: &str) -> TableResult<Self> {
        validate_table_name(name)?;
        let path = config.table_path(name);
        let file = File::open(&path).map_err(|e| TableError::FileOpen(path.clone(), e))?;
        let file_len = file
            .metadata()
            .map_err(|e| TableError::FileRead(path.clone(), e.to_string()))?
            .len();
        if file_len == 0 {
            return Err(TableError::EmptyFile(path));
        }

        let mut reader = BufReader::new(file);
        let mut header_buf = [0u8; HEADER_SIZE];
        reader
            .read_exact(&mut header_buf)
            .map_err(|e| read_error(&path, e))?;
        let header = decode_header(&header_buf, &path)?;

        let mut fields = Vec::new();
        let mut cell = [0u8; CELL_SIZE];
        for _ in 0..header.field_count {
            reader.read_exact(&mut cell).map_err(|e| read_error(&path, e))?;
            fields.push(decode_descriptor(&cell, &path)?);
        }
        let schema = Schema::new(fields)?;

        let expected = header
            .record_count
            .checked_mul(row_size(schema.len()))
            .and_then(|rows| rows.checked_add(header.header_len))
            .ok_or_else(|| {
                TableError::FileRead(
                    path.clone(),
                    format!("malformed header: record count {}", header.record_count),
                )
            })?;
        if file_len < expected {
            return Err(TableError::FileRead(
                path,
                format!(
                    "header counts {} records ({} bytes) but file has {}",
                    header.record_count, expected, file_len
                ),
            ));
        }
        if file_len > expected {
            warn!(
                "table {}: header says {} bytes ({} records) but file has {}",
                name, expected, header.record_count, file_len
            );
        }
        if header.name != name {
            debug!("table file {} carries name {}", path.display(), header.name);
        }

        Ok(Self {
            path,
            temp_path: config.temp_path(name),
            header,
            schema: Arc::new(schema),
            durability: config.durability,
        })
    }

    /// Remove the table file.
    pub fn drop(config: &DbConfig, name: &str) -> TableResult<()> {
        validate_table_name(name)?;
        let path = config.table_path(name);
        fs::remove_file(&path).map_err(|e| TableError::FileRemove(path.clone(), e))?;
        info!("dropped table {}", name);
        Ok(())
    }

    /// Names of all tables in the data directory, sorted.
    pub fn list(config: &DbConfig) -> TableResult<Vec<String>> {
        let entries = fs::read_dir(&config.data_dir)
            .map_err(|e| TableError::FileOpen(config.data_dir.clone(), e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TableError::FileRead(config.data_dir.clone(), e.to_string()))?;
            let path = entry.path();
            let matches_ext = path
                .extension()
                .map_or(false, |ext| ext == config.table_extension.as_str());
            if let (true, Some(stem)) = (matches_ext, path.file_stem().and_then(|s| s.to_str())) {
                if validate_table_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn shared_schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    pub fn record_count(&self) -> u64 {
        self.header.record_count
    }

    pub fn row_size(&self) -> u64 {
        row_size(self.schema.len())
    }

    /// Position and descriptor of the field called `name`.
    pub fn field(&self, name: &str) -> TableResult<(usize, &FieldDescriptor)> {
        self.schema.field(name)
    }

    fn row_offset(&self, index: u64) -> TableResult<u64> {
        index
            .checked_sub(1)
            .and_then(|i| i.checked_mul(self.row_size()))
            .and_then(|rows| rows.checked_add(self.header.header_len))
            .ok_or(TableError::InvalidIndex(index))
    }

    fn check_index(&self, index: u64) -> TableResult<()> {
        if index == 0 || index > self.header.record_count {
            return Err(TableError::InvalidIndex(index));
        }
        Ok(())
    }

    /// Append `row` after the last record, then rewrite the header.
    ///
    /// The two writes are separate: a crash in between leaves a row on disk
    /// that the header does not count.
    pub fn append(&mut self, row: &Row) -> TableResult<u64> {
        let bytes = encode_row(&self.schema, row)?;
        let mut file = self.open_for_write()?;

        let index = self
            .header
            .record_count
            .checked_add(1)
            .ok_or(TableError::InvalidIndex(u64::MAX))?;
        let offset = self.row_offset(index)?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| TableError::FileSeek(self.path.clone(), e))?;
        file.write_all(&bytes)
            .map_err(|e| TableError::FileWrite(self.path.clone(), e))?;

        let mut header = self.header.clone();
        header.record_count = index;
        self.write_header(&mut file, &header)?;
        self.finish_write(&mut file)?;
        self.header = header;

        debug!("{}: appended row {}", self.name(), index);
        Ok(index)
    }

    /// Index of the first row equal to `key` in every field.
    pub fn find(&self, key: &Row) -> TableResult<u64> {
        let mut reader = self.open_rows()?;
        let mut buf = vec![0u8; self.row_size() as usize];
        for index in 1..=self.header.record_count {
            reader
                .read_exact(&mut buf)
                .map_err(|e| read_error(&self.path, e))?;
            if decode_row(&self.schema, &buf, &self.path)? == *key {
                return Ok(index);
            }
        }
        Err(TableError::RowNotFound)
    }

    pub fn read(&self, index: u64) -> TableResult<Row> {
        self.check_index(index)?;
        let file = File::open(&self.path).map_err(|e| TableError::FileOpen(self.path.clone(), e))?;
        let mut reader = BufReader::new(file);
        let offset = self.row_offset(index)?;
        reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| TableError::FileSeek(self.path.clone(), e))?;
        let mut buf = vec![0u8; self.row_size() as usize];
        reader
            .read_exact(&mut buf)
            .map_err(|e| read_error(&self.path, e))?;
        decode_row(&self.schema, &buf, &self.path)
    }

    /// Overwrite row `index` in place.
    pub fn update(&mut self, index: u64, row: &Row) -> TableResult<()> {
        self.check_index(index)?;
        let bytes = encode_row(&self.schema, row)?;
        let offset = self.row_offset(index)?;
        let mut file = self.open_for_write()?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| TableError::FileSeek(self.path.clone(), e))?;
        file.write_all(&bytes)
            .map_err(|e| TableError::FileWrite(self.path.clone(), e))?;
        self.finish_write(&mut file)?;
        debug!("{}: updated row {}", self.name(), index);
        Ok(())
    }

    /// Remove row `index` by writing every other row to a scratch file and
    /// renaming it over the table file.
    pub fn delete_row(&mut self, index: u64) -> TableResult<()> {
        self.check_index(index)?;
        let mut header = self.header.clone();
        header.record_count -= 1;

        if let Err(e) = self.write_copy_without(index, &header) {
            let _ = fs::remove_file(&self.temp_path);
            return Err(e);
        }
        if let Err(e) = fs::rename(&self.temp_path, &self.path) {
            let _ = fs::remove_file(&self.temp_path);
            return Err(TableError::FileRename(self.temp_path.clone(), e));
        }
        self.header = header;

        debug!("{}: deleted row {}", self.name(), index);
        Ok(())
    }

    fn write_copy_without(&self, index: u64, header: &TableHeader) -> TableResult<()> {
        let mut reader = self.open_rows()?;
        let temp = File::create(&self.temp_path)
            .map_err(|e| TableError::FileOpen(self.temp_path.clone(), e))?;
        let mut writer = BufWriter::new(temp);
        let write_err = |e| TableError::FileWrite(self.temp_path.clone(), e);

        writer.write_all(&encode_header(header)?).map_err(write_err)?;
        for field in self.schema.fields() {
            writer.write_all(&encode_descriptor(field)).map_err(write_err)?;
        }

        let mut buf = vec![0u8; self.row_size() as usize];
        for current in 1..=self.header.record_count {
            reader
                .read_exact(&mut buf)
                .map_err(|e| read_error(&self.path, e))?;
            if current != index {
                writer.write_all(&buf).map_err(write_err)?;
            }
        }

        let mut temp = writer
            .into_inner()
            .map_err(|e| TableError::FileWrite(self.temp_path.clone(), e.into_error()))?;
        self.finish_write(&mut temp)
    }

    fn open_rows(&self) -> TableResult<BufReader<File>> {
        let file = File::open(&self.path).map_err(|e| TableError::FileOpen(self.path.clone(), e))?;
        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(self.header.header_len))
            .map_err(|e| TableError::FileSeek(self.path.clone(), e))?;
        Ok(reader)
    }

    fn open_for_write(&self) -> TableResult<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| TableError::FileOpen(self.path.clone(), e))
    }

    fn write_header(&self, file: &mut File, header: &TableHeader) -> TableResult<()> {
        let bytes = encode_header(header)?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| TableError::FileSeek(self.path.clone(), e))?;
        file.write_all(&bytes)
            .map_err(|e| TableError::FileWrite(self.path.clone(), e))
    }

    fn finish_write(&self, file: &mut File) -> TableResult<()> {
        file.flush()
            .map_err(|e| TableError::FileWrite(self.path.clone(), e))?;
        if self.durability.requires_immediate_sync() {
            file.sync_data()
                .map_err(|e| TableError::FileWrite(self.path.clone(), e))?;
        }
        Ok(())
    }
}

fn read_error(path: &Path, err: std::io::Error) -> TableError {
    TableError::FileRead(path.to_path_buf(), err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;
    use tempfile::tempdir;

    fn people() -> Schema {
        Schema::new(vec![
            FieldDescriptor::text("name", 5).unwrap(),
            FieldDescriptor::long("age").unwrap(),
        ])
        .unwrap()
    }

    fn row(name: &str, age: i64) -> Row {
        Row::new(vec![Cell::Text(name.into()), Cell::Long(age)])
    }

    #[test]
    fn test_create_then_open() {
        let dir = tempdir().unwrap();
        let config = DbConfig::for_testing(dir.path());
        Table::create(&config, "people", people()).unwrap();

        let table = Table::open(&config, "people").unwrap();
        assert_eq!(table.name(), "people");
        assert_eq!(table.record_count(), 0);
        assert_eq!(table.schema(), &people());
        assert_eq!(table.header().header_len, 40 + 2 * 56);
        assert_eq!(
            fs::metadata(dir.path().join("people.txt")).unwrap().len(),
            table.header().header_len
        );
    }

    #[test]
    fn test_append_and_read_round_trip() {
        let dir = tempdir().unwrap();
        let config = DbConfig::for_testing(dir.path());
        let mut table = Table::create(&config, "people", people()).unwrap();

        assert_eq!(table.append(&row("abcde", 10)).unwrap(), 1);
        assert_eq!(table.append(&row("de", -20)).unwrap(), 2);

        let reopened = Table::open(&config, "people").unwrap();
        assert_eq!(reopened.record_count(), 2);
        assert_eq!(reopened.read(1).unwrap(), row("abcde", 10));
        assert_eq!(reopened.read(2).unwrap(), row("de", -20));
        assert_eq!(
            fs::metadata(reopened.path()).unwrap().len(),
            reopened.header().header_len + 2 * reopened.row_size()
        );
    }

    #[test]
    fn test_append_rejects_long_text() {
        let dir = tempdir().unwrap();
        let config = DbConfig::for_testing(dir.path());
        let mut table = Table::create(&config, "people", people()).unwrap();

        let err = table.append(&row("abcdef", 1));
        assert!(matches!(err, Err(TableError::FieldLength(_))));
        assert_eq!(table.record_count(), 0);
    }

    #[test]
    fn test_find_returns_first_match() {
        let dir = tempdir().unwrap();
        let config = DbConfig::for_testing(dir.path());
        let mut table = Table::create(&config, "people", people()).unwrap();
        table.append(&row("a", 1)).unwrap();
        table.append(&row("b", 2)).unwrap();
        table.append(&row("b", 2)).unwrap();

        assert_eq!(table.find(&row("b", 2)).unwrap(), 2);
        assert!(matches!(table.find(&row("b", 3)), Err(TableError::RowNotFound)));
    }

    #[test]
    fn test_delete_row() {
        let dir = tempdir().unwrap();
        let config = DbConfig::for_testing(dir.path());
        let mut table = Table::create(&config, "people", people()).unwrap();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            table.append(&row(name, i as i64)).unwrap();
        }

        table.delete_row(2).unwrap();
        assert_eq!(table.record_count(), 2);
        assert!(matches!(table.find(&row("b", 1)), Err(TableError::RowNotFound)));

        let reopened = Table::open(&config, "people").unwrap();
        assert_eq!(reopened.read(1).unwrap(), row("a", 0));
        assert_eq!(reopened.read(2).unwrap(), row("c", 2));
        assert!(!config.temp_path("people").exists());
        assert_eq!(
            fs::metadata(reopened.path()).unwrap().len(),
            reopened.header().header_len + 2 * reopened.row_size()
        );
    }

    #[test]
    fn test_table_named_tmp_survives_delete() {
        let dir = tempdir().unwrap();
        let config = DbConfig::for_testing(dir.path());
        let mut tmp = Table::create(&config, "tmp", people()).unwrap();
        tmp.append(&row("keep", 1)).unwrap();
        let mut other = Table::create(&config, "other", people()).unwrap();
        other.append(&row("x", 1)).unwrap();

        other.delete_row(1).unwrap();
        assert_eq!(Table::open(&config, "tmp").unwrap().read(1).unwrap(), row("keep", 1));
    }

    #[test]
    fn test_update_bounds() {
        let dir = tempdir().unwrap();
        let config = DbConfig::for_testing(dir.path());
        let mut table = Table::create(&config, "people", people()).unwrap();
        table.append(&row("a", 1)).unwrap();

        table.update(1, &row("z", 9)).unwrap();
        assert_eq!(table.read(1).unwrap(), row("z", 9));
        assert_eq!(
            fs::metadata(table.path()).unwrap().len(),
            table.header().header_len + table.row_size()
        );
        assert!(matches!(table.update(2, &row("z", 9)), Err(TableError::InvalidIndex(2))));
        assert!(matches!(table.read(0), Err(TableError::InvalidIndex(0))));
    }

    #[test]
    fn test_open_errors() {
        let dir = tempdir().unwrap();
        let config = DbConfig::for_testing(dir.path());

        assert!(matches!(Table::open(&config, "missing"), Err(TableError::FileOpen(..))));

        fs::write(config.table_path("empty"), b"").unwrap();
        assert!(matches!(Table::open(&config, "empty"), Err(TableError::EmptyFile(_))));

        fs::write(config.table_path("short"), b"abc").unwrap();
        assert!(matches!(Table::open(&config, "short"), Err(TableError::FileRead(..))));

        assert!(matches!(
            Table::open(&config, "sixteen_letters_"),
            Err(TableError::TableName(_))
        ));
    }

    fn patch_record_count(path: &Path, count: u64) {
        let mut file = OpenOptions::new().write(true).open(path).unwrap();
        file.seek(SeekFrom::Start(24)).unwrap();
        file.write_all(&count.to_le_bytes()).unwrap();
    }

    #[test]
    fn test_open_rejects_damaged_record_count() {
        let dir = tempdir().unwrap();
        let config = DbConfig::for_testing(dir.path());
        let mut table = Table::create(&config, "t", people()).unwrap();
        table.append(&row("a", 1)).unwrap();
        let path = config.table_path("t");

        patch_record_count(&path, u64::MAX);
        assert!(matches!(Table::open(&config, "t"), Err(TableError::FileRead(..))));

        // more records counted than the file holds
        patch_record_count(&path, 2);
        assert!(matches!(Table::open(&config, "t"), Err(TableError::FileRead(..))));

        // fewer counted than stored: trailing bytes are tolerated
        patch_record_count(&path, 0);
        let mut table = Table::open(&config, "t").unwrap();
        assert_eq!(table.record_count(), 0);
        assert_eq!(table.append(&row("b", 2)).unwrap(), 1);
        assert_eq!(table.read(1).unwrap(), row("b", 2));
    }

    #[test]
    fn test_synchronous_durability() {
        let dir = tempdir().unwrap();
        let mut config = DbConfig::for_testing(dir.path());
        config.durability = DurabilityLevel::Synchronous;
        let mut table = Table::create(&config, "people", people()).unwrap();

        table.append(&row("a", 1)).unwrap();
        table.append(&row("b", 2)).unwrap();
        table.update(2, &row("c", 3)).unwrap();
        table.delete_row(1).unwrap();

        let reopened = Table::open(&config, "people").unwrap();
        assert_eq!(reopened.record_count(), 1);
        assert_eq!(reopened.read(1).unwrap(), row("c", 3));
        assert_eq!(
            fs::metadata(reopened.path()).unwrap().len(),
            reopened.header().header_len + reopened.row_size()
        );
    }

    #[test]
    fn test_drop_and_list() {
        let dir = tempdir().unwrap();
        let config = DbConfig::for_testing(dir.path());
        Table::create(&config, "b", people()).unwrap();
        Table::create(&config, "a", people()).unwrap();
        fs::write(dir.path().join("notes.md"), b"x").unwrap();

        assert_eq!(Table::list(&config).unwrap(), vec!["a".to_string(), "b".to_string()]);

        Table::drop(&config, "a").unwrap();
        assert!(!config.table_path("a").exists());
        assert!(matches!(Table::drop(&config, "a"), Err(TableError::FileRemove(..))));
    }

    #[test]
    fn test_create_truncates_existing() {
        let dir = tempdir().unwrap();
        let config = DbConfig::for_testing(dir.path());
        let mut table = Table::create(&config, "people", people()).unwrap();
        table.append(&row("a", 1)).unwrap();

        let table = Table::create(&config, "people", people()).unwrap();
        assert_eq!(table.record_count(), 0);
        assert_eq!(Table::open(&config, "people").unwrap().record_count(), 0);
    }
}
