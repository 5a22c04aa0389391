//! Single-file hash table store
//!
//! Chained hash table pages with fixed-size records, grown by appending.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{KvError, Result};

use super::{pad, unpad, OpenMode, Store, StoreLayout};

/// Magic bytes at the start of every store file
pub const MAGIC: [u8; 4] = *b"MTKV";

/// Current file format version
pub const VERSION: u16 = 1;

/// Encoded header size: magic (4) + version (2) + three u64 fields
pub const HEADER_SIZE: u64 = 30;

/// On-disk header, encoded with bincode's fixed-width little-endian format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub hash_buckets: u64,
    pub key_size: u64,
    pub value_size: u64,
}

impl StoreHeader {
    fn new(layout: StoreLayout) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            hash_buckets: layout.hash_buckets,
            key_size: layout.key_size,
            value_size: layout.value_size,
        }
    }

    fn layout(&self) -> StoreLayout {
        StoreLayout {
            hash_buckets: self.hash_buckets,
            key_size: self.key_size,
            value_size: self.value_size,
        }
    }
}

struct Tables {
    /// Bucket slots of every table page, in chain order
    pages: Vec<Vec<u64>>,
    /// File offset of every table page
    offsets: Vec<u64>,
    /// Current end of file, where the next record or page goes
    end: u64,
}

/// Persistent hash table in a single file
///
/// ## Concurrency:
/// File access is positional, so the handle itself needs no lock. The table
/// index sits behind a `RwLock`: lookups share it and run in parallel, while
/// a put holds it exclusively for the whole write. Exclusion between whole
/// requests is enforced outside.
pub struct HashStore {
    path: PathBuf,
    layout: StoreLayout,
    file: File,
    tables: RwLock<Tables>,
}

impl HashStore {
    /// Open or create a store
    ///
    /// A new file gets a header for `layout`. An existing file must have been
    /// created with the same layout.
    pub fn open(path: &Path, mode: OpenMode, layout: StoreLayout) -> Result<Self> {
        if layout.hash_buckets == 0 || layout.key_size == 0 || layout.value_size == 0 {
            return Err(KvError::Store(format!(
                "Invalid layout: {:?}",
                layout
            )));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(mode == OpenMode::Create)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    KvError::Store(format!("Database file {} does not exist", path.display()))
                }
                _ => KvError::Io(e),
            })?;

        if file.metadata()?.len() == 0 {
            let header = bincode::serialize(&StoreHeader::new(layout))?;
            write_at(&file, 0, &header)?;
            file.sync_all()?;
        } else {
            let header = read_header(&file)?;
            if header.magic != MAGIC {
                return Err(KvError::Store(format!(
                    "Invalid store magic: expected MTKV, got {:?}",
                    header.magic
                )));
            }
            if header.version != VERSION {
                return Err(KvError::Store(format!(
                    "Unsupported store version: {}",
                    header.version
                )));
            }
            if header.layout() != layout {
                return Err(KvError::Store(format!(
                    "Layout mismatch: file has {:?}, requested {:?}",
                    header.layout(),
                    layout
                )));
            }
        }

        let tables = load_tables(&file, layout.hash_buckets)?;

        tracing::debug!(
            "Opened store {} ({} table pages, {} buckets)",
            path.display(),
            tables.pages.len(),
            layout.hash_buckets
        );

        Ok(Self {
            path: path.to_path_buf(),
            layout,
            file,
            tables: RwLock::new(tables),
        })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the layout the store was opened with
    pub fn layout(&self) -> StoreLayout {
        self.layout
    }

    /// Number of hash table pages in the chain
    pub fn table_count(&self) -> usize {
        self.tables.read().pages.len()
    }

    fn bucket(&self, padded_key: &[u8]) -> usize {
        (crc32fast::hash(padded_key) as u64 % self.layout.hash_buckets) as usize
    }

    fn table_bytes(&self) -> u64 {
        (self.layout.hash_buckets + 1) * 8
    }

    fn record_bytes(&self) -> u64 {
        self.layout.key_size + self.layout.value_size
    }
}

impl Store for HashStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let key_size = self.layout.key_size as usize;
        let padded = pad(key, key_size);
        let bucket = self.bucket(&padded);

        let tables = self.tables.read();

        for page in tables.pages.iter() {
            let offset = page[bucket];
            if offset == 0 {
                return Ok(None);
            }

            if read_at(&self.file, offset, key_size)? == padded {
                let value = read_at(
                    &self.file,
                    offset + key_size as u64,
                    self.layout.value_size as usize,
                )?;
                return Ok(Some(unpad(&value).to_vec()));
            }
        }

        Ok(None)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let key_size = self.layout.key_size as usize;
        let padded_key = pad(key, key_size);
        let padded_value = pad(value, self.layout.value_size as usize);
        let bucket = self.bucket(&padded_key);

        let mut tables = self.tables.write();
        let Tables {
            pages,
            offsets,
            end,
        } = &mut *tables;

        for (page, page_offset) in pages.iter_mut().zip(offsets.iter()) {
            let offset = page[bucket];

            if offset == 0 {
                // Free slot: append the record and point the slot at it
                let record_start = *end;
                write_at(&self.file, record_start, &padded_key)?;
                write_at(&self.file, record_start + key_size as u64, &padded_value)?;
                *end += self.record_bytes();

                write_at(&self.file, page_offset + bucket as u64 * 8, &record_start.to_le_bytes())?;
                page[bucket] = record_start;
                return Ok(());
            }

            if read_at(&self.file, offset, key_size)? == padded_key {
                write_at(&self.file, offset + key_size as u64, &padded_value)?;
                return Ok(());
            }
        }

        // Every page has this bucket taken: append a new page, then the record
        let page_start = *end;
        let record_start = page_start + self.table_bytes();

        let mut page = vec![0u64; self.layout.hash_buckets as usize + 1];
        page[bucket] = record_start;

        let encoded: Vec<u8> = page.iter().flat_map(|slot| slot.to_le_bytes()).collect();
        write_at(&self.file, page_start, &encoded)?;
        write_at(&self.file, record_start, &padded_key)?;
        write_at(&self.file, record_start + key_size as u64, &padded_value)?;
        *end = record_start + self.record_bytes();

        if let Some(last) = offsets.last() {
            let link = last + self.layout.hash_buckets * 8;
            write_at(&self.file, link, &page_start.to_le_bytes())?;
            if let Some(prev) = pages.last_mut() {
                prev[self.layout.hash_buckets as usize] = page_start;
            }
        }

        pages.push(page);
        offsets.push(page_start);
        tracing::debug!("Store grew to {} table pages", pages.len());

        Ok(())
    }

    fn close(self) -> Result<()> {
        self.file.sync_all()?;
        tracing::debug!("Closed store {}", self.path.display());
        Ok(())
    }
}

fn read_header(file: &File) -> Result<StoreHeader> {
    let bytes = read_at(file, 0, HEADER_SIZE as usize).map_err(|e| match e {
        KvError::Io(ref io) if io.kind() == ErrorKind::UnexpectedEof => {
            KvError::Store("File too short for a store header".to_string())
        }
        other => other,
    })?;
    Ok(bincode::deserialize(&bytes)?)
}

/// Walk the page chain starting right after the header
fn load_tables(file: &File, hash_buckets: u64) -> Result<Tables> {
    let file_len = file.metadata()?.len();
    let table_len = (hash_buckets as usize + 1) * 8;

    let mut pages = Vec::new();
    let mut offsets = Vec::new();
    let mut next = if file_len > HEADER_SIZE { HEADER_SIZE } else { 0 };

    while next != 0 {
        if next + table_len as u64 > file_len || offsets.contains(&next) {
            return Err(KvError::Store(format!(
                "Corrupt hash table chain at offset {}",
                next
            )));
        }

        let bytes = read_at(file, next, table_len)?;
        let page: Vec<u64> = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut slot = [0u8; 8];
                slot.copy_from_slice(chunk);
                u64::from_le_bytes(slot)
            })
            .collect();

        offsets.push(next);
        next = page[hash_buckets as usize];
        pages.push(page);
    }

    Ok(Tables {
        pages,
        offsets,
        end: file_len.max(HEADER_SIZE),
    })
}

fn read_at(file: &File, offset: u64, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    positional::read_exact_at(file, &mut buf, offset)?;
    Ok(buf)
}

fn write_at(file: &File, offset: u64, data: &[u8]) -> Result<()> {
    positional::write_all_at(file, data, offset)?;
    Ok(())
}

#[cfg(unix)]
mod positional {
    use std::fs::File;
    use std::io;
    use std::os::unix::fs::FileExt;

    pub fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
        file.read_exact_at(buf, offset)
    }

    pub fn write_all_at(file: &File, data: &[u8], offset: u64) -> io::Result<()> {
        file.write_all_at(data, offset)
    }
}

#[cfg(windows)]
mod positional {
    use std::fs::File;
    use std::io::{self, ErrorKind};
    use std::os::windows::fs::FileExt;

    pub fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
        while !buf.is_empty() {
            match file.seek_read(buf, offset) {
                Ok(0) => return Err(ErrorKind::UnexpectedEof.into()),
                Ok(n) => {
                    let rest = buf;
                    buf = &mut rest[n..];
                    offset += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub fn write_all_at(file: &File, mut data: &[u8], mut offset: u64) -> io::Result<()> {
        while !data.is_empty() {
            match file.seek_write(data, offset) {
                Ok(0) => return Err(ErrorKind::WriteZero.into()),
                Ok(n) => {
                    data = &data[n..];
                    offset += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
