//! Binary layout of the two per-group files.
//!
//! ```text
//! .vgs  "@vgs" count:u24 { index:u24 name_len:u16 name text_len:u24 text emb_len:u24 f32* }*
//! .vss  "@vss" count:u24 { name_len:u16 name text_len:u24 text }*
//! ```
//!
//! All integers are little-endian. There is no version field; a layout change
//! needs a new magic symbol.

use crate::error::{Result, VectorStoreError};
use crate::summary::SummaryStore;
use crate::types::Chunk;

pub const GROUP_FILE_MAGIC: &[u8; 4] = b"@vgs";
pub const SUMMARY_FILE_MAGIC: &[u8; 4] = b"@vss";

const U16_MAX: usize = 0xFFFF;
const U24_MAX: usize = 0xFF_FFFF;

/// Encode a chunk array as a `.vgs` file.
///
/// The per-chunk `total` is not written; [`decode_chunks`] reconstructs it
/// from the file-level count.
pub fn encode_chunks(chunks: &[Chunk]) -> Result<Vec<u8>> {
    let payload: usize = chunks
        .iter()
        .map(|c| 11 + c.document_name.len() + c.text.len() + c.embedding.len() * 4)
        .sum();
    let mut out = ByteWriter::with_capacity(7 + payload);
    out.put_magic(GROUP_FILE_MAGIC);
    out.put_u24(chunks.len(), "chunk count")?;
    for chunk in chunks {
        out.put_u24(chunk.index, "chunk index")?;
        out.put_str_u16(&chunk.document_name, "document name")?;
        out.put_str_u24(&chunk.text, "chunk text")?;
        out.put_u24(chunk.embedding.len(), "embedding length")?;
        for value in &chunk.embedding {
            out.put_f32(*value);
        }
    }
    Ok(out.into_inner())
}

/// Decode a `.vgs` file. Every chunk's `total` is set to the chunk count of
/// the whole file.
pub fn decode_chunks(bytes: &[u8]) -> Result<Vec<Chunk>> {
    let mut reader = ByteReader::new(bytes);
    reader.expect_magic(GROUP_FILE_MAGIC, "group")?;
    let count = reader.u24("chunk count")?;

    let mut chunks = Vec::with_capacity(count.min(reader.remaining() / 9));
    for _ in 0..count {
        let index = reader.u24("chunk index")?;
        let name_len = reader.u16("document name length")?;
        let document_name = reader.string(name_len, "document name")?;
        let text_len = reader.u24("chunk text length")?;
        let text = reader.string(text_len, "chunk text")?;
        let embedding_len = reader.u24("embedding length")?;
        let mut embedding = Vec::with_capacity(embedding_len.min(reader.remaining() / 4));
        for _ in 0..embedding_len {
            embedding.push(reader.f32("embedding value")?);
        }
        chunks.push(Chunk::new(text, index, count, document_name, embedding));
    }
    reader.finish()?;
    Ok(chunks)
}

/// Encode summaries as a `.vss` file, entries in name order
pub fn encode_summary(summary: &SummaryStore) -> Result<Vec<u8>> {
    let payload: usize = summary.iter().map(|(k, v)| 5 + k.len() + v.len()).sum();
    let mut out = ByteWriter::with_capacity(7 + payload);
    out.put_magic(SUMMARY_FILE_MAGIC);
    out.put_u24(summary.len(), "summary count")?;
    for (name, text) in summary.iter() {
        out.put_str_u16(name, "summary name")?;
        out.put_str_u24(text, "summary text")?;
    }
    Ok(out.into_inner())
}

pub fn decode_summary(bytes: &[u8]) -> Result<SummaryStore> {
    let mut reader = ByteReader::new(bytes);
    reader.expect_magic(SUMMARY_FILE_MAGIC, "summary")?;
    let count = reader.u24("summary count")?;

    let mut summary = SummaryStore::new();
    for _ in 0..count {
        let name_len = reader.u16("summary name length")?;
        let name = reader.string(name_len, "summary name")?;
        let text_len = reader.u24("summary text length")?;
        let text = reader.string(text_len, "summary text")?;
        if summary.insert(name, text).is_some() {
            log::warn!("Duplicate summary entry in summary file; keeping the last one");
        }
    }
    reader.finish()?;
    Ok(summary)
}

struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    fn put_magic(&mut self, magic: &[u8; 4]) {
        self.buf.extend_from_slice(magic);
    }

    fn put_u16(&mut self, value: usize, field: &str) -> Result<()> {
        if value > U16_MAX {
            return Err(VectorStoreError::format(format!(
                "{field} {value} does not fit in 2 bytes"
            )));
        }
        #[allow(clippy::cast_possible_truncation)]
        let bytes = (value as u16).to_le_bytes();
        self.buf.extend_from_slice(&bytes);
        Ok(())
    }

    fn put_u24(&mut self, value: usize, field: &str) -> Result<()> {
        if value > U24_MAX {
            return Err(VectorStoreError::format(format!(
                "{field} {value} does not fit in 3 bytes"
            )));
        }
        #[allow(clippy::cast_possible_truncation)]
        let bytes = (value as u32).to_le_bytes();
        self.buf.extend_from_slice(&bytes[..3]);
        Ok(())
    }

    fn put_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn put_str_u16(&mut self, value: &str, field: &str) -> Result<()> {
        self.put_u16(value.len(), field)?;
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    fn put_str_u24(&mut self, value: &str, field: &str) -> Result<()> {
        self.put_u24(value.len(), field)?;
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    const fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(VectorStoreError::decode(
                self.pos,
                format!(
                    "{field} needs {len} bytes but only {} remain",
                    self.remaining()
                ),
            ));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn expect_magic(&mut self, magic: &[u8; 4], kind: &str) -> Result<()> {
        let found = self.take(4, "magic symbol")?;
        if found != magic {
            return Err(VectorStoreError::format(format!(
                "not a {kind} file: expected magic {:?}, found {:?}",
                String::from_utf8_lossy(magic),
                String::from_utf8_lossy(found)
            )));
        }
        Ok(())
    }

    fn u16(&mut self, field: &str) -> Result<usize> {
        let b = self.take(2, field)?;
        Ok(usize::from(u16::from_le_bytes([b[0], b[1]])))
    }

    fn u24(&mut self, field: &str) -> Result<usize> {
        let b = self.take(3, field)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]) as usize)
    }

    fn f32(&mut self, field: &str) -> Result<f32> {
        let b = self.take(4, field)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn string(&mut self, len: usize, field: &str) -> Result<String> {
        let start = self.pos;
        let raw = self.take(len, field)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|err| {
                VectorStoreError::decode(
                    start + err.valid_up_to(),
                    format!("{field} is not valid UTF-8"),
                )
            })
    }

    fn finish(&self) -> Result<()> {
        if self.remaining() > 0 {
            return Err(VectorStoreError::decode(
                self.pos,
                format!("{} trailing bytes after last record", self.remaining()),
            ));
        }
        Ok(())
    }
}
