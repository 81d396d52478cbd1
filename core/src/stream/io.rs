// ## 📂 File: `src/stream/io.rs`
// ## File handles + ordered batch writer

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::types::StreamError;

/// Open `path` for reading and return it with its length.
pub fn open_input(path: &Path) -> Result<(File, u64), StreamError> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    Ok((file, len))
}

/// Open `path` for reading positioned at `offset`.
pub fn open_input_at(path: &Path, offset: u64) -> Result<File, StreamError> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    Ok(file)
}

/// Create (or truncate) `path` for writing.
pub fn open_output(path: &Path) -> Result<BufWriter<File>, StreamError> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Read up to `len` bytes, stopping early only at EOF. `Interrupted` is retried.
pub fn read_exact_or_eof<R: Read + ?Sized>(r: &mut R, len: usize) -> Result<Vec<u8>, StreamError> {
    let mut buf = vec![0u8; len];
    let mut off = 0;

    while off < len {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    buf.truncate(off);
    Ok(buf)
}

/// Read exactly `len` bytes of a file whose length was measured up front.
///
/// A short read means the file shrank underneath us.
pub fn read_planned<R: Read + ?Sized>(r: &mut R, len: usize) -> Result<Vec<u8>, StreamError> {
    let buf = read_exact_or_eof(r, len)?;
    if buf.len() != len {
        return Err(StreamError::Validation(format!(
            "input ended early: expected {} bytes, got {}",
            len,
            buf.len()
        )));
    }
    Ok(buf)
}

/// One transformed batch ready for the ordered writer.
#[derive(Debug)]
pub struct TransformedBatch {
    pub index: u64,
    pub bytes: Vec<u8>,
    pub is_final: bool,
}

/// Writes batches in index order, buffering those that arrive early.
///
/// `finish_tail` runs on the final batch before it is written (unpadding on decrypt).
/// The buffer itself is unbounded; the parallel pipeline caps it with reader credits.
pub struct OrderedBatchWriter<'a, W: Write> {
    out: &'a mut W,
    next: u64,
    pending: BTreeMap<u64, TransformedBatch>,
    finish_tail: Box<dyn FnMut(Vec<u8>) -> Result<Vec<u8>, StreamError> + 'a>,
    final_seen: bool,
    bytes_written: u64,
}

impl<'a, W: Write> OrderedBatchWriter<'a, W> {
    pub fn new(out: &'a mut W) -> Self {
        Self::with_tail(out, Ok)
    }

    pub fn with_tail(
        out: &'a mut W,
        finish_tail: impl FnMut(Vec<u8>) -> Result<Vec<u8>, StreamError> + 'a,
    ) -> Self {
        Self {
            out,
            next: 0,
            pending: BTreeMap::new(),
            finish_tail: Box::new(finish_tail),
            final_seen: false,
            bytes_written: 0,
        }
    }

    /// Queue `batch` and write everything now contiguous. Returns the number of batches written.
    pub fn push(&mut self, batch: TransformedBatch) -> Result<usize, StreamError> {
        if batch.index < self.next || self.pending.contains_key(&batch.index) {
            return Err(StreamError::PipelineError("duplicate batch index"));
        }
        self.pending.insert(batch.index, batch);
        self.flush_ready()
    }

    /// Flush what is contiguous and report whether the final batch was written.
    pub fn finish(&mut self) -> Result<bool, StreamError> {
        self.flush_ready()?;
        if !self.pending.is_empty() {
            debug!(pending = self.pending.len(), next = self.next, "ordered writer has gaps at finish");
        }
        self.out.flush()?;
        Ok(self.final_seen)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn flush_ready(&mut self) -> Result<usize, StreamError> {
        let mut flushed = 0;
        while let Some(batch) = self.pending.remove(&self.next) {
            let bytes = if batch.is_final {
                self.final_seen = true;
                (self.finish_tail)(batch.bytes)?
            } else {
                batch.bytes
            };
            self.out.write_all(&bytes)?;
            self.bytes_written += bytes.len() as u64;
            self.next += 1;
            flushed += 1;
        }
        Ok(flushed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    fn batch(index: u64, bytes: &[u8], is_final: bool) -> TransformedBatch {
        TransformedBatch { index, bytes: bytes.to_vec(), is_final }
    }

    #[test]
    fn writes_in_index_order() {
        let mut out = Vec::new();
        let mut w = OrderedBatchWriter::new(&mut out);
        assert_eq!(w.push(batch(2, b"cc", true)).unwrap(), 0);
        assert_eq!(w.push(batch(0, b"aa", false)).unwrap(), 1);
        assert_eq!(w.pending(), 1);
        assert_eq!(w.push(batch(1, b"bb", false)).unwrap(), 2);
        assert_eq!(w.pending(), 0);
        assert!(w.finish().unwrap());
        drop(w);
        assert_eq!(out, b"aabbcc");
    }

    #[test]
    fn tail_hook_runs_on_final_only() {
        let mut out = Vec::new();
        let mut w = OrderedBatchWriter::with_tail(&mut out, |mut b: Vec<u8>| {
            b.truncate(1);
            Ok(b)
        });
        w.push(batch(0, b"xyz", false)).unwrap();
        w.push(batch(1, b"pq", true)).unwrap();
        w.finish().unwrap();
        drop(w);
        assert_eq!(out, b"xyzp");
    }

    #[test]
    fn rejects_duplicates() {
        let mut out = Vec::new();
        let mut w = OrderedBatchWriter::new(&mut out);
        w.push(batch(0, b"a", false)).unwrap();
        assert!(w.push(batch(0, b"a", false)).is_err());
    }

    #[test]
    fn read_exact_or_eof_stops_at_eof() {
        let mut r = Cursor::new(vec![1u8; 5]);
        assert_eq!(read_exact_or_eof(&mut r, 8).unwrap().len(), 5);
        assert!(read_planned(&mut Cursor::new(vec![0u8; 3]), 4).is_err());
    }

    /// Interrupted once, then hands out a byte at a time.
    struct Jittery {
        interrupted: bool,
        data: Cursor<Vec<u8>>,
    }

    impl Read for Jittery {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            let n = buf.len().min(1);
            self.data.read(&mut buf[..n])
        }
    }

    #[test]
    fn reads_through_trait_objects_and_interrupts() {
        let mut jittery = Jittery { interrupted: false, data: Cursor::new(vec![9u8; 6]) };
        let r: &mut dyn Read = &mut jittery;
        assert_eq!(read_exact_or_eof(&mut *r, 4).unwrap(), vec![9u8; 4]);
        assert_eq!(read_planned(&mut *r, 2).unwrap(), vec![9u8; 2]);
        assert!(read_exact_or_eof(&mut *r, 4).unwrap().is_empty());
    }
}
