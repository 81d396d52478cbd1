// ## 📂 File: `src/stream/async_io.rs`

//! stream/async_io.rs
//! Tokio file API.
//!
//! Design notes:
//! - Always sequential; the cipher work per chunk is synchronous and short, so
//!   the task only suspends at read and write boundaries.
//! - The cancellation token is checked once per chunk. A cancelled run flushes
//!   what it wrote and returns `StreamOutcome::Cancelled`.
//! - Uses the same cursors as the blocking engine, so output is byte-identical.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;

use byteorder::{ByteOrder, LittleEndian};
use rand::rngs::StdRng;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::constants::DELTA_COUNT_LEN;
use crate::modes::CipherMode;
use crate::padding::padded_len;
use crate::random::DeltaStream;
use crate::stream::core::StreamJob;
use crate::stream::cursor::{check_payload, DecryptCursor, EncryptCursor};
use crate::stream::header::{self, HeaderError};
use crate::telemetry::Stage;
use crate::types::{StreamError, StreamOutcome};

/// Read exactly `len` bytes of a file whose length was measured up front.
async fn read_planned<R: AsyncRead + Unpin>(r: &mut R, len: usize) -> Result<Vec<u8>, StreamError> {
    let mut buf = vec![0u8; len];
    match r.read_exact(&mut buf).await {
        Ok(_) => Ok(buf),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            Err(StreamError::Validation(format!("input ended early: expected {} bytes", len)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Read `need` header bytes. `available` is what the file can supply from this
/// offset and is reported when EOF comes first.
async fn read_header_bytes<R: AsyncRead + Unpin>(r: &mut R, need: usize, available: u64) -> Result<Vec<u8>, StreamError> {
    let mut buf = vec![0u8; need];
    match r.read_exact(&mut buf).await {
        Ok(_) => Ok(buf),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            Err(HeaderError::Truncated { need: need as u64, have: available.min(need as u64) }.into())
        }
        Err(e) => Err(e.into()),
    }
}

async fn write_delta_header<W: AsyncWrite + Unpin>(
    w: &mut W,
    stream: &mut DeltaStream,
    count: u64,
    block_size: usize,
    chunk_blocks: usize,
) -> Result<usize, StreamError> {
    let mut written = 0;
    for chunk in header::delta_header_chunks(stream, count, block_size, chunk_blocks) {
        w.write_all(&chunk).await?;
        written += chunk.len();
    }
    Ok(written)
}

/// Async counterpart of [`crate::stream::core::encrypt_file`].
pub async fn encrypt_file_async(
    job: StreamJob<'_>,
    input: &Path,
    output: &Path,
    mut rng: StdRng,
    cancel: CancellationToken,
) -> Result<StreamOutcome, StreamError> {
    let bs = job.block_size();
    job.config.validate(bs)?;
    let iv = job.encrypt_iv()?;

    let mut reader = File::open(input).await?;
    let input_len = reader.metadata().await?.len();
    let mut writer = BufWriter::new(File::create(output).await?);
    info!(cipher = job.cipher.name(), mode = ?job.mode, input_len, "async encrypt file start");

    let t = Instant::now();
    let mut delta_stream = (job.mode == CipherMode::RandomDelta).then(|| DeltaStream::new(&mut rng));
    let header_bytes = match delta_stream.as_mut() {
        Some(stream) => {
            let count = (padded_len(job.padding, input_len as usize, bs)? / bs) as u64;
            let replay = stream.replay();
            let n = write_delta_header(&mut writer, stream, count, bs, job.chunk_blocks()).await?;
            *stream = replay;
            n
        }
        None => match iv {
            Some(iv) => {
                writer.write_all(iv).await?;
                iv.len()
            }
            None => 0,
        },
    };

    let mut cursor = EncryptCursor::new(
        job.cipher,
        job.mode,
        job.padding,
        iv,
        input_len,
        job.chunk_blocks(),
        delta_stream,
    )?;
    cursor.counters.add_header(header_bytes);
    cursor.timer.add_stage_time(Stage::Header, t.elapsed());

    let mut completed = true;
    while let Some(want) = cursor.next_read_len() {
        if cancel.is_cancelled() {
            warn!(blocks = cursor.counters.blocks, "async encrypt cancelled");
            completed = false;
            break;
        }
        let t = Instant::now();
        let buf = read_planned(&mut reader, want).await?;
        cursor.timer.add_stage_time(Stage::Read, t.elapsed());

        let out = cursor.transform(buf, &mut rng)?;

        let t = Instant::now();
        writer.write_all(&out).await?;
        cursor.timer.add_stage_time(Stage::Write, t.elapsed());
    }
    writer.flush().await?;

    let snapshot = cursor.snapshot();
    info!(blocks = snapshot.blocks, bytes_out = snapshot.bytes_out, completed, "async encrypt file finish");
    Ok(if completed { StreamOutcome::Completed(snapshot) } else { StreamOutcome::Cancelled(snapshot) })
}

/// Async counterpart of [`crate::stream::core::decrypt_file`].
pub async fn decrypt_file_async(
    job: StreamJob<'_>,
    input: &Path,
    output: &Path,
    cancel: CancellationToken,
) -> Result<StreamOutcome, StreamError> {
    let bs = job.block_size();
    job.config.validate(bs)?;

    let mut reader = File::open(input).await?;
    let file_len = reader.metadata().await?.len();
    info!(cipher = job.cipher.name(), mode = ?job.mode, file_len, "async decrypt file start");

    let t = Instant::now();
    let mut delta_reader = None;
    let (iv, header_bytes, payload_len) = match job.mode {
        CipherMode::Ecb => (None, 0u64, file_len),
        CipherMode::RandomDelta => {
            let raw = read_header_bytes(&mut reader, DELTA_COUNT_LEN, file_len).await?;
            let count = LittleEndian::read_u64(&raw);
            let blocks = header::delta_payload_blocks(file_len, count, bs)?;
            let header_len = DELTA_COUNT_LEN as u64 + count * bs as u64;

            let mut deltas = File::open(input).await?;
            deltas.seek(std::io::SeekFrom::Start(DELTA_COUNT_LEN as u64)).await?;
            delta_reader = Some(deltas);
            reader.seek(std::io::SeekFrom::Start(header_len)).await?;
            (None, header_len, blocks * bs as u64)
        }
        _ => {
            let iv = read_header_bytes(&mut reader, bs, file_len).await?;
            (Some(iv), bs as u64, file_len - bs as u64)
        }
    };
    check_payload(payload_len, bs)?;

    let mut cursor = DecryptCursor::new(
        job.cipher,
        job.mode,
        job.padding,
        job.config.unpad_policy,
        iv.as_deref(),
        payload_len,
        job.chunk_blocks(),
    )?;
    cursor.counters.add_header(header_bytes as usize);
    cursor.timer.add_stage_time(Stage::Header, t.elapsed());

    let mut writer = BufWriter::new(File::create(output).await?);
    let mut completed = true;
    while let Some(want) = cursor.next_read_len() {
        if cancel.is_cancelled() {
            warn!(blocks = cursor.counters.blocks, "async decrypt cancelled");
            completed = false;
            break;
        }
        let t = Instant::now();
        let buf = read_planned(&mut reader, want).await?;
        let deltas = match delta_reader.as_mut() {
            Some(r) => read_planned(r, want).await?,
            None => Vec::new(),
        };
        cursor.timer.add_stage_time(Stage::Read, t.elapsed());

        let out = cursor.transform(buf, &deltas)?;

        let t = Instant::now();
        writer.write_all(&out).await?;
        cursor.timer.add_stage_time(Stage::Write, t.elapsed());
    }
    writer.flush().await?;

    let snapshot = cursor.snapshot();
    info!(blocks = snapshot.blocks, bytes_out = snapshot.bytes_out, completed, "async decrypt file finish");
    Ok(if completed { StreamOutcome::Completed(snapshot) } else { StreamOutcome::Cancelled(snapshot) })
}
