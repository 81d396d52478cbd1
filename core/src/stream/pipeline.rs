// ## 📂 File: `src/stream/pipeline.rs`
// ## Sequential loops + parallel batch pipeline (ECB/CTR)

use std::io::{Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cipher::BlockCipher;
use crate::modes::{ChainState, CipherMode, Direction};
use crate::padding::{self, PaddingScheme, UnpadPolicy};
use crate::random::RandomSource;
use crate::stream::cursor::{unpad_tail, DecryptCursor, EncryptCursor};
use crate::stream::header;
use crate::stream::io::{self, OrderedBatchWriter, TransformedBatch};
use crate::stream::parallelism::ParallelismProfile;
use crate::telemetry::{Stage, StageTimes, TelemetryCounters, TelemetryTimer};
use crate::types::StreamError;

pub(crate) fn is_cancelled(cancel: Option<&CancellationToken>) -> bool {
    cancel.map_or(false, |t| t.is_cancelled())
}

// ============================================================
// Sequential
// ============================================================

/// Drive an encrypt cursor to completion. Returns `false` if cancelled.
pub fn run_sequential_encrypt<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    cursor: &mut EncryptCursor<'_>,
    rng: &mut dyn RandomSource,
    cancel: Option<&CancellationToken>,
) -> Result<bool, StreamError> {
    while let Some(want) = cursor.next_read_len() {
        if is_cancelled(cancel) {
            writer.flush()?;
            warn!(blocks = cursor.counters.blocks, "encrypt cancelled");
            return Ok(false);
        }

        let t = Instant::now();
        let buf = io::read_planned(reader, want)?;
        cursor.timer.add_stage_time(Stage::Read, t.elapsed());

        let out = cursor.transform(buf, rng)?;

        let t = Instant::now();
        writer.write_all(&out)?;
        cursor.timer.add_stage_time(Stage::Write, t.elapsed());
    }
    writer.flush()?;
    Ok(true)
}

/// Drive a decrypt cursor to completion. `deltas` reads RandomDelta deltas in
/// lockstep with the payload. Returns `false` if cancelled.
pub fn run_sequential_decrypt<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    cursor: &mut DecryptCursor<'_>,
    mut deltas: Option<&mut dyn Read>,
    cancel: Option<&CancellationToken>,
) -> Result<bool, StreamError> {
    while let Some(want) = cursor.next_read_len() {
        if is_cancelled(cancel) {
            writer.flush()?;
            warn!(blocks = cursor.counters.blocks, "decrypt cancelled");
            return Ok(false);
        }

        let t = Instant::now();
        let buf = io::read_planned(reader, want)?;
        let delta_bytes = match deltas.as_mut() {
            Some(r) => header::read_header_bytes(&mut **r, want)?,
            None => Vec::new(),
        };
        cursor.timer.add_stage_time(Stage::Read, t.elapsed());

        let out = cursor.transform(buf, &delta_bytes)?;

        let t = Instant::now();
        writer.write_all(&out)?;
        cursor.timer.add_stage_time(Stage::Write, t.elapsed());
    }
    writer.flush()?;
    Ok(true)
}

// ============================================================
// Parallel (independent-block modes only)
// ============================================================

/// Fixed inputs for one parallel run.
pub struct ParallelJob<'a> {
    pub cipher: &'a dyn BlockCipher,
    pub mode: CipherMode,
    pub iv: Option<&'a [u8]>,
    pub batch_blocks: usize,
    pub profile: ParallelismProfile,
}

struct Batch {
    index: u64,
    first_block: u64,
    bytes: Vec<u8>,
    bytes_read: usize,
    is_final: bool,
}

/// Per-worker tallies, merged into the run totals once the worker exits.
#[derive(Default)]
struct WorkerTally {
    counters: TelemetryCounters,
    times: StageTimes,
}

enum ReaderEnd {
    Done(Duration),
    Cancelled(Duration),
}

/// Encrypt `input_len` bytes from `reader` with a worker pool. Returns `false` if cancelled.
#[allow(clippy::too_many_arguments)]
pub fn run_parallel_encrypt<R: Read + Send, W: Write>(
    job: &ParallelJob<'_>,
    reader: &mut R,
    writer: &mut W,
    input_len: u64,
    padding: PaddingScheme,
    rng: &mut dyn RandomSource,
    cancel: Option<&CancellationToken>,
    counters: &mut TelemetryCounters,
    timer: &mut TelemetryTimer,
) -> Result<bool, StreamError> {
    run_parallel(
        job,
        Direction::Encrypt,
        reader,
        writer,
        input_len,
        Some((padding, rng)),
        None,
        cancel,
        counters,
        timer,
    )
}

/// Decrypt `payload_len` ciphertext bytes from `reader` with a worker pool.
#[allow(clippy::too_many_arguments)]
pub fn run_parallel_decrypt<R: Read + Send, W: Write>(
    job: &ParallelJob<'_>,
    reader: &mut R,
    writer: &mut W,
    payload_len: u64,
    padding: PaddingScheme,
    policy: UnpadPolicy,
    cancel: Option<&CancellationToken>,
    counters: &mut TelemetryCounters,
    timer: &mut TelemetryTimer,
) -> Result<bool, StreamError> {
    run_parallel(
        job,
        Direction::Decrypt,
        reader,
        writer,
        payload_len,
        None,
        Some((padding, policy)),
        cancel,
        counters,
        timer,
    )
}

#[allow(clippy::too_many_arguments)]
fn run_parallel<R: Read + Send, W: Write>(
    job: &ParallelJob<'_>,
    direction: Direction,
    reader: &mut R,
    writer: &mut W,
    total_len: u64,
    pad: Option<(PaddingScheme, &mut dyn RandomSource)>,
    unpad: Option<(PaddingScheme, UnpadPolicy)>,
    cancel: Option<&CancellationToken>,
    counters: &mut TelemetryCounters,
    timer: &mut TelemetryTimer,
) -> Result<bool, StreamError> {
    if !job.mode.is_independent() {
        return Err(StreamError::Validation(format!(
            "{:?} cannot run in the parallel pipeline",
            job.mode
        )));
    }
    let bs = job.cipher.block_size();
    let batch_bytes = job.batch_blocks.max(1) * bs;
    let stage = match direction {
        Direction::Encrypt => Stage::Encrypt,
        Direction::Decrypt => Stage::Decrypt,
    };
    debug!(
        mode = ?job.mode,
        workers = job.profile.worker_count,
        inflight = job.profile.inflight_batches,
        batch_bytes,
        "parallel pipeline start"
    );

    thread::scope(|scope| -> Result<bool, StreamError> {
        let window = job.profile.inflight_batches.max(1);
        let (batch_tx, batch_rx) = bounded::<Batch>(window);
        let (out_tx, out_rx) = bounded::<Result<TransformedBatch, StreamError>>(window);
        // One credit per batch read but not yet written. Caps the reorder buffer
        // at `window` batches even when one worker stalls.
        let (credit_tx, credit_rx) = bounded::<()>(window);

        // ---- Reader ----
        let reader_handle = scope.spawn(move || {
            read_batches(reader, batch_tx, credit_tx, total_len, batch_bytes, bs, pad, cancel)
        });

        // ---- Workers ----
        let mut workers = Vec::with_capacity(job.profile.worker_count);
        for i in 0..job.profile.worker_count {
            let rx = batch_rx.clone();
            let tx = out_tx.clone();
            let (cipher, mode, iv) = (job.cipher, job.mode, job.iv);
            workers.push(scope.spawn(move || {
                debug!(worker = i, "worker starting");
                let tally = transform_batches(cipher, mode, direction, iv, stage, rx, tx);
                debug!(worker = i, batches = tally.counters.batches, "worker finished");
                tally
            }));
        }
        drop(batch_rx);
        drop(out_tx);

        // ---- Ordered writer ----
        let written = write_ordered(writer, out_rx, credit_rx, unpad, bs, counters, timer);

        let read = reader_handle
            .join()
            .map_err(|_| StreamError::PipelineError("reader thread panicked"))?;
        for handle in workers {
            let tally = handle
                .join()
                .map_err(|_| StreamError::PipelineError("worker thread panicked"))?;
            counters.merge(&tally.counters);
            timer.stage_times.merge(&tally.times);
        }

        let final_written = written?;
        match read? {
            ReaderEnd::Done(read_time) => {
                timer.add_stage_time(Stage::Read, read_time);
                if !final_written {
                    return Err(StreamError::PipelineError("final batch missing"));
                }
                Ok(true)
            }
            ReaderEnd::Cancelled(read_time) => {
                timer.add_stage_time(Stage::Read, read_time);
                warn!(batches = counters.batches, "parallel pipeline cancelled");
                Ok(false)
            }
        }
    })
}

#[allow(clippy::too_many_arguments)]
fn read_batches<R: Read>(
    reader: &mut R,
    tx: Sender<Batch>,
    credits: Sender<()>,
    total_len: u64,
    batch_bytes: usize,
    block_size: usize,
    mut pad: Option<(PaddingScheme, &mut dyn RandomSource)>,
    cancel: Option<&CancellationToken>,
) -> Result<ReaderEnd, StreamError> {
    let mut remaining = total_len;
    let mut index = 0u64;
    let mut first_block = 0u64;
    let mut read_time = Duration::ZERO;

    loop {
        if is_cancelled(cancel) {
            return Ok(ReaderEnd::Cancelled(read_time));
        }
        credits
            .send(())
            .map_err(|_| StreamError::PipelineError("credit channel closed"))?;

        let want = remaining.min(batch_bytes as u64) as usize;
        let t = Instant::now();
        let mut bytes = io::read_planned(reader, want)?;
        read_time += t.elapsed();
        remaining -= want as u64;

        let is_final = remaining == 0;
        if is_final {
            if let Some((scheme, rng)) = pad.as_mut() {
                let suffix = padding::pad_suffix(*scheme, total_len as usize, block_size, &mut **rng)?;
                bytes.extend_from_slice(&suffix);
            }
        }

        let blocks = (bytes.len() / block_size) as u64;
        tx.send(Batch { index, first_block, bytes, bytes_read: want, is_final })
            .map_err(|_| StreamError::PipelineError("batch channel closed"))?;

        if is_final {
            return Ok(ReaderEnd::Done(read_time));
        }
        index += 1;
        first_block += blocks;
    }
}

fn transform_batches(
    cipher: &dyn BlockCipher,
    mode: CipherMode,
    direction: Direction,
    iv: Option<&[u8]>,
    stage: Stage,
    rx: Receiver<Batch>,
    tx: Sender<Result<TransformedBatch, StreamError>>,
) -> WorkerTally {
    let bs = cipher.block_size();
    let mut tally = WorkerTally::default();

    for batch in rx.iter() {
        let t = Instant::now();
        let Batch { index, first_block, mut bytes, bytes_read, is_final } = batch;

        let result = ChainState::new(mode, direction, bs, iv)
            .and_then(|state| state.at_block(first_block))
            .and_then(|mut state| state.process(cipher, &mut bytes, &[]))
            .map_err(StreamError::from)
            .map(|()| {
                let blocks = bytes.len() / bs;
                tally.counters.add_batch(blocks, bytes_read, 0);
                tally.times.add(stage, t.elapsed());
                debug!(batch = index, blocks, "batch done");
                TransformedBatch { index, bytes, is_final }
            });

        if tx.send(result).is_err() {
            break;
        }
    }
    tally
}

/// Drain worker output in batch order. Returns whether the final batch was written.
///
/// Hands one credit back to the reader per batch written.
fn write_ordered<W: Write>(
    writer: &mut W,
    rx: Receiver<Result<TransformedBatch, StreamError>>,
    credits: Receiver<()>,
    unpad: Option<(PaddingScheme, UnpadPolicy)>,
    block_size: usize,
    counters: &mut TelemetryCounters,
    timer: &mut TelemetryTimer,
) -> Result<bool, StreamError> {
    let mut ordered = OrderedBatchWriter::with_tail(writer, move |bytes| match unpad {
        Some((scheme, policy)) => unpad_tail(scheme, policy, block_size, bytes),
        None => Ok(bytes),
    });

    let mut write_time = Duration::ZERO;
    for result in rx.iter() {
        let batch = result?;

        let before = ordered.bytes_written();
        let t = Instant::now();
        let flushed = ordered.push(batch)?;
        write_time += t.elapsed();
        counters.bytes_out += ordered.bytes_written() - before;

        for _ in 0..flushed {
            credits
                .recv()
                .map_err(|_| StreamError::PipelineError("credit channel closed"))?;
        }
    }

    let t = Instant::now();
    let final_written = ordered.finish()?;
    write_time += t.elapsed();
    timer.add_stage_time(Stage::Write, write_time);
    Ok(final_written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::cipher::{Aes128Block, CipherError, KeyExpander, RawKeySchedule};
    use crate::modes;

    /// AES-128 that stalls on an all-0xFF plaintext block.
    struct StallOnMarker(Aes128Block);

    impl BlockCipher for StallOnMarker {
        fn block_size(&self) -> usize {
            self.0.block_size()
        }
        fn set_round_keys(&mut self, round_keys: &[Vec<u8>]) -> Result<(), CipherError> {
            self.0.set_round_keys(round_keys)
        }
        fn encrypt_block(&self, block: &mut [u8]) -> Result<(), CipherError> {
            if block.iter().all(|&b| b == 0xFF) {
                thread::sleep(Duration::from_millis(50));
            }
            self.0.encrypt_block(block)
        }
        fn decrypt_block(&self, block: &mut [u8]) -> Result<(), CipherError> {
            self.0.decrypt_block(block)
        }
    }

    struct CountingReader {
        data: std::io::Cursor<Vec<u8>>,
        read: Arc<AtomicU64>,
    }

    impl Read for CountingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.data.read(buf)?;
            self.read.fetch_add(n as u64, Ordering::SeqCst);
            Ok(n)
        }
    }

    /// Records the widest gap between bytes read and bytes written.
    struct LagWriter {
        out: Vec<u8>,
        read: Arc<AtomicU64>,
        max_lag: u64,
    }

    impl Write for LagWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let lag = self.read.load(Ordering::SeqCst).saturating_sub(self.out.len() as u64);
            self.max_lag = self.max_lag.max(lag);
            self.out.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn keyed() -> StallOnMarker {
        let mut cipher = StallOnMarker(Aes128Block::new());
        cipher.set_round_keys(&RawKeySchedule.expand_key(&[7u8; 16]).unwrap()).unwrap();
        cipher
    }

    #[test]
    fn stalled_worker_does_not_let_reader_run_ahead() {
        let cipher = keyed();
        let batch_blocks = 4;
        let batch_bytes = batch_blocks * 16;
        let window = 2;

        // First block stalls its worker; the rest never match the marker.
        let mut data = vec![0xFFu8; 16];
        data.extend((0..batch_bytes * 40).map(|i| (i % 251) as u8));

        let read = Arc::new(AtomicU64::new(0));
        let mut reader = CountingReader { data: std::io::Cursor::new(data.clone()), read: read.clone() };
        let mut writer = LagWriter { out: Vec::new(), read, max_lag: 0 };

        let job = ParallelJob {
            cipher: &cipher,
            mode: CipherMode::Ecb,
            iv: None,
            batch_blocks,
            profile: ParallelismProfile { worker_count: 3, inflight_batches: window },
        };
        let mut counters = TelemetryCounters::default();
        let mut timer = TelemetryTimer::new();
        let completed = run_parallel_encrypt(
            &job,
            &mut reader,
            &mut writer,
            data.len() as u64,
            PaddingScheme::Pkcs7,
            &mut StdRng::from_seed([0u8; 32]),
            None,
            &mut counters,
            &mut timer,
        )
        .unwrap();

        assert!(completed);
        assert!(writer.max_lag <= (window * batch_bytes) as u64, "lag {}", writer.max_lag);

        let padded = padding::apply(PaddingScheme::Pkcs7, &data, 16, &mut StdRng::from_seed([0u8; 32])).unwrap();
        let expected = modes::encrypt(CipherMode::Ecb, &cipher, None, &padded, &mut StdRng::from_seed([0u8; 32]))
            .unwrap()
            .ciphertext;
        assert_eq!(writer.out, expected);
        assert_eq!(counters.blocks, (padded.len() / 16) as u64);
        assert_eq!(counters.bytes_in, data.len() as u64);
        assert_eq!(counters.bytes_out, padded.len() as u64);
        assert!(timer.stage_times.has_all(&[Stage::Read, Stage::Encrypt, Stage::Write]));
    }
}
