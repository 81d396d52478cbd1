// ## 📂 File: `src/stream/core.rs`
// ## Blocking file API

use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cipher::BlockCipher;
use crate::config::StreamConfig;
use crate::constants::DELTA_COUNT_LEN;
use crate::modes::{CipherMode, ModeError};
use crate::padding::{padded_len, PaddingScheme};
use crate::random::{DeltaStream, RandomSource};
use crate::stream::cursor::{check_payload, DecryptCursor, EncryptCursor};
use crate::stream::header;
use crate::stream::io::{open_input, open_input_at, open_output};
use crate::stream::parallelism::ParallelismProfile;
use crate::stream::pipeline::{
    run_parallel_decrypt, run_parallel_encrypt, run_sequential_decrypt, run_sequential_encrypt,
    ParallelJob,
};
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::{StreamError, StreamOutcome};
use crate::utils::{best_chunk_blocks, hex_preview};

/// Everything a file transform needs besides the paths.
#[derive(Clone, Copy)]
pub struct StreamJob<'a> {
    pub cipher: &'a dyn BlockCipher,
    pub mode: CipherMode,
    pub padding: PaddingScheme,
    /// Encryption IV. Ignored on decrypt, which reads the IV from the file header.
    pub iv: Option<&'a [u8]>,
    pub config: &'a StreamConfig,
}

impl<'a> StreamJob<'a> {
    pub fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    pub fn chunk_blocks(&self) -> usize {
        best_chunk_blocks(self.config.chunk_blocks, self.block_size())
    }

    pub fn runs_parallel(&self) -> bool {
        self.config.parallel && self.mode.is_independent()
    }

    /// IV for encryption, checked against the block size.
    pub fn encrypt_iv(&self) -> Result<Option<&'a [u8]>, StreamError> {
        if !self.mode.uses_iv() {
            return Ok(None);
        }
        let bs = self.block_size();
        match self.iv {
            Some(iv) if iv.len() == bs => Ok(Some(iv)),
            other => Err(ModeError::IvLength { expected: bs, actual: other.map_or(0, <[u8]>::len) }.into()),
        }
    }

    fn parallel_job(&self, iv: Option<&'a [u8]>) -> ParallelJob<'a> {
        let batch_blocks = self.config.batch_blocks;
        ParallelJob {
            cipher: self.cipher,
            mode: self.mode,
            iv,
            batch_blocks,
            profile: ParallelismProfile::for_config(batch_blocks * self.block_size(), self.config.workers),
        }
    }
}

fn outcome(completed: bool, snapshot: TelemetrySnapshot) -> StreamOutcome {
    if completed {
        StreamOutcome::Completed(snapshot)
    } else {
        StreamOutcome::Cancelled(snapshot)
    }
}

/// Encrypt `input` into `output`: mode header, then the padded ciphertext.
pub fn encrypt_file(
    job: &StreamJob<'_>,
    input: &Path,
    output: &Path,
    rng: &mut dyn RandomSource,
    cancel: Option<&CancellationToken>,
) -> Result<StreamOutcome, StreamError> {
    let bs = job.block_size();
    job.config.validate(bs)?;
    let iv = job.encrypt_iv()?;

    let (mut reader, input_len) = open_input(input)?;
    let mut writer = open_output(output)?;
    info!(
        cipher = job.cipher.name(),
        mode = ?job.mode,
        padding = ?job.padding,
        input_len,
        parallel = job.runs_parallel(),
        "encrypt file start"
    );

    // ---- Header ----
    let t = Instant::now();
    let mut delta_stream = (job.mode == CipherMode::RandomDelta).then(|| DeltaStream::new(rng));
    let header_bytes = match (job.mode, delta_stream.as_mut()) {
        (CipherMode::RandomDelta, Some(stream)) => {
            let count = (padded_len(job.padding, input_len as usize, bs)? / bs) as u64;
            let replay = stream.replay();
            let n = header::write_delta_header(&mut writer, stream, count, bs, job.chunk_blocks())?;
            *stream = replay;
            n
        }
        _ => match iv {
            Some(iv) => header::write_iv(&mut writer, iv)?,
            None => 0,
        },
    };
    let header_time = t.elapsed();

    // ---- Payload ----
    let (completed, snapshot) = if job.runs_parallel() {
        let mut counters = TelemetryCounters::default();
        let mut timer = TelemetryTimer::new();
        counters.add_header(header_bytes);
        timer.add_stage_time(Stage::Header, header_time);

        let completed = run_parallel_encrypt(
            &job.parallel_job(iv),
            &mut reader,
            &mut writer,
            input_len,
            job.padding,
            rng,
            cancel,
            &mut counters,
            &mut timer,
        )?;
        timer.finish();
        (completed, TelemetrySnapshot::from(&counters, &timer))
    } else {
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
        cursor.timer.add_stage_time(Stage::Header, header_time);

        let completed = run_sequential_encrypt(&mut reader, &mut writer, &mut cursor, rng, cancel)?;
        (completed, cursor.snapshot())
    };

    info!(
        blocks = snapshot.blocks,
        bytes_out = snapshot.bytes_out,
        bytes_header = snapshot.bytes_header,
        completed,
        "encrypt file finish"
    );
    Ok(outcome(completed, snapshot))
}

/// Decrypt `input` (mode header + ciphertext) into `output`.
pub fn decrypt_file(
    job: &StreamJob<'_>,
    input: &Path,
    output: &Path,
    cancel: Option<&CancellationToken>,
) -> Result<StreamOutcome, StreamError> {
    let bs = job.block_size();
    job.config.validate(bs)?;

    let (mut reader, file_len) = open_input(input)?;
    info!(cipher = job.cipher.name(), mode = ?job.mode, file_len, "decrypt file start");

    // ---- Header ----
    let t = Instant::now();
    let mut delta_reader = None;
    let (iv, header_bytes, payload_len) = match job.mode {
        CipherMode::Ecb => (None, 0u64, file_len),
        CipherMode::RandomDelta => {
            let count = header::read_delta_count(&mut reader)?;
            let blocks = header::delta_payload_blocks(file_len, count, bs)?;
            let header_len = DELTA_COUNT_LEN as u64 + count * bs as u64;
            delta_reader = Some(open_input_at(input, DELTA_COUNT_LEN as u64)?);
            reader.seek(SeekFrom::Start(header_len))?;
            (None, header_len, blocks * bs as u64)
        }
        _ => {
            let iv = header::read_iv(&mut reader, bs)?;
            (Some(iv), bs as u64, file_len - bs as u64)
        }
    };
    check_payload(payload_len, bs)?;
    let header_time = t.elapsed();
    if let Some(iv) = iv.as_deref() {
        debug!(iv = %hex_preview(iv), payload_len, "header read");
    }

    let mut writer = open_output(output)?;

    // ---- Payload ----
    let (completed, snapshot) = if job.runs_parallel() {
        let mut counters = TelemetryCounters::default();
        let mut timer = TelemetryTimer::new();
        counters.add_header(header_bytes as usize);
        timer.add_stage_time(Stage::Header, header_time);

        let completed = run_parallel_decrypt(
            &job.parallel_job(iv.as_deref()),
            &mut reader,
            &mut writer,
            payload_len,
            job.padding,
            job.config.unpad_policy,
            cancel,
            &mut counters,
            &mut timer,
        )?;
        timer.finish();
        (completed, TelemetrySnapshot::from(&counters, &timer))
    } else {
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
        cursor.timer.add_stage_time(Stage::Header, header_time);

        let deltas = delta_reader.as_mut().map(|r| r as &mut dyn std::io::Read);
        let completed = run_sequential_decrypt(&mut reader, &mut writer, &mut cursor, deltas, cancel)?;
        (completed, cursor.snapshot())
    };

    info!(blocks = snapshot.blocks, bytes_out = snapshot.bytes_out, completed, "decrypt file finish");
    Ok(outcome(completed, snapshot))
}
