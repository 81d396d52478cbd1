#[cfg(test)]
mod tests {
    use std::fs;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    use modes_core::prelude::*;
    use modes_core::stream::HeaderError;

    fn ctx(mode: CipherMode, padding: PaddingScheme, seed: u64) -> CryptoContext {
        let key = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let iv = [0x24u8; 16];
        CryptoContext::new(&key, Box::new(Aes128Block::new()), mode, padding, &RawKeySchedule, Some(&iv[..]))
            .unwrap()
            .with_config(StreamConfig::default().with_chunk_blocks(16))
            .unwrap()
            .with_random_source(Box::new(StdRng::seed_from_u64(seed)))
    }

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 256) as u8 | 1).collect()
    }

    #[tokio::test]
    async fn async_round_trip_all_modes() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let data = sample(1_000);
        let plain = dir.path().join("plain.bin");
        let enc = dir.path().join("enc.bin");
        let dec = dir.path().join("dec.bin");
        fs::write(&plain, &data)?;

        for mode in CipherMode::ALL {
            let c = ctx(mode, PaddingScheme::Pkcs7, 4);
            let outcome = c.encrypt_file_async(&plain, &enc, CancellationToken::new()).await?;
            assert!(matches!(outcome, StreamOutcome::Completed(_)));

            let outcome = c.decrypt_file_async(&enc, &dec, CancellationToken::new()).await?;
            assert_eq!(outcome.snapshot().bytes_out, data.len() as u64);
            assert_eq!(fs::read(&dec)?, data, "{mode:?}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn async_output_matches_blocking_output() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let plain = dir.path().join("plain.bin");
        let sync_out = dir.path().join("sync.bin");
        let async_out = dir.path().join("async.bin");
        fs::write(&plain, sample(333))?;

        for mode in CipherMode::ALL {
            ctx(mode, PaddingScheme::Iso10126, 8).encrypt_file(&plain, &sync_out)?;
            ctx(mode, PaddingScheme::Iso10126, 8)
                .encrypt_file_async(&plain, &async_out, CancellationToken::new())
                .await?;
            assert_eq!(fs::read(&sync_out)?, fs::read(&async_out)?, "{mode:?}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn async_decrypt_reads_blocking_output() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let data = sample(77);
        let plain = dir.path().join("plain.bin");
        let enc = dir.path().join("enc.bin");
        let dec = dir.path().join("dec.bin");
        fs::write(&plain, &data)?;

        let c = ctx(CipherMode::RandomDelta, PaddingScheme::AnsiX923, 1);
        c.encrypt_file(&plain, &enc)?;
        c.decrypt_file_async(&enc, &dec, CancellationToken::new()).await?;
        assert_eq!(fs::read(&dec)?, data);
        Ok(())
    }

    #[tokio::test]
    async fn pre_cancelled_token_returns_cancelled() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let plain = dir.path().join("plain.bin");
        let enc = dir.path().join("enc.bin");
        fs::write(&plain, sample(4096))?;

        let token = CancellationToken::new();
        token.cancel();
        let c = ctx(CipherMode::Ctr, PaddingScheme::Pkcs7, 0);
        let outcome = c.encrypt_file_async(&plain, &enc, token.clone()).await?;
        assert!(outcome.is_cancelled());
        assert_eq!(outcome.into_snapshot().blocks, 0);
        assert_eq!(fs::metadata(&enc)?.len(), 16);
        Ok(())
    }

    #[tokio::test]
    async fn async_errors_match_blocking_errors() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let bad = dir.path().join("bad.bin");
        fs::write(&bad, [0u8; 20])?;

        let c = ctx(CipherMode::Cbc, PaddingScheme::Pkcs7, 0);
        let err = c
            .decrypt_file_async(&bad, dir.path().join("out.bin"), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::Truncated { len: 4, block_size: 16 }));
        Ok(())
    }

    #[tokio::test]
    async fn async_short_header_is_header_error() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let short = dir.path().join("short.bin");
        fs::write(&short, [7u8; 5])?;

        let c = ctx(CipherMode::Cbc, PaddingScheme::Pkcs7, 0);
        let err = c
            .decrypt_file_async(&short, dir.path().join("out.bin"), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::Header(HeaderError::Truncated { need: 16, have: 5 })));

        let c = ctx(CipherMode::RandomDelta, PaddingScheme::Pkcs7, 0);
        let err = c
            .decrypt_file_async(&short, dir.path().join("out.bin"), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::Header(HeaderError::Truncated { need: 8, have: 5 })));
        Ok(())
    }
}
