#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use modes_core::cipher::{Aes128Block, BlockCipher, CipherError, DesBlock, KeyExpander, RawKeySchedule};
    use modes_core::modes::{self, ChainState, CipherMode, DeltaSequence, Direction, ModeError};

    const NIST_KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
    const NIST_PT: &str = "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51";
    const NIST_IV: &str = "000102030405060708090a0b0c0d0e0f";
    const NIST_CTR_IV: &str = "f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff";

    fn aes(key_hex: &str) -> Aes128Block {
        let mut c = Aes128Block::new();
        let keys = RawKeySchedule.expand_key(&hex::decode(key_hex).unwrap()).unwrap();
        c.set_round_keys(&keys).unwrap();
        c
    }

    fn des() -> DesBlock {
        let mut c = DesBlock::new();
        let keys = RawKeySchedule.expand_key(&hex::decode("AABB09182736CCDD").unwrap()).unwrap();
        c.set_round_keys(&keys).unwrap();
        c
    }

    fn enc_hex(mode: CipherMode, iv_hex: Option<&str>) -> String {
        let cipher = aes(NIST_KEY);
        let iv = iv_hex.map(|h| hex::decode(h).unwrap());
        let pt = hex::decode(NIST_PT).unwrap();
        let out = modes::encrypt(mode, &cipher, iv.as_deref(), &pt, &mut StdRng::seed_from_u64(0)).unwrap();
        hex::encode(out.ciphertext)
    }

    // --- Known-answer vectors (FIPS-197, SP 800-38A) ---

    #[test]
    fn fips197_block_through_ecb() {
        let cipher = aes("000102030405060708090a0b0c0d0e0f");
        let pt = hex::decode("00112233445566778899aabbccddeeff").unwrap();
        let out = modes::encrypt(CipherMode::Ecb, &cipher, None, &pt, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(hex::encode(&out.ciphertext), "69c4e0d86a7b0430d8cdb78070b4c55a");
        assert!(out.deltas.is_none());
    }

    #[test]
    fn sp800_38a_ecb() {
        assert_eq!(
            enc_hex(CipherMode::Ecb, None),
            "3ad77bb40d7a3660a89ecaf32466ef97f5d3d58503b9699de785895a96fdbaaf"
        );
    }

    #[test]
    fn sp800_38a_cbc() {
        assert_eq!(
            enc_hex(CipherMode::Cbc, Some(NIST_IV)),
            "7649abac8119b246cee98e9b12e9197d5086cb9b507219ee95db113a917678b2"
        );
    }

    #[test]
    fn sp800_38a_cfb128() {
        assert_eq!(
            enc_hex(CipherMode::Cfb, Some(NIST_IV)),
            "3b3fd92eb72dad20333449f8e83cfb4ac8a64537a0b3a93fcde3cdad9f1ce58b"
        );
    }

    #[test]
    fn sp800_38a_ofb() {
        assert_eq!(
            enc_hex(CipherMode::Ofb, Some(NIST_IV)),
            "3b3fd92eb72dad20333449f8e83cfb4a7789508d16918f03f53c52dac54ed825"
        );
    }

    #[test]
    fn sp800_38a_ctr() {
        assert_eq!(
            enc_hex(CipherMode::Ctr, Some(NIST_CTR_IV)),
            "874d6191b620e3261bef6864990db6ce9806f66b7970fdff8617187bb9fffdff"
        );
    }

    #[test]
    fn pcbc_first_block_matches_cbc_then_diverges() {
        let cbc = enc_hex(CipherMode::Cbc, Some(NIST_IV));
        let pcbc = enc_hex(CipherMode::Pcbc, Some(NIST_IV));
        assert_eq!(&cbc[..32], &pcbc[..32]);
        assert_ne!(&cbc[32..], &pcbc[32..]);
    }

    // --- Round trips ---

    fn round_trip_all(cipher: &dyn BlockCipher) {
        let bs = cipher.block_size();
        let iv: Vec<u8> = (0..bs as u8).collect();
        for mode in CipherMode::ALL {
            for blocks in 0..=3 {
                let data: Vec<u8> = (0..blocks * bs).map(|i| (i * 7 + 3) as u8).collect();
                let out = modes::encrypt(mode, cipher, Some(&iv[..]), &data, &mut StdRng::seed_from_u64(9)).unwrap();
                assert_eq!(out.ciphertext.len(), data.len(), "{mode:?}");
                assert_eq!(out.deltas.is_some(), mode == CipherMode::RandomDelta);

                let back = modes::decrypt(mode, cipher, Some(&iv[..]), &out.ciphertext, out.deltas.as_ref()).unwrap();
                assert_eq!(back, data, "{mode:?} blocks={blocks}");
            }
        }
    }

    #[test]
    fn all_modes_round_trip_des() {
        round_trip_all(&des());
    }

    #[test]
    fn all_modes_round_trip_aes() {
        round_trip_all(&aes(NIST_KEY));
    }

    #[test]
    fn deterministic_except_random_delta() {
        let cipher = des();
        let iv = [9u8; 8];
        let data = [0x42u8; 24];
        for mode in CipherMode::ALL {
            let a = modes::encrypt(mode, &cipher, Some(&iv[..]), &data, &mut StdRng::seed_from_u64(1)).unwrap();
            let b = modes::encrypt(mode, &cipher, Some(&iv[..]), &data, &mut StdRng::seed_from_u64(2)).unwrap();
            if mode == CipherMode::RandomDelta {
                assert_ne!(a.ciphertext, b.ciphertext);
            } else {
                assert_eq!(a.ciphertext, b.ciphertext, "{mode:?}");
            }
        }
    }

    #[test]
    fn caller_iv_is_not_mutated() {
        let cipher = des();
        let iv = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        let before = iv.clone();
        for mode in [CipherMode::Cbc, CipherMode::Pcbc, CipherMode::Cfb, CipherMode::Ofb, CipherMode::Ctr] {
            modes::encrypt(mode, &cipher, Some(&iv[..]), &[0u8; 32], &mut StdRng::seed_from_u64(0)).unwrap();
        }
        assert_eq!(iv, before);
    }

    // --- Chain state ---

    #[test]
    fn ctr_at_block_matches_whole_buffer() {
        let cipher = des();
        let iv = [0xFFu8; 8];
        let data: Vec<u8> = (0..40).collect();
        let whole = modes::encrypt(CipherMode::Ctr, &cipher, Some(&iv[..]), &data, &mut StdRng::seed_from_u64(0))
            .unwrap()
            .ciphertext;

        let mut tail = data[16..].to_vec();
        let mut state = ChainState::new(CipherMode::Ctr, Direction::Encrypt, 8, Some(&iv[..]))
            .unwrap()
            .at_block(2)
            .unwrap();
        state.process(&cipher, &mut tail, &[]).unwrap();
        assert_eq!(tail, whole[16..].to_vec());
        assert_eq!(state.block_index(), 5);
    }

    #[test]
    fn chained_modes_refuse_at_block() {
        let state = ChainState::new(CipherMode::Cbc, Direction::Encrypt, 8, Some(&[0u8; 8][..])).unwrap();
        assert_eq!(state.at_block(3).unwrap_err(), ModeError::NotSeekable(CipherMode::Cbc));
    }

    #[test]
    fn chunked_processing_equals_one_shot() {
        let cipher = des();
        let iv = [3u8; 8];
        let data: Vec<u8> = (0..64).map(|i| i as u8 ^ 0x5A).collect();
        for mode in [CipherMode::Cbc, CipherMode::Pcbc, CipherMode::Cfb, CipherMode::Ofb, CipherMode::Ctr] {
            let whole = modes::encrypt(mode, &cipher, Some(&iv[..]), &data, &mut StdRng::seed_from_u64(0))
                .unwrap()
                .ciphertext;

            let mut state = ChainState::new(mode, Direction::Encrypt, 8, Some(&iv[..])).unwrap();
            let mut chunked = Vec::new();
            for chunk in data.chunks(24) {
                let mut buf = chunk.to_vec();
                state.process(&cipher, &mut buf, &[]).unwrap();
                chunked.extend(buf);
            }
            assert_eq!(chunked, whole, "{mode:?}");
        }
    }

    // --- Failures ---

    #[test]
    fn misaligned_buffer_rejected() {
        let cipher = des();
        let err = modes::encrypt(CipherMode::Ecb, &cipher, None, &[0u8; 9], &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert_eq!(err, ModeError::NotAligned { len: 9, block_size: 8 });
        let err = modes::decrypt(CipherMode::RandomDelta, &cipher, None, &[0u8; 9],
            Some(&DeltaSequence::from_bytes(8, vec![0u8; 8]).unwrap())).unwrap_err();
        assert!(matches!(err, ModeError::NotAligned { .. } | ModeError::DeltaCount { .. }));
    }

    #[test]
    fn wrong_iv_length_rejected() {
        let cipher = des();
        for mode in [CipherMode::Cbc, CipherMode::Pcbc, CipherMode::Cfb, CipherMode::Ofb, CipherMode::Ctr] {
            let err = modes::encrypt(mode, &cipher, Some(&[0u8; 7][..]), &[0u8; 8], &mut StdRng::seed_from_u64(0))
                .unwrap_err();
            assert_eq!(err, ModeError::IvLength { expected: 8, actual: 7 }, "{mode:?}");
            let err = modes::decrypt(mode, &cipher, None, &[0u8; 8], None).unwrap_err();
            assert_eq!(err, ModeError::IvLength { expected: 8, actual: 0 }, "{mode:?}");
        }
    }

    #[test]
    fn ecb_and_random_delta_ignore_iv() {
        let cipher = des();
        assert!(modes::encrypt(CipherMode::Ecb, &cipher, Some(&[0u8; 3][..]), &[0u8; 8], &mut StdRng::seed_from_u64(0)).is_ok());
    }

    #[test]
    fn random_delta_needs_matching_deltas() {
        let cipher = des();
        let out = modes::encrypt(CipherMode::RandomDelta, &cipher, None, &[1u8; 16], &mut StdRng::seed_from_u64(5))
            .unwrap();
        assert_eq!(
            modes::decrypt(CipherMode::RandomDelta, &cipher, None, &out.ciphertext, None),
            Err(ModeError::MissingDeltas)
        );

        let short = DeltaSequence::from_bytes(8, vec![0u8; 8]).unwrap();
        assert_eq!(
            modes::decrypt(CipherMode::RandomDelta, &cipher, None, &out.ciphertext, Some(&short)),
            Err(ModeError::DeltaCount { expected: 2, actual: 1 })
        );
    }

    #[test]
    fn cipher_without_keys_surfaces_cipher_error() {
        let cipher = DesBlock::new();
        let err = modes::encrypt(CipherMode::Ecb, &cipher, None, &[0u8; 8], &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert_eq!(err, ModeError::Cipher(CipherError::KeysNotInstalled));
    }

    #[test]
    fn mode_ids_and_flags() {
        assert_eq!(CipherMode::verify(0x01), Ok(CipherMode::Cbc));
        assert_eq!(CipherMode::verify(0x06), Ok(CipherMode::RandomDelta));
        assert_eq!(CipherMode::verify(0x07), Err(ModeError::UnknownMode { raw: 0x07 }));

        let independent: Vec<_> = CipherMode::ALL.into_iter().filter(|m| m.is_independent()).collect();
        assert_eq!(independent, vec![CipherMode::Ecb, CipherMode::Ctr]);
        assert!(!CipherMode::Ecb.uses_iv());
        assert!(!CipherMode::RandomDelta.uses_iv());
        assert!(CipherMode::Pcbc.uses_iv());
    }

    #[test]
    fn adapter_reports_installed_keys() {
        let mut cipher = Aes128Block::new();
        assert!(!cipher.has_keys());
        cipher.set_round_keys(&RawKeySchedule.expand_key(&[0u8; 16]).unwrap()).unwrap();
        assert!(cipher.has_keys());
        assert_eq!(cipher.name(), "AES-128");
    }
}
