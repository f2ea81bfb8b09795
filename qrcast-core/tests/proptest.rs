//! Property-based tests using proptest

use bytes::Bytes;
use qrcast_core::{
    accuracy::compare,
    armor::{armor, unarmor},
    assembler::AssemblerState,
    config::DecodeMode,
    constants::{CODEC_CAP, FILLER_BYTE},
    decoder::{decode_armored, decode_frame_from_bytes},
    encoder::FrameBuilder,
    packer::{Chunks, FramePacker},
    planner::plan_chunk_size,
    SourceStream,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_round_trip_encode_decode(
        source_id in any::<u8>(),
        index in 1u32..100_000u32,
        payload in prop::collection::vec(any::<u8>(), 0..1024),
        start in any::<bool>(),
        end in any::<bool>(),
    ) {
        let payload_bytes = Bytes::from(payload);
        let mut builder = FrameBuilder::new(index)
            .source(source_id)
            .payload(payload_bytes.clone());
        if start {
            builder = builder.mark_first();
        }
        if end {
            builder = builder.mark_last();
        }

        let decoded = decode_armored(&builder.build_armored().unwrap()).unwrap();

        prop_assert_eq!(decoded.source_id(), source_id);
        prop_assert_eq!(decoded.chunk.index, index);
        prop_assert_eq!(decoded.chunk.start, start);
        prop_assert_eq!(decoded.chunk.end, end);
        prop_assert_eq!(decoded.chunk.payload, payload_bytes);
    }

    #[test]
    fn prop_decode_never_panics(
        data in prop::collection::vec(any::<u8>(), 0..4096)
    ) {
        let _ = decode_frame_from_bytes(&data);
        let _ = decode_armored(&data);
    }

    #[test]
    fn prop_single_bit_flip_is_rejected(
        payload in prop::collection::vec(any::<u8>(), 1..256),
        bit in any::<prop::sample::Index>(),
    ) {
        let encoded = FrameBuilder::new(1)
            .payload(Bytes::from(payload))
            .mark_first()
            .build()
            .unwrap();

        // Flip one bit anywhere after the begin marker
        let mut corrupted = encoded.to_vec();
        let position = 8 + bit.index((corrupted.len() - 1) * 8);
        corrupted[position / 8] ^= 1 << (position % 8);

        prop_assert!(decode_frame_from_bytes(&corrupted).is_err()
            || corrupted[1] != encoded[1]
            || corrupted[2] != encoded[2]);
    }

    #[test]
    fn prop_armor_round_trip(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        let armored = armor(&data);
        prop_assert!(armored.iter().all(|b| b.is_ascii_graphic()));
        let back = unarmor(&armored).unwrap();
        prop_assert_eq!(back.as_ref(), data.as_slice());
    }

    #[test]
    fn prop_chunks_concatenate_to_source(
        data in prop::collection::vec(any::<u8>(), 0..4096),
        chunk_size in 1usize..600,
    ) {
        let chunks: Vec<_> = Chunks::new(Bytes::from(data.clone()), chunk_size).collect();

        let joined: Vec<u8> = chunks.iter().flat_map(|c| c.payload.iter().copied()).collect();
        prop_assert_eq!(joined, data.clone());
        prop_assert_eq!(chunks.len(), data.len().div_ceil(chunk_size));

        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.index as usize, i + 1);
            prop_assert_eq!(chunk.start, i == 0);
            prop_assert_eq!(chunk.end, i + 1 == chunks.len());
            prop_assert!(chunk.payload.len() <= chunk_size);
        }
    }

    #[test]
    fn prop_plan_respects_ceilings(
        total in 0usize..10_000_000,
        budget in 0u64..100_000,
        mtu in 0usize..4096,
    ) {
        let plan = plan_chunk_size(total, budget, mtu, CODEC_CAP);
        prop_assert!(plan.chunk_size >= 1);
        prop_assert!(plan.chunk_size <= CODEC_CAP);
        if mtu > 9 {
            prop_assert!(plan.chunk_size <= mtu - 9);
        }
    }

    #[test]
    fn prop_clean_pipeline_reconstructs_every_source(
        lens in prop::collection::vec(0usize..300, 1..5),
        chunk_size in 1usize..64,
    ) {
        let sources: Vec<SourceStream> = lens
            .iter()
            .enumerate()
            .map(|(id, &len)| SourceStream::new(id as u8, vec![id as u8 ^ 0x5A; len]))
            .collect();

        let mut state = AssemblerState::new(DecodeMode::Multiplexed);
        for frame in FramePacker::new(sources.clone(), chunk_size).unwrap() {
            state.push_symbol(&frame.unwrap().wire);
        }

        let streams = state.into_streams();
        let expected: Vec<_> = sources.iter().filter(|s| !s.data.is_empty()).collect();
        prop_assert_eq!(streams.len(), expected.len());
        for (stream, source) in streams.iter().zip(expected) {
            prop_assert_eq!(stream.source_id, source.source_id);
            prop_assert_eq!(&stream.data, &source.data);
            prop_assert!(stream.finished);
        }
    }

    #[test]
    fn prop_duplicates_are_idempotent(
        data in prop::collection::vec(any::<u8>(), 1..512),
        chunk_size in 1usize..32,
        repeats in prop::collection::vec(1usize..4, 1..64),
    ) {
        let data = Bytes::from(data);
        let frames: Vec<_> = FramePacker::new(vec![SourceStream::new(0, data.clone())], chunk_size)
            .unwrap()
            .map(|f| f.unwrap())
            .collect();

        let mut state = AssemblerState::new(DecodeMode::Multiplexed);
        for (i, frame) in frames.iter().enumerate() {
            for _ in 0..repeats[i % repeats.len()] {
                state.push_symbol(&frame.wire);
            }
        }

        let streams = state.into_streams();
        prop_assert_eq!(&streams[0].data, &data);
    }

    #[test]
    fn prop_gap_fills_previous_length(
        chunk_count in 3usize..40,
        chunk_size in 1usize..32,
        drop_start in 1usize..1000,
        drop_len in 1usize..1000,
    ) {
        let data: Vec<u8> = (0..chunk_count * chunk_size).map(|i| b'0' + (i % 10) as u8).collect();
        let frames: Vec<_> = FramePacker::new(vec![SourceStream::new(0, data.clone())], chunk_size)
            .unwrap()
            .map(|f| f.unwrap())
            .collect();

        // Keep the first and last frame, drop a run in between
        let first = 1 + drop_start % (chunk_count - 2);
        let k = 1 + drop_len % (chunk_count - 1 - first);

        let mut state = AssemblerState::new(DecodeMode::Multiplexed);
        for (i, frame) in frames.iter().enumerate() {
            if (first..first + k).contains(&i) {
                continue;
            }
            state.push_symbol(&frame.wire);
        }

        let stats = state.stats().clone();
        prop_assert_eq!(stats.filler_chunks, k);
        prop_assert_eq!(stats.filler_bytes, k * chunk_size);

        let out = state.into_streams().remove(0).data;
        prop_assert_eq!(out.len(), data.len());
        let gap = first * chunk_size..(first + k) * chunk_size;
        prop_assert!(out[gap.clone()].iter().all(|&b| b == FILLER_BYTE));
        prop_assert_eq!(&out[..gap.start], &data[..gap.start]);
        prop_assert_eq!(&out[gap.end..], &data[gap.end..]);
    }

    #[test]
    fn prop_accuracy_is_one_only_when_identical(
        a in prop::collection::vec(any::<u8>(), 0..256),
        b in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let score = compare(&a, &b).summary.score;
        prop_assert!((0.0..=1.0).contains(&score));
        prop_assert_eq!(score == 1.0, a == b);
        prop_assert_eq!(compare(&a, &a).summary.score, 1.0);
    }
}
