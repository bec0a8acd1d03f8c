//! Cross-backend and cross-call consistency checks for [`StreamCipher`].

use randquik_core::{BitGenerator, IV_BYTES, KEY_BYTES, Rounds, StreamCipher};

fn key(fill: u8) -> [u8; KEY_BYTES] {
    [fill; KEY_BYTES]
}

fn iv(fill: u8) -> [u8; IV_BYTES] {
    [fill; IV_BYTES]
}

#[test]
fn arbitrary_chunking_reconstructs_one_contiguous_stream() {
    const TOTAL: usize = 4096;
    let mut whole = StreamCipher::new(&key(0x42), &iv(0x24), Rounds::R20);
    let mut expected = vec![0u8; TOTAL];
    whole.update(&mut expected);

    let mut chunked = StreamCipher::new(&key(0x42), &iv(0x24), Rounds::R20);
    let mut actual = vec![0u8; TOTAL];
    let mut pos = 0;
    let mut step = 1usize;
    while pos < TOTAL {
        let take = step.min(TOTAL - pos);
        chunked.update(&mut actual[pos..pos + take]);
        pos += take;
        step = (step * 7 + 3) % 251 + 1;
    }
    assert_eq!(actual, expected);
}

#[test]
fn seeking_is_equivalent_to_skipping_blocks() {
    let mut seeker = StreamCipher::new(&key(1), &iv(2), Rounds::R20);
    seeker.seek_blocks(100);
    let mut from_seek = [0u8; 128];
    seeker.update(&mut from_seek);

    let mut skipper = StreamCipher::new(&key(1), &iv(2), Rounds::R20);
    let mut discard = vec![0u8; 100 * 64];
    skipper.update(&mut discard);
    let mut from_skip = [0u8; 128];
    skipper.update(&mut from_skip);

    assert_eq!(from_seek, from_skip);
}

#[test]
fn negative_seek_then_forward_seek_cancels_out() {
    let mut a = StreamCipher::new(&key(5), &iv(6), Rounds::R12);
    a.seek_blocks(50);
    a.seek_blocks(-20);
    a.seek_blocks(-30);
    let mut out_a = [0u8; 64];
    a.update(&mut out_a);

    let mut b = StreamCipher::new(&key(5), &iv(6), Rounds::R12);
    let mut out_b = [0u8; 64];
    b.update(&mut out_b);

    assert_eq!(out_a, out_b);
}

/// Scaled-down version of the parallel-equivalence property: a sequential
/// stream split into N equal partitions, each regenerated by seeking a
/// fresh cipher to its partition boundary, must reassemble byte-for-byte.
#[test]
fn partitioned_regeneration_matches_sequential_stream() {
    const WORKERS: usize = 4;
    const BLOCKS_PER_PARTITION: usize = 256; // 16 KiB per worker, 64 KiB total
    const PARTITION_BYTES: usize = BLOCKS_PER_PARTITION * 64;

    let mut sequential = StreamCipher::new(&key(9), &iv(3), Rounds::R20);
    let mut expected = vec![0u8; WORKERS * PARTITION_BYTES];
    sequential.update(&mut expected);

    let mut actual = vec![0u8; WORKERS * PARTITION_BYTES];
    for w in 0..WORKERS {
        let mut worker = StreamCipher::new(&key(9), &iv(3), Rounds::R20);
        worker.seek_blocks((w * BLOCKS_PER_PARTITION) as i64);
        let start = w * PARTITION_BYTES;
        worker.update(&mut actual[start..start + PARTITION_BYTES]);
    }

    assert_eq!(actual, expected);
}

#[test]
fn bit_generator_draws_are_independent_of_chunking_in_stream_cipher() {
    let mut gen = BitGenerator::new(&key(7), &iv(8), Rounds::R20);
    let a = gen.next_uint32();
    let b = gen.next_uint64();
    let c = gen.next_double();
    assert!((0.0..1.0).contains(&c));
    assert_ne!(a as u64, b);
}
