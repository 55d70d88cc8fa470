use rand::Rng;

use crate::code::FecCode;
use crate::share::{Share, ShareCollector};

/// `len` bytes counting up from 1.
pub fn some_message(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i + 1) as u8).collect()
}

/// All `total` shares of `some_message(required * block)`.
pub fn some_shares(code: &FecCode, block: usize) -> Vec<Share> {
    let data = some_message(code.required() * block);
    let mut collector = ShareCollector::new();
    code.encode(&data, &mut collector).unwrap();
    collector.into_shares()
}

pub fn copy_shares(shares: &[Share]) -> Vec<Share> {
    shares.to_vec()
}

/// Replaces `share.data[column]` with a different random byte.
pub fn mutate_share<R: Rng>(rng: &mut R, column: usize, share: &mut Share) {
    let orig = share.data[column];
    let mut next: u8 = rng.gen();
    while next == orig {
        next = rng.gen();
    }
    share.data[column] = next;
}

/// Fisher-Yates shuffle.
pub fn permute_shares<R: Rng>(rng: &mut R, shares: &mut [Share]) {
    for i in 0..shares.len() {
        let with = rng.gen_range(i..shares.len());
        shares.swap(i, with);
    }
}
