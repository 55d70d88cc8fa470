//! Shares and the sink contract used to stream them in and out of a code.

use serde::{Deserialize, Serialize};

/// One row of an encoded block.
///
/// `number` is the share's position in the code: `0..required` are the
/// message rows, `required..total` are parity.
///
/// # Examples
///
/// ```rust
/// use shardfec::share::Share;
///
/// let share = Share::new(3, vec![0x15, 0x2a]);
/// assert_eq!(share.number, 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Share {
    /// Position of the share in the code, `0..total`.
    pub number: u16,
    /// The share's bytes, one per column of the block. Serialized as a
    /// byte string.
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
}

impl Share {
    /// Creates a share from its number and bytes.
    pub fn new(number: u16, data: Vec<u8>) -> Self {
        Share { number, data }
    }
}

/// A consumer of `(number, total, bytes)` events.
///
/// Encoders and decoders call [`ShareSink::put`] zero or more times, in
/// increasing `number` order within one batch. The bytes are borrowed for
/// the duration of the call only.
///
/// Any `FnMut(usize, usize, &[u8])` is a sink:
///
/// ```rust
/// use shardfec::code::FecCode;
///
/// let code = FecCode::new(2, 4).unwrap();
/// let mut sizes = Vec::new();
/// code.encode(b"abcd", &mut |_number: usize, _total: usize, data: &[u8]| {
///     sizes.push(data.len());
/// })
/// .unwrap();
/// assert_eq!(sizes, vec![2, 2, 2, 2]);
/// ```
pub trait ShareSink {
    fn put(&mut self, number: usize, total: usize, data: &[u8]);
}

impl<F> ShareSink for F
where
    F: FnMut(usize, usize, &[u8]),
{
    fn put(&mut self, number: usize, total: usize, data: &[u8]) {
        self(number, total, data)
    }
}

/// A sink that keeps every share it is given.
///
/// Repeated puts for the same number append, so a collector can sit behind
/// several batches of the same block.
#[derive(Debug, Clone, Default)]
pub struct ShareCollector {
    shares: Vec<Share>,
}

impl ShareCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares collected so far, ordered by number. Numbers that were never
    /// put are present with empty data.
    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    pub fn into_shares(self) -> Vec<Share> {
        self.shares
    }

    /// Concatenation of every collected share's data, in number order.
    pub fn concat(&self) -> Vec<u8> {
        self.shares.iter().flat_map(|s| s.data.iter().copied()).collect()
    }
}

impl ShareSink for ShareCollector {
    fn put(&mut self, number: usize, _total: usize, data: &[u8]) {
        if self.shares.len() <= number {
            let start = self.shares.len();
            self.shares.extend((start..=number).map(|n| Share::new(n as u16, Vec::new())));
        }
        self.shares[number].data.extend_from_slice(data);
    }
}
