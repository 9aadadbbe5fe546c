//! Test helpers for functions dealing with on-wire protocols
// (c) 2026 The rfetch developers

use crate::protocol::common::{ReceivingStream, SendReceivePair, SendingStream};

use tokio::io::{BufReader, ReadHalf, SimplexStream, WriteHalf, simplex};

pub(crate) type TestStreamPair =
    SendReceivePair<WriteHalf<SimplexStream>, BufReader<ReadHalf<SimplexStream>>>;

impl SendingStream for WriteHalf<SimplexStream> {}
impl ReceivingStream for BufReader<ReadHalf<SimplexStream>> {}

const STREAM_BUFFER_SIZE: usize = 4_096;

/// In order to test a streaming function we need a bi-directional stream.
/// A pipe isn't useful by itself, as it returns
/// a writer which the corresponding reader accesses.
/// We need two such pipes; each side of the streaming function under test takes one
/// such reader and the _opposite_ writer.
pub(crate) fn test_plumbing() -> (TestStreamPair, TestStreamPair) {
    let (r1, w1) = simplex(STREAM_BUFFER_SIZE);
    let (r2, w2) = simplex(STREAM_BUFFER_SIZE);
    let a = (w1, BufReader::new(r2)).into();
    let b = (w2, BufReader::new(r1)).into();
    (a, b)
}
