use std::cmp;
use std::collections::VecDeque;

/// A BufferQueue manages a sequence of buffers.
/// Keeping the buffers as is avoids copies at the
/// expense of complexity when consuming the data.
///
/// The bridge uses one per input direction: chunks are only ever removed
/// whole, and a chunk the engine refused goes back to the front unchanged.
#[derive(Debug, Default)]
pub(crate) struct BufferQueue {
    // ring buffer
    buffers: VecDeque<Vec<u8>>,
    limit: Option<usize>,
}

// the limit and byte-level reads only serve the rustls engine
#[cfg_attr(not(feature = "rustls"), allow(dead_code))]
impl BufferQueue {
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Self {
            buffers: VecDeque::new(),
            limit,
        }
    }

    /// Sets the upper limit on how many bytes this
    /// object can store before `is_full` reports true.
    ///
    /// Setting a lower limit than the currently stored
    /// data is not an error.
    ///
    /// A [`None`] limit is interpreted as no limit.
    pub(crate) fn set_limit(&mut self, new_limit: Option<usize>) {
        self.limit = new_limit;
    }

    /// If we're empty
    pub(crate) fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// How many bytes we're storing
    pub(crate) fn len(&self) -> usize {
        let mut len = 0;
        for buf in &self.buffers {
            len += buf.len();
        }
        len
    }

    /// True once we hold at least `limit` bytes.
    ///
    /// A [`None`] limit is never full.
    pub(crate) fn is_full(&self) -> bool {
        self.limit
            .map(|limit| self.len() >= limit)
            .unwrap_or_default()
    }

    /// Place the buffer in line if it is not empty.
    pub(crate) fn enqueue(&mut self, buf: Vec<u8>) -> usize {
        let len = buf.len();

        if !buf.is_empty() {
            self.buffers.push_back(buf);
        }

        len
    }

    /// Take the next buffer in line, if any. Empty buffers are omitted.
    pub(crate) fn dequeue(&mut self) -> Option<Vec<u8>> {
        self.buffers.pop_front()
    }

    /// Put back a buffer previously taken with `dequeue`, so it is
    /// next in line again.
    pub(crate) fn requeue(&mut self, buf: Vec<u8>) {
        if !buf.is_empty() {
            self.buffers.push_front(buf);
        }
    }

    /// The queued buffers, front first.
    pub(crate) fn chunks(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.buffers.iter().map(Vec::as_slice)
    }

    /// Drop everything.
    pub(crate) fn clear(&mut self) {
        self.buffers.clear();
    }

    /// Read data out of this object, writing it into `buf`
    /// and returning how many bytes were written there.
    pub(crate) fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut offs = 0;

        while offs < buf.len() && !self.is_empty() {
            let used = cmp::min(self.buffers[0].len(), buf.len() - offs);
            buf[offs..offs + used].copy_from_slice(&self.buffers[0][..used]);

            self.consume(used);
            offs += used;
        }

        offs
    }

    fn consume(&mut self, mut used: usize) {
        while let Some(mut buf) = self.buffers.pop_front() {
            if used < buf.len() {
                buf.drain(..used);
                self.buffers.push_front(buf);
                break;
            } else {
                used -= buf.len();
            }
        }
    }
}
