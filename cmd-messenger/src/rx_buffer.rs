/// Ring buffer holding received bytes that have not been deframed yet.
pub struct RxBuffer<const N: usize> {
    buf: [u8; N],
    start_cursor: usize,
    size: usize,
}

impl<const N: usize> Default for RxBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RxBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            start_cursor: 0,
            size: 0,
        }
    }

    /// The contiguous free region after the populated one, for a port to
    /// read into directly. Follow with [`commit`](Self::commit).
    pub fn writable(&mut self) -> &mut [u8] {
        let end = self.end_cursor();
        let free = N - self.len();

        // the free region may wrap; only hand out the part before the wrap
        let contiguous = free.min(N - end);

        &mut self.buf[end..end + contiguous]
    }

    /// Mark `count` bytes of the [`writable`](Self::writable) region as
    /// populated.
    pub fn commit(&mut self, count: usize) {
        self.size += count.min(N - self.len());
    }

    /// Wrap a provided cursor to adhere
    /// to the buffer size.
    #[inline]
    fn wrap(cursor: usize) -> usize {
        cursor % N
    }

    /// Get the position of the end of
    /// the populated region of the buffer.
    #[inline]
    fn end_cursor(&self) -> usize {
        Self::wrap(self.start_cursor + self.len())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn iter(&self) -> RxBufferIter<'_, N> {
        RxBufferIter::new(self)
    }

    /// Evict all bytes that have been visited by
    /// the memented iterator.
    pub fn flush(&mut self, IterMemento(count): IterMemento) {
        let count = count.min(self.size);

        self.start_cursor = Self::wrap(self.start_cursor + count);
        self.size -= count;

        // an empty buffer can hand out its whole capacity as one region
        if self.size == 0 {
            self.start_cursor = 0;
        }
    }
}

/// An opaque type that may be created
/// upon the death of a `RxBufferIter`
/// in order to utilize the final state.
pub struct IterMemento(usize);

/// The iterator type for `RxBuffer`.
pub struct RxBufferIter<'a, const N: usize> {
    parent: &'a RxBuffer<N>,
    count: usize,
}

impl<'a, const N: usize> RxBufferIter<'a, N> {
    fn new(parent: &'a RxBuffer<N>) -> Self {
        Self { parent, count: 0 }
    }

    /// Capture the end state of this iterator
    /// as a memento that may be used by the
    /// `RxBuffer` to evict visited bytes.
    #[inline]
    pub fn capture(self) -> IterMemento {
        IterMemento(self.count)
    }
}

impl<const N: usize> Iterator for RxBufferIter<'_, N> {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        if self.count >= self.parent.len() {
            return None;
        }

        let byte = self.parent.buf[RxBuffer::<N>::wrap(self.parent.start_cursor + self.count)];
        self.count += 1;

        Some(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::RxBuffer;

    /// Copy as much of `src` as fits, the way a port read would.
    fn fill<const N: usize>(rx_buf: &mut RxBuffer<N>, mut src: &[u8]) -> usize {
        let mut stored = 0;

        while !src.is_empty() {
            let region = rx_buf.writable();
            let count = region.len().min(src.len());

            if count == 0 {
                break;
            }

            region[..count].copy_from_slice(&src[..count]);
            rx_buf.commit(count);

            src = &src[count..];
            stored += count;
        }

        stored
    }

    mod ingestion {
        use super::*;

        #[test]
        fn basic() {
            let mut rx_buf = RxBuffer::<10>::new();

            let test_buf = [0xde, 0xad, 0xbe, 0xef];

            assert_eq!(test_buf.len(), fill(&mut rx_buf, &test_buf));
            assert_eq!(rx_buf.len(), test_buf.len());

            let mut buf_iter = rx_buf.iter();

            test_buf
                .iter()
                .zip(&mut buf_iter)
                .for_each(|(&left, right)| assert_eq!(left, right));

            assert!(buf_iter.next().is_none());
        }

        #[test]
        fn full() {
            let mut rx_buf = RxBuffer::<8>::new();

            let test_buf = [0xde, 0xad, 0xbe, 0xef, 0x15, 0xba, 0xdb, 0xad, 0xf0, 0x0d];

            assert_eq!(8, fill(&mut rx_buf, &test_buf));
            assert_eq!(8, rx_buf.len());
            assert!(rx_buf.writable().is_empty());

            // committing past the free space is clamped
            rx_buf.commit(4);
            assert_eq!(8, rx_buf.len());
            assert!(rx_buf.iter().eq(test_buf[..8].iter().copied()));
        }

        #[test]
        fn writable_region() {
            let mut rx_buf = RxBuffer::<8>::new();

            let region = rx_buf.writable();
            assert_eq!(8, region.len());
            region[..3].copy_from_slice(b"1,2");
            rx_buf.commit(3);

            assert_eq!(3, rx_buf.len());
            assert!(rx_buf.iter().eq(b"1,2".iter().copied()));
            assert_eq!(5, rx_buf.writable().len());
        }
    }

    mod iter {
        use super::*;

        #[test]
        fn partial_flush_keeps_the_rest() {
            let mut rx_buf = RxBuffer::<10>::new();

            fill(&mut rx_buf, b"0;1;");

            let mut buf_iter = rx_buf.iter();
            assert_eq!(Some(b'0'), buf_iter.next());
            assert_eq!(Some(b';'), buf_iter.next());

            let memento = buf_iter.capture();
            rx_buf.flush(memento);

            assert_eq!(2, rx_buf.len());
            assert!(rx_buf.iter().eq(b"1;".iter().copied()));
        }

        #[test]
        fn wraps_around() {
            let mut rx_buf = RxBuffer::<6>::new();

            fill(&mut rx_buf, b"abcd");

            let mut buf_iter = rx_buf.iter();
            buf_iter.by_ref().take(3).for_each(drop);
            let memento = buf_iter.capture();
            rx_buf.flush(memento);

            // "d" sits at offset 3; the free region runs to the end first
            assert_eq!(2, rx_buf.writable().len());

            assert_eq!(4, fill(&mut rx_buf, b"efgh"));

            assert_eq!(5, rx_buf.len());
            assert!(rx_buf.iter().eq(b"defgh".iter().copied()));
        }

        #[test]
        fn cycle() {
            let mut rx_buf = RxBuffer::<10>::new();

            let test_buf = [0xde, 0xad, 0xbe, 0xef];

            for _ in 0..10 {
                fill(&mut rx_buf, &test_buf);

                assert_eq!(rx_buf.len(), test_buf.len());

                let mut buf_iter = rx_buf.iter();

                test_buf
                    .iter()
                    .zip(&mut buf_iter)
                    .for_each(|(&left, right)| assert_eq!(left, right));

                assert!(buf_iter.next().is_none());

                let memento = buf_iter.capture();

                rx_buf.flush(memento);

                assert_eq!(0, rx_buf.len());
            }
        }
    }
}
