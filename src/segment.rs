use std::ops::Range;

/// A contiguous byte range of the input handed to exactly one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub id: u64,
    pub start: u64,
    pub length: u64,
}

impl Segment {
    pub fn end(&self) -> u64 {
        self.start + self.length
    }

    pub fn range(&self) -> Range<u64> {
        self.start..self.end()
    }
}

/// Lazily plans segments over `[0, total_len)` in ascending start order.
#[derive(Debug, Clone)]
pub struct SegmentIter {
    total_len: u64,
    segment_size: u64,
    next_start: u64,
    next_id: u64,
}

impl SegmentIter {
    pub fn new(total_len: u64, segment_size: u64) -> Self {
        Self {
            total_len,
            segment_size,
            next_start: 0,
            next_id: 0,
        }
    }
}

impl Iterator for SegmentIter {
    type Item = Segment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.segment_size == 0 || self.next_start >= self.total_len {
            return None;
        }
        let length = (self.total_len - self.next_start).min(self.segment_size);
        let segment = Segment {
            id: self.next_id,
            start: self.next_start,
            length,
        };
        self.next_start += length;
        self.next_id += 1;
        Some(segment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total_len.saturating_sub(self.next_start);
        let n = segment_count(remaining, self.segment_size) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for SegmentIter {}

pub fn plan_segments(total_len: u64, segment_size: u64) -> Vec<Segment> {
    SegmentIter::new(total_len, segment_size).collect()
}

pub fn segment_count(total_len: u64, segment_size: u64) -> u64 {
    if segment_size == 0 {
        return 0;
    }
    total_len.div_ceil(segment_size)
}
