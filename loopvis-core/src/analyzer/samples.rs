//! Sliding Sample Window
pub type Sample = f32;

/// Fixed length window over the most recent mono samples
///
/// Storage is twice the window length.  New samples are written into the upper half and
/// once that is full it is copied down in one go, so the latest `size` samples are
/// always one contiguous slice without shifting on every push.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    buf: Vec<Sample>,
    size: usize,
    cursor: usize,
}

impl SampleWindow {
    /// Create a window of `size` samples, initially silent
    pub fn new(size: usize) -> SampleWindow {
        assert!(size > 0, "Sample window can't be empty!");

        SampleWindow {
            buf: vec![0.0; size * 2],
            size,
            cursor: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn push(&mut self, sample: Sample) {
        self.buf[self.size + self.cursor] = sample;
        self.cursor += 1;

        if self.cursor >= self.size {
            self.buf.copy_within(self.size.., 0);
            self.cursor = 0;
        }
    }

    pub fn extend<I: IntoIterator<Item = Sample>>(&mut self, samples: I) {
        for s in samples {
            self.push(s);
        }
    }

    /// The latest `len()` samples, oldest first
    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.buf[self.cursor..self.cursor + self.size]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initially_silent() {
        let window = SampleWindow::new(16);

        assert_eq!(window.len(), 16);
        assert_eq!(window.samples(), &[0.0; 16][..]);
    }

    #[test]
    fn test_partial() {
        let mut window = SampleWindow::new(8);

        window.extend((1..4).map(|i| i as Sample));

        assert_eq!(window.samples(), &[0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_overflow() {
        let mut window = SampleWindow::new(16);

        window.extend((100..120).map(|i| i as Sample));
        window.extend((0..32).map(|i| i as Sample));

        assert_eq!(
            window.samples(),
            &(16..32).map(|i| i as Sample).collect::<Vec<_>>()[..],
        );
    }

    #[test]
    fn test_contiguous_across_compaction() {
        let mut window = SampleWindow::new(5);

        for i in 0..23 {
            window.push(i as Sample);

            let expected = (0..5)
                .map(|k| i as isize - 4 + k)
                .map(|v| if v < 0 { 0.0 } else { v as Sample })
                .collect::<Vec<_>>();
            assert_eq!(window.samples(), &expected[..], "after pushing {}", i);
        }
    }

    #[test]
    #[should_panic]
    fn test_empty() {
        SampleWindow::new(0);
    }
}
