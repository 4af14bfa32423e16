use std::sync::Arc;
use std::sync::atomic::{AtomicI16, AtomicU32, AtomicUsize, Ordering, fence};

use tracing::debug;

/// Lock-free single-producer/single-consumer ring of interleaved stereo
/// samples.
///
/// The frame pump pushes one block per tick; the host audio context pulls
/// through an [`AudioConsumer`]. Cursors grow monotonically and are masked
/// into the backing storage, so capacity is always a power of two.
///
/// Overflow is lossy: the producer never waits, and a consumer that finds
/// more than `capacity` unread samples skips to the newest `capacity` of
/// them. Underrun is padded with silence.
///
/// `reset` is a seqlock write: the sequence is odd while it runs and moves
/// on by two per reset. A pull that overlaps one in any way returns
/// silence and leaves the read cursor for the next pull to rewind.
pub struct AudioRing {
    slots: Box<[AtomicI16]>,
    mask: usize,
    write_pos: AtomicUsize,
    read_pos: AtomicUsize,
    sequence: AtomicU32,
    // Sequence the consumer last synchronized its read cursor to.
    // Written only by the consumer.
    consumer_sequence: AtomicU32,
}

/// Consumer-side snapshot taken at the start of a pull.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ReadView {
    sequence: u32,
    read: usize,
    unread: usize,
}

impl AudioRing {
    /// `capacity` is rounded up to the next power of two.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_power_of_two();
        let slots = (0..capacity).map(|_| AtomicI16::new(0)).collect();
        Self {
            slots,
            mask: capacity - 1,
            write_pos: AtomicUsize::new(0),
            read_pos: AtomicUsize::new(0),
            sequence: AtomicU32::new(0),
            consumer_sequence: AtomicU32::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Number of completed resets.
    pub fn generation(&self) -> u32 {
        self.sequence.load(Ordering::Acquire) / 2
    }

    /// Samples pushed but not yet pulled, clamped to capacity.
    pub fn unread(&self) -> usize {
        let sequence = self.sequence.load(Ordering::Acquire);
        if sequence % 2 == 1 {
            return 0;
        }
        let write = self.write_pos.load(Ordering::Acquire);
        // A consumer that has not seen the latest reset rewinds to zero.
        let read = if self.consumer_sequence.load(Ordering::Acquire) == sequence {
            self.read_pos.load(Ordering::Acquire)
        } else {
            0
        };
        let unread = write.wrapping_sub(read);
        if unread > isize::MAX as usize {
            0
        } else {
            unread.min(self.capacity())
        }
    }

    /// Producer side. Writes `samples` at the write cursor, wrapping at the
    /// capacity boundary. A block larger than the ring keeps only its newest
    /// `capacity` samples.
    pub fn push(&self, samples: &[i16]) {
        let capacity = self.capacity();
        let samples = if samples.len() > capacity {
            debug!(
                len = samples.len(),
                capacity, "audio block larger than ring, keeping newest samples"
            );
            &samples[samples.len() - capacity..]
        } else {
            samples
        };

        // Only the producer (and reset, which runs on the producer's
        // context) moves the write cursor.
        let write = self.write_pos.load(Ordering::Relaxed);
        for (i, &sample) in samples.iter().enumerate() {
            self.slots[write.wrapping_add(i) & self.mask].store(sample, Ordering::Relaxed);
        }
        self.write_pos
            .store(write.wrapping_add(samples.len()), Ordering::Release);
    }

    /// Consumer side. Fills `out` from the read cursor and returns how many
    /// samples were real; the rest of `out` is silence.
    pub fn pull(&self, out: &mut [i16]) -> usize {
        match self.begin_pull() {
            Some(view) => self.finish_pull(view, out),
            None => {
                out.fill(0);
                0
            }
        }
    }

    /// Snapshot the cursors. `None` while a reset is in progress.
    pub(crate) fn begin_pull(&self) -> Option<ReadView> {
        let sequence = self.sequence.load(Ordering::Acquire);
        if sequence % 2 == 1 {
            return None;
        }
        if self.consumer_sequence.load(Ordering::Relaxed) != sequence {
            self.read_pos.store(0, Ordering::Release);
            self.consumer_sequence.store(sequence, Ordering::Release);
        }

        let write = self.write_pos.load(Ordering::Acquire);
        let mut read = self.read_pos.load(Ordering::Relaxed);
        let capacity = self.capacity();
        let unread = write.wrapping_sub(read);
        let unread = if unread > isize::MAX as usize {
            read = write;
            0
        } else if unread > capacity {
            read = write.wrapping_sub(capacity);
            capacity
        } else {
            unread
        };
        Some(ReadView {
            sequence,
            read,
            unread,
        })
    }

    /// Copy out of the snapshot and commit the read cursor, unless a reset
    /// started since `begin_pull`.
    pub(crate) fn finish_pull(&self, view: ReadView, out: &mut [i16]) -> usize {
        let count = view.unread.min(out.len());
        for (i, sample) in out[..count].iter_mut().enumerate() {
            *sample = self.slots[view.read.wrapping_add(i) & self.mask].load(Ordering::Relaxed);
        }
        out[count..].fill(0);

        fence(Ordering::Acquire);
        if self.sequence.load(Ordering::Relaxed) != view.sequence {
            out.fill(0);
            return 0;
        }
        self.read_pos
            .store(view.read.wrapping_add(count), Ordering::Release);
        count
    }

    /// Zero both cursors and the backing storage.
    ///
    /// Runs on the producer's context. A pull racing the reset returns
    /// silence.
    pub fn reset(&self) {
        self.sequence.fetch_add(1, Ordering::AcqRel);
        fence(Ordering::Release);
        self.write_pos.store(0, Ordering::Relaxed);
        self.read_pos.store(0, Ordering::Relaxed);
        for slot in self.slots.iter() {
            slot.store(0, Ordering::Relaxed);
        }
        self.sequence.fetch_add(1, Ordering::Release);
    }

    /// Pull handle for the host audio context.
    pub fn consumer(self: &Arc<Self>) -> AudioConsumer {
        AudioConsumer {
            ring: Arc::clone(self),
        }
    }
}

/// Consumer end of an [`AudioRing`], handed to the audio host.
///
/// The host asks it to produce samples into a buffer it owns; there is no
/// callback registration and no global state, so any context (a device
/// thread or a test) can drive it.
pub struct AudioConsumer {
    ring: Arc<AudioRing>,
}

impl AudioConsumer {
    /// Fill `out` with the next samples, padding with silence on underrun.
    /// Returns the number of real samples written.
    pub fn fill(&mut self, out: &mut [i16]) -> usize {
        self.ring.pull(out)
    }

    pub fn ring(&self) -> &Arc<AudioRing> {
        &self.ring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        assert_eq!(AudioRing::new(1000).capacity(), 1024);
        assert_eq!(AudioRing::new(4096).capacity(), 4096);
        assert_eq!(AudioRing::new(0).capacity(), 2);
    }

    #[test]
    fn pull_returns_pushed_samples_in_order() {
        let ring = AudioRing::new(16);
        ring.push(&[1, 2, 3, 4]);
        let mut out = [0i16; 4];
        assert_eq!(ring.pull(&mut out), 4);
        assert_eq!(out, [1, 2, 3, 4]);
        assert_eq!(ring.unread(), 0);
    }

    #[test]
    fn underrun_pads_with_silence() {
        let ring = AudioRing::new(16);
        ring.push(&[7, -7]);
        let mut out = [99i16; 6];
        assert_eq!(ring.pull(&mut out), 2);
        assert_eq!(out, [7, -7, 0, 0, 0, 0]);
    }

    #[test]
    fn empty_ring_emits_silence() {
        let ring = AudioRing::new(8);
        let mut out = [5i16; 8];
        assert_eq!(ring.pull(&mut out), 0);
        assert!(out.iter().all(|&s| s == 0));
    }

    #[test]
    fn push_wraps_at_capacity_boundary() {
        let ring = AudioRing::new(8);
        ring.push(&[1, 2, 3, 4, 5, 6]);
        let mut out = [0i16; 6];
        ring.pull(&mut out);

        ring.push(&[10, 11, 12, 13]); // slots 6, 7, 0, 1
        let mut out = [0i16; 4];
        assert_eq!(ring.pull(&mut out), 4);
        assert_eq!(out, [10, 11, 12, 13]);
    }

    #[test]
    fn overflow_drops_oldest_samples() {
        let ring = AudioRing::new(4);
        ring.push(&[1, 2, 3, 4]);
        ring.push(&[5, 6]);
        assert_eq!(ring.unread(), 4);

        let mut out = [0i16; 4];
        assert_eq!(ring.pull(&mut out), 4);
        assert_eq!(out, [3, 4, 5, 6]);
    }

    #[test]
    fn oversized_block_keeps_newest() {
        let ring = AudioRing::new(4);
        ring.push(&[1, 2, 3, 4, 5, 6]);
        let mut out = [0i16; 4];
        ring.pull(&mut out);
        assert_eq!(out, [3, 4, 5, 6]);
    }

    #[test]
    fn reset_zeroes_cursors_and_storage() {
        let ring = AudioRing::new(8);
        ring.push(&[1, 2, 3, 4, 5]);
        ring.reset();
        assert_eq!(ring.unread(), 0);
        assert_eq!(ring.generation(), 1);

        let mut out = [42i16; 8];
        assert_eq!(ring.pull(&mut out), 0);
        assert!(out.iter().all(|&s| s == 0));
        assert!(ring.slots.iter().all(|s| s.load(Ordering::Relaxed) == 0));
    }

    #[test]
    fn pull_overlapping_reset_is_silent() {
        let ring = AudioRing::new(8);
        ring.push(&[1, 2, 3, 4, 5]);

        let view = ring.begin_pull().unwrap();
        ring.reset();
        ring.push(&[7, 8]);

        let mut out = [9i16; 4];
        assert_eq!(ring.finish_pull(view, &mut out), 0);
        assert_eq!(out, [0, 0, 0, 0]);

        // The block pushed after the reset is delivered in full.
        assert_eq!(ring.pull(&mut out), 2);
        assert_eq!(out, [7, 8, 0, 0]);
        assert_eq!(ring.unread(), 0);
    }

    #[test]
    fn pull_committed_before_reset_does_not_skip_new_samples() {
        let ring = AudioRing::new(8);
        ring.push(&[1, 2, 3, 4, 5, 6]);
        let mut out = [0i16; 6];
        assert_eq!(ring.pull(&mut out), 6);

        ring.reset();
        assert_eq!(ring.unread(), 0);
        ring.push(&[10, 11, 12]);
        assert_eq!(ring.unread(), 3);

        let mut out = [0i16; 3];
        assert_eq!(ring.pull(&mut out), 3);
        assert_eq!(out, [10, 11, 12]);
    }

    #[test]
    fn stale_consumer_cursor_rewinds_after_reset() {
        let ring = AudioRing::new(8);
        ring.push(&[1, 2, 3, 4]);
        ring.reset();
        // A pull that passed its sequence check just before the reset
        // began still commits its old cursor.
        ring.read_pos.store(4, Ordering::Relaxed);
        ring.push(&[20, 21]);

        let mut out = [0i16; 4];
        assert_eq!(ring.pull(&mut out), 2);
        assert_eq!(out, [20, 21, 0, 0]);
    }

    #[test]
    fn consumer_pulls_through_shared_ring() {
        let ring = Arc::new(AudioRing::new(8));
        let mut consumer = ring.consumer();
        ring.push(&[3, 4]);
        let mut out = [0i16; 2];
        assert_eq!(consumer.fill(&mut out), 2);
        assert_eq!(out, [3, 4]);
    }

    #[test]
    fn concurrent_pull_only_sees_pushed_or_silence() {
        let ring = Arc::new(AudioRing::new(256));
        let mut consumer = ring.consumer();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                let block: Vec<i16> = (1..=64).collect();
                for _ in 0..2000 {
                    ring.push(&block);
                }
            });
            scope.spawn(move || {
                let mut out = [0i16; 100];
                for _ in 0..2000 {
                    consumer.fill(&mut out);
                    assert!(out.iter().all(|&s| (0..=64).contains(&s)));
                }
            });
        });
    }
}
