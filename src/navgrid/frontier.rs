//! The [FrontierQueue] is the active-cell worklist shared by the distance
//! solvers: a fixed-capacity circular FIFO of cell indices with separate
//! read/write cursors
//!
//! The buffer never grows. Exceeding capacity is a programming error (an
//! undersized queue) rather than a recoverable fault, so it fails loudly via
//! `debug_assert!` in development builds. A capacity of the total cell count
//! is sufficient for the uniform-step flood solve; the Eikonal narrow-band
//! solve re-enqueues unconverged cells and is sized with margin by its
//! caller. One queue instance serves exactly one sequential solver
//! invocation, no thread-safety is provided or required
//!

/// Fixed-capacity circular FIFO of cell indices
pub struct FrontierQueue {
	/// Pre-allocated ring storage
	buffer: Vec<u32>,
	/// Read cursor, the position of the next [FrontierQueue::dequeue]
	head: usize,
	/// Write cursor, the position of the next [FrontierQueue::enqueue]
	tail: usize,
	/// Live occupancy between the cursors
	len: usize,
}

impl FrontierQueue {
	/// Create a new instance of [FrontierQueue] able to hold `capacity` cell
	/// indices
	pub fn with_capacity(capacity: usize) -> Self {
		FrontierQueue {
			buffer: vec![0; capacity],
			head: 0,
			tail: 0,
			len: 0,
		}
	}
	/// Number of cell indices the queue can hold
	pub fn capacity(&self) -> usize {
		self.buffer.len()
	}
	/// Live occupancy of the queue
	pub fn len(&self) -> usize {
		self.len
	}
	/// Whether the queue holds no cell indices
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}
	/// Write a cell index at the tail cursor and advance it. The caller
	/// guarantees capacity is never exceeded
	pub fn enqueue(&mut self, index: u32) {
		debug_assert!(
			self.len < self.buffer.len(),
			"FrontierQueue capacity {} exceeded, the queue was sized too small for the solver",
			self.buffer.len()
		);
		self.buffer[self.tail] = index;
		self.tail = (self.tail + 1) % self.buffer.len();
		self.len += 1;
	}
	/// Read the cell index at the head cursor and advance it, or [None] when
	/// the queue is empty
	pub fn dequeue(&mut self) -> Option<u32> {
		if self.len == 0 {
			return None;
		}
		let index = self.buffer[self.head];
		self.head = (self.head + 1) % self.buffer.len();
		self.len -= 1;
		Some(index)
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn fifo_order() {
		let mut queue = FrontierQueue::with_capacity(8);
		for i in 0..5 {
			queue.enqueue(i);
			assert_eq!(i as usize + 1, queue.len());
		}
		for i in 0..5 {
			assert_eq!(Some(i), queue.dequeue());
		}
		assert_eq!(None, queue.dequeue());
	}
	#[test]
	fn cursors_wrap_around() {
		let mut queue = FrontierQueue::with_capacity(4);
		queue.enqueue(0);
		queue.enqueue(1);
		assert_eq!(Some(0), queue.dequeue());
		assert_eq!(Some(1), queue.dequeue());
		// cursors now sit mid-buffer, fill to capacity across the seam
		for i in 2..6 {
			queue.enqueue(i);
		}
		assert_eq!(4, queue.len());
		for i in 2..6 {
			assert_eq!(Some(i), queue.dequeue());
		}
		assert!(queue.is_empty());
	}
	#[test]
	#[should_panic]
	#[cfg(debug_assertions)]
	fn overflow_asserts_in_debug() {
		let mut queue = FrontierQueue::with_capacity(2);
		queue.enqueue(0);
		queue.enqueue(1);
		queue.enqueue(2);
	}
}
