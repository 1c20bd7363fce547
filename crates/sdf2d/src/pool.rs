//! Pool of reusable scratch objects for mesh rebuilds.
//!
//! Checkout hands out a [`PooledScratch`] guard; dropping the guard resets
//! the object and returns it to the free list. Each object is owned by one
//! guard at a time, so two in-flight rebuilds never share scratch.
//!
//! ```ignore
//! let pool = ScratchPool::<MesherScratch>::new(8);
//! let mut scratch = pool.checkout();   // reuses a returned object if any
//! mesher.mesh(&job, &mut scratch);
//! // dropped here: reset, then back on the free list
//! ```

use std::ops::{Deref, DerefMut};

use crossbeam_channel::{self as channel, Receiver, Sender};

/// Clear an object's contents while keeping its allocations.
pub trait Reset {
  fn reset(&mut self);
}

/// Bounded free list of scratch objects, shareable across threads.
pub struct ScratchPool<T: Reset + Default> {
  sender: Sender<T>,
  receiver: Receiver<T>,
}

impl<T: Reset + Default> Clone for ScratchPool<T> {
  fn clone(&self) -> Self {
    Self {
      sender: self.sender.clone(),
      receiver: self.receiver.clone(),
    }
  }
}

impl<T: Reset + Default> ScratchPool<T> {
  /// Pool keeping at most `capacity` idle objects.
  pub fn new(capacity: usize) -> Self {
    let (sender, receiver) = channel::bounded(capacity.max(1));
    Self { sender, receiver }
  }

  /// Take an idle object, or create one if none is idle.
  pub fn checkout(&self) -> PooledScratch<T> {
    let value = self.receiver.try_recv().unwrap_or_default();
    PooledScratch {
      value: Some(value),
      home: self.sender.clone(),
    }
  }

  /// Objects currently idle in the pool.
  pub fn idle(&self) -> usize {
    self.receiver.len()
  }
}

/// Checked-out scratch object. Resets and returns itself on drop.
pub struct PooledScratch<T: Reset> {
  value: Option<T>,
  home: Sender<T>,
}

impl<T: Reset> Deref for PooledScratch<T> {
  type Target = T;

  fn deref(&self) -> &T {
    // Only `drop` takes the value.
    match &self.value {
      Some(value) => value,
      None => unreachable!("scratch used after release"),
    }
  }
}

impl<T: Reset> DerefMut for PooledScratch<T> {
  fn deref_mut(&mut self) -> &mut T {
    match &mut self.value {
      Some(value) => value,
      None => unreachable!("scratch used after release"),
    }
  }
}

impl<T: Reset> Drop for PooledScratch<T> {
  fn drop(&mut self) {
    if let Some(mut value) = self.value.take() {
      value.reset();
      // Full pool: let the object go.
      let _ = self.home.try_send(value);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Default)]
  struct Buffer {
    data: Vec<u32>,
    resets: usize,
  }

  impl Reset for Buffer {
    fn reset(&mut self) {
      self.data.clear();
      self.resets += 1;
    }
  }

  #[test]
  fn test_checkout_reuses_and_resets() {
    let pool = ScratchPool::<Buffer>::new(2);
    {
      let mut scratch = pool.checkout();
      scratch.data.extend([1, 2, 3]);
    }
    assert_eq!(pool.idle(), 1);

    let scratch = pool.checkout();
    assert!(scratch.data.is_empty());
    assert!(scratch.data.capacity() >= 3);
    assert_eq!(scratch.resets, 1);
    assert_eq!(pool.idle(), 0);
  }

  #[test]
  fn test_concurrent_checkouts_are_distinct() {
    let pool = ScratchPool::<Buffer>::new(4);
    let mut a = pool.checkout();
    let mut b = pool.checkout();
    a.data.push(1);
    b.data.push(2);
    assert_eq!(a.data, vec![1]);
    assert_eq!(b.data, vec![2]);
  }

  #[test]
  fn test_pool_drops_surplus() {
    let pool = ScratchPool::<Buffer>::new(1);
    let a = pool.checkout();
    let b = pool.checkout();
    drop(a);
    drop(b);
    assert_eq!(pool.idle(), 1);
  }

  #[test]
  fn test_pool_is_shared_across_threads() {
    let pool = ScratchPool::<Buffer>::new(8);
    let handles: Vec<_> = (0..4)
      .map(|i| {
        let pool = pool.clone();
        std::thread::spawn(move || {
          let mut scratch = pool.checkout();
          scratch.data.push(i);
          scratch.data.len()
        })
      })
      .collect();
    for handle in handles {
      assert_eq!(handle.join().unwrap(), 1);
    }
    assert!(pool.idle() >= 1);
  }
}
