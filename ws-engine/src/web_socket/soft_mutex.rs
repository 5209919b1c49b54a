//! Cooperative ownership of one side of a transport.
//!
//! The protected value is lent to a single operation at a time. When released, it is reserved
//! for the waiting operation of highest priority so that a newly started operation can not
//! overtake an operation that is already waiting.

use core::{
  future::Future,
  mem::ManuallyDrop,
  ops::{Deref, DerefMut},
  pin::Pin,
  task::{Context, Poll, Waker},
};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Kinds of operations that compete for a side of the transport, from the highest to the lowest
/// priority.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Owner {
  Close,
  Read,
  Ping,
  Write,
}

impl Owner {
  const ALL: [Self; 4] = [Self::Close, Self::Read, Self::Ping, Self::Write];

  const fn idx(self) -> usize {
    match self {
      Self::Close => 0,
      Self::Read => 1,
      Self::Ping => 2,
      Self::Write => 3,
    }
  }
}

#[derive(Debug)]
pub(crate) struct SoftMutex<T> {
  state: Mutex<State<T>>,
}

impl<T> SoftMutex<T> {
  pub(crate) const fn new(value: T) -> Self {
    Self {
      state: Mutex::new(State {
        holder: None,
        holder_waker: None,
        reserved: None,
        value: Some(value),
        waiters: [None, None, None, None],
      }),
    }
  }

  /// `None` if the value was never returned by a leaked guard.
  pub(crate) fn into_inner(self) -> Option<T> {
    self.state.into_inner().unwrap_or_else(PoisonError::into_inner).value
  }

  pub(crate) fn lock(&self, owner: Owner) -> SoftMutexLock<'_, T> {
    SoftMutexLock { is_done: false, mutex: self, owner }
  }

  /// Returns the value only if it is free and nobody is waiting for it.
  pub(crate) fn try_lock(&self, owner: Owner) -> Option<SoftMutexGuard<'_, T>> {
    let mut state = self.state();
    if state.reserved.is_some() {
      return None;
    }
    let value = state.value.take()?;
    state.holder = Some(owner);
    Some(SoftMutexGuard { mutex: self, owner, value: ManuallyDrop::new(value) })
  }

  fn state(&self) -> MutexGuard<'_, State<T>> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

#[derive(Debug)]
struct State<T> {
  holder: Option<Owner>,
  holder_waker: Option<Waker>,
  reserved: Option<Owner>,
  value: Option<T>,
  waiters: [Option<Waker>; 4],
}

impl<T> State<T> {
  fn dispatch(&mut self) {
    self.reserved = None;
    for owner in Owner::ALL {
      if let Some(waker) = self.waiters.get_mut(owner.idx()).and_then(Option::take) {
        self.reserved = Some(owner);
        waker.wake();
        return;
      }
    }
  }
}

pub(crate) struct SoftMutexLock<'mutex, T> {
  is_done: bool,
  mutex: &'mutex SoftMutex<T>,
  owner: Owner,
}

impl<'mutex, T> Future for SoftMutexLock<'mutex, T> {
  type Output = SoftMutexGuard<'mutex, T>;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let owner = self.owner;
    let mutex = self.mutex;
    let mut state = mutex.state();
    if state.reserved.is_none() || state.reserved == Some(owner) {
      if let Some(value) = state.value.take() {
        state.holder = Some(owner);
        state.reserved = None;
        if let Some(slot) = state.waiters.get_mut(owner.idx()) {
          *slot = None;
        }
        drop(state);
        self.is_done = true;
        return Poll::Ready(SoftMutexGuard { mutex, owner, value: ManuallyDrop::new(value) });
      }
    }
    if let Some(slot) = state.waiters.get_mut(owner.idx()) {
      *slot = Some(cx.waker().clone());
    }
    if let Some(waker) = state.holder_waker.take() {
      waker.wake();
    }
    Poll::Pending
  }
}

impl<T> Drop for SoftMutexLock<'_, T> {
  fn drop(&mut self) {
    if self.is_done {
      return;
    }
    let mut state = self.mutex.state();
    if let Some(slot) = state.waiters.get_mut(self.owner.idx()) {
      *slot = None;
    }
    if state.reserved == Some(self.owner) {
      state.dispatch();
    }
  }
}

pub(crate) struct SoftMutexGuard<'mutex, T> {
  mutex: &'mutex SoftMutex<T>,
  owner: Owner,
  value: ManuallyDrop<T>,
}

impl<T> SoftMutexGuard<'_, T> {
  /// If an operation of kind `owner` is waiting for this value.
  pub(crate) fn has_waiter(&self, owner: Owner) -> bool {
    self.mutex.state().waiters.get(owner.idx()).is_some_and(Option::is_some)
  }

  /// If any other operation is waiting for this value.
  pub(crate) fn is_contended(&self) -> bool {
    self.mutex.state().waiters.iter().any(Option::is_some)
  }

  /// Resolves when an operation of kind `owner` starts waiting for this value.
  pub(crate) fn poll_waiter(&self, cx: &mut Context<'_>, owner: Owner) -> Poll<()> {
    let mut state = self.mutex.state();
    if state.waiters.get(owner.idx()).is_some_and(Option::is_some) {
      return Poll::Ready(());
    }
    state.holder_waker = Some(cx.waker().clone());
    Poll::Pending
  }
}

impl<T> Deref for SoftMutexGuard<'_, T> {
  type Target = T;

  fn deref(&self) -> &Self::Target {
    &self.value
  }
}

impl<T> DerefMut for SoftMutexGuard<'_, T> {
  fn deref_mut(&mut self) -> &mut Self::Target {
    &mut self.value
  }
}

impl<T> Drop for SoftMutexGuard<'_, T> {
  fn drop(&mut self) {
    // SAFETY: `value` is never used after this point
    #[allow(unsafe_code)]
    let value = unsafe { ManuallyDrop::take(&mut self.value) };
    let mut state = self.mutex.state();
    debug_assert_eq!(state.holder, Some(self.owner));
    state.holder = None;
    state.holder_waker = None;
    state.value = Some(value);
    state.dispatch();
  }
}

#[cfg(test)]
mod tests {
  use crate::web_socket::soft_mutex::{Owner, SoftMutex};
  use core::{
    future::{poll_fn, Future},
    pin::pin,
    task::Poll,
  };

  #[tokio::test]
  async fn released_value_goes_to_the_highest_priority_waiter() {
    let mutex = SoftMutex::new(Vec::new());
    {
      let guard = mutex.lock(Owner::Read).await;
      let mut write = pin!(mutex.lock(Owner::Write));
      let mut ping = pin!(mutex.lock(Owner::Ping));
      let mut close = pin!(mutex.lock(Owner::Close));
      poll_fn(|cx| {
        assert!(write.as_mut().poll(cx).is_pending());
        assert!(ping.as_mut().poll(cx).is_pending());
        assert!(close.as_mut().poll(cx).is_pending());
        Poll::Ready(())
      })
      .await;
      assert!(guard.has_waiter(Owner::Close));
      assert!(guard.is_contended());
      drop(guard);
      assert!(mutex.try_lock(Owner::Read).is_none());
      poll_fn(|cx| {
        assert!(write.as_mut().poll(cx).is_pending());
        assert!(ping.as_mut().poll(cx).is_pending());
        Poll::Ready(())
      })
      .await;
      let mut guard = close.await;
      guard.push(Owner::Close);
      drop(guard);
      let mut guard = ping.await;
      guard.push(Owner::Ping);
      drop(guard);
      let mut guard = write.await;
      guard.push(Owner::Write);
      drop(guard);
    }
    assert_eq!(mutex.into_inner().unwrap(), [Owner::Close, Owner::Ping, Owner::Write]);
  }

  #[tokio::test]
  async fn cancelled_waiter_passes_the_reservation() {
    let mutex = SoftMutex::new(());
    let guard = mutex.lock(Owner::Write).await;
    {
      let mut close = pin!(mutex.lock(Owner::Close));
      let mut read = pin!(mutex.lock(Owner::Read));
      poll_fn(|cx| {
        assert!(close.as_mut().poll(cx).is_pending());
        assert!(read.as_mut().poll(cx).is_pending());
        Poll::Ready(())
      })
      .await;
      drop(guard);
    }
    assert!(mutex.try_lock(Owner::Ping).is_some());
  }

  #[tokio::test]
  async fn holder_is_notified_of_new_waiters() {
    let mutex = SoftMutex::new(());
    let guard = mutex.lock(Owner::Read).await;
    let mut close = pin!(mutex.lock(Owner::Close));
    poll_fn(|cx| {
      assert!(guard.poll_waiter(cx, Owner::Close).is_pending());
      assert!(close.as_mut().poll(cx).is_pending());
      assert!(guard.poll_waiter(cx, Owner::Close).is_ready());
      Poll::Ready(())
    })
    .await;
    drop(guard);
    let _guard = close.await;
  }
}
