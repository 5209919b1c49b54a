use crate::web_socket::{CloseReason, WebSocketError};
use core::sync::atomic::{AtomicBool, Ordering};

/// Lifecycle of a session.
///
/// `Open` → `Closing` → `Closed` | `Failed`. Nothing leaves `Closed` or `Failed`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
  /// Messages can be exchanged.
  Open,
  /// A close frame was sent or received and the session is shutting down.
  Closing,
  /// Closing handshake finished and the transport was torn down.
  Closed,
  /// Session was terminated because of an error.
  Failed,
}

/// Shared bookkeeping of one connection. Guarded by a short-lived lock that is never held
/// across suspension points.
#[derive(Debug)]
pub(crate) struct Session {
  pub(crate) close_reason: Option<CloseReason>,
  pub(crate) rd_close: bool,
  pub(crate) status: Status,
  pub(crate) teardown_started: bool,
  pub(crate) wr_close: bool,
}

impl Session {
  pub(crate) const fn new() -> Self {
    Self {
      close_reason: None,
      rd_close: false,
      status: Status::Open,
      teardown_started: false,
      wr_close: false,
    }
  }

  pub(crate) fn check_open(&self) -> crate::Result<()> {
    if self.status == Status::Open {
      Ok(())
    } else {
      Err(WebSocketError::OperationAborted.into())
    }
  }

  /// Returns `false` if the transport was already torn down or is being torn down.
  pub(crate) fn begin_teardown(&mut self) -> bool {
    !core::mem::replace(&mut self.teardown_started, true)
  }

  /// Marks the session as failed unless it already ended.
  pub(crate) fn fail(&mut self) {
    if !matches!(self.status, Status::Closed | Status::Failed) {
      self.status = Status::Failed;
    }
  }

  /// Terminal transition. A session that already ended keeps its first terminal status.
  pub(crate) fn end(&mut self, rslt: &crate::Result<()>) {
    if matches!(self.status, Status::Closed | Status::Failed) {
      return;
    }
    self.status = match rslt {
      Ok(()) => Status::Closed,
      Err(err) if err.is_closed() => Status::Closed,
      Err(_) => Status::Failed,
    };
  }
}

/// Families of operations. At most one operation of each family can be outstanding.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Family {
  Close,
  Ping,
  Read,
  Write,
}

impl Family {
  const fn name(self) -> &'static str {
    match self {
      Self::Close => "close",
      Self::Ping => "ping/pong",
      Self::Read => "read",
      Self::Write => "write",
    }
  }
}

#[derive(Debug, Default)]
pub(crate) struct Families {
  flags: [AtomicBool; 4],
}

impl Families {
  /// # Panics
  ///
  /// If another operation of the same family is still running.
  pub(crate) fn enter(&self, family: Family) -> FamilyGuard<'_> {
    let flag = match family {
      Family::Close => &self.flags[0],
      Family::Ping => &self.flags[1],
      Family::Read => &self.flags[2],
      Family::Write => &self.flags[3],
    };
    assert!(
      !flag.swap(true, Ordering::AcqRel),
      "only one {} operation can be outstanding at a time",
      family.name()
    );
    FamilyGuard { flag }
  }
}

pub(crate) struct FamilyGuard<'flag> {
  flag: &'flag AtomicBool,
}

impl Drop for FamilyGuard<'_> {
  fn drop(&mut self) {
    self.flag.store(false, Ordering::Release);
  }
}
