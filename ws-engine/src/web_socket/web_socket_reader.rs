use crate::{
  misc::{DynamicBuffer, FlatBuffer},
  rng::Rng,
  stream::{StreamReader, StreamWriter},
  web_socket::{
    soft_mutex::{Owner, SoftMutexGuard},
    web_socket_writer::WriterPart,
    CloseCode, CloseReason, FrameHeader, FrameType, Inflater, MessageInfo, NegotiatedCompression,
    OpCode, PreparedKey, Status, Utf8Checker, WebSocket, WebSocketError, MAX_CONTROL_PAYLOAD_LEN,
  },
};
use arrayvec::ArrayVec;
use core::{
  future::{poll_fn, Future},
  pin::pin,
  task::Poll,
};

pub(crate) type ReaderGuard<'ws, NC, SR> =
  SoftMutexGuard<'ws, ReaderPart<<NC as NegotiatedCompression>::Inflater, SR>>;
pub(crate) type WriterGuard<'ws, NC, R, SW> =
  SoftMutexGuard<'ws, WriterPart<<NC as NegotiatedCompression>::Deflater, R, SW>>;

/// Receiving half of a session.
#[derive(Debug)]
pub(crate) struct ReaderPart<I, SR> {
  pub(crate) buffer: FlatBuffer,
  pub(crate) frame: Frame,
  inflated: Vec<u8>,
  inflated_idx: usize,
  inflater: Option<I>,
  message: Message,
  pub(crate) stream: SR,
}

impl<I, SR> ReaderPart<I, SR>
where
  I: Inflater,
  SR: StreamReader,
{
  pub(crate) fn new(inflater: Option<I>, stream: SR) -> Self {
    Self {
      buffer: FlatBuffer::default(),
      frame: Frame::default(),
      inflated: Vec::new(),
      inflated_idx: 0,
      inflater,
      message: Message::default(),
      stream,
    }
  }

  pub(crate) fn into_stream(self) -> SR {
    self.stream
  }

  pub(crate) const fn is_message_done(&self) -> bool {
    self.message.done
  }

  pub(crate) const fn got_binary(&self) -> bool {
    !self.message.is_text
  }

  pub(crate) const fn got_text(&self) -> bool {
    self.message.is_text
  }

  pub(crate) fn rsv1_allowed(&self) -> bool {
    self.inflater.is_some()
  }

  /// Reads more bytes from the transport. Reaching the end of the stream is an error.
  pub(crate) async fn fill(&mut self, len: usize) -> crate::Result<()> {
    let Self { buffer, stream, .. } = self;
    let read = stream.read(buffer.prepare(len)?).await?;
    if read == 0 {
      return Err(crate::Error::UnexpectedStreamReadEOF);
    }
    buffer.commit(read);
    Ok(())
  }

  /// Control payloads are always read at once.
  pub(crate) async fn read_control_payload(
    &mut self,
    header: &FrameHeader,
    header_len: usize,
    read_buffer_size: usize,
  ) -> crate::Result<ArrayVec<u8, MAX_CONTROL_PAYLOAD_LEN>> {
    let payload_len = usize::try_from(header.payload_len)?;
    let frame_len = header_len.wrapping_add(payload_len);
    while self.buffer.len() < frame_len {
      self.fill(read_buffer_size).await?;
    }
    let mut payload = ArrayVec::new();
    payload
      .try_extend_from_slice(self.buffer.data().get(header_len..frame_len).unwrap_or_default())
      .map_err(|_err| WebSocketError::BadControlSize)?;
    self.buffer.consume(frame_len);
    if let Some(key) = header.mask_key {
      PreparedKey::new(key).apply(&mut payload);
    }
    Ok(payload)
  }

  fn has_pending(&self) -> bool {
    self.inflated_idx < self.inflated.len()
  }

  /// Moves inflated bytes into `buffer`.
  fn deliver_inflated(
    &mut self,
    buffer: &mut impl DynamicBuffer,
    limit: usize,
  ) -> crate::Result<usize> {
    let pending = self.inflated.get(self.inflated_idx..).unwrap_or_default();
    let len = pending.len().min(limit).min(buffer.remaining_capacity());
    if len == 0 && limit > 0 {
      return Err(crate::Error::BufferOverflow);
    }
    buffer.prepare(len)?.copy_from_slice(pending.get(..len).unwrap_or_default());
    buffer.commit(len);
    self.inflated_idx = self.inflated_idx.wrapping_add(len);
    if !self.has_pending() {
      self.inflated.clear();
      self.inflated_idx = 0;
    }
    Ok(len)
  }

  /// Validates the final state of the current message.
  fn finish_message(&mut self) -> crate::Result<()> {
    self.message.last_frame_read = false;
    if self.message.is_text && !self.message.utf8.finish() {
      return Err(WebSocketError::BadFramePayload.into());
    }
    self.message.done = true;
    Ok(())
  }

  /// Checks a data frame header against the current message and starts a new message or
  /// continues the current one.
  fn start_data_frame(
    &mut self,
    header: &FrameHeader,
    message_max: usize,
  ) -> crate::Result<()> {
    if header.op_code.is_continuation() {
      if !self.message.cont {
        return Err(WebSocketError::BadContinuation.into());
      }
      if header.rsv1 {
        return Err(WebSocketError::BadReservedBits.into());
      }
    } else {
      if self.message.cont {
        return Err(WebSocketError::BadDataFrame.into());
      }
      self.message.compressed = header.rsv1;
      self.message.done = false;
      self.message.is_text = header.op_code == OpCode::Text;
      self.message.last_frame_read = false;
      self.message.size = 0;
      self.message.utf8.reset();
    }
    self.message.cont = !header.fin;
    if !self.message.compressed {
      let len = usize::try_from(header.payload_len).unwrap_or(usize::MAX);
      let size = self.message.size.saturating_add(len);
      if size > message_max {
        return Err(WebSocketError::MessageTooBig.into());
      }
      self.message.size = size;
    }
    self.frame = Frame {
      fin: header.fin,
      is_active: true,
      key: header.mask_key.map(PreparedKey::new),
      remain: header.payload_len,
    };
    Ok(())
  }

  /// Processes the next chunk of the current frame payload. Returns the number of bytes
  /// written into `buffer`.
  fn process_payload(
    &mut self,
    buffer: &mut impl DynamicBuffer,
    limit: usize,
    message_max: usize,
  ) -> crate::Result<usize> {
    let Self { buffer: raw, frame, inflated, inflater, message, .. } = self;
    let remain = usize::try_from(frame.remain).unwrap_or(usize::MAX);
    let mut delivered = 0;
    if message.compressed {
      let len = raw.len().min(remain);
      let chunk = raw.data_mut().get_mut(..len).unwrap_or_default();
      if let Some(key) = frame.key.as_mut() {
        key.apply(chunk);
      }
      let before = inflated.len();
      let max_len = message_max.saturating_sub(message.size);
      if let Some(elem) = inflater.as_mut() {
        elem.inflate(chunk, inflated, max_len)?;
      }
      raw.consume(len);
      frame.remain = frame.remain.wrapping_sub(len as u64);
      if frame.remain == 0 {
        frame.is_active = false;
        if frame.fin {
          if let Some(elem) = inflater.as_mut() {
            elem.finish(inflated, max_len.saturating_sub(inflated.len().wrapping_sub(before)))?;
          }
          message.last_frame_read = true;
        }
      }
      let produced = inflated.get(before..).unwrap_or_default();
      message.size = message.size.saturating_add(produced.len());
      if message.is_text && !message.utf8.write(produced) {
        return Err(WebSocketError::BadFramePayload.into());
      }
    } else {
      let len = raw.len().min(remain).min(limit).min(buffer.remaining_capacity());
      if len == 0 && remain > 0 && limit > 0 {
        return Err(crate::Error::BufferOverflow);
      }
      let chunk = raw.data_mut().get_mut(..len).unwrap_or_default();
      if let Some(key) = frame.key.as_mut() {
        key.apply(chunk);
      }
      if message.is_text && !message.utf8.write(chunk) {
        return Err(WebSocketError::BadFramePayload.into());
      }
      buffer.prepare(len)?.copy_from_slice(chunk);
      buffer.commit(len);
      raw.consume(len);
      delivered = len;
      frame.remain = frame.remain.wrapping_sub(len as u64);
      if frame.remain == 0 {
        frame.is_active = false;
        message.last_frame_read = frame.fin;
      }
    }
    Ok(delivered)
  }
}

/// Frame whose payload is being received.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Frame {
  pub(crate) fin: bool,
  pub(crate) is_active: bool,
  pub(crate) key: Option<PreparedKey>,
  pub(crate) remain: u64,
}

#[derive(Debug)]
struct Message {
  compressed: bool,
  cont: bool,
  done: bool,
  is_text: bool,
  last_frame_read: bool,
  size: usize,
  utf8: Utf8Checker,
}

impl Default for Message {
  fn default() -> Self {
    Self {
      compressed: false,
      cont: false,
      done: true,
      is_text: false,
      last_frame_read: false,
      size: 0,
      utf8: Utf8Checker::new(),
    }
  }
}

enum Step {
  Continue,
  Return(MessageInfo),
}

impl<NC, R, SR, SW, const IS_CLIENT: bool> WebSocket<NC, R, SR, SW, IS_CLIENT>
where
  NC: NegotiatedCompression,
  R: Rng,
  SR: StreamReader,
  SW: StreamWriter,
{
  /// If the last message was binary.
  ///
  /// Returns `false` while a read is running or while the reader is claimed by another operation.
  #[inline]
  pub fn got_binary(&self) -> bool {
    self.reader.try_lock(Owner::Read).map_or(false, |rd| rd.got_binary())
  }

  /// If the last message was text.
  ///
  /// Returns `false` while a read is running or while the reader is claimed by another operation.
  #[inline]
  pub fn got_text(&self) -> bool {
    self.reader.try_lock(Owner::Read).map_or(false, |rd| rd.got_text())
  }

  pub(crate) async fn read_some_op(
    &self,
    buffer: &mut impl DynamicBuffer,
    limit: usize,
  ) -> crate::Result<MessageInfo> {
    self.session().check_open()?;
    let mut rd = self.reader.lock(Owner::Read).await;
    self.session().check_open()?;
    loop {
      match self.read_step(&mut rd, buffer, limit).await {
        Ok(Step::Continue) => {}
        Ok(Step::Return(info)) => return Ok(info),
        Err(err) => return Err(self.fail(rd, err).await),
      }
    }
  }

  /// Locks the writer on behalf of a reader that already owns the reader. Gives up if a close
  /// operation is waiting for the reader, in which case the latter must be released.
  pub(crate) async fn lock_writer<'this>(
    &'this self,
    rd: &ReaderGuard<'this, NC, SR>,
  ) -> Option<WriterGuard<'this, NC, R, SW>> {
    let mut lock = pin!(self.writer.lock(Owner::Read));
    poll_fn(|cx| {
      if let Poll::Ready(wr) = lock.as_mut().poll(cx) {
        return Poll::Ready(Some(wr));
      }
      if rd.poll_waiter(cx, Owner::Close).is_ready() {
        return Poll::Ready(None);
      }
      Poll::Pending
    })
    .await
  }

  async fn read_step(
    &self,
    rd: &mut ReaderGuard<'_, NC, SR>,
    buffer: &mut impl DynamicBuffer,
    limit: usize,
  ) -> crate::Result<Step> {
    let message_max = self.config.message_max();
    if rd.has_pending() {
      let len = rd.deliver_inflated(buffer, limit)?;
      if !rd.has_pending() && rd.message.last_frame_read {
        rd.finish_message()?;
      }
      return Ok(Step::Return(self.message_info(rd, len)));
    }
    if rd.message.last_frame_read {
      rd.finish_message()?;
      return Ok(Step::Return(self.message_info(rd, 0)));
    }
    if rd.frame.is_active {
      if rd.frame.remain > 0 && rd.buffer.is_empty() {
        self.fill(rd).await?;
      }
      let len = rd.process_payload(buffer, limit, message_max)?;
      if rd.message.compressed {
        return Ok(Step::Continue);
      }
      if rd.message.last_frame_read {
        rd.finish_message()?;
      }
      return Ok(Step::Return(self.message_info(rd, len)));
    }
    let (header, header_len) = loop {
      if let Some(elem) = FrameHeader::decode::<IS_CLIENT>(rd.buffer.data(), rd.rsv1_allowed())? {
        break elem;
      }
      self.fill(rd).await?;
    };
    _trace!(
      fin = header.fin,
      len = header.payload_len,
      op_code = %header.op_code,
      rsv1 = header.rsv1,
      "Received frame"
    );
    if header.op_code.is_control() {
      let payload =
        rd.read_control_payload(&header, header_len, self.config.read_buffer_size).await?;
      return self.control_frame(rd, header.op_code, &payload).await;
    }
    rd.buffer.consume(header_len);
    rd.start_data_frame(&header, message_max)?;
    if header.payload_len == 0 && !header.fin {
      rd.frame.is_active = false;
    }
    Ok(Step::Continue)
  }

  async fn control_frame(
    &self,
    rd: &mut ReaderGuard<'_, NC, SR>,
    op_code: OpCode,
    payload: &[u8],
  ) -> crate::Result<Step> {
    match op_code {
      OpCode::Ping => {
        if self.status() == Status::Closing {
          return Ok(Step::Continue);
        }
        self.call_control_callback(FrameType::Ping, payload);
        let Some(mut wr) = self.lock_writer(rd).await else {
          return Err(WebSocketError::OperationAborted.into());
        };
        if self.status() != Status::Open {
          return Ok(Step::Continue);
        }
        if let Err(err) = wr.write_control::<IS_CLIENT>(OpCode::Pong, payload).await {
          self.session().fail();
          return Err(err);
        }
        Ok(Step::Continue)
      }
      OpCode::Pong => {
        if !self.session().wr_close {
          self.call_control_callback(FrameType::Pong, payload);
        }
        Ok(Step::Continue)
      }
      _ => {
        self.session().rd_close = true;
        let close_reason = CloseReason::parse(payload)?;
        _debug!(code = ?close_reason.code(), "Received close frame");
        self.session().close_reason = Some(close_reason.clone());
        self.call_control_callback(FrameType::Close, payload);
        let Some(mut wr) = self.lock_writer(rd).await else {
          return Err(WebSocketError::Closed.into());
        };
        let must_echo = {
          let mut session = self.session();
          if session.status == Status::Open {
            session.status = Status::Closing;
          }
          !core::mem::replace(&mut session.wr_close, true)
        };
        if must_echo {
          let code = close_reason.code().unwrap_or(CloseCode::Normal);
          let echo = CloseReason::from(code).payload();
          if let Err(err) = wr.write_control::<IS_CLIENT>(OpCode::Close, &echo).await {
            self.session().fail();
            return Err(err);
          }
        }
        if self.session().begin_teardown() {
          self.teardown(&mut wr, Some(&mut **rd)).await;
        }
        self.session().end(&Ok(()));
        Err(WebSocketError::Closed.into())
      }
    }
  }

  /// Reads from the transport unless a close operation wants the reader.
  async fn fill(&self, rd: &mut ReaderGuard<'_, NC, SR>) -> crate::Result<()> {
    rd.fill(self.config.read_buffer_size).await?;
    if rd.has_waiter(Owner::Close) {
      return Err(WebSocketError::OperationAborted.into());
    }
    Ok(())
  }

  /// Terminates the session after `err`. The peer is notified with a close frame whenever
  /// possible.
  async fn fail(&self, mut rd: ReaderGuard<'_, NC, SR>, err: crate::Error) -> crate::Error {
    let is_local = matches!(err, crate::Error::BufferOverflow);
    if err.is_closed() || err.is_operation_aborted() || is_local {
      return err;
    }
    _debug!(code = ?err.close_code(), error = ?err, "Read failed");
    if matches!(err, crate::Error::IoError(_) | crate::Error::UnexpectedStreamReadEOF) {
      self.session().fail();
      if let Some(mut wr) = self.writer.try_lock(Owner::Read) {
        let must_send = !core::mem::replace(&mut self.session().wr_close, true);
        if must_send {
          let payload = CloseReason::from(err.close_code()).payload();
          let _rslt = wr.write_control::<IS_CLIENT>(OpCode::Close, &payload).await;
        }
        if self.session().begin_teardown() {
          self.teardown(&mut wr, None).await;
        }
      }
      return err;
    }
    let Some(mut wr) = self.lock_writer(&rd).await else {
      self.session().fail();
      return err;
    };
    let must_send = {
      let mut session = self.session();
      if session.status == Status::Open {
        session.status = Status::Closing;
      }
      !core::mem::replace(&mut session.wr_close, true)
    };
    if must_send {
      let payload = CloseReason::from(err.close_code()).payload();
      let _rslt = wr.write_control::<IS_CLIENT>(OpCode::Close, &payload).await;
    }
    if self.session().begin_teardown() {
      self.teardown(&mut wr, Some(&mut *rd)).await;
    }
    self.session().fail();
    err
  }

  fn message_info(&self, rd: &ReaderGuard<'_, NC, SR>, len: usize) -> MessageInfo {
    MessageInfo { is_final: rd.message.done, is_text: rd.message.is_text, len }
  }
}
