use crate::{
  misc::DynamicBuffer,
  rng::Rng,
  stream::{StreamReader, StreamWriter},
  web_socket::{
    soft_mutex::Owner,
    web_socket_reader::{ReaderGuard, ReaderPart},
    web_socket_writer::WriterPart,
    CloseReason, FrameHeader, FrameType, NegotiatedCompression, OpCode, Status, WebSocket,
  },
};

/// Upper bound of bytes discarded while waiting for the peer to close the transport.
const TEARDOWN_DRAIN_LIMIT: usize = 64 * 1024;

impl<NC, R, SR, SW, const IS_CLIENT: bool> WebSocket<NC, R, SR, SW, IS_CLIENT>
where
  NC: NegotiatedCompression,
  R: Rng,
  SR: StreamReader,
  SW: StreamWriter,
{
  pub(crate) async fn close_op(&self, close_reason: &CloseReason) -> crate::Result<()> {
    self.session().check_open()?;
    let mut wr = self.writer.lock(Owner::Close).await;
    {
      let mut session = self.session();
      session.check_open()?;
      session.status = Status::Closing;
      session.wr_close = true;
    }
    _debug!(code = ?close_reason.code(), "Sending close frame");
    if let Err(err) = wr.write_control::<IS_CLIENT>(OpCode::Close, &close_reason.payload()).await {
      self.session().fail();
      return Err(err);
    }
    if self.session().rd_close {
      if self.session().begin_teardown() {
        self.teardown(&mut wr, None).await;
      }
      self.session().end(&Ok(()));
      return Ok(());
    }
    let mut rd = self.reader.lock(Owner::Close).await;
    let rslt = if self.session().rd_close { Ok(()) } else { self.drain(&mut rd).await };
    if self.session().begin_teardown() {
      self.teardown(&mut wr, Some(&mut *rd)).await;
    }
    let mut session = self.session();
    session.end(&rslt);
    _debug!(status = ?session.status, "Closing handshake finished");
    rslt
  }

  /// Discards everything until the close frame of the peer arrives. The end of the stream is
  /// also accepted as an answer.
  async fn drain(&self, rd: &mut ReaderGuard<'_, NC, SR>) -> crate::Result<()> {
    let read_buffer_size = self.config.read_buffer_size;
    loop {
      if rd.frame.is_active {
        if rd.frame.remain > 0 && rd.buffer.is_empty() {
          match rd.fill(read_buffer_size).await {
            Ok(()) => {}
            Err(err) if err.is_eof() => return Ok(()),
            Err(err) => return Err(err),
          }
        }
        let len = rd.buffer.len().min(usize::try_from(rd.frame.remain).unwrap_or(usize::MAX));
        rd.buffer.consume(len);
        rd.frame.remain = rd.frame.remain.wrapping_sub(len as u64);
        if rd.frame.remain == 0 {
          rd.frame.is_active = false;
        }
        continue;
      }
      let Some((header, header_len)) =
        FrameHeader::decode::<IS_CLIENT>(rd.buffer.data(), rd.rsv1_allowed())?
      else {
        match rd.fill(read_buffer_size).await {
          Ok(()) => continue,
          Err(err) if err.is_eof() => return Ok(()),
          Err(err) => return Err(err),
        }
      };
      if header.op_code == OpCode::Close {
        let payload = match rd.read_control_payload(&header, header_len, read_buffer_size).await {
          Ok(elem) => elem,
          Err(err) if err.is_eof() => return Ok(()),
          Err(err) => return Err(err),
        };
        let close_reason = CloseReason::parse(&payload)?;
        _debug!(code = ?close_reason.code(), "Received close frame");
        {
          let mut session = self.session();
          session.close_reason = Some(close_reason);
          session.rd_close = true;
        }
        self.call_control_callback(FrameType::Close, &payload);
        return Ok(());
      }
      rd.buffer.consume(header_len);
      rd.frame.fin = header.fin;
      rd.frame.is_active = true;
      rd.frame.key = None;
      rd.frame.remain = header.payload_len;
    }
  }

  /// Ends the sending direction and then waits, within limits, for the peer to do the same.
  pub(crate) async fn teardown(
    &self,
    wr: &mut WriterPart<NC::Deflater, R, SW>,
    rd: Option<&mut ReaderPart<NC::Inflater, SR>>,
  ) {
    _debug!("Tearing down the transport");
    if let Err(_err) = wr.stream_mut().shutdown().await {
      _debug!(error = ?_err, "Transport shutdown failed");
    }
    let Some(rd) = rd else {
      return;
    };
    let mut scratch = [0; 1024];
    let mut total: usize = 0;
    while total < TEARDOWN_DRAIN_LIMIT {
      match rd.stream.read(&mut scratch).await {
        Ok(0) | Err(_) => break,
        Ok(read) => total = total.wrapping_add(read),
      }
    }
  }
}
