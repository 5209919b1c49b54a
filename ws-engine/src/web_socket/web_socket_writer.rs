use crate::{
  rng::Rng,
  stream::{StreamReader, StreamWriter},
  web_socket::{
    control_frame::serialize_frame, soft_mutex::Owner, Deflater, FrameHeader, NegotiatedCompression,
    OpCode, WebSocket, MAX_HEADER_LEN,
  },
};

/// Sending half of a session.
#[derive(Debug)]
pub(crate) struct WriterPart<D, R, SW> {
  buffer: Vec<u8>,
  compress: bool,
  cont: bool,
  deflated: Vec<u8>,
  deflater: Option<D>,
  is_text: bool,
  rng: R,
  stream: SW,
}

impl<D, R, SW> WriterPart<D, R, SW>
where
  D: Deflater,
  R: Rng,
  SW: StreamWriter,
{
  pub(crate) const fn new(deflater: Option<D>, rng: R, stream: SW) -> Self {
    Self {
      buffer: Vec::new(),
      compress: false,
      cont: false,
      deflated: Vec::new(),
      deflater,
      is_text: false,
      rng,
      stream,
    }
  }

  pub(crate) fn into_stream(self) -> SW {
    self.stream
  }

  pub(crate) fn stream_mut(&mut self) -> &mut SW {
    &mut self.stream
  }

  pub(crate) async fn write_control<const IS_CLIENT: bool>(
    &mut self,
    op_code: OpCode,
    payload: &[u8],
  ) -> crate::Result<()> {
    _trace!(%op_code, len = payload.len(), "Sending control frame");
    let header = FrameHeader::new(true, op_code, payload.len() as u64);
    self.write_frame::<IS_CLIENT>(header, payload).await
  }

  /// Clients mask every frame with a fresh key. Servers send the header and the payload
  /// without copying the latter.
  async fn write_frame<const IS_CLIENT: bool>(
    &mut self,
    mut header: FrameHeader,
    payload: &[u8],
  ) -> crate::Result<()> {
    if IS_CLIENT {
      header.mask_key = Some(self.rng.next_u32());
      self.buffer.clear();
      serialize_frame(&mut self.buffer, &header, payload);
      self.stream.write_all(&self.buffer).await
    } else {
      let mut header_buffer = [0; MAX_HEADER_LEN];
      let len = header.encode(&mut header_buffer);
      let header_bytes = header_buffer.get(..len).unwrap_or_default();
      self.stream.write_all_vectored(&[header_bytes, payload]).await
    }
  }
}

impl<NC, R, SR, SW, const IS_CLIENT: bool> WebSocket<NC, R, SR, SW, IS_CLIENT>
where
  NC: NegotiatedCompression,
  R: Rng,
  SR: StreamReader,
  SW: StreamWriter,
{
  pub(crate) async fn control_op(&self, op_code: OpCode, payload: &[u8]) -> crate::Result<()> {
    self.session().check_open()?;
    let mut wr = self.writer.lock(Owner::Ping).await;
    self.session().check_open()?;
    let rslt = wr.write_control::<IS_CLIENT>(op_code, payload).await;
    if rslt.is_err() {
      self.session().fail();
    }
    rslt
  }

  pub(crate) async fn write_some_op(
    &self,
    payload: &[u8],
    is_text: bool,
    fin: bool,
  ) -> crate::Result<()> {
    self.session().check_open()?;
    let mut wr = self.writer.lock(Owner::Write).await;
    self.session().check_open()?;
    if wr.cont {
      assert_eq!(wr.is_text, is_text, "all parts of a message must have the same type");
    } else {
      wr.is_text = is_text;
      wr.compress = wr.deflater.is_some()
        && self.config.compress
        && payload.len() >= self.config.compress_threshold;
    }
    let mut deflated = core::mem::take(&mut wr.deflated);
    deflated.clear();
    let data = if wr.compress {
      let deflate_rslt = match wr.deflater.as_mut() {
        Some(deflater) => deflater.deflate(payload, &mut deflated, fin),
        None => Ok(()),
      };
      if let Err(err) = deflate_rslt {
        wr.deflated = deflated;
        self.session().fail();
        return Err(err);
      }
      deflated.as_slice()
    } else {
      payload
    };
    let chunk_len =
      if self.config.auto_fragment { self.config.write_buffer_size } else { usize::MAX };
    let mut chunks = data.chunks(chunk_len.max(1)).peekable();
    let mut rslt = Ok(());
    loop {
      let chunk = chunks.next().unwrap_or_default();
      let is_last = chunks.peek().is_none();
      let frame_fin = fin && is_last;
      let (op_code, rsv1) = if wr.cont {
        (OpCode::Continuation, false)
      } else if wr.is_text {
        (OpCode::Text, wr.compress)
      } else {
        (OpCode::Binary, wr.compress)
      };
      let header = FrameHeader { rsv1, ..FrameHeader::new(frame_fin, op_code, chunk.len() as u64) };
      _trace!(%op_code, fin = frame_fin, len = chunk.len(), "Sending data frame");
      if let Err(err) = wr.write_frame::<IS_CLIENT>(header, chunk).await {
        self.session().fail();
        rslt = Err(err);
        break;
      }
      wr.cont = !frame_fin;
      if is_last {
        break;
      }
      if wr.is_contended() {
        drop(wr);
        wr = self.writer.lock(Owner::Write).await;
        if let Err(err) = self.session().check_open() {
          rslt = Err(err);
          break;
        }
      }
    }
    wr.deflated = deflated;
    rslt
  }
}
