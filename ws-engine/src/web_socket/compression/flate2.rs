use crate::{
  misc::Role,
  web_socket::{
    compression::{
      CompressionLevel, DeflateParams, Deflater, Inflater, NegotiatedCompression, DEFLATE_SUFFIX,
    },
    WebSocketError,
  },
};
use flate2::{Compress, Decompress, FlushCompress, FlushDecompress, Status};

const MIN_SPARE_CAPACITY: usize = 64;

/// Negotiated Flate2 compression
#[derive(Clone, Copy, Debug)]
pub struct Flate2 {
  compression_level: CompressionLevel,
  params: DeflateParams,
}

impl Flate2 {
  /// New instance
  #[inline]
  pub const fn new(compression_level: CompressionLevel, params: DeflateParams) -> Self {
    Self { compression_level, params }
  }
}

impl NegotiatedCompression for Flate2 {
  type Deflater = Flate2Deflater;
  type Inflater = Flate2Inflater;

  #[inline]
  fn split(self, role: Role) -> crate::Result<Option<(Self::Deflater, Self::Inflater)>> {
    let is_client = role == Role::Client;
    let (encoder_wb, encoder_nct) = self.params.sending(is_client);
    let (decoder_wb, decoder_nct) = self.params.receiving(is_client);
    let deflater = Flate2Deflater {
      compress: Compress::new_with_window_bits(
        self.compression_level.into(),
        false,
        encoder_wb.into(),
      ),
      no_context_takeover: encoder_nct,
    };
    let inflater = Flate2Inflater {
      decompress: Decompress::new_with_window_bits(false, decoder_wb.into()),
      no_context_takeover: decoder_nct,
    };
    Ok(Some((deflater, inflater)))
  }
}

/// Sending half of [`Flate2`].
#[derive(Debug)]
pub struct Flate2Deflater {
  compress: Compress,
  no_context_takeover: bool,
}

impl Deflater for Flate2Deflater {
  #[inline]
  fn deflate(&mut self, input: &[u8], output: &mut Vec<u8>, fin: bool) -> crate::Result<()> {
    let begin = output.len();
    let mut consumed = 0;
    while consumed < input.len() {
      reserve_spare(output, input.len().wrapping_sub(consumed));
      let total_in = self.compress.total_in();
      let _status = self.compress.compress_vec(
        input.get(consumed..).unwrap_or_default(),
        output,
        FlushCompress::None,
      )?;
      consumed = consumed.wrapping_add(usize::try_from(self.compress.total_in() - total_in)?);
    }
    if !fin {
      return Ok(());
    }
    loop {
      reserve_spare(output, MIN_SPARE_CAPACITY);
      let total_out = self.compress.total_out();
      let _status = self.compress.compress_vec(&[], output, FlushCompress::Sync)?;
      if output.len() < output.capacity() || self.compress.total_out() == total_out {
        break;
      }
    }
    if output.get(begin..).unwrap_or_default().ends_with(&DEFLATE_SUFFIX) {
      output.truncate(output.len().wrapping_sub(DEFLATE_SUFFIX.len()));
    }
    if output.len() == begin {
      output.push(0);
    }
    if self.no_context_takeover {
      self.compress.reset();
    }
    Ok(())
  }
}

/// Receiving half of [`Flate2`].
#[derive(Debug)]
pub struct Flate2Inflater {
  decompress: Decompress,
  no_context_takeover: bool,
}

impl Inflater for Flate2Inflater {
  #[inline]
  fn inflate(&mut self, input: &[u8], output: &mut Vec<u8>, max_len: usize) -> crate::Result<()> {
    let begin = output.len();
    let mut consumed = 0;
    loop {
      reserve_spare(output, input.len().wrapping_sub(consumed).wrapping_mul(2));
      let total_in = self.decompress.total_in();
      let total_out = self.decompress.total_out();
      let status = self.decompress.decompress_vec(
        input.get(consumed..).unwrap_or_default(),
        output,
        FlushDecompress::Sync,
      )?;
      consumed = consumed.wrapping_add(usize::try_from(self.decompress.total_in() - total_in)?);
      if output.len().wrapping_sub(begin) > max_len {
        return Err(WebSocketError::MessageTooBig.into());
      }
      if let Status::StreamEnd = status {
        if consumed < input.len() {
          return Err(WebSocketError::PartialDeflateBlock.into());
        }
        break;
      }
      let has_progressed = self.decompress.total_in() != total_in
        || self.decompress.total_out() != total_out;
      if (consumed >= input.len() && output.len() < output.capacity()) || !has_progressed {
        break;
      }
    }
    Ok(())
  }

  #[inline]
  fn finish(&mut self, output: &mut Vec<u8>, max_len: usize) -> crate::Result<()> {
    self.inflate(&DEFLATE_SUFFIX, output, max_len)?;
    if self.no_context_takeover {
      self.decompress.reset(false);
    }
    Ok(())
  }
}

fn reserve_spare(output: &mut Vec<u8>, additional: usize) {
  if output.capacity().wrapping_sub(output.len()) < MIN_SPARE_CAPACITY {
    output.reserve(additional.max(MIN_SPARE_CAPACITY));
  }
}
