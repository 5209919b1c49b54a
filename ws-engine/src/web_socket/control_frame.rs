use crate::web_socket::{
  FrameHeader, OpCode, PreparedKey, WebSocketError, MAX_CONTROL_PAYLOAD_LEN, MAX_HEADER_LEN,
};

/// Appends a ping, pong or close frame to `buffer`. The payload is masked when `mask_key` is
/// present, which is always the case for clients.
#[inline]
pub fn serialize_control_frame(
  buffer: &mut Vec<u8>,
  op_code: OpCode,
  payload: &[u8],
  mask_key: Option<u32>,
) -> crate::Result<()> {
  if !op_code.is_control() {
    return Err(WebSocketError::BadOpcode.into());
  }
  if payload.len() > MAX_CONTROL_PAYLOAD_LEN {
    return Err(WebSocketError::BadControlSize.into());
  }
  let header = FrameHeader { mask_key, ..FrameHeader::new(true, op_code, payload.len() as u64) };
  serialize_frame(buffer, &header, payload);
  Ok(())
}

/// Header followed by the, possibly masked, payload.
pub(crate) fn serialize_frame(buffer: &mut Vec<u8>, header: &FrameHeader, payload: &[u8]) {
  let mut header_buffer = [0; MAX_HEADER_LEN];
  let header_len = header.encode(&mut header_buffer);
  buffer.extend_from_slice(header_buffer.get(..header_len).unwrap_or_default());
  let payload_begin = buffer.len();
  buffer.extend_from_slice(payload);
  if let Some(key) = header.mask_key {
    PreparedKey::new(key).apply(buffer.get_mut(payload_begin..).unwrap_or_default());
  }
}
