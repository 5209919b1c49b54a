use crate::{
  misc::Role,
  web_socket::{
    compression::{CompressionLevel, DeflateParams, WindowBits},
    WebSocketError,
  },
};

/// Configurations for the `permessage-deflate` extension from the IETF RFC 7692
#[derive(Clone, Copy, Debug)]
pub struct DeflateConfig {
  /// Clients offer the extension.
  pub client_enable: bool,
  /// LZ77 sliding window size for the client.
  pub client_max_window_bits: WindowBits,
  /// Client resets its compression context after each message.
  pub client_no_context_takeover: bool,
  /// Compression level.
  pub compression_level: CompressionLevel,
  /// Servers accept offers of the extension.
  pub server_enable: bool,
  /// LZ77 sliding window size for the server.
  pub server_max_window_bits: WindowBits,
  /// Server resets its compression context after each message.
  pub server_no_context_takeover: bool,
}

impl DeflateConfig {
  /// Parses the `Sec-WebSocket-Extensions` header value received by `role`.
  ///
  /// Servers look for the first acceptable offer of a client while clients validate the
  /// response of a server. `None` means that compression is not going to be used.
  #[inline]
  pub fn negotiate(&self, role: Role, header_value: &str) -> crate::Result<Option<DeflateParams>> {
    match role {
      Role::Client => {
        let mut iter = header_value.split(',').filter(|el| !el.trim().is_empty());
        let Some(response) = iter.next() else {
          return Ok(None);
        };
        if !self.client_enable || iter.next().is_some() {
          return Err(WebSocketError::UnsupportedCompression.into());
        }
        let Some(offer) = Offer::parse(response)? else {
          return Err(WebSocketError::UnsupportedCompression.into());
        };
        self.accept_response(&offer).map(Some)
      }
      Role::Server => {
        if !self.server_enable {
          return Ok(None);
        }
        for elem in header_value.split(',') {
          let Ok(Some(offer)) = Offer::parse(elem) else {
            continue;
          };
          if let Some(params) = self.accept_offer(&offer) {
            return Ok(Some(params));
          }
        }
        Ok(None)
      }
    }
  }

  /// Value of the `Sec-WebSocket-Extensions` header sent by clients.
  #[inline]
  pub fn offer(&self) -> Option<String> {
    if !self.client_enable {
      return None;
    }
    let mut rslt = String::from("permessage-deflate");
    if self.client_max_window_bits == WindowBits::MAX {
      rslt.push_str("; client_max_window_bits");
    } else {
      rslt.push_str(&format!("; client_max_window_bits={}", u8::from(self.client_max_window_bits)));
    }
    if self.server_max_window_bits != WindowBits::MAX {
      rslt.push_str(&format!("; server_max_window_bits={}", u8::from(self.server_max_window_bits)));
    }
    if self.client_no_context_takeover {
      rslt.push_str("; client_no_context_takeover");
    }
    if self.server_no_context_takeover {
      rslt.push_str("; server_no_context_takeover");
    }
    Some(rslt)
  }

  fn accept_offer(&self, offer: &Offer) -> Option<DeflateParams> {
    let server_max_window_bits = match offer.server_max_window_bits {
      Some(Some(elem)) => elem.min(self.server_max_window_bits),
      Some(None) => return None,
      None => self.server_max_window_bits,
    };
    let client_max_window_bits = match offer.client_max_window_bits {
      Some(Some(elem)) => elem.min(self.client_max_window_bits),
      Some(None) => self.client_max_window_bits,
      None => WindowBits::MAX,
    };
    Some(DeflateParams {
      client_max_window_bits,
      client_no_context_takeover: offer.client_no_context_takeover
        || self.client_no_context_takeover,
      server_max_window_bits,
      server_no_context_takeover: offer.server_no_context_takeover
        || self.server_no_context_takeover,
    })
  }

  fn accept_response(&self, offer: &Offer) -> crate::Result<DeflateParams> {
    let server_max_window_bits = match offer.server_max_window_bits {
      Some(Some(elem)) if elem <= self.server_max_window_bits => elem,
      None if self.server_max_window_bits == WindowBits::MAX => WindowBits::MAX,
      _ => return Err(WebSocketError::UnsupportedCompression.into()),
    };
    let client_max_window_bits = match offer.client_max_window_bits {
      Some(Some(elem)) if elem <= self.client_max_window_bits => elem,
      None => self.client_max_window_bits,
      _ => return Err(WebSocketError::UnsupportedCompression.into()),
    };
    if self.server_no_context_takeover && !offer.server_no_context_takeover {
      return Err(WebSocketError::UnsupportedCompression.into());
    }
    Ok(DeflateParams {
      client_max_window_bits,
      client_no_context_takeover: offer.client_no_context_takeover
        || self.client_no_context_takeover,
      server_max_window_bits,
      server_no_context_takeover: offer.server_no_context_takeover,
    })
  }
}

impl Default for DeflateConfig {
  #[inline]
  fn default() -> Self {
    DeflateConfig {
      client_enable: true,
      client_max_window_bits: WindowBits::MAX,
      client_no_context_takeover: false,
      compression_level: CompressionLevel::default(),
      server_enable: true,
      server_max_window_bits: WindowBits::MAX,
      server_no_context_takeover: false,
    }
  }
}

// `Some(None)` is a parameter without a value.
#[derive(Debug, Default)]
struct Offer {
  client_max_window_bits: Option<Option<WindowBits>>,
  client_no_context_takeover: bool,
  server_max_window_bits: Option<Option<WindowBits>>,
  server_no_context_takeover: bool,
}

impl Offer {
  // `None` if the element describes another extension.
  fn parse(elem: &str) -> crate::Result<Option<Self>> {
    let mut params = elem.split(';').map(str::trim);
    if params.next() != Some("permessage-deflate") {
      return Ok(None);
    }
    let mut offer = Offer::default();
    for param in params {
      let (name, value) = match param.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value.trim().trim_matches('"'))),
        None => (param, None),
      };
      match (name, value) {
        ("client_max_window_bits", _) => {
          manage_uniqueness(&mut offer.client_max_window_bits, window_bits(value)?)?;
        }
        ("client_no_context_takeover", None) => {
          manage_flag(&mut offer.client_no_context_takeover)?;
        }
        ("server_max_window_bits", Some(_)) => {
          manage_uniqueness(&mut offer.server_max_window_bits, window_bits(value)?)?;
        }
        ("server_no_context_takeover", None) => {
          manage_flag(&mut offer.server_no_context_takeover)?;
        }
        _ => return Err(WebSocketError::UnsupportedCompression.into()),
      }
    }
    Ok(Some(offer))
  }
}

fn manage_flag(flag: &mut bool) -> crate::Result<()> {
  if *flag {
    return Err(WebSocketError::UnsupportedCompression.into());
  }
  *flag = true;
  Ok(())
}

fn manage_uniqueness(
  param: &mut Option<Option<WindowBits>>,
  value: Option<WindowBits>,
) -> crate::Result<()> {
  if param.is_some() {
    return Err(WebSocketError::UnsupportedCompression.into());
  }
  *param = Some(value);
  Ok(())
}

fn window_bits(value: Option<&str>) -> crate::Result<Option<WindowBits>> {
  let Some(elem) = value else {
    return Ok(None);
  };
  let n: u8 = elem.parse().map_err(|_err| WebSocketError::UnsupportedCompression)?;
  Ok(Some(WindowBits::try_from(n).map_err(|_err| WebSocketError::UnsupportedCompression)?))
}
