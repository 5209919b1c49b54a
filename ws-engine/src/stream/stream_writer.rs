use core::future::Future;

/// A sink of bytes written asynchronously.
pub trait StreamWriter {
  /// Attempts to write ***all*** `bytes`.
  fn write_all(&mut self, bytes: &[u8]) -> impl Future<Output = crate::Result<()>>;

  /// Attempts to write ***all*** `bytes` of all slices, in order.
  #[inline]
  fn write_all_vectored(&mut self, bytes: &[&[u8]]) -> impl Future<Output = crate::Result<()>> {
    async move {
      for elem in bytes {
        if !elem.is_empty() {
          self.write_all(elem).await?;
        }
      }
      Ok(())
    }
  }

  /// Graceful half-close of the sending direction. Layered transports, like TLS, perform their
  /// own closing sequence here.
  #[inline]
  fn shutdown(&mut self) -> impl Future<Output = crate::Result<()>> {
    async { Ok(()) }
  }
}

impl StreamWriter for () {
  #[inline]
  async fn write_all(&mut self, _: &[u8]) -> crate::Result<()> {
    Ok(())
  }
}

impl<T> StreamWriter for &mut T
where
  T: StreamWriter,
{
  #[inline]
  async fn write_all(&mut self, bytes: &[u8]) -> crate::Result<()> {
    (**self).write_all(bytes).await
  }

  #[inline]
  async fn write_all_vectored(&mut self, bytes: &[&[u8]]) -> crate::Result<()> {
    (**self).write_all_vectored(bytes).await
  }

  #[inline]
  async fn shutdown(&mut self) -> crate::Result<()> {
    (**self).shutdown().await
  }
}
