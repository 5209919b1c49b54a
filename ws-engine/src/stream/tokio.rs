use crate::stream::{StreamReader, StreamWriter};
use tokio::{
  io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf},
  net::tcp::{OwnedReadHalf, OwnedWriteHalf},
};

impl StreamReader for OwnedReadHalf {
  #[inline]
  async fn read(&mut self, bytes: &mut [u8]) -> crate::Result<usize> {
    Ok(<Self as AsyncReadExt>::read(self, bytes).await?)
  }
}

impl<T> StreamReader for ReadHalf<T>
where
  T: AsyncRead,
{
  #[inline]
  async fn read(&mut self, bytes: &mut [u8]) -> crate::Result<usize> {
    Ok(<Self as AsyncReadExt>::read(self, bytes).await?)
  }
}

impl StreamWriter for OwnedWriteHalf {
  #[inline]
  async fn write_all(&mut self, bytes: &[u8]) -> crate::Result<()> {
    <Self as AsyncWriteExt>::write_all(self, bytes).await?;
    Ok(())
  }

  #[inline]
  async fn shutdown(&mut self) -> crate::Result<()> {
    <Self as AsyncWriteExt>::shutdown(self).await?;
    Ok(())
  }
}

impl<T> StreamWriter for WriteHalf<T>
where
  T: AsyncWrite,
{
  #[inline]
  async fn write_all(&mut self, bytes: &[u8]) -> crate::Result<()> {
    <Self as AsyncWriteExt>::write_all(self, bytes).await?;
    Ok(())
  }

  #[inline]
  async fn shutdown(&mut self) -> crate::Result<()> {
    <Self as AsyncWriteExt>::shutdown(self).await?;
    Ok(())
  }
}
