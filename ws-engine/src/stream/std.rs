use crate::stream::{StreamReader, StreamWriter};
use std::{
  io::{Read, Write},
  net::{Shutdown, TcpStream},
};

// Blocking calls inside `async` functions, meant to be driven by `*_blocking` methods. Each
// half is usually obtained through `TcpStream::try_clone`.

impl StreamReader for TcpStream {
  #[inline]
  async fn read(&mut self, bytes: &mut [u8]) -> crate::Result<usize> {
    Ok(<Self as Read>::read(self, bytes)?)
  }
}

impl StreamWriter for TcpStream {
  #[inline]
  async fn write_all(&mut self, bytes: &[u8]) -> crate::Result<()> {
    <Self as Write>::write_all(self, bytes)?;
    Ok(())
  }

  #[inline]
  async fn shutdown(&mut self) -> crate::Result<()> {
    TcpStream::shutdown(self, Shutdown::Write)?;
    Ok(())
  }
}
