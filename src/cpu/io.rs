//! I/O port devices.
//!
//! The IO address is a single byte-wide port. What sits behind it is up
//! to the host: [`NullPort`] when nothing is attached, [`BufferedPort`]
//! for in-memory streams.

use std::collections::VecDeque;

/// A device attached to the IO address.
pub trait IoPort {
    /// Produce the next input byte.
    fn read(&mut self) -> u8;

    /// Accept one output byte.
    fn write(&mut self, value: u8);
}

/// No device: reads 0, discards writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullPort;

impl IoPort for NullPort {
    fn read(&mut self) -> u8 {
        0
    }

    fn write(&mut self, _value: u8) {}
}

/// Queue-backed input and an output buffer.
///
/// Reads pop from the input queue and yield 0 once it is exhausted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferedPort {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl BufferedPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a port with pending input.
    pub fn with_input(input: impl IntoIterator<Item = u8>) -> Self {
        Self {
            input: input.into_iter().collect(),
            output: Vec::new(),
        }
    }

    /// Queue more input bytes.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.input.extend(bytes);
    }

    /// Bytes written so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Take the written bytes, leaving the buffer empty.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// Drop pending input and written output.
    pub fn clear(&mut self) {
        self.input.clear();
        self.output.clear();
    }

    /// Number of input bytes not yet read.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }
}

impl IoPort for BufferedPort {
    fn read(&mut self) -> u8 {
        self.input.pop_front().unwrap_or(0)
    }

    fn write(&mut self, value: u8) {
        self.output.push(value);
    }
}

impl<P: IoPort + ?Sized> IoPort for Box<P> {
    fn read(&mut self) -> u8 {
        (**self).read()
    }

    fn write(&mut self, value: u8) {
        (**self).write(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_port() {
        let mut port = NullPort;
        port.write(9);
        assert_eq!(port.read(), 0);
    }

    #[test]
    fn test_buffered_port() {
        let mut port = BufferedPort::with_input([3, 4]);
        assert_eq!(port.read(), 3);
        assert_eq!(port.pending_input(), 1);
        assert_eq!(port.read(), 4);
        assert_eq!(port.read(), 0);

        port.write(7);
        port.write(8);
        assert_eq!(port.output(), &[7, 8]);
        assert_eq!(port.take_output(), vec![7, 8]);
        assert!(port.output().is_empty());

        port.feed(&[1, 2]);
        port.write(3);
        port.clear();
        assert_eq!(port.pending_input(), 0);
        assert!(port.output().is_empty());
    }

    #[test]
    fn test_boxed_port() {
        let mut port: Box<dyn IoPort> = Box::new(BufferedPort::with_input([1]));
        assert_eq!(port.read(), 1);
        assert_eq!(port.read(), 0);
    }
}
