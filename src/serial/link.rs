use super::protocol::{SerialCommand, Step};
use crate::{config::SerialConfig, Result};
use log::{debug, info};
use serialport::{ClearBuffer, SerialPort};
use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

/// Port the board usually enumerates as on this platform
#[must_use]
pub const fn default_port() -> &'static str {
    if cfg!(target_os = "windows") {
        "COM5"
    } else if cfg!(target_os = "macos") {
        "/dev/cu.usbmodem2101"
    } else {
        "/dev/ttyACM0"
    }
}

/// The byte stream the link talks over
pub trait CommandPort: Read + Write {
    /// Bytes waiting to be read
    fn bytes_pending(&self) -> Result<u32>;

    /// Discard anything already received
    fn clear_input(&self) -> Result<()>;
}

impl CommandPort for Box<dyn SerialPort> {
    fn bytes_pending(&self) -> Result<u32> {
        Ok(self.bytes_to_read()?)
    }

    fn clear_input(&self) -> Result<()> {
        Ok(self.clear(ClearBuffer::Input)?)
    }
}

/// Line-oriented connection to the servo sketch
pub struct SerialLink<P: CommandPort> {
    port: P,
    response_wait: Duration,
}

impl SerialLink<Box<dyn SerialPort>> {
    /// Open the configured (or platform default) port.
    ///
    /// Opening resets most Arduino boards, so this waits `settle_ms` and then drops whatever
    /// the bootloader printed.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be opened or its input cannot be cleared
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let name = config.port.as_deref().unwrap_or(default_port());
        info!("Opening serial port {} at {} baud", name, config.baud);

        let port = serialport::new(name, config.baud)
            .timeout(Duration::from_millis(config.timeout_ms))
            .open()?;

        thread::sleep(Duration::from_millis(config.settle_ms));
        port.clear_input()?;

        Ok(Self::new(port, Duration::from_millis(config.response_wait_ms)))
    }
}

impl<P: CommandPort> SerialLink<P> {
    pub const fn new(port: P, response_wait: Duration) -> Self {
        Self { port, response_wait }
    }

    /// Write one line, give the board a moment, and collect whatever it answered
    ///
    /// # Errors
    ///
    /// Returns an error if writing or reading the port fails
    pub fn send_line(&mut self, line: &str) -> Result<Vec<String>> {
        info!(">> {}", line);
        self.port.write_all(line.as_bytes())?;
        self.port.write_all(b"\n")?;
        self.port.flush()?;

        if !self.response_wait.is_zero() {
            thread::sleep(self.response_wait);
        }

        let responses = self.read_responses()?;
        for response in &responses {
            info!("{}", response);
        }
        Ok(responses)
    }

    /// Send a single command
    ///
    /// # Errors
    ///
    /// Returns an error if the port fails
    pub fn send(&mut self, command: &SerialCommand) -> Result<Vec<String>> {
        self.send_line(&command.to_string())
    }

    /// Run a scripted sequence of commands and pauses
    ///
    /// # Errors
    ///
    /// Stops at and returns the first port error
    pub fn run_steps(&mut self, steps: &[Step]) -> Result<()> {
        for step in steps {
            match step {
                Step::Send(command) => {
                    self.send(command)?;
                }
                Step::Wait(ms) => thread::sleep(Duration::from_millis(*ms)),
            }
        }
        Ok(())
    }

    fn read_responses(&mut self) -> Result<Vec<String>> {
        let mut raw = Vec::new();
        let mut buf = [0u8; 256];

        loop {
            let pending = self.port.bytes_pending()?;
            if pending == 0 {
                break;
            }
            let want = buf.len().min(pending as usize);
            let n = self.port.read(&mut buf[..want])?;
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
        }

        debug!("Read {} response bytes", raw.len());
        Ok(String::from_utf8_lossy(&raw)
            .lines()
            .map(|l| l.trim_end().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }

    /// The underlying port
    pub fn port(&self) -> &P {
        &self.port
    }
}
