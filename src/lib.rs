//! Hand tracking to servo control.
//!
//! This library turns hand landmarks into servo commands:
//! - a 2D rotation angle is estimated from two reference landmarks of each hand
//! - the angle is smoothed with an exponential moving average
//! - the smoothed angle is mapped linearly onto the servo range and clamped
//! - commands are rate limited per hand and handed to a serial sender process
//!
//! The same binary also provides the serial sender itself (`send`) and a headless launcher
//! (`launch`) that runs the tracker as a child process and relays its output.
//!
//! # Examples
//!
//! ## Angle to servo value
//!
//! ```
//! use hand_servo::{filters::exponential::ExponentialFilter, range_map::RangeMapper};
//!
//! let mut filter = ExponentialFilter::new(0.2);
//! let mapper = RangeMapper::default();
//!
//! let smoothed = filter.update(10.0);
//! assert_eq!(mapper.map_to_servo(smoothed).unwrap(), 150);
//! ```
//!
//! ## Processing a frame
//!
//! ```no_run
//! use hand_servo::{config::Config, hand_landmarks::Frame, tracker::HandTracker};
//! use std::time::Instant;
//!
//! # fn main() -> hand_servo::Result<()> {
//! let mut tracker = HandTracker::new(Config::default(), None, std::io::stdout())?;
//! let frame = Frame::from_json_line(r#"{"hands": []}"#)?;
//! for report in tracker.process_frame(&frame, Instant::now())? {
//!     println!("hand {}: {:.2}", report.hand_index, report.smoothed_angle);
//! }
//! # Ok(())
//! # }
//! ```

/// Hand landmark frames and their JSON-lines source
pub mod hand_landmarks;

/// Rotation angle estimation from reference landmarks
pub mod hand_angle;

/// Signal filtering algorithms for smoothing angle estimates
pub mod filters;

/// Linear range mapping with clamping
pub mod range_map;

/// Rate-limited servo command dispatch
pub mod dispatch;

/// Process-backed senders
pub mod sender;

/// Per-frame tracking pipeline
pub mod tracker;

/// Main application module
pub mod app;

/// Serial protocol and link to the servo board
pub mod serial;

/// Headless launcher
pub mod launcher;

/// Numeric helpers
pub mod utils;

/// Error types and result handling
pub mod error;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
