//! Small helpers shared by the mapping, serial and process plumbing code.

pub mod lossy_lines;
pub mod safe_cast;
