//! # Events Module
//!
//! Event-driven progress reporting.
//!
//! ## Design
//! The engine emits events through channels, allowing any UI
//! (CLI, GUI, web) to subscribe and display progress.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::default_bounded();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Transfer(p) = event {
//!             println!("{}/{} {}", p.current, p.total, p.current_file);
//!         }
//!     }
//! });
//!
//! let session = Session::builder().events(sender).build();
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender, DEFAULT_CAPACITY};
pub use types::*;
