//! Thin aliases over the concurrency and collection primitives this crate
//! uses, collected in one place the way the rest of the storage stack's
//! `crate::os` module does (see e.g. `gc.rs`'s
//! `os::{sleep, Arc, BTreeMap, Condvar, CvarMutex, Mutex, Vec}` import).
//!
//! `Mutex` is the spin-lock used for short, non-blocking critical sections
//! (bitmaps, segment tables); `CvarMutex`/`Condvar` are the std blocking
//! primitives used wherever a thread may need to sleep while holding a
//! wait, such as the pacer's stop signal and the shared GC/compaction
//! handshake.

pub use hashbrown::{HashMap, HashSet};
pub use spin::Mutex;
pub use std::collections::BTreeMap;
pub use std::sync::{Arc, Condvar, Mutex as CvarMutex};
pub use std::thread::sleep;
pub use std::vec::Vec;
