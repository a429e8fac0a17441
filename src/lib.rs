//! Lockmaps - Reader-writer locked map containers
//!
//! This crate provides two containers that can be shared between threads and
//! mutated through `&self`:
//!
//! * [`ConcurrentMap`] - each `String` key maps to a single value.
//! * [`ConcurrentMultiMap`] - each `String` key maps to an ordered sequence
//!   of values.
//!
//! Each instance is guarded by exactly one `RwLock`. Reads take the lock
//! shared, writes take it exclusively, and every operation releases it
//! before returning. The lock is never handed out, so there is no way to
//! hold it across calls: each operation is atomic on its own, but a sequence
//! of operations is not, and nothing is atomic across two instances.
//!
//! Lookups of absent keys are not errors. They yield `None` or an empty
//! sequence, as documented on each operation.
//!
//! There is no eviction, no sharding and no ordering of iteration. If your
//! workload holds reads for a long time and you need writers to proceed
//! regardless, a concurrently readable (copy on write) structure is a better
//! fit than a lock.
//!
//! # Features
//!
//! * `foldhash` - use foldhash for the default hasher (default)
//! * `ahash` - use ahash for the default hasher when `foldhash` is disabled
//! * `serde` - serialize and deserialize the containers as maps
//!
//! With neither hasher feature the std `RandomState` is used. Any hasher may
//! be supplied per instance with `with_hasher`.

#![deny(warnings)]
#![warn(unused_extern_crates)]
#![warn(missing_docs)]

mod utils;

pub mod map;
pub mod multimap;

pub use map::ConcurrentMap;
pub use multimap::ConcurrentMultiMap;
pub use utils::DefaultHashBuilder;
