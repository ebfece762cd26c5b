// # Built-in Upstream Providers
//
// Providers that ship with the core crate. Network-backed providers live in
// their own crates (e.g. `zonecache-provider-ns1`).

pub mod memory;

pub use memory::{MemoryProvider, MemoryProviderFactory};
