//! Integration suite for the shared-memory offset pool.

#[cfg(test)]
mod full_layout;

#[cfg(test)]
mod pool_cycle;
