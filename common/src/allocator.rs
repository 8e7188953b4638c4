use std::{collections::BTreeSet, ops::Range};

/// Tracks which ports of a node are claimed by provisioned servers.
///
/// Unlike a sequential allocator, this type never picks ports on its own.
/// The panel resolves the desired port set for a server up front and the
/// allocator only enforces that a port inside the managed half-open range
/// (`[start, end)`) is never claimed twice.
///
/// # Example
///
/// ```
/// use common::allocator::PortAllocator;
///
/// let mut allocator = PortAllocator::new(1025..65535);
///
/// assert!(allocator.claim(25565));
/// assert!(!allocator.claim(25565));
///
/// allocator.release(25565);
/// assert!(!allocator.is_claimed(25565));
/// ```
pub struct PortAllocator {
    range: Range<u16>,
    claimed: BTreeSet<u16>,
}

impl PortAllocator {
    /// Constructs a new `PortAllocator` managing the given half-open range.
    #[must_use]
    pub fn new(range: Range<u16>) -> Self {
        Self {
            range,
            claimed: BTreeSet::new(),
        }
    }

    /// Claims a single port.
    ///
    /// Returns `false` if the port lies outside the managed range or is
    /// already claimed. The allocator is unchanged in that case.
    pub fn claim(&mut self, port: u16) -> bool {
        if !self.range.contains(&port) {
            return false;
        }
        self.claimed.insert(port)
    }

    /// Claims every port in the slice or none of them.
    ///
    /// # Errors
    ///
    /// Returns the first port that is out of range or already claimed. All
    /// ports claimed by this call are released again in that case.
    pub fn claim_all(&mut self, ports: &[u16]) -> Result<(), u16> {
        for (index, &port) in ports.iter().enumerate() {
            if !self.claim(port) {
                for &claimed in &ports[..index] {
                    self.release(claimed);
                }
                return Err(port);
            }
        }
        Ok(())
    }

    /// Releases a previously claimed port.
    ///
    /// Returns `false` if the port was not claimed.
    pub fn release(&mut self, port: u16) -> bool {
        self.claimed.remove(&port)
    }

    /// Releases every port in the slice. Ports that were never claimed are
    /// ignored.
    pub fn release_all(&mut self, ports: &[u16]) {
        for &port in ports {
            self.release(port);
        }
    }

    /// Checks if a specific port is currently claimed.
    #[must_use]
    pub fn is_claimed(&self, port: u16) -> bool {
        self.claimed.contains(&port)
    }

    /// Returns the number of claimed ports.
    #[must_use]
    pub fn claimed(&self) -> usize {
        self.claimed.len()
    }
}
