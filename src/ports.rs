// ABOUTME: Ephemeral TCP port allocation on loopback.
// ABOUTME: Bind-then-close; the port is advisory and collisions fail loudly later.

use std::net::TcpListener;

/// Hands out free ephemeral ports on loopback.
///
/// The returned port is advisory: nothing stops another process from
/// claiming it before the caller binds. The container run that immediately
/// follows fails loudly on collision, prompting a retry at a higher layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortBroker;

impl PortBroker {
    pub fn new() -> Self {
        Self
    }

    /// Allocate a free TCP port on 127.0.0.1.
    pub fn allocate(&self) -> std::io::Result<u16> {
        let listener = TcpListener::bind(("127.0.0.1", 0))?;
        let port = listener.local_addr()?.port();
        drop(listener);
        Ok(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_a_nonzero_port() {
        let port = PortBroker::new().allocate().unwrap();
        assert!(port >= 1024);
    }

    #[test]
    fn consecutive_allocations_are_bindable() {
        let broker = PortBroker::new();
        let port = broker.allocate().unwrap();
        // The port was released on close, so binding it again succeeds.
        TcpListener::bind(("127.0.0.1", port)).unwrap();
    }
}
