//! Fragment buffer (C5): reassembles Resource/Frag/End PDU sequences into a
//! single payload, per the explicit state-machine redesign note.

/// `Idle -> Collecting -> Complete`, confined to one parser instance.
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentState {
    Idle,
    Collecting { address: u32, encrypted: bool, data: Vec<u8> },
    Complete { reassembled: Vec<u8> },
}

/// Owns the fragment-buffer state machine for one logical channel.
#[derive(Debug, Default)]
pub struct FragmentBuffer {
    state: FragmentState,
}

impl Default for FragmentState {
    fn default() -> Self {
        FragmentState::Idle
    }
}

impl FragmentBuffer {
    pub fn new() -> Self {
        Self { state: FragmentState::Idle }
    }

    pub fn state(&self) -> &FragmentState {
        &self.state
    }

    /// Start a new collection, discarding whatever was in progress.
    pub fn start(&mut self, address: u32, encrypted: bool, payload: &[u8]) {
        self.state = FragmentState::Collecting {
            address,
            encrypted,
            data: payload.to_vec(),
        };
    }

    /// Append a continuation fragment. A no-op (buffer retained) if not
    /// currently collecting, per §4.4's "any non-sequence PDU does not reset
    /// the buffer" rule.
    pub fn append(&mut self, payload: &[u8]) {
        if let FragmentState::Collecting { data, .. } = &mut self.state {
            data.extend_from_slice(payload);
        }
    }

    /// Close the buffer with a final fragment, returning the reassembled
    /// bytes and the metadata recorded at `start`. Resets to `Idle`.
    pub fn finish(&mut self, payload: &[u8]) -> Option<(u32, bool, Vec<u8>)> {
        match std::mem::replace(&mut self.state, FragmentState::Idle) {
            FragmentState::Collecting { address, encrypted, mut data } => {
                data.extend_from_slice(payload);
                let reassembled = data.clone();
                self.state = FragmentState::Complete { reassembled };
                let result = Some((address, encrypted, data));
                self.state = FragmentState::Idle;
                result
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    pub fn is_collecting(&self) -> bool {
        matches!(self.state, FragmentState::Collecting { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let buf = FragmentBuffer::new();
        assert_eq!(*buf.state(), FragmentState::Idle);
    }

    #[test]
    fn collects_and_finishes() {
        let mut buf = FragmentBuffer::new();
        buf.start(0x456789, false, b"hello ");
        buf.append(b"world");
        let (address, encrypted, data) = buf.finish(b"!").unwrap();
        assert_eq!(address, 0x456789);
        assert!(!encrypted);
        assert_eq!(data, b"hello world!");
        assert_eq!(*buf.state(), FragmentState::Idle);
    }

    #[test]
    fn append_without_start_is_noop() {
        let mut buf = FragmentBuffer::new();
        buf.append(b"stray");
        assert_eq!(*buf.state(), FragmentState::Idle);
    }

    #[test]
    fn finish_without_start_returns_none() {
        let mut buf = FragmentBuffer::new();
        assert!(buf.finish(b"x").is_none());
    }

    #[test]
    fn restart_while_collecting_discards_previous() {
        let mut buf = FragmentBuffer::new();
        buf.start(1, false, b"first");
        buf.start(2, true, b"second");
        let (address, encrypted, data) = buf.finish(b"").unwrap();
        assert_eq!(address, 2);
        assert!(encrypted);
        assert_eq!(data, b"second");
    }
}
