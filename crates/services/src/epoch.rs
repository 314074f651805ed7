/// Proof that a request was issued by a store, checked when its response lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Monotonic request counter. Only the latest ticket may apply its response.
#[derive(Debug, Default, Clone)]
pub(crate) struct RequestEpoch {
    latest: u64,
}

impl RequestEpoch {
    pub(crate) fn issue(&mut self) -> LoadTicket {
        self.latest += 1;
        LoadTicket(self.latest)
    }

    pub(crate) fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Makes every outstanding ticket stale.
    pub(crate) fn invalidate(&mut self) {
        self.latest += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_ticket_is_current() {
        let mut epoch = RequestEpoch::default();
        let first = epoch.issue();
        let second = epoch.issue();
        assert!(!epoch.is_current(first));
        assert!(epoch.is_current(second));
        epoch.invalidate();
        assert!(!epoch.is_current(second));
    }
}
