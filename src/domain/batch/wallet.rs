use rand::Rng;

/// Smallest random allowance, in currency units.
pub const MIN_FUNDS: f64 = 0.05;
/// Largest random allowance, in currency units.
pub const MAX_FUNDS: f64 = 0.50;

/// Funds a vehicle can spend on crossing priority, and its current bid.
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    bid: f64,
    total_funds_available: f64,
}

impl Wallet {
    pub fn new(initial_bid: f64, initial_funds: f64) -> Self {
        Wallet { bid: initial_bid, total_funds_available: initial_funds }
    }

    /// Wallet with funds drawn uniformly in whole cents from [`MIN_FUNDS`, `MAX_FUNDS`],
    /// bidding everything it has.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let min_cents = (MIN_FUNDS * 100.0).round() as u32;
        let max_cents = (MAX_FUNDS * 100.0).round() as u32;
        let funds = rng.random_range(min_cents..=max_cents) as f64 / 100.0;

        Wallet { bid: funds, total_funds_available: funds }
    }

    pub fn current_bid(&self) -> f64 {
        self.bid
    }

    pub fn remaining_funds(&self) -> f64 {
        self.total_funds_available
    }

    /// Updates the bid when `complex` bidding is on, capped by the available funds.
    /// Returns the bid in effect afterwards.
    pub fn set_bid(&mut self, amount: f64, complex: bool) -> f64 {
        if complex {
            self.bid = amount.min(self.total_funds_available);
        }

        return self.bid;
    }

    pub fn set_wallet_amount(&mut self, amount: f64) {
        self.total_funds_available = amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_wallet_stays_in_range() {
        let mut rng = rand::rng();

        for _ in 0..100 {
            let wallet = Wallet::random(&mut rng);
            assert!(wallet.current_bid() >= MIN_FUNDS && wallet.current_bid() <= MAX_FUNDS);
            assert_eq!(wallet.current_bid(), wallet.remaining_funds());
        }
    }

    #[test]
    fn complex_bids_are_capped_by_funds() {
        let mut wallet = Wallet::new(0.1, 0.3);

        assert_eq!(wallet.set_bid(0.5, true), 0.3);
        assert_eq!(wallet.set_bid(0.2, true), 0.2);
        assert_eq!(wallet.set_bid(0.25, false), 0.2);
    }
}
