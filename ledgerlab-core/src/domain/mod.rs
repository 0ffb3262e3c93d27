//! Domain types for LedgerLab

pub mod fill;
pub mod ids;

pub use fill::{Fill, Side};
pub use ids::{DatasetHash, LedgerHash};

/// Symbol type alias
pub type Symbol = String;

/// Clamp any integer-like signal into the executable domain {-1, 0, 1}.
pub fn clamp_signal(value: i64) -> i8 {
    value.clamp(-1, 1) as i8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_signal_saturates() {
        assert_eq!(clamp_signal(5), 1);
        assert_eq!(clamp_signal(-9), -1);
        assert_eq!(clamp_signal(0), 0);
        assert_eq!(clamp_signal(1), 1);
    }
}
