use crate::error::TypeError;

/// Convert a whole-token amount into base units: `whole * 10^decimals`.
pub fn scale_by_decimals(whole: u128, decimals: u8) -> Result<u128, TypeError> {
    10u128
        .checked_pow(u32::from(decimals))
        .and_then(|factor| whole.checked_mul(factor))
        .ok_or_else(|| TypeError::Overflow(format!("{whole} * 10^{decimals}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_whole_tokens() {
        assert_eq!(scale_by_decimals(1000, 2).unwrap(), 100_000);
        assert_eq!(scale_by_decimals(7, 0).unwrap(), 7);
        assert_eq!(scale_by_decimals(0, 30).unwrap(), 0);
    }

    #[test]
    fn overflow_is_reported() {
        assert!(scale_by_decimals(1, 40).is_err());
        assert!(scale_by_decimals(u128::MAX, 1).is_err());
    }
}
