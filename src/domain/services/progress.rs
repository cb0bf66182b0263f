use rust_decimal::Decimal;

/// Percentage of completed lessons, rounded to two decimals.
///
/// Rounds half to even. A course without lessons has zero progress.
pub fn progress_percent(completed: i64, total: i64) -> Decimal {
    if total <= 0 {
        return Decimal::ZERO;
    }
    let completed = completed.clamp(0, total);
    (Decimal::from(completed) * Decimal::ONE_HUNDRED / Decimal::from(total)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, 3 => Decimal::ZERO ; "nothing done")]
    #[test_case(1, 3 => Decimal::new(3333, 2) ; "one third")]
    #[test_case(2, 3 => Decimal::new(6667, 2) ; "two thirds")]
    #[test_case(3, 3 => Decimal::ONE_HUNDRED ; "all done")]
    #[test_case(1, 4 => Decimal::new(25, 0) ; "quarter")]
    #[test_case(1, 32 => Decimal::new(312, 2) ; "half to even down")]
    #[test_case(3, 32 => Decimal::new(938, 2) ; "half to even up")]
    #[test_case(5, 0 => Decimal::ZERO ; "no lessons")]
    #[test_case(7, 5 => Decimal::ONE_HUNDRED ; "completed count above total")]
    fn test_progress_percent(completed: i64, total: i64) -> Decimal {
        progress_percent(completed, total)
    }
}
