use rust_decimal::{Decimal, RoundingStrategy};

/// Formats amounts for a single ISO 4217 currency, en-US style
/// (`$1,200.00`, `HK$500.00`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrencyFormatter {
    currency_code: String,
    symbol: String,
    fraction_digits: u32,
}

impl CurrencyFormatter {
    pub fn new(currency_code: impl Into<String>) -> Self {
        let currency_code = currency_code.into().trim().to_ascii_uppercase();
        let (symbol, fraction_digits) = match currency_code.as_str() {
            "USD" => ("$".to_string(), 2),
            "HKD" => ("HK$".to_string(), 2),
            "AUD" => ("A$".to_string(), 2),
            "CAD" => ("CA$".to_string(), 2),
            "NZD" => ("NZ$".to_string(), 2),
            "EUR" => ("€".to_string(), 2),
            "GBP" => ("£".to_string(), 2),
            "JPY" => ("¥".to_string(), 0),
            "KRW" => ("₩".to_string(), 0),
            other => (format!("{other}\u{a0}"), 2),
        };
        Self { currency_code, symbol, fraction_digits }
    }

    pub fn currency_code(&self) -> &str {
        &self.currency_code
    }

    pub fn format(&self, amount: Decimal) -> String {
        let rounded =
            amount.round_dp_with_strategy(self.fraction_digits, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
        let digits = format!("{:.*}", self.fraction_digits as usize, rounded.abs());

        let (integer, fraction) = match digits.split_once('.') {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (digits.as_str(), None),
        };

        let mut output = format!("{sign}{}{}", self.symbol, group_thousands(integer));
        if let Some(fraction) = fraction {
            output.push('.');
            output.push_str(fraction);
        }
        output
    }
}

/// Whole-number percentage, `0.75` renders as `75%`.
pub fn format_percent(ratio: Decimal) -> String {
    let percent = (ratio * Decimal::from(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    format!("{percent}%")
}

fn group_thousands(integer: &str) -> String {
    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{format_percent, CurrencyFormatter};

    #[test]
    fn formats_known_currencies_with_symbol_and_grouping() {
        assert_eq!(CurrencyFormatter::new("USD").format(Decimal::from(1200)), "$1,200.00");
        assert_eq!(CurrencyFormatter::new("HKD").format(Decimal::from(500)), "HK$500.00");
        assert_eq!(
            CurrencyFormatter::new("AUD").format(Decimal::new(123_456_789, 2)),
            "A$1,234,567.89"
        );
    }

    #[test]
    fn zero_fraction_currencies_round_to_whole_units() {
        assert_eq!(CurrencyFormatter::new("JPY").format(Decimal::new(12_345, 1)), "¥1,235");
    }

    #[test]
    fn unknown_currency_uses_code_prefix() {
        let formatter = CurrencyFormatter::new("sgd");
        assert_eq!(formatter.currency_code(), "SGD");
        assert_eq!(formatter.format(Decimal::new(75, 1)), "SGD\u{a0}7.50");
    }

    #[test]
    fn negative_amounts_keep_sign_before_symbol() {
        assert_eq!(CurrencyFormatter::new("USD").format(Decimal::new(-1_005, 1)), "-$100.50");
        assert_eq!(CurrencyFormatter::new("USD").format(Decimal::new(-1, 3)), "$0.00");
    }

    #[test]
    fn percentages_are_whole_numbers() {
        assert_eq!(format_percent(Decimal::new(5, 1)), "50%");
        assert_eq!(format_percent(Decimal::new(75, 2)), "75%");
        assert_eq!(format_percent(Decimal::ZERO), "0%");
    }
}
