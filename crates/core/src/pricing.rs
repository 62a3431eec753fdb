use std::collections::BTreeMap;

use rust_decimal::Decimal;

/// Per-cord price list keyed by firewood type.
///
/// Lookups are case-insensitive; keys are stored lowercased. Prices are whole
/// dollars and quoted totals render with a single leading `$` and no decimal
/// places, exactly as the fulfillment message repeats them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceBook {
    per_cord: BTreeMap<String, Decimal>,
}

impl Default for PriceBook {
    fn default() -> Self {
        Self::new([
            ("split".to_owned(), Decimal::from(200u32)),
            ("logs".to_owned(), Decimal::from(150u32)),
        ])
    }
}

impl PriceBook {
    pub fn new(per_cord: impl IntoIterator<Item = (String, Decimal)>) -> Self {
        Self {
            per_cord: per_cord
                .into_iter()
                .map(|(kind, price)| (kind.to_ascii_lowercase(), price))
                .collect(),
        }
    }

    pub fn contains(&self, firewood_type: &str) -> bool {
        self.per_cord.contains_key(&firewood_type.to_ascii_lowercase())
    }

    /// Catalog entries in listing order, for elicitation prompts.
    pub fn catalog(&self) -> Vec<&str> {
        self.per_cord.keys().map(String::as_str).collect()
    }

    pub fn quote(&self, firewood_type: &str, cords: u32) -> Option<Decimal> {
        self.per_cord
            .get(&firewood_type.to_ascii_lowercase())
            .map(|per_cord| per_cord * Decimal::from(cords))
    }

    pub fn quote_label(&self, firewood_type: &str, cords: u32) -> Option<String> {
        self.quote(firewood_type, cords).map(|total| format!("${total}"))
    }
}

#[cfg(test)]
mod tests {
    use super::PriceBook;

    #[test]
    fn quotes_the_documented_totals() {
        let prices = PriceBook::default();
        assert_eq!(prices.quote_label("split", 2).as_deref(), Some("$400"));
        assert_eq!(prices.quote_label("logs", 3).as_deref(), Some("$450"));
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let prices = PriceBook::default();
        assert!(prices.contains("Split"));
        assert_eq!(prices.quote_label("LOGS", 1).as_deref(), Some("$150"));
    }

    #[test]
    fn unknown_types_quote_nothing() {
        let prices = PriceBook::default();
        assert!(!prices.contains("pellets"));
        assert_eq!(prices.quote("pellets", 2), None);
    }
}
