/// Currency code to display symbol.
pub trait SymbolLookup: Send + Sync {
    /// `None` for codes the table does not know.
    fn symbol(&self, currency_code: &str) -> Option<String>;
}

/// Built-in table of common ISO 4217 symbols.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticSymbolTable;

impl SymbolLookup for StaticSymbolTable {
    fn symbol(&self, currency_code: &str) -> Option<String> {
        let symbol = match currency_code.trim().to_ascii_uppercase().as_str() {
            "AED" => "د.إ",
            "ARS" | "AUD" | "CAD" | "CLP" | "COP" | "HKD" | "MXN" | "NZD" | "SGD" | "USD" => "$",
            "BGN" => "лв",
            "BRL" => "R$",
            "CHF" => "CHF",
            "CNY" | "JPY" => "¥",
            "CZK" => "Kč",
            "DKK" | "NOK" | "SEK" | "ISK" => "kr",
            "EGP" | "GBP" => "£",
            "EUR" => "€",
            "HUF" => "Ft",
            "IDR" => "Rp",
            "ILS" => "₪",
            "INR" => "₹",
            "KRW" => "₩",
            "MYR" => "RM",
            "PHP" => "₱",
            "PLN" => "zł",
            "RON" => "lei",
            "RUB" => "₽",
            "SAR" => "﷼",
            "THB" => "฿",
            "TRY" => "₺",
            "TWD" => "NT$",
            "UAH" => "₴",
            "VND" => "₫",
            "ZAR" => "R",
            _ => return None,
        };
        Some(symbol.to_string())
    }
}
