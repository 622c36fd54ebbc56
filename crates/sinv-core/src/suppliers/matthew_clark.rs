//! Matthew Clark wine & spirits invoices.

use crate::parser::KeywordRule;

use super::table::{SizeFallback, TableInvoiceParser, TableLayout};

const KEYWORDS: &[KeywordRule] = &[
    KeywordRule::new("matthew clark", 40),
    KeywordRule::new("matthewclark.co.uk", 30),
    KeywordRule::new("bibendum", 15),
    KeywordRule::new("delivery notes:", 10),
    KeywordRule::new("payment terms:", 5),
];

const WINE: &[&str] = &[
    "wine", "shiraz", "syrah", "merlot", "cabernet", "sauvignon", "chardonnay", "pinot",
    "grigio", "rioja", "malbec", "tempranillo", "grenache", "zinfandel", "chianti", "riesling",
    "prosecco", "champagne", "cava", "rose", "rosé", "blanc", "rouge", "claret", "port",
];

const SPIRITS: &[&str] = &[
    "vodka", "gin", "whisky", "whiskey", "rum", "brandy", "cognac", "tequila", "liqueur",
    "bourbon", "vermouth", "schnapps",
];

/// Layout of a Matthew Clark invoice.
pub fn layout() -> TableLayout {
    TableLayout {
        key: "matthew_clark",
        supplier_name: "Matthew Clark",
        keywords: KEYWORDS,
        match_threshold: 40,
        invoice_prefix: "INV",
        header_lines: 50,
        footer_lines: 30,
        min_tokens: 7,
        start_sentinels: &["Delivery Notes:", "Payment Terms:"],
        end_sentinels: &[
            "Total Nett",
            "Total VAT",
            "Invoice Total",
            "VAT Summary",
            "Carried Forward",
        ],
        cases_units_quantity: true,
        size_fallbacks: &[
            SizeFallback {
                keywords: WINE,
                unit_size: "75cl",
            },
            SizeFallback {
                keywords: SPIRITS,
                unit_size: "70cl",
            },
        ],
        default_unit_size: "75cl",
        vat_codes: &[("1", 20), ("0", 0)],
    }
}

/// Parser for Matthew Clark invoices.
pub fn parser() -> TableInvoiceParser {
    TableInvoiceParser::new(layout())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RowError;
    use crate::parser::SupplierParser;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const INVOICE: &str = "\
Matthew Clark Bibendum Ltd
Whitchurch Lane, Bristol
www.matthewclark.co.uk
TAX INVOICE
Invoice No: INV1234567
Account: 4410021
Invoice Date: 15/01/2024
Delivery Notes: DN778812
RED WINE
EX0200RB 2.00 6 Rye Mill Shiraz 43.68 87.36 1
EX0415CS 1.03 6 Oak Ridge Cabernet Sauvignon 75cl 51.00 59.50 1
EX0999ZZ 0 6 Broken Row Merlot 10.00 0.00 1
SPIRITS
SP1020GN 0.02 6 Harbour London Dry Gin 120.00 40.00 1
XX 1 2 3 4 5 6
SOFT DRINKS
SOFT01 3.00 24 Sparkling Water 500ml 12.00 36.00 0
Total Nett 222.86
Total VAT 37.37
Invoice Total 260.23
";

    #[test]
    fn test_parse_row_exemplar() {
        let item = parser()
            .parse_row("EX0200RB 2.00 6 Rye Mill Shiraz 43.68 87.36 1", None)
            .unwrap();

        assert_eq!(item.supplier_sku, "EX0200RB");
        assert_eq!(item.quantity, dec("12"));
        assert_eq!(item.unit_price, dec("7.28"));
        assert_eq!(item.line_total, dec("87.36"));
        assert_eq!(item.nett_price, dec("87.36"));
        assert_eq!(item.unit_size.as_deref(), Some("75cl"));
        assert_eq!(item.pack_size.as_deref(), Some("12x75cl"));
        assert_eq!(item.description.as_deref(), Some("Rye Mill Shiraz"));
        assert_eq!(item.vat_code.as_deref(), Some("1"));
        assert_eq!(item.vat_rate, Some(dec("20")));
        assert_eq!(item.vat_amount, Some(dec("17.47")));
    }

    #[test]
    fn test_decode_cases_units_quantity() {
        let parser = parser();
        assert_eq!(parser.decode_quantity(dec("2.03"), dec("6")), Some(dec("15")));
        assert_eq!(parser.decode_quantity(dec("0.02"), dec("6")), Some(dec("2")));
        assert_eq!(parser.decode_quantity(dec("3"), dec("24")), Some(dec("72")));
        assert_eq!(parser.decode_quantity(Decimal::MAX, dec("6")), None);
    }

    #[test]
    fn test_infer_unit_size() {
        let parser = parser();
        assert_eq!(parser.infer_unit_size("Reserve Malbec 1.5L"), "1.5l");
        assert_eq!(parser.infer_unit_size("Cotes du Rhone Rouge"), "75cl");
        assert_eq!(parser.infer_unit_size("Harbour London Dry Gin"), "70cl");
        assert_eq!(parser.infer_unit_size("Tonic Water"), "75cl");
    }

    #[test]
    fn test_row_rejections() {
        let parser = parser();

        assert!(matches!(
            parser.parse_row("EX0200RB 2.00 6 43.68 87.36 1", None),
            Err(RowError::TooFewTokens { expected: 7, found: 6 })
        ));
        assert!(matches!(
            parser.parse_row("Page: 1 of 2 printed 15/01/2024 12:00", None),
            Err(RowError::NotAnItem(_))
        ));
        assert!(matches!(
            parser.parse_row("EX0200RB two 6 Rye Mill Shiraz 43.68 87.36 1", None),
            Err(RowError::InvalidNumber { field: "quantity", .. })
        ));
        assert!(matches!(
            parser.parse_row("EX0200RB 2.00 0 Rye Mill Shiraz 43.68 87.36 1", None),
            Err(RowError::InvalidNumber { field: "case size", .. })
        ));
    }

    #[test]
    fn test_out_of_range_numbers_skip_the_row() {
        let parser = parser();

        assert!(matches!(
            parser.parse_row(
                "EX0200RB 79228162514264337593543950335 6 Rye Mill Shiraz 43.68 87.36 1",
                None
            ),
            Err(RowError::InvalidNumber { field: "quantity", .. })
        ));
        assert!(matches!(
            parser.parse_row(
                "EX0200RB 1 0.0000000000000000000000000001 Rye Mill Shiraz 79228162514264337593543950335 87.36 1",
                None
            ),
            Err(RowError::InvalidNumber { .. })
        ));

        let text = "\
Payment Terms: 30
EX0200RB 79228162514264337593543950335 6 Rye Mill Shiraz 43.68 87.36 1
EX0415CS 1.03 6 Oak Ridge Cabernet Sauvignon 75cl 51.00 59.50 1
";
        let result = parser.parse(text);

        assert!(result.success, "{}", result.notes);
        assert_eq!(result.parsed_items.len(), 1);
        assert_eq!(result.parsed_items[0].supplier_sku, "EX0415CS");
        assert!(result.notes.contains("(1 rows skipped)"), "{}", result.notes);
    }

    #[test]
    fn test_unknown_vat_code() {
        let item = parser()
            .parse_row("EX0200RB 1.00 6 Rye Mill Shiraz 43.68 43.68 Z", None)
            .unwrap();
        assert_eq!(item.vat_code.as_deref(), Some("Z"));
        assert_eq!(item.vat_rate, None);
        assert_eq!(item.vat_amount, None);
    }

    #[test]
    fn test_parse_full_invoice() {
        let result = parser().parse(INVOICE);

        assert!(result.success, "{}", result.notes);
        assert_eq!(result.parser_used, "matthew_clark");
        assert_eq!(result.supplier.name, "Matthew Clark");
        assert_eq!(result.metadata.invoice_number, "INV1234567");
        assert_eq!(result.metadata.invoice_date, "2024-01-15");
        assert_eq!(result.metadata.subtotal, dec("222.86"));
        assert_eq!(result.metadata.vat_total, dec("37.37"));
        assert_eq!(result.metadata.total_amount, dec("260.23"));
        assert_eq!(result.notes, "Parsed 4 line items (1 rows skipped)");

        let skus: Vec<&str> = result.parsed_items.iter().map(|i| i.supplier_sku.as_str()).collect();
        assert_eq!(skus, vec!["EX0200RB", "EX0415CS", "SP1020GN", "SOFT01"]);

        let cabernet = &result.parsed_items[1];
        assert_eq!(cabernet.quantity, dec("9"));
        assert_eq!(cabernet.unit_price, dec("8.50"));
        assert_eq!(cabernet.unit_size.as_deref(), Some("75cl"));
        assert_eq!(cabernet.category_header.as_deref(), Some("RED WINE"));

        let gin = &result.parsed_items[2];
        assert_eq!(gin.quantity, dec("2"));
        assert_eq!(gin.unit_price, dec("20.00"));
        assert_eq!(gin.unit_size.as_deref(), Some("70cl"));
        assert_eq!(gin.category_header.as_deref(), Some("SPIRITS"));

        let water = &result.parsed_items[3];
        assert_eq!(water.pack_size.as_deref(), Some("72x500ml"));
        assert_eq!(water.vat_rate, Some(Decimal::ZERO));
        assert_eq!(water.vat_amount, Some(Decimal::ZERO));
        assert_eq!(water.category_header.as_deref(), Some("SOFT DRINKS"));

        assert_eq!(result.items_total(), Some(result.metadata.subtotal));
        assert!(result.validate().is_empty());
    }

    #[test]
    fn test_vat_summary_row_and_computed_total() {
        let text = "\
Matthew Clark
Invoice INV42 dated 2024-03-01
Payment Terms: 30 days
EX0200RB 1.00 6 Rye Mill Shiraz 43.68 43.68 1
VAT Summary
1 43.68 20 8.74
";
        let result = parser().parse(text);

        assert!(result.success);
        assert_eq!(result.parsed_items.len(), 1);
        assert_eq!(result.metadata.invoice_number, "INV42");
        assert_eq!(result.metadata.invoice_date, "2024-03-01");
        assert_eq!(result.metadata.subtotal, dec("43.68"));
        assert_eq!(result.metadata.vat_total, dec("8.74"));
        assert_eq!(result.metadata.total_amount, dec("52.42"));
    }

    #[test]
    fn test_end_sentinel_ignored_before_first_item() {
        let text = "\
Payment Terms: 30 days
Invoice Total shown below
EX0200RB 1.00 6 Rye Mill Shiraz 43.68 43.68 1
Invoice Total
43.68
";
        let result = parser().parse(text);

        assert_eq!(result.parsed_items.len(), 1);
        assert_eq!(result.metadata.total_amount, dec("43.68"));
        assert_eq!(result.metadata.subtotal, Decimal::ZERO);
        assert_eq!(result.metadata.vat_total, Decimal::ZERO);
    }

    #[test]
    fn test_no_items_is_a_failed_result() {
        let result = parser().parse("Matthew Clark\nDelivery Notes: none\nNothing here");
        assert!(!result.success);
        assert_eq!(result.notes, "no invoice data found");
        assert!(result.parsed_items.is_empty());
    }

    #[test]
    fn test_empty_text_is_a_failed_result() {
        let result = parser().parse("   \n  ");
        assert!(!result.success);
        assert_eq!(result.notes, "invoice text is empty");
    }

    #[test]
    fn test_detect_supplier() {
        let parser = parser();

        let detection = parser.detect_supplier(INVOICE);
        assert!(detection.is_match);
        assert_eq!(detection.confidence, 95);

        let detection = parser.detect_supplier("Booker Wholesale");
        assert!(!detection.is_match);
        assert_eq!(detection.confidence, 0);
    }
}
