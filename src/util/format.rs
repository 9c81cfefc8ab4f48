use num_format::{CustomFormat, Grouping, ToFormattedString};

pub fn number_format() -> CustomFormat {
    CustomFormat::builder()
        .grouping(Grouping::Standard)
        .minus_sign("-")
        .separator("_")
        .build()
        .unwrap_or_default()
}

/// `1234567` -> `"1_234_567"`
pub fn grouped<N: ToFormattedString>(n: N) -> String {
    n.to_formatted_string(&number_format())
}
