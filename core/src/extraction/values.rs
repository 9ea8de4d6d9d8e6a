use regex::Regex;
use std::sync::OnceLock;

/// Parses every decimal number in a DICOM value string
///
/// Accepts the forms produced by different writers:
/// - backslash separated multi-values: `"0.1\\0.1"`
/// - whitespace or comma separated lists: `"[0.1, 0.1]"`
/// - quoted values: `"'28'"`
/// - exponential notation: `"1.5e-4"`
///
/// # Example
///
/// ```
/// use phantomqc_core::extraction::parse_decimals;
///
/// assert_eq!(parse_decimals("'28'"), vec![28.0]);
/// assert_eq!(parse_decimals("0.1\\1.5e+1"), vec![0.1, 15.0]);
/// assert!(parse_decimals("N/A").is_empty());
/// ```
pub fn parse_decimals(s: &str) -> Vec<f64> {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    let re = REGEX.get_or_init(|| {
        Regex::new(r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").expect("Failed to compile regex")
    });

    re.find_iter(s)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0.1\\0.1", vec![0.1, 0.1])]
    #[case("0.194 0.194", vec![0.194, 0.194])]
    #[case("[0.1, 0.1]", vec![0.1, 0.1])]
    #[case("1.5e-1\\1.5e-1", vec![0.15, 0.15])]
    #[case("-1024", vec![-1024.0])]
    #[case("'32'", vec![32.0])]
    #[case(".5", vec![0.5])]
    #[case("12.", vec![12.0])]
    #[case("", vec![])]
    #[case("MOLYBDENUM", vec![])]
    fn test_parse_decimals(#[case] input: &str, #[case] expected: Vec<f64>) {
        assert_eq!(parse_decimals(input), expected);
    }
}
