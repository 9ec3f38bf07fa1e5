/*!
 * Environment Flags
 */

/// Truthy environment value: `1`, `true`, `yes` or `on`, any case
pub fn parse_flag(raw: &str) -> bool {
    let value = raw.trim();
    ["1", "true", "yes", "on"]
        .iter()
        .any(|accepted| value.eq_ignore_ascii_case(accepted))
}
