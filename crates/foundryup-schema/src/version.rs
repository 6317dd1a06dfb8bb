//! Dotted version comparison.

/// Compare two version strings numerically.
///
/// Returns true if `latest` is strictly newer than `current`. A leading `v`
/// is ignored and missing components count as zero.
///
/// # Example
///
/// ```
/// use foundryup_schema::is_newer;
///
/// assert!(is_newer("1.2.3", "1.2.4"));
/// assert!(!is_newer("1.2.3", "1.2.3"));
/// ```
pub fn is_newer(current: &str, latest: &str) -> bool {
    let parse = |v: &str| -> Vec<u32> {
        v.trim()
            .trim_start_matches('v')
            .split('.')
            .filter_map(|s| s.parse::<u32>().ok())
            .collect()
    };

    let c_parts = parse(current);
    let l_parts = parse(latest);

    for i in 0..std::cmp::max(c_parts.len(), l_parts.len()) {
        let cv = c_parts.get(i).unwrap_or(&0);
        let lv = l_parts.get(i).unwrap_or(&0);
        if lv > cv {
            return true;
        }
        if cv > lv {
            return false;
        }
    }
    false
}

/// Strict greater-than on `major.minor.patch` strings: `version_gt(a, b)` is `a > b`.
pub fn version_gt(a: &str, b: &str) -> bool {
    is_newer(b, a)
}
