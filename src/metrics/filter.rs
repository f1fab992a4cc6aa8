/// Restricts which metric names a reporter snapshots. When a metric
/// filter is configured the two partitions run under `Matching` and
/// `NotMatching` built from the same prefix list, so every name is
/// reported by exactly one of them.
#[derive(Debug, Clone)]
pub enum NameSelector {
    All,
    Matching(Vec<String>),
    NotMatching(Vec<String>),
}

impl NameSelector {
    pub fn accepts(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Matching(prefixes) => starts_with_any(name, prefixes),
            Self::NotMatching(prefixes) => !starts_with_any(name, prefixes),
        }
    }
}

fn starts_with_any(name: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
}

/// Parses the `metricsFilterList` property value: prefixes separated by
/// `;`, surrounding whitespace trimmed, empty segments dropped.
pub fn parse_prefixes(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits `names` into `(filtered, remaining)`: a name is filtered when
/// it starts with any configured prefix.
pub fn partition<'a, I>(names: I, prefixes: &[String]) -> (Vec<&'a str>, Vec<&'a str>)
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .partition(|name| starts_with_any(name, prefixes))
}
