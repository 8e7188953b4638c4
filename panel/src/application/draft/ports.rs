use crate::application::node::PORT_RANGE;

/// The normalized pool of ports a draft can hand out to port bound
/// variables.
///
/// Built from the free form port tokens the user types. Order of first
/// appearance is kept, duplicates collapse and only ports strictly inside
/// the usable range survive.
#[derive(Clone, Default)]
pub struct PortSet {
    ports: Vec<u16>,
}

impl PortSet {
    /// Parses a sequence of raw port tokens.
    ///
    /// A token without a dash must be fully numeric. A token with a dash is
    /// split on the first one and enumerates the inclusive range between its
    /// halves, the end clamped to 65535. Malformed tokens are dropped and
    /// normalization continues with the remaining tokens.
    pub fn parse(tokens: &[String]) -> Self {
        let mut candidates = Vec::new();
        for token in tokens {
            let token = token.trim();
            match token.split_once('-') {
                None => {
                    if let Some(port) = parse_numeric(token) {
                        candidates.push(port);
                    }
                }
                Some((start, end)) => {
                    let (start, end) = match (parse_numeric(start), parse_numeric(end)) {
                        (Some(start), Some(end)) => (start, end.min(65535)),
                        _ => continue,
                    };
                    for port in start..=end {
                        candidates.push(port);
                    }
                }
            }
        }
        Self::collect(candidates)
    }

    /// Seeds the pool from the default ports of an egg's port bound
    /// variables. The same normalization rules apply.
    pub fn seed(defaults: &[u32]) -> Self {
        Self::collect(defaults.iter().map(|&port| u64::from(port)).collect())
    }

    fn collect(candidates: Vec<u64>) -> Self {
        let mut ports = Vec::new();
        for candidate in candidates {
            if candidate <= u64::from(PORT_RANGE.start - 1) || candidate >= u64::from(PORT_RANGE.end) {
                continue;
            }
            let candidate = candidate as u16;
            if !ports.contains(&candidate) {
                ports.push(candidate);
            }
        }
        Self { ports }
    }

    pub fn contains(&self, port: u16) -> bool {
        self.ports.contains(&port)
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.ports
    }

    pub fn to_vec(&self) -> Vec<u16> {
        self.ports.clone()
    }
}

/// Accepts only tokens that are nothing but digits. Values too large for a
/// port still parse here and are thrown away by the range filter.
fn parse_numeric(token: &str) -> Option<u64> {
    if token.is_empty() || !token.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    token.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::PortSet;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|token| token.to_string()).collect()
    }

    #[test]
    fn singles_and_ranges_expand_in_order() {
        let ports = PortSet::parse(&tokens(&["25565", "8080", "1337-1340"]));
        assert_eq!(ports.as_slice(), &[25565, 8080, 1337, 1338, 1339, 1340]);
    }

    #[test]
    fn out_of_bounds_values_are_filtered() {
        let ports = PortSet::parse(&tokens(&["100-2000"]));
        assert_eq!(ports.len(), 2000 - 1025 + 1);
        assert_eq!(ports.as_slice()[0], 1025);
        assert_eq!(*ports.as_slice().last().unwrap(), 2000);

        let ports = PortSet::parse(&tokens(&["1024", "65535", "70000"]));
        assert!(ports.is_empty());
    }

    #[test]
    fn malformed_tokens_are_dropped() {
        let ports = PortSet::parse(&tokens(&["abc", "abc-10", "20-abc", "25565"]));
        assert_eq!(ports.as_slice(), &[25565]);
    }

    #[test]
    fn duplicates_collapse_to_first_appearance() {
        let ports = PortSet::parse(&tokens(&["8080", "8079-8081", "8080"]));
        assert_eq!(ports.as_slice(), &[8080, 8079, 8081]);
    }

    #[test]
    fn range_end_is_clamped() {
        let ports = PortSet::parse(&tokens(&["65530-99999"]));
        assert_eq!(ports.as_slice(), &[65530, 65531, 65532, 65533, 65534]);
    }

    #[test]
    fn empty_input_yields_empty_pool() {
        assert!(PortSet::parse(&[]).is_empty());
        assert!(PortSet::parse(&tokens(&["", "-", "a-b"])).is_empty());
    }

    #[test]
    fn seed_applies_the_same_bounds() {
        let ports = PortSet::seed(&[25566, 80, 25566]);
        assert_eq!(ports.as_slice(), &[25566]);
    }
}
