//! Street usage statistics
//!
//! A read-only snapshot of how many car paths cross each street, computed once
//! after the network is built and handed to whichever policy needs it.

use super::types::StreetId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageStats {
    /// Number of car paths containing each street, indexed by street id
    counts: Vec<u64>,
}

impl UsageStats {
    /// Count street occurrences over every car path
    pub fn from_paths<'a, I, P>(street_count: usize, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: IntoIterator<Item = &'a StreetId>,
    {
        let mut counts = vec![0; street_count];
        for path in paths {
            for street in path {
                if let Some(count) = counts.get_mut(street.0) {
                    *count += 1;
                }
            }
        }
        Self { counts }
    }

    pub fn usage(&self, street: StreetId) -> u64 {
        self.counts.get(street.0).copied().unwrap_or(0)
    }

    /// Number of streets no car ever drives on
    pub fn unused_streets(&self) -> usize {
        self.counts.iter().filter(|&&c| c == 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_every_occurrence() {
        let paths = vec![
            vec![StreetId(0), StreetId(1)],
            vec![StreetId(1), StreetId(2), StreetId(1)],
        ];
        let stats = UsageStats::from_paths(4, paths.iter());
        assert_eq!(stats.usage(StreetId(0)), 1);
        assert_eq!(stats.usage(StreetId(1)), 3);
        assert_eq!(stats.usage(StreetId(2)), 1);
        assert_eq!(stats.usage(StreetId(3)), 0);
        assert_eq!(stats.usage(StreetId(42)), 0);
        assert_eq!(stats.unused_streets(), 1);
    }
}
