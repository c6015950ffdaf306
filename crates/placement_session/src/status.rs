//! Outcome codes reported to the UI layer

use std::fmt;

/// The structured result of every session operation.
///
/// The UI maps these to display text; [`fmt::Display`] provides the
/// editor tool's wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// `simulate` was called with an empty participant set
    NoBodiesToSimulate,
    /// The iteration count was empty or zero
    InvalidIterationCount,
    /// The iteration count could not be parsed
    IterationFormatError,
    /// Newly tracked handles, and the registry size afterwards
    Added(usize, usize),
    /// Untracked handles, and the registry size afterwards
    Removed(usize, usize),
    Cleared,
    /// A run stopped after this many ticks
    DoneSimulating(u32),
    /// Stale participants dropped by validation
    EntriesInvalidated(usize),
    /// The registry is locked by a running or settling session
    SimulationInProgress,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoBodiesToSimulate => write!(f, "No bodies to simulate."),
            Self::InvalidIterationCount => write!(f, "Max Iterations must be higher than 0"),
            Self::IterationFormatError => write!(f, "Max Iterations Format Error."),
            Self::Added(added, total) => write!(f, "Added {added} new bodies ({total} total)"),
            Self::Removed(removed, total) => write!(f, "Removed {removed} bodies ({total} total)"),
            Self::Cleared => write!(f, "Cleared out all bodies."),
            Self::DoneSimulating(iterations) => write!(f, "Done simulating in {iterations} iterations."),
            Self::EntriesInvalidated(1) => write!(f, "1 entry invalidated."),
            Self::EntriesInvalidated(n) => write!(f, "{n} entries invalidated."),
            Self::SimulationInProgress => write!(f, "Simulation in progress."),
        }
    }
}

/// Parse the iteration count typed into the editor field.
///
/// Anything that is not an ASCII digit is ignored, matching a numeric
/// text field that silently drops other characters.
pub fn parse_iterations(text: &str) -> Result<u32, Status> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(Status::InvalidIterationCount);
    }
    match digits.parse::<u32>() {
        Ok(0) => Err(Status::InvalidIterationCount),
        Ok(n) => Ok(n),
        Err(_) => Err(Status::IterationFormatError),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_wording() {
        assert_eq!(Status::Added(2, 5).to_string(), "Added 2 new bodies (5 total)");
        assert_eq!(Status::Removed(1, 4).to_string(), "Removed 1 bodies (4 total)");
        assert_eq!(Status::DoneSimulating(37).to_string(), "Done simulating in 37 iterations.");
        assert_eq!(Status::EntriesInvalidated(1).to_string(), "1 entry invalidated.");
        assert_eq!(Status::EntriesInvalidated(3).to_string(), "3 entries invalidated.");
    }

    #[test]
    fn test_parse_iterations() {
        assert_eq!(parse_iterations("1000"), Ok(1000));
        assert_eq!(parse_iterations(" 1,000 "), Ok(1000));
        assert_eq!(parse_iterations("abc"), Err(Status::InvalidIterationCount));
        assert_eq!(parse_iterations(""), Err(Status::InvalidIterationCount));
        assert_eq!(parse_iterations("000"), Err(Status::InvalidIterationCount));
        assert_eq!(parse_iterations("99999999999"), Err(Status::IterationFormatError));
    }
}
