use crate::error::Error;

const DEFAULT_MAX_IDENTITIES: &str = "4";
const DEFAULT_RETIRE_THRESHOLD: &str = "10";
const DEFAULT_MATCH_DISTANCE: &str = "0.2";

#[derive(Debug, Clone, Copy, PartialEq, structopt::StructOpt)]
pub struct TrackerConfig {
    /// Maximum number of people tracked at once.
    #[structopt(short = "-m", long, default_value = DEFAULT_MAX_IDENTITIES)]
    pub max_identities: u32,

    /// Consecutive frames a person may go unmatched before their id is freed.
    #[structopt(short, long, default_value = DEFAULT_RETIRE_THRESHOLD)]
    pub retire_threshold: u32,

    /// Largest hip-centroid jump, in normalized frame units, still matched to
    /// the same person.
    #[structopt(short = "-D", long, default_value = DEFAULT_MATCH_DISTANCE)]
    pub match_distance: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_identities: 4,
            retire_threshold: 10,
            match_distance: 0.2,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        validate_capacity(self.max_identities)?;
        if self.retire_threshold == 0 {
            return Err(Error::InvalidRetireThreshold(self.retire_threshold));
        }
        if !(self.match_distance.is_finite() && self.match_distance > 0.0) {
            return Err(Error::InvalidMatchDistance(self.match_distance));
        }
        Ok(())
    }
}

pub(crate) fn validate_capacity(max_identities: u32) -> Result<(), Error> {
    if max_identities == 0 {
        Err(Error::InvalidCapacity(max_identities))
    } else {
        Ok(())
    }
}
