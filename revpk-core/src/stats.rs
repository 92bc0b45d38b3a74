use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-operation summary returned by every top-level pack/unpack
/// operation and printed by the CLI as a one-line human summary.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Stats {
    pub files_processed: u64,
    pub chunks_written: u64,
    pub chunks_deduped: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    #[serde(with = "duration_as_secs_f64")]
    pub elapsed: Duration,
}

impl std::fmt::Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} files, {} chunks written, {} deduped, {} -> {} bytes, {:.2}s",
            self.files_processed,
            self.chunks_written,
            self.chunks_deduped,
            self.bytes_in,
            self.bytes_out,
            self.elapsed.as_secs_f64()
        )
    }
}

mod duration_as_secs_f64 {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}
