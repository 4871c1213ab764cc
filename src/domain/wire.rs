//! Serde helpers for the remote API's encoding conventions
//!
//! Durations travel as integer nanoseconds and collections may arrive as
//! `null`.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

/// Treat `null` as the type's default value
pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub mod nanos {
    use super::*;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let value = Option::<u64>::deserialize(deserializer)?;
        Ok(Duration::from_nanos(value.unwrap_or_default()))
    }
}

pub mod option_nanos {
    use super::*;

    pub fn serialize<S: Serializer>(
        duration: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match duration {
            Some(d) => super::nanos::serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let value = Option::<u64>::deserialize(deserializer)?;
        Ok(value.filter(|n| *n > 0).map(Duration::from_nanos))
    }
}
