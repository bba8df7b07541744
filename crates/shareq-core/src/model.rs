use serde::{Deserialize, Serialize};

/// Delivery target for a share. Persisted as a small integer; the codec
/// lives here so every storage backend agrees on the encoding.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Destination {
    Email,
    Facebook,
    Dropbox,
}

impl Destination {
    pub fn to_i64(self) -> i64 {
        match self {
            Destination::Email => 0,
            Destination::Facebook => 1,
            Destination::Dropbox => 2,
        }
    }

    pub fn from_i64(v: i64) -> Result<Self, CodecError> {
        match v {
            0 => Ok(Destination::Email),
            1 => Ok(Destination::Facebook),
            2 => Ok(Destination::Dropbox),
            other => Err(CodecError::UnknownDestination(other)),
        }
    }
}

/// Lifecycle of a share request. Pending -> Processing -> back to Pending
/// on failure or Processed on success. Processed is terminal.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ShareState {
    Pending,
    Processing,
    Processed,
}

impl ShareState {
    pub fn to_i64(self) -> i64 {
        match self {
            ShareState::Pending => 0,
            ShareState::Processing => 1,
            ShareState::Processed => 2,
        }
    }

    pub fn from_i64(v: i64) -> Result<Self, CodecError> {
        match v {
            0 => Ok(ShareState::Pending),
            1 => Ok(ShareState::Processing),
            2 => Ok(ShareState::Processed),
            other => Err(CodecError::UnknownState(other)),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("unknown destination code {0}")]
    UnknownDestination(i64),
    #[error("unknown state code {0}")]
    UnknownState(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_codec_round_trips() {
        for d in [Destination::Email, Destination::Facebook, Destination::Dropbox] {
            assert_eq!(Destination::from_i64(d.to_i64()).unwrap(), d);
        }
        assert_eq!(
            Destination::from_i64(9),
            Err(CodecError::UnknownDestination(9))
        );
    }

    #[test]
    fn state_codec_round_trips() {
        for s in [
            ShareState::Pending,
            ShareState::Processing,
            ShareState::Processed,
        ] {
            assert_eq!(ShareState::from_i64(s.to_i64()).unwrap(), s);
        }
        assert_eq!(ShareState::from_i64(-1), Err(CodecError::UnknownState(-1)));
    }
}
