//! Album value and its content fingerprint
//!
//! An album is identified by the names of its immediate entries, in listing
//! order, not by its path. The fingerprint is the bincode encoding of that
//! name list: a little-endian `u64` element count followed, per name, by a
//! `u64` byte length and the name's raw bytes. For UTF-8 names this is the
//! same layout as a bincode `Vec<String>`. Equal lists give equal bytes; any
//! change in count, order or spelling gives different bytes, including names
//! that only differ in bytes that are not valid UTF-8.

use flaclink_common::{Error, Result};
use std::ffi::{OsStr, OsString};

/// A detected album directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    /// Directory base name, for display
    pub name: String,
    /// Immediate child entry names, directories and files alike
    pub contents: Vec<OsString>,
}

impl Album {
    pub fn new<I, S>(name: impl Into<String>, contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            name: name.into(),
            contents: contents.into_iter().map(Into::into).collect(),
        }
    }

    pub fn fingerprint(&self) -> Result<Fingerprint> {
        Fingerprint::encode(&self.contents)
    }
}

/// Registry key derived from an album's content listing
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(Vec<u8>);

impl Fingerprint {
    pub fn encode<S: AsRef<OsStr>>(contents: &[S]) -> Result<Self> {
        let names: Vec<&[u8]> = contents.iter().map(|name| name_bytes(name.as_ref())).collect();

        bincode::serialize(&names)
            .map(Fingerprint)
            .map_err(Error::Encode)
    }

    /// Recover the content listing a fingerprint was built from
    ///
    /// Names that are not valid UTF-8 come back lossy.
    pub fn decode(&self) -> Result<Vec<String>> {
        let names: Vec<Vec<u8>> = bincode::deserialize(&self.0).map_err(Error::Decode)?;

        Ok(names
            .iter()
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .collect())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Fingerprint(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(unix)]
fn name_bytes(name: &OsStr) -> &[u8] {
    use std::os::unix::ffi::OsStrExt;
    name.as_bytes()
}

// Only unpaired UTF-16 surrogates are not representable here
#[cfg(not(unix))]
fn name_bytes(name: &OsStr) -> &[u8] {
    name.to_str().map(str::as_bytes).unwrap_or_else(|| {
        tracing::warn!("Non-Unicode file name in fingerprint: {:?}", name);
        name.as_encoded_bytes()
    })
}
