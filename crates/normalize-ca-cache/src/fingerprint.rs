use serde::Serialize;
use std::fmt;

/// Failure to encode a value for hashing.
#[derive(Debug, thiserror::Error)]
#[error("cannot fingerprint value: {0}")]
pub struct FingerprintError(#[from] bincode::Error);

/// blake3 digest of a value's bincode encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint any serializable value.
    ///
    /// Stable across runs and processes for the same bincode encoding;
    /// map-typed fields must iterate in a fixed order (use `BTreeMap`).
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self, FingerprintError> {
        let bytes = bincode::serialize(value)?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Fingerprint raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell entries apart in logs
        f.write_str(&self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Key<'a> {
        tree: &'a str,
        target: &'a str,
        options: BTreeMap<&'a str, bool>,
    }

    #[test]
    fn test_same_value_same_fingerprint() {
        let options = BTreeMap::from([("useBorrowing", true), ("generateComments", false)]);
        let a = Key {
            tree: "fn f() {}",
            target: "rust",
            options: options.clone(),
        };
        let b = Key {
            tree: "fn f() {}",
            target: "rust",
            options,
        };
        assert_eq!(Fingerprint::of(&a).unwrap(), Fingerprint::of(&b).unwrap());
    }

    #[test]
    fn test_any_field_changes_fingerprint() {
        let base = Fingerprint::of(&("tree", "rust", 1u8)).unwrap();
        assert_ne!(base, Fingerprint::of(&("tree", "go", 1u8)).unwrap());
        assert_ne!(base, Fingerprint::of(&("tree", "rust", 2u8)).unwrap());
        assert_ne!(base, Fingerprint::of(&("tree2", "rust", 1u8)).unwrap());
    }

    #[test]
    fn test_hex_and_display() {
        let fp = Fingerprint::from_bytes(b"abc");
        let hex = fp.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(hex, blake3::hash(b"abc").to_hex().to_string());
        assert_eq!(fp.to_string(), hex[..16]);
    }
}
