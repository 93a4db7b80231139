//! Preprocessor define set
//!
//! A `DefineSet` is the ordered list of `(name, value)` pairs injected
//! as `#define` lines when a stage is compiled for a program variant.
//!
//! Equality and hashing are order-sensitive: `[A=1, B=2]` and
//! `[B=2, A=1]` produce distinct program variants. Call sites are
//! expected to build define sets in a consistent order; the cache does
//! not canonicalize them.
//!
//! # Usage
//!
//! ```rust,ignore
//! let defines = DefineSet::new()
//!     .with("HAS_NORMAL_MAP", "1")
//!     .with("MAX_LIGHTS", "8");
//!
//! assert_eq!(defines.to_block(), "#define HAS_NORMAL_MAP 1\n#define MAX_LIGHTS 8\n");
//! ```

use std::fmt::Write;

/// Ordered preprocessor configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DefineSet {
    defines: Vec<(String, String)>,
}

impl DefineSet {
    /// Create an empty define set
    #[inline]
    pub fn new() -> Self {
        Self { defines: Vec::new() }
    }

    /// Append a define (builder form)
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Append a define at the end of the sequence
    ///
    /// Duplicated names are kept as-is, in order; the shader preprocessor
    /// decides what a redefinition means.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.defines.push((name.into(), value.into()));
    }

    /// Value of the first define with this name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.defines
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.defines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    /// Iterate defines in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.defines.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Render one `#define NAME VALUE` line per entry, in order
    ///
    /// An empty value renders as `#define NAME`.
    pub fn to_block(&self) -> String {
        let mut block = String::new();
        for (name, value) in &self.defines {
            if value.is_empty() {
                let _ = writeln!(block, "#define {}", name);
            } else {
                let _ = writeln!(block, "#define {} {}", name, value);
            }
        }
        block
    }
}

impl From<&[(&str, &str)]> for DefineSet {
    fn from(defines: &[(&str, &str)]) -> Self {
        let mut result = Self {
            defines: Vec::with_capacity(defines.len()),
        };
        for (name, value) in defines {
            result.push(*name, *value);
        }
        result
    }
}

impl<const N: usize> From<[(&str, &str); N]> for DefineSet {
    fn from(defines: [(&str, &str); N]) -> Self {
        Self::from(&defines[..])
    }
}

#[cfg(test)]
#[path = "define_set_tests.rs"]
mod tests;
