//! Language identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A programming language the translator knows about, as source or target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    Python,
    Rust,
    Go,
    JavaScript,
    TypeScript,
    Cpp,
    CSharp,
    Kotlin,
    Swift,
    Scala,
    C,
    Php,
    Ruby,
    Dart,
}

/// Error returned when a language name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language: {0}")]
pub struct UnknownLanguage(pub String);

impl Language {
    /// Every supported language, in declaration order.
    pub const ALL: [Language; 15] = [
        Language::Java,
        Language::Python,
        Language::Rust,
        Language::Go,
        Language::JavaScript,
        Language::TypeScript,
        Language::Cpp,
        Language::CSharp,
        Language::Kotlin,
        Language::Swift,
        Language::Scala,
        Language::C,
        Language::Php,
        Language::Ruby,
        Language::Dart,
    ];

    /// Stable lowercase identifier (e.g., "typescript", "cpp").
    pub const fn id(self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Python => "python",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Kotlin => "kotlin",
            Language::Swift => "swift",
            Language::Scala => "scala",
            Language::C => "c",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Dart => "dart",
        }
    }

    /// Human-readable name.
    pub const fn display_name(self) -> &'static str {
        match self {
            Language::Java => "Java",
            Language::Python => "Python",
            Language::Rust => "Rust",
            Language::Go => "Go",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Cpp => "C++",
            Language::CSharp => "C#",
            Language::Kotlin => "Kotlin",
            Language::Swift => "Swift",
            Language::Scala => "Scala",
            Language::C => "C",
            Language::Php => "PHP",
            Language::Ruby => "Ruby",
            Language::Dart => "Dart",
        }
    }

    /// Conventional source file extension, without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Python => "py",
            Language::Rust => "rs",
            Language::Go => "go",
            Language::JavaScript => "js",
            Language::TypeScript => "ts",
            Language::Cpp => "cpp",
            Language::CSharp => "cs",
            Language::Kotlin => "kt",
            Language::Swift => "swift",
            Language::Scala => "scala",
            Language::C => "c",
            Language::Php => "php",
            Language::Ruby => "rb",
            Language::Dart => "dart",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lang = match s.trim().to_ascii_lowercase().as_str() {
            "java" => Language::Java,
            "python" | "py" => Language::Python,
            "rust" | "rs" => Language::Rust,
            "go" | "golang" => Language::Go,
            "javascript" | "js" => Language::JavaScript,
            "typescript" | "ts" => Language::TypeScript,
            "cpp" | "c++" => Language::Cpp,
            "csharp" | "c#" | "cs" => Language::CSharp,
            "kotlin" | "kt" => Language::Kotlin,
            "swift" => Language::Swift,
            "scala" => Language::Scala,
            "c" => Language::C,
            "php" => Language::Php,
            "ruby" | "rb" => Language::Ruby,
            "dart" => Language::Dart,
            _ => return Err(UnknownLanguage(s.to_string())),
        };
        Ok(lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_parse() {
        assert_eq!("py".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("C++".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!(" Golang ".parse::<Language>().unwrap(), Language::Go);
        assert_eq!("c#".parse::<Language>().unwrap(), Language::CSharp);
    }

    #[test]
    fn test_unknown_language() {
        let err = "cobol".parse::<Language>().unwrap_err();
        assert_eq!(err.to_string(), "unknown language: cobol");
    }

    #[test]
    fn test_id_roundtrips_through_from_str() {
        for lang in Language::ALL {
            assert_eq!(lang.id().parse::<Language>().unwrap(), lang);
        }
    }
}
