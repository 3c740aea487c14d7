//! Languages recognised for shared snippets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages a snippet can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedLanguage {
    Javascript,
    Typescript,
    Jsx,
    Tsx,
    Python,
    Java,
    Cpp,
    C,
    Csharp,
    Go,
    Rust,
    Ruby,
    Php,
    Swift,
    Kotlin,
    Scala,
    Solidity,
    Html,
    Css,
    Scss,
    Json,
    Yaml,
    Markdown,
    Sql,
    Bash,
    Shell,
    Plaintext,
}

/// Display name and file extensions of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub extensions: &'static [&'static str],
}

impl SupportedLanguage {
    /// Every language, in detection priority order.
    pub const ALL: [SupportedLanguage; 27] = [
        Self::Javascript,
        Self::Typescript,
        Self::Jsx,
        Self::Tsx,
        Self::Python,
        Self::Java,
        Self::Cpp,
        Self::C,
        Self::Csharp,
        Self::Go,
        Self::Rust,
        Self::Ruby,
        Self::Php,
        Self::Swift,
        Self::Kotlin,
        Self::Scala,
        Self::Solidity,
        Self::Html,
        Self::Css,
        Self::Scss,
        Self::Json,
        Self::Yaml,
        Self::Markdown,
        Self::Sql,
        Self::Bash,
        Self::Shell,
        Self::Plaintext,
    ];

    pub fn info(self) -> LanguageInfo {
        match self {
            Self::Javascript => language("javascript", "JavaScript", &[".js", ".mjs"]),
            Self::Typescript => language("typescript", "TypeScript", &[".ts"]),
            Self::Jsx => language("jsx", "JSX", &[".jsx"]),
            Self::Tsx => language("tsx", "TSX", &[".tsx"]),
            Self::Python => language("python", "Python", &[".py"]),
            Self::Java => language("java", "Java", &[".java"]),
            Self::Cpp => language("cpp", "C++", &[".cpp", ".cc", ".cxx", ".hpp", ".h"]),
            Self::C => language("c", "C", &[".c", ".h"]),
            Self::Csharp => language("csharp", "C#", &[".cs"]),
            Self::Go => language("go", "Go", &[".go"]),
            Self::Rust => language("rust", "Rust", &[".rs"]),
            Self::Ruby => language("ruby", "Ruby", &[".rb"]),
            Self::Php => language("php", "PHP", &[".php"]),
            Self::Swift => language("swift", "Swift", &[".swift"]),
            Self::Kotlin => language("kotlin", "Kotlin", &[".kt", ".kts"]),
            Self::Scala => language("scala", "Scala", &[".scala"]),
            Self::Solidity => language("solidity", "Solidity", &[".sol"]),
            Self::Html => language("html", "HTML", &[".html", ".htm"]),
            Self::Css => language("css", "CSS", &[".css"]),
            Self::Scss => language("scss", "SCSS", &[".scss", ".sass"]),
            Self::Json => language("json", "JSON", &[".json"]),
            Self::Yaml => language("yaml", "YAML", &[".yaml", ".yml"]),
            Self::Markdown => language("markdown", "Markdown", &[".md", ".markdown"]),
            Self::Sql => language("sql", "SQL", &[".sql"]),
            Self::Bash => language("bash", "Bash", &[".sh", ".bash"]),
            Self::Shell => language("shell", "Shell", &[".sh", ".zsh", ".fish"]),
            Self::Plaintext => language("plaintext", "Plain Text", &[".txt"]),
        }
    }

    /// First extension registered for the language, dot included.
    pub fn default_extension(self) -> &'static str {
        self.info().extensions[0]
    }
}

const fn language(
    id: &'static str,
    name: &'static str,
    extensions: &'static [&'static str],
) -> LanguageInfo {
    LanguageInfo {
        id,
        name,
        extensions,
    }
}

impl fmt::Display for SupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

/// Error returned when a language id is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language '{0}'")]
pub struct UnknownLanguage(pub String);

impl FromStr for SupportedLanguage {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|language| language.info().id == wanted)
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

/// Detect the language of a file from its extension.
///
/// Falls back to [`SupportedLanguage::Plaintext`] when the name has no
/// extension or the extension is unknown.
pub fn detect_language(filename: &str) -> SupportedLanguage {
    let Some(dot) = filename.rfind('.') else {
        return SupportedLanguage::Plaintext;
    };
    let extension = filename[dot..].to_ascii_lowercase();

    SupportedLanguage::ALL
        .into_iter()
        .find(|language| language.info().extensions.contains(&extension.as_str()))
        .unwrap_or(SupportedLanguage::Plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_common_extensions() {
        assert_eq!(detect_language("snippet.sol"), SupportedLanguage::Solidity);
        assert_eq!(detect_language("main.RS"), SupportedLanguage::Rust);
        assert_eq!(detect_language("notes.md"), SupportedLanguage::Markdown);
        assert_eq!(detect_language("archive.tar.gz"), SupportedLanguage::Plaintext);
        assert_eq!(detect_language("Makefile"), SupportedLanguage::Plaintext);
    }

    #[test]
    fn shared_extensions_resolve_to_the_first_language() {
        assert_eq!(detect_language("vector.h"), SupportedLanguage::Cpp);
        assert_eq!(detect_language("deploy.sh"), SupportedLanguage::Bash);
    }

    #[test]
    fn parses_language_ids() {
        assert_eq!("rust".parse::<SupportedLanguage>(), Ok(SupportedLanguage::Rust));
        assert_eq!(" CPP ".parse::<SupportedLanguage>(), Ok(SupportedLanguage::Cpp));
        assert!("cobol".parse::<SupportedLanguage>().is_err());
    }

    #[test]
    fn default_extension_is_first_listed() {
        assert_eq!(SupportedLanguage::Javascript.default_extension(), ".js");
        assert_eq!(SupportedLanguage::Yaml.default_extension(), ".yaml");
        assert_eq!(SupportedLanguage::Csharp.to_string(), "C#");
    }
}
