use std::fmt;

use serde::{Deserialize, Serialize};

/// Languages the assistant answers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Pa,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Pa => "pa",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Self::En),
            "hi" => Some(Self::Hi),
            "pa" => Some(Self::Pa),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.code()) }
}

const GREETINGS: &[&str] = &["hi", "hello", "hey", "yo", "sup", "hai", "hola", "namaste", "sat sri akal"];

/// Script-based guess. Greetings and one- or two-character inputs are English.
pub fn detect_language(text: &str) -> Language {
    let t = text.trim().to_lowercase();
    if t.chars().count() <= 2 || GREETINGS.contains(&t.as_str()) { return Language::En; }

    let (mut gurmukhi, mut devanagari, mut latin) = (0usize, 0usize, 0usize);
    for c in t.chars() {
        match c {
            '\u{0A00}'..='\u{0A7F}' => gurmukhi += 1,
            '\u{0900}'..='\u{097F}' => devanagari += 1,
            c if c.is_ascii_alphabetic() => latin += 1,
            _ => {}
        }
    }
    if gurmukhi > devanagari && gurmukhi > latin {
        Language::Pa
    } else if devanagari > latin {
        Language::Hi
    } else {
        Language::En
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts() {
        assert_eq!(detect_language("ਮੈਨੂੰ ਨੌਕਰੀ ਚਾਹੀਦੀ ਹੈ"), Language::Pa);
        assert_eq!(detect_language("मुझे क्लर्क की नौकरी चाहिए"), Language::Hi);
        assert_eq!(detect_language("clerk jobs in Mohali"), Language::En);
    }

    #[test]
    fn greetings_and_short_inputs_are_english() {
        assert_eq!(detect_language("  Namaste "), Language::En);
        assert_eq!(detect_language("Sat Sri Akal"), Language::En);
        assert_eq!(detect_language("ਹਾ"), Language::En);
        assert_eq!(detect_language(""), Language::En);
    }

    #[test]
    fn codes_round_trip() {
        assert_eq!(Language::from_code(" PA "), Some(Language::Pa));
        assert_eq!(Language::Hi.to_string(), "hi");
        assert_eq!(Language::from_code("fr"), None);
    }
}
