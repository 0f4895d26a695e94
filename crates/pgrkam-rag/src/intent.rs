//! Keyword intent rules and portal deep links.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    PrivateJobs,
    GovernmentJobs,
    SkillDevelopment,
    ForeignCounseling,
    JobMela,
    RegistrationHelp,
    EligibilityQuery,
    DocumentChecklist,
    PortalNavigation,
    GeneralFaq,
}

/// Checked in this order; the first rule with a whole-word match wins.
const RULES: &[(Intent, &[&str])] = &[
    (Intent::GovernmentJobs, &["gov", "government", "sarkari", "punjab govt", "ssc", "psssb"]),
    (Intent::PrivateJobs, &["private", "company", "hiring", "walk-in", "internship"]),
    (Intent::SkillDevelopment, &["skill", "training", "course", "upskill", "pmkvy"]),
    (Intent::ForeignCounseling, &["foreign", "abroad", "ielts", "study visa", "counsel"]),
    (Intent::JobMela, &["mela", "job fair", "campus drive"]),
    (Intent::RegistrationHelp, &["register", "signup", "login", "password", "otp"]),
    (Intent::EligibilityQuery, &["eligible", "eligibility", "criteria", "age limit", "qualification"]),
    (Intent::DocumentChecklist, &["document", "docs", "certificate", "upload", "resume"]),
    (Intent::PortalNavigation, &["where", "how to find", "navigate", "page", "link"]),
];

fn compiled_rules() -> &'static [(Intent, Regex)] {
    static COMPILED: OnceLock<Vec<(Intent, Regex)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .filter_map(|(intent, words)| {
                let alternatives = words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|");
                match Regex::new(&format!(r"\b(?:{alternatives})\b")) {
                    Ok(re) => Some((*intent, re)),
                    Err(e) => {
                        tracing::error!(?intent, error = %e, "invalid intent pattern");
                        None
                    }
                }
            })
            .collect()
    })
}

pub fn classify_intent(text: &str) -> Intent {
    let t = text.to_lowercase();
    if let Some((intent, _)) = compiled_rules().iter().find(|(_, re)| re.is_match(&t)) {
        return *intent;
    }
    if t.contains("job") || t.contains("vacancy") { Intent::PrivateJobs } else { Intent::GeneralFaq }
}

impl Intent {
    pub fn name(self) -> &'static str {
        match self {
            Self::PrivateJobs => "PrivateJobs",
            Self::GovernmentJobs => "GovernmentJobs",
            Self::SkillDevelopment => "SkillDevelopment",
            Self::ForeignCounseling => "ForeignCounseling",
            Self::JobMela => "JobMela",
            Self::RegistrationHelp => "RegistrationHelp",
            Self::EligibilityQuery => "EligibilityQuery",
            Self::DocumentChecklist => "DocumentChecklist",
            Self::PortalNavigation => "PortalNavigation",
            Self::GeneralFaq => "GeneralFAQ",
        }
    }

    /// Portal section for this intent; intents without a section get `base`.
    pub fn deep_link(self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        let section = match self {
            Self::GovernmentJobs => "/#govtJobs",
            Self::PrivateJobs => "/#privateJobs",
            Self::SkillDevelopment => "/#skillDevelopment",
            Self::ForeignCounseling => "/#foreignCounseling",
            Self::JobMela => "/#jobMela",
            Self::RegistrationHelp => "/#register",
            Self::GeneralFaq => "/#faq",
            Self::PortalNavigation | Self::EligibilityQuery | Self::DocumentChecklist => "",
        };
        format!("{base}{section}")
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_rules_in_priority_order() {
        assert_eq!(classify_intent("Any SARKARI naukri?"), Intent::GovernmentJobs);
        assert_eq!(classify_intent("private company hiring for government contract"), Intent::GovernmentJobs);
        assert_eq!(classify_intent("walk-in interview tomorrow"), Intent::PrivateJobs);
        assert_eq!(classify_intent("IELTS coaching"), Intent::ForeignCounseling);
        assert_eq!(classify_intent("next job fair in Ludhiana"), Intent::JobMela);
        assert_eq!(classify_intent("forgot password"), Intent::RegistrationHelp);
        assert_eq!(classify_intent("what is the age limit"), Intent::EligibilityQuery);
        assert_eq!(classify_intent("upload my resume"), Intent::DocumentChecklist);
        assert_eq!(classify_intent("where is the notice"), Intent::PortalNavigation);
    }

    #[test]
    fn word_boundaries_apply() {
        // "governor" must not trigger "gov"; "skills" is not "skill".
        assert_eq!(classify_intent("governor speech"), Intent::GeneralFaq);
        assert_eq!(classify_intent("soft skills"), Intent::GeneralFaq);
    }

    #[test]
    fn fallback_rules() {
        assert_eq!(classify_intent("any jobs for me"), Intent::PrivateJobs);
        assert_eq!(classify_intent("latest vacancy"), Intent::PrivateJobs);
        assert_eq!(classify_intent("thanks"), Intent::GeneralFaq);
    }

    #[test]
    fn deep_links() {
        let base = "https://www.pgrkam.com";
        assert_eq!(Intent::GovernmentJobs.deep_link(base), "https://www.pgrkam.com/#govtJobs");
        assert_eq!(Intent::GeneralFaq.deep_link("https://www.pgrkam.com/"), "https://www.pgrkam.com/#faq");
        assert_eq!(Intent::PortalNavigation.deep_link(base), base);
        assert_eq!(Intent::EligibilityQuery.deep_link(base), base);
        assert_eq!(Intent::GeneralFaq.to_string(), "GeneralFAQ");
    }
}
