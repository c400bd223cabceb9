/// Case shape of a matched span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasePattern {
    Lower,
    Title,
    Upper,
}

impl CasePattern {
    pub fn detect(span: &str) -> Self {
        let letters: Vec<char> = span.chars().filter(|c| c.is_alphabetic()).collect();
        match letters.first() {
            None => Self::Lower,
            Some(_) if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) => Self::Upper,
            Some(first) if first.is_uppercase() => Self::Title,
            Some(_) => Self::Lower,
        }
    }

    /// Reshape `replacement` to this pattern. Lower keeps the stored form.
    pub fn apply(self, replacement: &str) -> String {
        match self {
            Self::Lower => replacement.to_string(),
            Self::Upper => replacement.to_uppercase(),
            Self::Title => {
                let mut chars = replacement.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}
