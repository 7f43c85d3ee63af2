//! Category lexicon: the seven NOC element types and their fixed labels in
//! both languages.
//!
//! The mapping is a bijection. Lookups for labels outside the seven return
//! `None`; callers leave the derived field unset.

use crate::i18n::Language;

/// One of the seven NOC element categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    IllustrativeExamples,
    AllExamples,
    Inclusions,
    Exclusions,
    MainDuties,
    EmploymentRequirements,
    AdditionalInformation,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::IllustrativeExamples,
        Category::AllExamples,
        Category::Inclusions,
        Category::Exclusions,
        Category::MainDuties,
        Category::EmploymentRequirements,
        Category::AdditionalInformation,
    ];

    /// Label used by the official export in `language`.
    pub fn label(self, language: Language) -> &'static str {
        let (english, french) = self.labels();
        if language == Language::FRENCH {
            french
        } else {
            english
        }
    }

    /// Short name used for the per-category export files.
    pub fn slug(self) -> &'static str {
        match self {
            Category::IllustrativeExamples => "illustratives",
            Category::AllExamples => "exemples",
            Category::Inclusions => "inclusions",
            Category::Exclusions => "exclusions",
            Category::MainDuties => "duties",
            Category::EmploymentRequirements => "requirements",
            Category::AdditionalInformation => "other",
        }
    }

    /// Find the category whose label in `language` is exactly `label`.
    pub fn from_label(label: &str, language: Language) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|category| category.label(language) == label)
    }

    fn labels(self) -> (&'static str, &'static str) {
        match self {
            Category::IllustrativeExamples => {
                ("Illustrative example(s)", "Exemple(s) illustratif(s)")
            }
            Category::AllExamples => ("All examples", "Tous les exemples"),
            Category::Inclusions => ("Inclusion(s)", "Inclusion(s)"),
            Category::Exclusions => ("Exclusion(s)", "Exclusion(s)"),
            Category::MainDuties => ("Main duties", "Fonctions principales"),
            Category::EmploymentRequirements => (
                "Employment requirements",
                "Conditions d'accès à la profession",
            ),
            Category::AdditionalInformation => {
                ("Additional information", "Renseignements supplémentaires")
            }
        }
    }
}

/// Translate a category label from `from` into the other language.
pub fn label_in_other(label: &str, from: Language) -> Option<&'static str> {
    Category::from_label(label, from).map(|category| category.label(from.other()))
}
