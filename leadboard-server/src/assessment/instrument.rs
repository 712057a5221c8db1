//! Questionnaire instruments
//!
//! An instrument fixes the question set (`q1`..`qN`), how many non-blank
//! answers are needed before classification, and the prompt text.

use leadboard_common::Questionnaire;
use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

const AESTHETIC_QUESTIONS: [&str; 15] = [
    "It makes sense to have cosmetic surgery rather than spending years feeling bad about the way I look.",
    "Cosmetic surgery is a good thing because it can help me feel better about myself.",
    "Within next 2 months, I will end up having some cosmetic surgery.",
    "I am very unhappy with my physical appearance, and I am considering cosmetic surgery.",
    "I think cosmetic surgery can make me happier with the way I look, and I am willing to go for it.",
    "If I could have a cosmetic surgery done for a fair price, I would consider cosmetic surgery.",
    "If I knew there would be no negative side effects such as pain, I would like to try cosmetic surgery.",
    "I am constantly thinking about having cosmetic surgery.",
    "I would seriously consider having cosmetic surgery if my partner thought it was a good idea.",
    "I would never have any kind of cosmetic surgery.",
    "I would have cosmetic surgery to keep looking young.",
    "It would benefit my career, I will have cosmetic surgery.",
    "I am considering having cosmetic surgery as I think my partner would find me more attractive.",
    "Cosmetic surgery can be a big benefit to my self-image.",
    "I think cosmetic procedures would make me more attractive to others, and that's why I will go for it.",
];

const RETAIL_QUESTIONS: [&str; 7] = [
    "I am actively shopping for farm, ranch, or outdoor products.",
    "I have a budget in mind for my next purchase.",
    "I prefer to buy within the next 30 days.",
    "I am the decision-maker for this purchase.",
    "I am comfortable ordering online for pickup or delivery.",
    "I'm interested in deals or financing options.",
    "I want personalized recommendations for my needs.",
];

/// Active questionnaire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Instrument {
    /// Cosmetic surgery intent, 15 items, all required, q10 reverse-scored
    #[default]
    Aesthetic,
    /// Farm/ranch retail purchase intent, 7 items, 5 required
    Retail,
}

impl Instrument {
    pub fn name(&self) -> &'static str {
        match self {
            Instrument::Aesthetic => "aesthetic",
            Instrument::Retail => "retail",
        }
    }

    pub fn questions(&self) -> &'static [&'static str] {
        match self {
            Instrument::Aesthetic => &AESTHETIC_QUESTIONS,
            Instrument::Retail => &RETAIL_QUESTIONS,
        }
    }

    /// Non-blank answers needed before the classifier is called
    pub fn threshold(&self) -> usize {
        match self {
            Instrument::Aesthetic => 15,
            Instrument::Retail => 5,
        }
    }

    /// 1-based number of the reverse-scored item, if any
    pub fn reverse_scored(&self) -> Option<usize> {
        match self {
            Instrument::Aesthetic => Some(10),
            Instrument::Retail => None,
        }
    }

    /// Answer keys `q1`..`qN`
    pub fn keys(&self) -> Vec<String> {
        (1..=self.questions().len()).map(|n| format!("q{}", n)).collect()
    }

    /// Non-blank answers among this instrument's keys
    pub fn answered(&self, questionnaire: &Questionnaire) -> usize {
        let keys = self.keys();
        questionnaire.answered_among(keys.iter().map(String::as_str))
    }

    pub fn is_complete(&self, questionnaire: &Questionnaire) -> bool {
        self.answered(questionnaire) >= self.threshold()
    }

    /// Classification prompt listing every question with its rating
    pub fn render_prompt(&self, questionnaire: &Questionnaire) -> String {
        let (subject, respondent, likelihood, benefits) = match self {
            Instrument::Aesthetic => (
                "a patient questionnaire about cosmetic surgery",
                "patient",
                "Likelihood of having cosmetic surgery score",
                "Perceived benefits of cosmetic surgery score",
            ),
            Instrument::Retail => (
                "a customer questionnaire for a farm/ranch retail pipeline",
                "customer",
                "Purchase intent score",
                "Perceived value score",
            ),
        };

        let mut prompt = format!(
            "I have {}. The {} rated the following statements on a scale from \
             1 (strongly disagree) to 7 (strongly agree):\n\n",
            subject, respondent
        );

        for (i, question) in self.questions().iter().enumerate() {
            let number = i + 1;
            let rating = questionnaire
                .get(&format!("q{}", number))
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .unwrap_or("not answered");
            let _ = write!(prompt, "{}. {} - Rating: {}", number, question, rating);
            if self.reverse_scored() == Some(number) {
                prompt.push_str(
                    " (Note: This question is reverse-scored, meaning a low score \
                     indicates higher likelihood)",
                );
            }
            prompt.push('\n');
        }

        let _ = write!(
            prompt,
            "\nAnalyze these responses and provide:\n\n\
             1. {} (0-10 scale)\n\
             2. {} (0-10 scale)\n\
             3. An overall assessment category: \"High Intent\", \"Medium Intent\", or \"Low Intent\"\n",
            likelihood, benefits
        );

        if let Some(number) = self.reverse_scored() {
            let _ = write!(
                prompt,
                "\nNote that question {} is reverse-scored, meaning a low score indicates higher likelihood.\n",
                number
            );
        }

        prompt.push_str(
            "\nReturn ONLY a JSON object in this format:\n\
             {\n  \"likelihood\": number,\n  \"benefits\": number,\n  \"overall\": string\n}\n",
        );

        prompt
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Instrument {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aesthetic" => Ok(Instrument::Aesthetic),
            "retail" => Ok(Instrument::Retail),
            other => Err(format!(
                "unknown instrument '{}' (expected 'aesthetic' or 'retail')",
                other
            )),
        }
    }
}
