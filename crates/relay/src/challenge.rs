//! Arithmetic challenges
//!
//! A challenge is a small arithmetic question with four choices, one of
//! them correct. Answers are carried as decimal strings and compared
//! literally.

use rand::seq::SliceRandom;
use rand::Rng;

use relaygate_core::{Choice, ChoiceKeyboard, SelectionPayload};

use crate::texts;

/// Largest answer a generated question may have
const MAX_ANSWER: u32 = 100;

/// Number of choices presented
const CHOICE_COUNT: usize = 4;

/// How far a wrong choice may stray from the answer
const DISTRACTOR_SPREAD: i64 = 10;

/// A generated challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// e.g. "12 + 30"
    pub question: String,
    /// Decimal answer, e.g. "42"
    pub answer: String,
    /// Presented choices in display order, the answer among them
    pub options: Vec<u32>,
}

impl Challenge {
    pub fn prompt(&self) -> String {
        texts::challenge_prompt(&self.question)
    }

    /// 2×2 keyboard; each choice carries `verify_<option>_<answer>`
    pub fn keyboard(&self) -> ChoiceKeyboard {
        let choices = self
            .options
            .iter()
            .map(|option| Choice {
                label: option.to_string(),
                payload: SelectionPayload::new(option.to_string(), self.answer.clone()).encode(),
            })
            .collect();
        ChoiceKeyboard::grid(choices, 2)
    }
}

/// Produces challenges
pub trait ChallengeSource: Send + Sync {
    fn generate(&self) -> Challenge;
}

/// Random arithmetic over `+ - * /` with answers in `0..=100`
#[derive(Debug, Default, Clone, Copy)]
pub struct MathChallenges;

impl MathChallenges {
    fn problem<R: Rng>(rng: &mut R) -> (String, u32) {
        loop {
            let (question, answer) = match rng.gen_range(0..4) {
                0 => {
                    let a = rng.gen_range(1..=50);
                    let b = rng.gen_range(1..=50);
                    (format!("{} + {}", a, b), a + b)
                }
                1 => {
                    let a = rng.gen_range(1..=100);
                    let b = rng.gen_range(0..a);
                    (format!("{} - {}", a, b), a - b)
                }
                2 => {
                    let a = rng.gen_range(1..=10);
                    let b = rng.gen_range(1..=10);
                    (format!("{} * {}", a, b), a * b)
                }
                _ => {
                    // Built backwards so the division is always exact
                    let b = rng.gen_range(1..=9);
                    let answer = rng.gen_range(1..=10);
                    (format!("{} / {}", answer * b, b), answer)
                }
            };
            if answer <= MAX_ANSWER {
                return (question, answer);
            }
        }
    }

    fn options<R: Rng>(answer: u32, rng: &mut R) -> Vec<u32> {
        let mut options = vec![answer];
        while options.len() < CHOICE_COUNT {
            let candidate = answer as i64 + rng.gen_range(-DISTRACTOR_SPREAD..=DISTRACTOR_SPREAD);
            if candidate <= 0 {
                continue;
            }
            let candidate = candidate as u32;
            if !options.contains(&candidate) {
                options.push(candidate);
            }
        }
        options.shuffle(rng);
        options
    }
}

impl ChallengeSource for MathChallenges {
    fn generate(&self) -> Challenge {
        let mut rng = rand::thread_rng();
        let (question, answer) = Self::problem(&mut rng);
        let options = Self::options(answer, &mut rng);
        Challenge {
            question,
            answer: answer.to_string(),
            options,
        }
    }
}

/// Always hands out the same challenge
#[derive(Debug, Clone)]
pub struct FixedChallenge(pub Challenge);

impl FixedChallenge {
    pub fn new(question: &str, answer: u32, options: [u32; 4]) -> Self {
        Self(Challenge {
            question: question.to_string(),
            answer: answer.to_string(),
            options: options.to_vec(),
        })
    }
}

impl ChallengeSource for FixedChallenge {
    fn generate(&self) -> Challenge {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluate(question: &str) -> u32 {
        let parts: Vec<&str> = question.split(' ').collect();
        let a: u32 = parts[0].parse().unwrap();
        let b: u32 = parts[2].parse().unwrap();
        match parts[1] {
            "+" => a + b,
            "-" => a - b,
            "*" => a * b,
            "/" => {
                assert_eq!(a % b, 0, "division must be exact: {}", question);
                a / b
            }
            op => panic!("unknown operator {}", op),
        }
    }

    #[test]
    fn test_generated_answers_are_correct() {
        for _ in 0..500 {
            let challenge = MathChallenges.generate();
            let answer: u32 = challenge.answer.parse().unwrap();
            assert_eq!(evaluate(&challenge.question), answer);
            assert!(answer <= MAX_ANSWER);
        }
    }

    #[test]
    fn test_options_contain_answer_once() {
        for _ in 0..500 {
            let challenge = MathChallenges.generate();
            let answer: u32 = challenge.answer.parse().unwrap();
            assert_eq!(challenge.options.len(), CHOICE_COUNT);
            assert_eq!(challenge.options.iter().filter(|o| **o == answer).count(), 1);

            let mut unique = challenge.options.clone();
            unique.sort_unstable();
            unique.dedup();
            assert_eq!(unique.len(), CHOICE_COUNT);
        }
    }

    #[test]
    fn test_distractors_are_positive_and_near() {
        let mut rng = rand::thread_rng();
        for answer in [0u32, 1, 2, 50, 100] {
            let options = MathChallenges::options(answer, &mut rng);
            for option in options.into_iter().filter(|o| *o != answer) {
                assert!(option > 0);
                assert!((option as i64 - answer as i64).abs() <= DISTRACTOR_SPREAD);
            }
        }
    }

    #[test]
    fn test_keyboard_payloads() {
        let challenge = FixedChallenge::new("3 + 4", 7, [3, 7, 9, 11]).generate();
        let keyboard = challenge.keyboard();

        assert_eq!(keyboard.rows.len(), 2);
        let payloads: Vec<&str> = keyboard.choices().map(|c| c.payload.as_str()).collect();
        assert_eq!(payloads, vec!["verify_3_7", "verify_7_7", "verify_9_7", "verify_11_7"]);
        let labels: Vec<&str> = keyboard.choices().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["3", "7", "9", "11"]);
    }

    #[test]
    fn test_prompt() {
        let challenge = FixedChallenge::new("3 + 4", 7, [3, 7, 9, 11]).generate();
        assert!(challenge.prompt().ends_with("\n\n3 + 4 = ?"));
    }
}
